use crate::error::Error;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// One COPY block pulled out of a plain-format SQL dump, columns mapped
/// by name from the COPY header so column reordering in the dump cannot
/// silently shift fields.
#[derive(Debug, Clone)]
pub struct DumpTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    /// Malformed rows encountered and skipped.
    pub skipped_rows: usize,
}

impl DumpTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// First present column among `names`, for dumps that vary in
    /// column naming across schema versions.
    pub fn column_index_any(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.column_index(n))
    }
}

/// Read the COPY block for `table` from a dump at `path`. `.gz` files
/// are decompressed on the fly; anything else is read as plain text.
pub fn read_table(path: &Path, table: &str) -> Result<DumpTable, Error> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    parse_copy_block(BufReader::new(reader), table)
}

fn parse_copy_block(reader: impl BufRead, table: &str) -> Result<DumpTable, Error> {
    let mut lines = reader.lines();

    let mut columns: Option<Vec<String>> = None;
    for line in lines.by_ref() {
        let line = line?;
        if let Some(cols) = parse_copy_header(&line, table) {
            columns = Some(cols);
            break;
        }
    }
    let Some(columns) = columns else {
        return Err(Error::Backup(format!(
            "COPY block for table '{table}' not found in dump"
        )));
    };
    debug!("Found COPY block for '{}' with {} columns", table, columns.len());

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut skipped_rows = 0;
    for line in lines {
        let line = line?;
        if line == "\\." {
            return Ok(DumpTable {
                columns,
                rows,
                skipped_rows,
            });
        }
        let fields: Vec<Option<String>> = line.split('\t').map(decode_field).collect();
        if fields.len() != columns.len() {
            warn!(
                "Skipping malformed dump row for '{}': {} fields, expected {}",
                table,
                fields.len(),
                columns.len()
            );
            skipped_rows += 1;
            continue;
        }
        rows.push(fields);
    }
    Err(Error::Backup(format!(
        "COPY block for table '{table}' is not terminated"
    )))
}

/// Matches `COPY [public.]<table> (col, "col2", …) FROM stdin;`.
fn parse_copy_header(line: &str, table: &str) -> Option<Vec<String>> {
    let rest = line.strip_prefix("COPY ")?;
    let (name, rest) = rest.split_once('(')?;
    let name = name.trim();
    let name = name.strip_prefix("public.").unwrap_or(name);
    if name != table {
        return None;
    }
    let (cols, _) = rest.split_once(')')?;
    Some(
        cols.split(',')
            .map(|c| c.trim().trim_matches('"').to_string())
            .collect(),
    )
}

/// `\N` is NULL; `\t`, `\n`, `\r`, `\\` are the escapes plain-format
/// COPY emits inside a field.
fn decode_field(raw: &str) -> Option<String> {
    if raw == "\\N" {
        return None;
    }
    if !raw.contains('\\') {
        return Some(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Some(out)
}
