mod dump;

pub use dump::{read_table, DumpTable};

use crate::error::Error;
use crate::storage::models::{FileRecord, RelationRecord};
use std::path::Path;
use tracing::warn;

/// File rows from a dump's files table. Returns the records plus the
/// count of rows skipped as malformed (inventory over a possibly
/// imperfect backup is best-effort).
pub fn read_file_records(path: &Path, table: &str) -> Result<(Vec<FileRecord>, usize), Error> {
    let dump = read_table(path, table)?;
    let id_ix = require_column(&dump, table, &["id"])?;
    let name_ix = require_column(&dump, table, &["name"])?;
    let hash_ix = dump.column_index("hash");
    let url_ix = dump.column_index("url");
    let created_ix = dump.column_index("created_at");

    let mut records = Vec::with_capacity(dump.rows.len());
    let mut skipped = dump.skipped_rows;
    for row in &dump.rows {
        let id = row[id_ix].as_deref().and_then(|v| v.parse::<i64>().ok());
        let name = row[name_ix].as_deref();
        let (Some(id), Some(name)) = (id, name) else {
            warn!("Skipping file dump row with missing id or name");
            skipped += 1;
            continue;
        };
        records.push(FileRecord {
            id,
            name: name.to_string(),
            hash: hash_ix.and_then(|ix| row[ix].clone()),
            url: text_or_empty(row, url_ix),
            created_at: text_or_empty(row, created_ix),
        });
    }
    Ok((records, skipped))
}

/// Relation rows from a dump's polymorphic join table. Column aliases
/// cover the naming drift across dump schema versions.
pub fn read_relation_records(
    path: &Path,
    table: &str,
) -> Result<(Vec<RelationRecord>, usize), Error> {
    let dump = read_table(path, table)?;
    let file_ix = require_column(&dump, table, &["file_id"])?;
    let owner_ix = require_column(&dump, table, &["owner_id", "related_id"])?;
    let type_ix = require_column(&dump, table, &["owner_type", "related_type"])?;
    let field_ix = require_column(&dump, table, &["field"])?;
    let order_ix = dump.column_index_any(&["sort_order", "order"]);

    let mut records = Vec::with_capacity(dump.rows.len());
    let mut skipped = dump.skipped_rows;
    for row in &dump.rows {
        let file_id = row[file_ix].as_deref().and_then(|v| v.parse::<i64>().ok());
        let owner_id = row[owner_ix].as_deref().and_then(|v| v.parse::<i64>().ok());
        let owner_type = row[type_ix].as_deref();
        let field = row[field_ix].as_deref();
        let (Some(file_id), Some(owner_id), Some(owner_type), Some(field)) =
            (file_id, owner_id, owner_type, field)
        else {
            warn!("Skipping relation dump row with missing key fields");
            skipped += 1;
            continue;
        };
        records.push(RelationRecord {
            id: 0,
            file_id,
            owner_id,
            owner_type: owner_type.to_string(),
            field: field.to_string(),
            sort_order: order_ix.and_then(|ix| row[ix].as_deref()).and_then(|v| v.parse().ok()),
        });
    }
    Ok((records, skipped))
}

fn require_column(dump: &DumpTable, table: &str, names: &[&str]) -> Result<usize, Error> {
    dump.column_index_any(names).ok_or_else(|| {
        Error::Backup(format!(
            "dump table '{}' has no '{}' column (found: {})",
            table,
            names.join("' or '"),
            dump.columns.join(", ")
        ))
    })
}

fn text_or_empty(row: &[Option<String>], ix: Option<usize>) -> String {
    ix.and_then(|ix| row[ix].clone()).unwrap_or_default()
}
