use crate::error::Error;
use crate::matcher::MatchResult;
use crate::storage::models::RelationRecord;
use crate::storage::Database;
use rusqlite::params;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemapOutcome {
    /// Relation rows whose file_id was rewritten in place.
    pub updated: usize,
    /// Relation rows dropped because the substituted tuple already existed.
    pub skipped_duplicates: usize,
}

/// Rewrite every relation row pointing at a matched source file so it
/// points at the target instead. One transaction for the whole batch:
/// either every eligible row is updated or dropped, or none are.
///
/// With `apply = false` the same loop runs and then rolls back, so the
/// dry-run counts are exactly what a subsequent apply would produce.
pub fn remap(db: &Database, matches: &[MatchResult], apply: bool) -> Result<RemapOutcome, Error> {
    let rows_planned = count_eligible_rows(db, matches)?;
    let outcome = run_batch(db, matches, apply)
        .map_err(|source| Error::Transaction { rows_planned, source })?;
    if apply {
        info!(
            "Remapped {} relation rows, dropped {} would-be duplicates",
            outcome.updated, outcome.skipped_duplicates
        );
    } else {
        info!(
            "Dry run: would remap {} relation rows and drop {} duplicates",
            outcome.updated, outcome.skipped_duplicates
        );
    }
    Ok(outcome)
}

fn count_eligible_rows(db: &Database, matches: &[MatchResult]) -> Result<usize, Error> {
    let mut stmt = db
        .connection()
        .prepare_cached("SELECT COUNT(*) FROM file_relations WHERE file_id = ?1")?;
    let mut total = 0usize;
    for m in matches {
        let count: i64 = stmt.query_row(params![m.source_id], |row| row.get(0))?;
        total += count as usize;
    }
    Ok(total)
}

fn run_batch(
    db: &Database,
    matches: &[MatchResult],
    apply: bool,
) -> rusqlite::Result<RemapOutcome> {
    let tx = db.connection().unchecked_transaction()?;
    let mut outcome = RemapOutcome::default();
    {
        let mut select = tx.prepare_cached(
            "SELECT id, owner_id, owner_type, field, sort_order \
             FROM file_relations WHERE file_id = ?1 ORDER BY id",
        )?;
        // `sort_order IS ?5` so NULL orders compare equal, unlike `=`
        let mut tuple_exists = tx.prepare_cached(
            "SELECT COUNT(*) FROM file_relations \
             WHERE file_id = ?1 AND owner_id = ?2 AND owner_type = ?3 \
               AND field = ?4 AND sort_order IS ?5",
        )?;
        let mut update = tx.prepare_cached("UPDATE file_relations SET file_id = ?1 WHERE id = ?2")?;
        let mut delete = tx.prepare_cached("DELETE FROM file_relations WHERE id = ?1")?;

        for m in matches {
            let rows: Vec<(i64, i64, String, String, Option<i64>)> = select
                .query_map(params![m.source_id], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                })?
                .collect::<rusqlite::Result<_>>()?;

            for (row_id, owner_id, owner_type, field, sort_order) in rows {
                let duplicates: i64 = tuple_exists.query_row(
                    params![m.target_id, owner_id, owner_type, field, sort_order],
                    |row| row.get(0),
                )?;
                if duplicates > 0 {
                    delete.execute(params![row_id])?;
                    outcome.skipped_duplicates += 1;
                    debug!(
                        "Dropped relation row {} ({} -> {} would duplicate an existing row)",
                        row_id, m.source_id, m.target_id
                    );
                } else {
                    update.execute(params![m.target_id, row_id])?;
                    outcome.updated += 1;
                }
            }
        }
    }
    if apply {
        tx.commit()?;
    } else {
        tx.rollback()?;
    }
    Ok(outcome)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreOutcome {
    pub inserted: usize,
    pub skipped_duplicates: usize,
    pub skipped_unmatched: usize,
}

/// Re-insert relation rows recovered from a backup dump, remapping each
/// file_id through the current match plan. Rows whose source file has no
/// match are skipped and counted; rows whose substituted tuple already
/// exists are skipped as duplicates. Same transaction and dry-run
/// discipline as `remap`.
pub fn restore_relations(
    db: &Database,
    id_map: &HashMap<i64, i64>,
    rows: &[RelationRecord],
    apply: bool,
) -> Result<RestoreOutcome, Error> {
    let outcome = run_restore(db, id_map, rows, apply).map_err(|source| Error::Transaction {
        rows_planned: rows.len(),
        source,
    })?;
    if apply {
        info!(
            "Restored {} relation rows ({} duplicates, {} unmatched skipped)",
            outcome.inserted, outcome.skipped_duplicates, outcome.skipped_unmatched
        );
    } else {
        info!(
            "Dry run: would restore {} relation rows ({} duplicates, {} unmatched skipped)",
            outcome.inserted, outcome.skipped_duplicates, outcome.skipped_unmatched
        );
    }
    Ok(outcome)
}

fn run_restore(
    db: &Database,
    id_map: &HashMap<i64, i64>,
    rows: &[RelationRecord],
    apply: bool,
) -> rusqlite::Result<RestoreOutcome> {
    let tx = db.connection().unchecked_transaction()?;
    let mut outcome = RestoreOutcome::default();
    let known_targets: HashSet<i64> = id_map.values().copied().collect();
    {
        let mut tuple_exists = tx.prepare_cached(
            "SELECT COUNT(*) FROM file_relations \
             WHERE file_id = ?1 AND owner_id = ?2 AND owner_type = ?3 \
               AND field = ?4 AND sort_order IS ?5",
        )?;
        let mut insert = tx.prepare_cached(
            "INSERT INTO file_relations (file_id, owner_id, owner_type, field, sort_order) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for rel in rows {
            // The dump may reference a target id directly (row written
            // after the re-upload); keep those as-is.
            let file_id = match id_map.get(&rel.file_id) {
                Some(target_id) => *target_id,
                None if known_targets.contains(&rel.file_id) => rel.file_id,
                None => {
                    outcome.skipped_unmatched += 1;
                    continue;
                }
            };
            let duplicates: i64 = tuple_exists.query_row(
                params![file_id, rel.owner_id, rel.owner_type, rel.field, rel.sort_order],
                |row| row.get(0),
            )?;
            if duplicates > 0 {
                outcome.skipped_duplicates += 1;
                continue;
            }
            insert.execute(params![
                file_id,
                rel.owner_id,
                rel.owner_type,
                rel.field,
                rel.sort_order,
            ])?;
            outcome.inserted += 1;
        }
    }
    if apply {
        tx.commit()?;
    } else {
        tx.rollback()?;
    }
    Ok(outcome)
}
