use super::models::*;
use super::sqlite::Database;
use rusqlite::{params, Result};
use tracing::debug;

impl Database {
    // ── Files ────────────────────────────────────────────────────

    pub fn insert_files(&self, files: &[FileRecord]) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO files (id, name, hash, url, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(id) DO UPDATE SET \
                     name = excluded.name, \
                     hash = excluded.hash, \
                     url = excluded.url, \
                     created_at = excluded.created_at",
            )?;
            for file in files {
                count += stmt.execute(params![
                    file.id,
                    file.name,
                    file.hash,
                    file.url,
                    file.created_at,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Upserted {} file records", count);
        Ok(count)
    }

    /// All file rows, ordered by id for deterministic downstream matching.
    pub fn all_files(&self) -> Result<Vec<FileRecord>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, name, hash, url, created_at FROM files ORDER BY id",
        )?;
        let files = stmt
            .query_map([], |row| {
                Ok(FileRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    hash: row.get(2)?,
                    url: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(files)
    }

    pub fn file_count(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
    }

    // ── Relations ────────────────────────────────────────────────

    pub fn insert_relations(&self, relations: &[RelationRecord]) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO file_relations \
                 (file_id, owner_id, owner_type, field, sort_order) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for rel in relations {
                count += stmt.execute(params![
                    rel.file_id,
                    rel.owner_id,
                    rel.owner_type,
                    rel.field,
                    rel.sort_order,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Inserted {} relation rows", count);
        Ok(count)
    }

    pub fn relations_for_file(&self, file_id: i64) -> Result<Vec<RelationRecord>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, file_id, owner_id, owner_type, field, sort_order \
             FROM file_relations WHERE file_id = ?1 ORDER BY id",
        )?;
        let relations = stmt
            .query_map(params![file_id], |row| {
                Ok(RelationRecord {
                    id: row.get(0)?,
                    file_id: row.get(1)?,
                    owner_id: row.get(2)?,
                    owner_type: row.get(3)?,
                    field: row.get(4)?,
                    sort_order: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(relations)
    }

    pub fn relation_count(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM file_relations", [], |row| row.get(0))
    }

    /// Relation rows whose file_id resolves to no file row — the state
    /// the whole reconciliation exists to prevent.
    pub fn orphaned_relation_count(&self) -> Result<i64> {
        self.connection().query_row(
            "SELECT COUNT(*) FROM file_relations fr \
             LEFT JOIN files f ON f.id = fr.file_id \
             WHERE f.id IS NULL",
            [],
            |row| row.get(0),
        )
    }
}
