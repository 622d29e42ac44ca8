use serde::Serialize;

/// A row in the `files` table. Identity is stable within one store;
/// `hash` is stable for byte-identical content but may differ after
/// re-encoding, which is why name-based fallback matching exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
    pub hash: Option<String>,
    pub url: String,
    pub created_at: String,
}

/// A row in the polymorphic `file_relations` join table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationRecord {
    pub id: i64,
    pub file_id: i64,
    pub owner_id: i64,
    pub owner_type: String,
    pub field: String,
    pub sort_order: Option<i64>,
}
