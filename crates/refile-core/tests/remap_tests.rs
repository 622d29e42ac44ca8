use refile_core::matcher::{MatchPlan, MatchResult, MatchStrategy};
use refile_core::storage::models::{FileRecord, RelationRecord};
use refile_core::storage::Database;
use refile_core::{cleanup, remap};

fn file(id: i64, name: &str, hash: Option<&str>) -> FileRecord {
    FileRecord {
        id,
        name: name.to_string(),
        hash: hash.map(|h| h.to_string()),
        url: format!("/uploads/{name}"),
        created_at: "2025-11-12 08:00:00".to_string(),
    }
}

fn relation(file_id: i64, owner_id: i64, field: &str, sort_order: Option<i64>) -> RelationRecord {
    RelationRecord {
        id: 0,
        file_id,
        owner_id,
        owner_type: "recipe".to_string(),
        field: field.to_string(),
        sort_order,
    }
}

fn exact(source_id: i64, target_id: i64) -> MatchResult {
    MatchResult {
        source_id,
        target_id,
        strategy: MatchStrategy::ExactHash,
        ambiguous: false,
    }
}

fn plan_of(matches: Vec<MatchResult>) -> MatchPlan {
    MatchPlan {
        matches,
        unmatched_source_ids: vec![],
    }
}

#[test]
fn test_remap_updates_relation_in_place() {
    let db = Database::open_in_memory().unwrap();
    db.insert_files(&[
        file(1, "cake.png", Some("abc")),
        file(101, "cake_9f8e7d6c5b.png", Some("abc")),
    ])
    .unwrap();
    db.insert_relations(&[relation(1, 50, "featuredImage", None)])
        .unwrap();

    let outcome = remap(&db, &[exact(1, 101)], true).unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.skipped_duplicates, 0);

    assert_eq!(db.relations_for_file(1).unwrap().len(), 0);
    let moved = db.relations_for_file(101).unwrap();
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].owner_id, 50);
    assert_eq!(moved[0].field, "featuredImage");
    assert_eq!(moved[0].sort_order, None);
}

#[test]
fn test_remap_drops_row_that_would_duplicate_existing() {
    let db = Database::open_in_memory().unwrap();
    db.insert_files(&[
        file(1, "cake.png", Some("abc")),
        file(101, "cake_9f8e7d6c5b.png", Some("abc")),
    ])
    .unwrap();
    // Target row already exists with a NULL sort_order — the `IS`
    // comparison must treat the substituted tuple as a duplicate.
    db.insert_relations(&[
        relation(1, 50, "featuredImage", None),
        relation(101, 50, "featuredImage", None),
    ])
    .unwrap();

    let outcome = remap(&db, &[exact(1, 101)], true).unwrap();
    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.skipped_duplicates, 1);

    assert_eq!(db.relations_for_file(1).unwrap().len(), 0);
    assert_eq!(db.relations_for_file(101).unwrap().len(), 1);
}

#[test]
fn test_distinct_sort_orders_are_not_duplicates() {
    let db = Database::open_in_memory().unwrap();
    db.insert_files(&[file(1, "a.png", Some("h1")), file(101, "a2.png", Some("h1"))])
        .unwrap();
    db.insert_relations(&[
        relation(1, 50, "gallery", Some(0)),
        relation(101, 50, "gallery", Some(1)),
    ])
    .unwrap();

    let outcome = remap(&db, &[exact(1, 101)], true).unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.skipped_duplicates, 0);
    assert_eq!(db.relations_for_file(101).unwrap().len(), 2);
}

#[test]
fn test_no_duplicate_tuples_after_remap() {
    let db = Database::open_in_memory().unwrap();
    db.insert_files(&[
        file(1, "a.png", Some("h1")),
        file(2, "b.png", Some("h1")),
        file(101, "ab.png", Some("h1")),
    ])
    .unwrap();
    // Two source rows that collapse to the same tuple once both point
    // at 101: the second must be dropped, not inserted.
    db.insert_relations(&[
        relation(1, 50, "featuredImage", None),
        relation(2, 50, "featuredImage", None),
    ])
    .unwrap();

    let outcome = remap(&db, &[exact(1, 101), exact(2, 101)], true).unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.skipped_duplicates, 1);

    let count: i64 = db
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM file_relations \
             WHERE file_id = 101 AND owner_id = 50 AND owner_type = 'recipe' \
               AND field = 'featuredImage' AND sort_order IS NULL",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_remap_is_idempotent() {
    let db = Database::open_in_memory().unwrap();
    db.insert_files(&[file(1, "a.png", Some("h1")), file(101, "a2.png", Some("h1"))])
        .unwrap();
    db.insert_relations(&[
        relation(1, 50, "featuredImage", None),
        relation(1, 51, "gallery", Some(0)),
    ])
    .unwrap();

    let matches = [exact(1, 101)];
    let first = remap(&db, &matches, true).unwrap();
    assert_eq!(first.updated, 2);

    let second = remap(&db, &matches, true).unwrap();
    assert_eq!(second.updated, 0);
    assert_eq!(second.skipped_duplicates, 0);
    assert_eq!(db.relation_count().unwrap(), 2);
}

#[test]
fn test_dry_run_reports_apply_counts_without_mutating() {
    let db = Database::open_in_memory().unwrap();
    db.insert_files(&[file(1, "a.png", Some("h1")), file(101, "a2.png", Some("h1"))])
        .unwrap();
    db.insert_relations(&[
        relation(1, 50, "featuredImage", None),
        relation(101, 50, "featuredImage", None),
        relation(1, 51, "gallery", Some(2)),
    ])
    .unwrap();

    let matches = [exact(1, 101)];
    let dry = remap(&db, &matches, false).unwrap();
    // Store untouched
    assert_eq!(db.relations_for_file(1).unwrap().len(), 2);
    assert_eq!(db.relation_count().unwrap(), 3);

    let applied = remap(&db, &matches, true).unwrap();
    assert_eq!(dry, applied);
    assert_eq!(applied.updated, 1);
    assert_eq!(applied.skipped_duplicates, 1);
}

#[test]
fn test_cleanup_refuses_still_referenced_files() {
    let db = Database::open_in_memory().unwrap();
    db.insert_files(&[file(1, "a.png", Some("h1")), file(101, "a2.png", Some("h1"))])
        .unwrap();
    db.insert_relations(&[relation(1, 50, "featuredImage", None)])
        .unwrap();

    // Remap never ran, so file 1 is still referenced
    let plan = plan_of(vec![exact(1, 101)]);
    let outcome = cleanup(&db, &plan, true).unwrap();
    assert_eq!(outcome.deleted, 0);
    assert_eq!(outcome.refused.len(), 1);
    assert_eq!(outcome.refused[0].file_id, 1);
    assert_eq!(outcome.refused[0].remaining_relations, 1);
    assert_eq!(db.file_count().unwrap(), 2);
}

#[test]
fn test_cleanup_deletes_only_matched_unreferenced_sources() {
    let db = Database::open_in_memory().unwrap();
    db.insert_files(&[
        file(1, "a.png", Some("h1")),
        file(3, "never-matched.png", None),
        file(101, "a2.png", Some("h1")),
    ])
    .unwrap();
    db.insert_relations(&[relation(1, 50, "featuredImage", None)])
        .unwrap();

    let plan = plan_of(vec![exact(1, 101)]);
    remap(&db, &plan.matches, true).unwrap();

    let outcome = cleanup(&db, &plan, true).unwrap();
    assert_eq!(outcome.deleted, 1);
    assert!(outcome.refused.is_empty());

    // File 3 was never matched, so it survives even though nothing
    // references it
    let remaining = db.all_files().unwrap();
    let ids: Vec<i64> = remaining.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![3, 101]);
}

#[test]
fn test_cleanup_dry_run_deletes_nothing() {
    let db = Database::open_in_memory().unwrap();
    db.insert_files(&[file(1, "a.png", Some("h1")), file(101, "a2.png", Some("h1"))])
        .unwrap();

    let plan = plan_of(vec![exact(1, 101)]);
    let outcome = cleanup(&db, &plan, false).unwrap();
    assert_eq!(outcome.deleted, 1); // planned, not executed
    assert_eq!(db.file_count().unwrap(), 2);
}
