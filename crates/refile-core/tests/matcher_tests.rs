use refile_core::matcher::{match_files, MatchStrategy};
use refile_core::storage::models::FileRecord;

fn file(id: i64, name: &str, hash: Option<&str>) -> FileRecord {
    FileRecord {
        id,
        name: name.to_string(),
        hash: hash.map(|h| h.to_string()),
        url: format!("/uploads/{name}"),
        created_at: "2025-11-12 08:00:00".to_string(),
    }
}

#[test]
fn test_exact_hash_wins_regardless_of_name() {
    let sources = vec![file(1, "cake.png", Some("abc"))];
    let targets = vec![
        file(101, "cake_9f8e7d6c5b.png", Some("abc")),
        // Same normalized name, different hash — must lose to the hash match
        file(102, "cake.png", Some("zzz")),
    ];
    let plan = match_files(&sources, &targets);
    assert_eq!(plan.matches.len(), 1);
    assert_eq!(plan.matches[0].source_id, 1);
    assert_eq!(plan.matches[0].target_id, 101);
    assert_eq!(plan.matches[0].strategy, MatchStrategy::ExactHash);
    assert!(plan.unmatched_source_ids.is_empty());
}

#[test]
fn test_name_fallback_when_hash_absent() {
    // No hash available, but a target shares the normalized name
    let sources = vec![file(2, "sketch.jpg", None)];
    let targets = vec![file(102, "sketch.jpg", Some("qqq"))];
    let plan = match_files(&sources, &targets);
    assert_eq!(plan.matches.len(), 1);
    assert_eq!(plan.matches[0].target_id, 102);
    assert_eq!(plan.matches[0].strategy, MatchStrategy::NormalizedName);
}

#[test]
fn test_name_fallback_when_hash_matches_nothing() {
    // Re-encoded content: hash differs, name still matches
    let sources = vec![file(3, "banner.png", Some("old-encoding"))];
    let targets = vec![file(103, "banner_0a13eb69d3.png", Some("new-encoding"))];
    let plan = match_files(&sources, &targets);
    assert_eq!(plan.matches.len(), 1);
    assert_eq!(plan.matches[0].target_id, 103);
    assert_eq!(plan.matches[0].strategy, MatchStrategy::NormalizedName);
}

#[test]
fn test_unmatched_source_is_reported_not_an_error() {
    let sources = vec![file(3, "never-uploaded.png", None)];
    let targets = vec![file(103, "unrelated.png", Some("abc"))];
    let plan = match_files(&sources, &targets);
    assert!(plan.matches.is_empty());
    assert_eq!(plan.unmatched_source_ids, vec![3]);
}

#[test]
fn test_tie_breaks_to_lowest_target_id_and_flags_ambiguity() {
    let sources = vec![file(1, "cake.png", Some("abc"))];
    let targets = vec![
        file(105, "cake_copy.png", Some("abc")),
        file(101, "cake.png", Some("abc")),
        file(103, "cake_again.png", Some("abc")),
    ];
    let plan = match_files(&sources, &targets);
    assert_eq!(plan.matches[0].target_id, 101);
    assert!(plan.matches[0].ambiguous);
    assert_eq!(plan.ambiguous_count(), 1);

    // Order-independence of the tie-break
    let mut reversed = targets.clone();
    reversed.reverse();
    let plan2 = match_files(&sources, &reversed);
    assert_eq!(plan2.matches[0].target_id, 101);
}

#[test]
fn test_many_sources_may_share_one_target() {
    let sources = vec![
        file(1, "logo.png", Some("abc")),
        file(2, "logo-old.png", Some("abc")),
    ];
    let targets = vec![file(101, "logo.png", Some("abc"))];
    let plan = match_files(&sources, &targets);
    assert_eq!(plan.matches.len(), 2);
    assert!(plan.matches.iter().all(|m| m.target_id == 101));
    assert_eq!(plan.matched_source_ids(), vec![1, 2]);
}

#[test]
fn test_empty_hash_treated_as_absent() {
    let sources = vec![file(1, "a.png", Some(""))];
    let targets = vec![file(101, "b.png", Some(""))];
    let plan = match_files(&sources, &targets);
    // Empty hashes must not match each other
    assert!(plan.matches.is_empty());
    assert_eq!(plan.unmatched_source_ids, vec![1]);
}

#[test]
fn test_empty_name_key_matches_nothing() {
    let sources = vec![file(1, "!!!.png", None)];
    let targets = vec![file(101, "???.png", None)];
    let plan = match_files(&sources, &targets);
    assert!(plan.matches.is_empty());
}
