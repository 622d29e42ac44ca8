use crate::normalize::normalize;
use crate::storage::models::FileRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Identical non-null content hash. Highest confidence.
    ExactHash,
    /// Equal normalized filenames. Fallback for re-encoded content.
    NormalizedName,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::ExactHash => write!(f, "exact_hash"),
            MatchStrategy::NormalizedName => write!(f, "normalized_name"),
        }
    }
}

/// One source→target correspondence. Transient: produced fresh each run,
/// consumed by the remapper, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub source_id: i64,
    pub target_id: i64,
    pub strategy: MatchStrategy,
    /// Several targets tied at this strategy; the lowest id won.
    pub ambiguous: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchPlan {
    pub matches: Vec<MatchResult>,
    pub unmatched_source_ids: Vec<i64>,
}

impl MatchPlan {
    pub fn id_map(&self) -> HashMap<i64, i64> {
        self.matches
            .iter()
            .map(|m| (m.source_id, m.target_id))
            .collect()
    }

    /// Sorted, deduplicated source ids that found a target — the only
    /// ids ever eligible for cleanup.
    pub fn matched_source_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.matches.iter().map(|m| m.source_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn ambiguous_count(&self) -> usize {
        self.matches.iter().filter(|m| m.ambiguous).count()
    }
}

/// Best-effort correspondence from each source file to at most one
/// target file. Strategy order per source: exact hash, then normalized
/// name. Ties break to the lowest target id so the result is
/// independent of inventory iteration order. A target may back several
/// sources (two old uploads deduplicating onto one re-upload is
/// expected); a source with no candidate is listed as unmatched.
pub fn match_files(sources: &[FileRecord], targets: &[FileRecord]) -> MatchPlan {
    let mut by_hash: HashMap<&str, Vec<&FileRecord>> = HashMap::new();
    let mut by_name_key: HashMap<String, Vec<&FileRecord>> = HashMap::new();
    for target in targets {
        if let Some(hash) = present(target.hash.as_deref()) {
            by_hash.entry(hash).or_default().push(target);
        }
        let key = normalize(&target.name);
        if !key.is_empty() {
            by_name_key.entry(key).or_default().push(target);
        }
    }

    let mut plan = MatchPlan::default();
    for source in sources {
        let hash_candidates = present(source.hash.as_deref()).and_then(|h| by_hash.get(h));
        let (candidates, strategy) = match hash_candidates {
            Some(c) => (c, MatchStrategy::ExactHash),
            None => {
                let key = normalize(&source.name);
                match by_name_key.get(&key).filter(|_| !key.is_empty()) {
                    Some(c) => (c, MatchStrategy::NormalizedName),
                    None => {
                        plan.unmatched_source_ids.push(source.id);
                        continue;
                    }
                }
            }
        };

        let Some(target_id) = candidates.iter().map(|t| t.id).min() else {
            plan.unmatched_source_ids.push(source.id);
            continue;
        };
        plan.matches.push(MatchResult {
            source_id: source.id,
            target_id,
            strategy,
            ambiguous: candidates.len() > 1,
        });
    }
    plan
}

/// Empty-string hashes are treated the same as absent ones.
fn present(hash: Option<&str>) -> Option<&str> {
    hash.filter(|h| !h.is_empty())
}
