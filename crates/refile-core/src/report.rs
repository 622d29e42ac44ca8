use crate::error::Error;
use crate::matcher::{MatchPlan, MatchStrategy};
use crate::remap::RemapOutcome;
use crate::storage::Database;
use rusqlite::params;
use serde::Serialize;
use tracing::{info, warn};

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub matched: usize,
    pub exact_matches: usize,
    pub name_matches: usize,
    pub ambiguous: usize,
    pub unmatched_source_ids: Vec<i64>,
    pub updated: usize,
    pub skipped_duplicates: usize,
    /// Relation rows still pointing at a file id absent from the store.
    pub orphaned_relations: i64,
}

pub fn build_report(
    db: &Database,
    plan: &MatchPlan,
    outcome: &RemapOutcome,
) -> Result<ReconcileReport, Error> {
    Ok(ReconcileReport {
        matched: plan.matches.len(),
        exact_matches: plan
            .matches
            .iter()
            .filter(|m| m.strategy == MatchStrategy::ExactHash)
            .count(),
        name_matches: plan
            .matches
            .iter()
            .filter(|m| m.strategy == MatchStrategy::NormalizedName)
            .count(),
        ambiguous: plan.ambiguous_count(),
        unmatched_source_ids: plan.unmatched_source_ids.clone(),
        updated: outcome.updated,
        skipped_duplicates: outcome.skipped_duplicates,
        orphaned_relations: db.orphaned_relation_count()?,
    })
}

/// A file id that cleanup refused to delete because relation rows still
/// reference it.
#[derive(Debug, Clone, Serialize)]
pub struct Refusal {
    pub file_id: i64,
    pub remaining_relations: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupOutcome {
    pub deleted: usize,
    pub refused: Vec<Refusal>,
}

/// Delete superseded source file records. Only ids that appear as a
/// matched source are ever eligible; unmatched sources are never deleted.
/// Any eligible id still referenced by a relation row is refused (and
/// reported), the rest proceed. Runs as its own transaction, strictly
/// after remap has committed, so a failure here cannot corrupt
/// relationship state.
pub fn cleanup(db: &Database, plan: &MatchPlan, apply: bool) -> Result<CleanupOutcome, Error> {
    let mut outcome = CleanupOutcome::default();
    let mut eligible: Vec<i64> = Vec::new();

    {
        let mut refs = db
            .connection()
            .prepare_cached("SELECT COUNT(*) FROM file_relations WHERE file_id = ?1")?;
        for file_id in plan.matched_source_ids() {
            let remaining: i64 = refs.query_row(params![file_id], |row| row.get(0))?;
            if remaining > 0 {
                warn!(
                    "Refusing to delete file {}: {} relation rows still reference it",
                    file_id, remaining
                );
                outcome.refused.push(Refusal {
                    file_id,
                    remaining_relations: remaining,
                });
            } else {
                eligible.push(file_id);
            }
        }
    }

    if !apply {
        outcome.deleted = eligible.len();
        info!(
            "Dry run: would delete {} superseded file records ({} refused)",
            outcome.deleted,
            outcome.refused.len()
        );
        return Ok(outcome);
    }

    if !eligible.is_empty() {
        let tx = db.connection().unchecked_transaction()?;
        {
            let mut delete = tx.prepare_cached("DELETE FROM files WHERE id = ?1")?;
            for file_id in &eligible {
                outcome.deleted += delete.execute(params![file_id])?;
            }
        }
        tx.commit()?;
    }
    info!(
        "Deleted {} superseded file records ({} refused)",
        outcome.deleted,
        outcome.refused.len()
    );
    Ok(outcome)
}
