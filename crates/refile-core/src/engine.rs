use crate::backup;
use crate::config::AppConfig;
use crate::error::Error;
use crate::inventory::{self, Inventory, Origin, OriginRule};
use crate::matcher::{self, MatchPlan};
use crate::remap::{self, RemapOutcome, RestoreOutcome};
use crate::report::{self, ReconcileReport};
use crate::storage::Database;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Orchestrates one reconciliation run:
/// inventory -> match -> remap -> (optionally) cleanup.
/// Matching is in-memory over fetched inventories; the remap phase is a
/// single transaction, so a failed run leaves the store untouched.
pub struct ReconcileEngine {
    config: AppConfig,
}

#[derive(Debug)]
pub struct ReconcileResult {
    pub inventory_duration: Duration,
    pub match_duration: Duration,
    pub remap_duration: Duration,
    pub source_count: usize,
    pub target_count: usize,
    pub report: ReconcileReport,
}

impl ReconcileEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn open_store(&self) -> Result<Database, Error> {
        Ok(Database::open(&self.config.db_path)?)
    }

    fn origin_rule(&self) -> OriginRule {
        OriginRule::new(
            self.config.source_url_patterns.clone(),
            self.config.created_cutoff.as_deref(),
        )
    }

    /// Enumerate source and target file records. When a backup path is
    /// configured the source side comes from the dump and the live store
    /// contributes targets only; otherwise both sides come from the live
    /// store, split by the origin rule. Returns the inventory plus the
    /// count of dump rows skipped as malformed.
    pub fn load_inventory(&self, db: &Database) -> Result<(Inventory, usize), Error> {
        let rule = self.origin_rule();
        match &self.config.backup_path {
            Some(path) => {
                let (sources, skipped) = backup::read_file_records(
                    Path::new(path),
                    &self.config.backup_files_table,
                )?;
                let targets = db
                    .all_files()?
                    .into_iter()
                    .filter(|f| rule.classify(f) == Origin::Target)
                    .collect();
                debug!(
                    "Inventory from backup '{}': {} source rows ({} skipped)",
                    path,
                    sources.len(),
                    skipped
                );
                Ok((Inventory { sources, targets }, skipped))
            }
            None => Ok((inventory::split_by_origin(db.all_files()?, &rule), 0)),
        }
    }

    /// Compute the match plan for the current inventories. Read-only.
    pub fn plan(&self, db: &Database) -> Result<MatchPlan, Error> {
        let (inv, _) = self.load_inventory(db)?;
        let plan = matcher::match_files(&inv.sources, &inv.targets);
        debug!(
            "Matched {} of {} sources against {} targets",
            plan.matches.len(),
            inv.sources.len(),
            inv.targets.len()
        );
        Ok(plan)
    }

    /// Run the full pipeline: inventory, match, remap, report.
    /// Cleanup stays a separate explicit call (`report::cleanup`).
    pub fn run(&self, db: &Database, apply: bool) -> Result<ReconcileResult, Error> {
        info!("Starting reconciliation run (apply: {})", apply);

        let inventory_start = Instant::now();
        let (inv, skipped) = self.load_inventory(db)?;
        let inventory_duration = inventory_start.elapsed();
        if skipped > 0 {
            info!("{} malformed backup rows skipped during inventory", skipped);
        }

        let match_start = Instant::now();
        let plan = matcher::match_files(&inv.sources, &inv.targets);
        let match_duration = match_start.elapsed();

        let remap_start = Instant::now();
        let outcome = remap::remap(db, &plan.matches, apply)?;
        let remap_duration = remap_start.elapsed();

        let report = report::build_report(db, &plan, &outcome)?;
        Ok(ReconcileResult {
            inventory_duration,
            match_duration,
            remap_duration,
            source_count: inv.sources.len(),
            target_count: inv.targets.len(),
            report,
        })
    }

    /// Re-insert relation rows from the configured backup dump, remapped
    /// through a fresh match plan.
    pub fn restore(&self, db: &Database, apply: bool) -> Result<RestoreOutcome, Error> {
        let Some(path) = self.config.backup_path.as_deref() else {
            return Err(Error::Backup(
                "restore requires backup_path to be configured".to_string(),
            ));
        };
        let (rows, skipped) = backup::read_relation_records(
            Path::new(path),
            &self.config.backup_relations_table,
        )?;
        if skipped > 0 {
            info!("{} malformed backup relation rows skipped", skipped);
        }
        let plan = self.plan(db)?;
        remap::restore_relations(db, &plan.id_map(), &rows, apply)
    }
}
