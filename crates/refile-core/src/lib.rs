pub mod backup;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod matcher;
pub mod normalize;
pub mod remap;
pub mod report;
pub mod storage;

pub use config::AppConfig;
pub use engine::{ReconcileEngine, ReconcileResult};
pub use error::Error;
pub use inventory::{Origin, OriginRule};
pub use matcher::{match_files, MatchPlan, MatchResult, MatchStrategy};
pub use remap::{remap, restore_relations, RemapOutcome, RestoreOutcome};
pub use report::{build_report, cleanup, CleanupOutcome, ReconcileReport};
