use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "refile")]
#[command(about = "Reconcile re-uploaded file records and repair their relationships", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List file records with their inferred storage origin
    Inventory {
        /// Only show records from one origin
        #[arg(long, value_enum)]
        origin: Option<OriginArg>,
    },
    /// Compute and print the match plan (read-only)
    Match {
        /// Emit the plan as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Rewrite relation rows from matched source files to their targets
    Remap {
        /// Execute the transaction instead of printing a dry run
        #[arg(long)]
        apply: bool,
    },
    /// Delete superseded source file records (matched sources only)
    Cleanup {
        /// Execute the deletion instead of printing a dry run
        #[arg(long)]
        apply: bool,
    },
    /// Re-insert relation rows from the configured backup dump, remapped
    Restore {
        /// Execute the insertion instead of printing a dry run
        #[arg(long)]
        apply: bool,
    },
    /// Print store health counters (files, relations, orphans)
    Check,
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OriginArg {
    Source,
    Target,
}
