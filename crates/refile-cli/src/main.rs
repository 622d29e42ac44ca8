mod commands;
mod logging;

use std::collections::HashMap;
use std::io::{self, Write};
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, OriginArg};
use dotenv::dotenv;
use refile_core::{Error, ReconcileEngine};
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match refile_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();
    let engine = ReconcileEngine::new(config);

    let code = match args.command {
        Some(Commands::Inventory { origin }) => run_inventory(&engine, origin),
        Some(Commands::Match { json }) => run_match(&engine, json),
        Some(Commands::Remap { apply }) => run_remap(&engine, apply),
        Some(Commands::Cleanup { apply }) => run_cleanup(&engine, apply),
        Some(Commands::Restore { apply }) => run_restore(&engine, apply),
        Some(Commands::Check) => run_check(&engine),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", engine.config());
            0
        }
        None => {
            let _ = Cli::command().print_long_help();
            0
        }
    };
    process::exit(code);
}

fn run_inventory(engine: &ReconcileEngine, origin: Option<OriginArg>) -> i32 {
    let result = (|| -> Result<(), Error> {
        let db = engine.open_store()?;
        let (inv, skipped) = engine.load_inventory(&db)?;

        // Flag target hashes uploaded more than once
        let mut hash_counts: HashMap<&str, usize> = HashMap::new();
        for target in &inv.targets {
            if let Some(hash) = target.hash.as_deref().filter(|h| !h.is_empty()) {
                *hash_counts.entry(hash).or_default() += 1;
            }
        }

        if !matches!(origin, Some(OriginArg::Target)) {
            println!("{}", format!("source files ({}):", inv.sources.len()).yellow());
            for file in &inv.sources {
                println!("  {:>6}  {}  {}", file.id, file.name, file.url.dimmed());
            }
        }
        if !matches!(origin, Some(OriginArg::Source)) {
            println!("{}", format!("target files ({}):", inv.targets.len()).green());
            for file in &inv.targets {
                let dupe = file
                    .hash
                    .as_deref()
                    .is_some_and(|h| hash_counts.get(h).copied().unwrap_or(0) > 1);
                if dupe {
                    println!("  {:>6}  {}  {}", file.id, file.name, "duplicate hash".red());
                } else {
                    println!("  {:>6}  {}", file.id, file.name);
                }
            }
        }
        if skipped > 0 {
            println!("{}", format!("{} malformed backup rows skipped", skipped).yellow());
        }
        Ok(())
    })();

    match result {
        Ok(()) => 0,
        Err(err) => {
            error!("Error: {}", err);
            1
        }
    }
}

fn run_match(engine: &ReconcileEngine, json: bool) -> i32 {
    let result = (|| -> Result<(), Error> {
        let db = engine.open_store()?;
        let plan = engine.plan(&db)?;

        if json {
            match serde_json::to_string_pretty(&plan) {
                Ok(out) => println!("{}", out),
                Err(err) => error!("Error serializing plan: {}", err),
            }
            return Ok(());
        }

        for m in &plan.matches {
            let note = if m.ambiguous {
                "  (ambiguous tie, lowest id chosen)".yellow().to_string()
            } else {
                String::new()
            };
            println!(
                "  {:>6} → {:<6}  [{}]{}",
                m.source_id,
                m.target_id,
                m.strategy.to_string().cyan(),
                note
            );
        }
        println!(
            "\n{} matched, {} unmatched",
            plan.matches.len().to_string().green(),
            plan.unmatched_source_ids.len().to_string().red()
        );
        if !plan.unmatched_source_ids.is_empty() {
            println!(
                "{} {:?}",
                "unmatched source ids:".red(),
                plan.unmatched_source_ids
            );
        }
        Ok(())
    })();

    match result {
        Ok(()) => 0,
        Err(err) => {
            error!("Error: {}", err);
            1
        }
    }
}

fn run_remap(engine: &ReconcileEngine, apply: bool) -> i32 {
    let result = (|| -> Result<(), Error> {
        let db = engine.open_store()?;
        let run = engine.run(&db, apply)?;

        info!(
            "Inventory: {}, Match: {}, Remap: {}",
            format!("{:.2}s", run.inventory_duration.as_secs_f64()).green(),
            format!("{:.2}s", run.match_duration.as_secs_f64()).green(),
            format!("{:.2}s", run.remap_duration.as_secs_f64()).green(),
        );

        let report = &run.report;
        println!(
            "{} of {} sources matched ({} exact, {} name, {} ambiguous)",
            report.matched.to_string().green(),
            run.source_count,
            report.exact_matches,
            report.name_matches,
            report.ambiguous,
        );
        println!(
            "relation rows updated: {}, duplicates dropped: {}",
            report.updated.to_string().green(),
            report.skipped_duplicates.to_string().yellow(),
        );
        if !report.unmatched_source_ids.is_empty() {
            println!(
                "{} {:?}",
                "unmatched source ids:".red(),
                report.unmatched_source_ids
            );
        }
        if report.orphaned_relations > 0 {
            println!(
                "{}",
                format!(
                    "{} relation rows reference a missing file",
                    report.orphaned_relations
                )
                .red()
            );
        }
        if !apply {
            println!("{}", "dry run — re-run with --apply to commit".yellow());
        }
        Ok(())
    })();

    match result {
        Ok(()) => 0,
        Err(err) => {
            error!("Error: {}", err);
            1
        }
    }
}

fn run_cleanup(engine: &ReconcileEngine, apply: bool) -> i32 {
    if apply {
        match prompt_confirm(
            "Delete all superseded source file records from the store?",
            Some(false),
        ) {
            Ok(true) => {}
            _ => return 0,
        }
    }

    let result = (|| -> Result<refile_core::CleanupOutcome, Error> {
        let db = engine.open_store()?;
        let plan = engine.plan(&db)?;
        refile_core::cleanup(&db, &plan, apply)
    })();

    match result {
        Ok(outcome) => {
            if apply {
                println!("deleted {} file records", outcome.deleted.to_string().green());
            } else {
                println!(
                    "would delete {} file records {}",
                    outcome.deleted.to_string().green(),
                    "(dry run — re-run with --apply)".yellow()
                );
            }
            if outcome.refused.is_empty() {
                0
            } else {
                for refusal in &outcome.refused {
                    println!(
                        "{}",
                        format!(
                            "refused file {}: {} relation rows still reference it",
                            refusal.file_id, refusal.remaining_relations
                        )
                        .red()
                    );
                }
                1
            }
        }
        Err(err) => {
            error!("Error: {}", err);
            1
        }
    }
}

fn run_restore(engine: &ReconcileEngine, apply: bool) -> i32 {
    let result = (|| -> Result<(), Error> {
        let db = engine.open_store()?;
        let outcome = engine.restore(&db, apply)?;
        println!(
            "inserted: {}, duplicates skipped: {}, unmatched skipped: {}",
            outcome.inserted.to_string().green(),
            outcome.skipped_duplicates.to_string().yellow(),
            outcome.skipped_unmatched.to_string().red(),
        );
        if !apply {
            println!("{}", "dry run — re-run with --apply to commit".yellow());
        }
        Ok(())
    })();

    match result {
        Ok(()) => 0,
        Err(err) => {
            error!("Error: {}", err);
            1
        }
    }
}

fn run_check(engine: &ReconcileEngine) -> i32 {
    let result = (|| -> Result<i64, Error> {
        let db = engine.open_store()?;
        let (inv, _) = engine.load_inventory(&db)?;
        println!("files: {}", db.file_count()?);
        println!("  source: {}", inv.sources.len());
        println!("  target: {}", inv.targets.len());
        println!("relations: {}", db.relation_count()?);
        let orphans = db.orphaned_relation_count()?;
        if orphans > 0 {
            println!(
                "{}",
                format!("orphaned relations: {}", orphans).red()
            );
        } else {
            println!("orphaned relations: {}", "0".green());
        }
        Ok(orphans)
    })();

    match result {
        Ok(_) => 0,
        Err(err) => {
            error!("Error: {}", err);
            1
        }
    }
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
