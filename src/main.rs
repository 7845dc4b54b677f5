#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use mcp_inject::{
    app_config::AppConfig,
    classify,
    cli::{AddArgs, Cli, Commands},
    writer::SaveReport,
    ConfigWriter, MergeStrategy, ServerEntry,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(cli.debug, cli.trace);

    match cli.command {
        Commands::Add(args) => run_add(args),
        Commands::Classify { path } => run_classify(&path),
        Commands::Apply { config, dry_run } => run_apply(config, dry_run),
    }
}

/// Initialize tracing with the specified debug/trace flags
fn initialize_tracing(debug: bool, trace: bool) {
    let log_level = if trace {
        Level::TRACE
    } else if debug {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::builder().with_default_directive(log_level.into()).from_env_lossy())
        .init();
}

fn run_add(args: AddArgs) -> Result<()> {
    let entry = ServerEntry::new(args.name, args.command).args(args.args).envs(args.env);
    let strategy =
        if args.overwrite { MergeStrategy::Overwrite } else { MergeStrategy::PreserveExisting };

    let writer = ConfigWriter::new(&args.path)
        .config_key(args.key)
        .strategy(strategy)
        .backup(args.backup)
        .add_server(entry);

    if args.dry_run {
        info!("Dry run mode - not writing changes");
        let outcome = writer.preview()?;
        print!("{}", outcome.document);
        if !outcome.document.ends_with('\n') {
            println!();
        }
        return Ok(());
    }

    let report = writer.try_save()?;
    print_report(&args.path, &report);
    Ok(())
}

fn run_classify(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    println!("{}", classify(&content));
    Ok(())
}

fn run_apply(config_path: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from(&path)?,
        None => {
            let path = AppConfig::config_path()?;
            AppConfig::load()?.with_context(|| {
                format!("No configuration file found at {}", path.display())
            })?
        },
    };

    if dry_run {
        info!("Dry run mode - not writing changes");
    }

    let mut failures = 0usize;
    for target in config.apply(dry_run) {
        match target.result {
            Ok(report) if dry_run => {
                println!("=== {} ({}) ===", target.path.display(), report.outcome.mode);
                print!("{}", report.outcome.document);
                if !report.outcome.document.ends_with('\n') {
                    println!();
                }
            },
            Ok(report) => print_report(&target.path, &report),
            Err(e) => {
                error!("{}: {e:#}", target.path.display());
                failures = failures.saturating_add(1);
            },
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} target(s) could not be updated");
    }
    Ok(())
}

fn print_report(path: &Path, report: &SaveReport) {
    let outcome = &report.outcome;
    debug!(
        "{}: added {:?}, updated {:?}, skipped {:?}",
        path.display(),
        outcome.added,
        outcome.updated,
        outcome.skipped
    );

    if report.written {
        println!(
            "Updated {} ({} added, {} replaced, {} already present)",
            path.display(),
            outcome.added.len(),
            outcome.updated.len(),
            outcome.skipped.len()
        );
    } else {
        println!("{} is already up to date", path.display());
    }
    if let Some(ref backup) = report.backup_path {
        println!("Backup saved to {backup}");
    }
}
