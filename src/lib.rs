//! neardup - near-duplicate text document finder
//!
//! Documents are turned into one of four representations (SimHash
//! fingerprint, word shingle set, raw text or TF-IDF vector), compared with
//! the matching metric and greedily clustered: the first document of every
//! group of near-duplicates is kept as its representative, the rest are
//! reported or removed.
//!
//! ```
//! use neardup::corpus::Corpus;
//! use neardup::engine::{DedupConfig, Deduplicator};
//! use neardup::metric::MetricKind;
//!
//! let corpus = Corpus::from_texts([
//!     "the quick brown fox jumps over the lazy dog",
//!     "the quick brown fox jumps over the lazy dog",
//!     "an entirely different sentence about something else",
//! ]);
//! let dedup = Deduplicator::new(DedupConfig::new(MetricKind::Levenshtein));
//! let (result, _summary) = dedup.run(&corpus).unwrap();
//! assert_eq!(result.representatives.len(), 2);
//! assert_eq!(result.duplicate_pairs.len(), 1);
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metric;
pub mod output;
pub mod progress;
pub mod representation;
pub mod signal;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use yansi::Paint;

use crate::actions::{delete_batch, ActionMode, DeletionPlan, NoDeleteProgress, Report};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::corpus::{unique_paths, DirectorySource};
use crate::engine::{DedupSummary, Deduplicator, EngineError};
use crate::error::ExitCode;
use crate::metric::SimilarityScore;
use crate::progress::{Progress, ProgressCallback};

/// Run the command line application.
///
/// # Errors
///
/// Returns an error for invalid configuration, unreadable directories,
/// engine failures, interruption, and refused or failed actions.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let handler = signal::install_handler().context("Failed to install Ctrl+C handler")?;

    let mut config = Config::load(cli.config.as_deref(), cli.profile.as_deref());
    config.merge_cli(&cli);
    let args = cli.command.args();
    config.merge_run_args(args);
    config.validate().context("Invalid configuration")?;
    log::debug!("Effective configuration: {config:?}");

    if let Some(ref path) = cli.save_config {
        config
            .save(path)
            .with_context(|| format!("Failed to save configuration to {}", path.display()))?;
        log::info!("Saved configuration to {}", path.display());
    }

    let paths = collect_paths(&args.paths, &config, handler.get_flag())?;
    if paths.is_empty() {
        log::warn!("No documents to compare");
    }

    let progress: Arc<dyn ProgressCallback> =
        Arc::new(Progress::with_accessible(cli.quiet, config.accessible));
    let dedup = Deduplicator::new(
        config
            .dedup_config()
            .with_shutdown_flag(handler.get_flag())
            .with_progress_callback(progress),
    );

    match &cli.command {
        Commands::Dedup(_) => run_dedup(&dedup, &paths, &config, args.yes, &handler, cli.quiet),
        Commands::Pairs(_) => run_pairs(&dedup, &paths, &config, cli.quiet),
    }
}

/// Expand directories into their sorted document lists; files keep their place.
///
/// A file reached twice (overlapping directories, `..` or symlinks) is kept
/// once, at its first position.
fn collect_paths(
    inputs: &[PathBuf],
    config: &Config,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let listed = DirectorySource::new(input, config.source_config())
                .with_shutdown_flag(shutdown_flag.clone())
                .list()
                .map_err(EngineError::from)
                .with_context(|| format!("Failed to list {}", input.display()))?;
            log::debug!("{}: {} document(s)", input.display(), listed.len());
            paths.extend(listed);
        } else {
            paths.push(input.clone());
        }
    }

    let total = paths.len();
    let paths = unique_paths(paths);
    if paths.len() < total {
        log::info!(
            "Ignoring {} path(s) that name an already listed file",
            total - paths.len()
        );
    }
    Ok(paths)
}

fn run_dedup(
    dedup: &Deduplicator,
    paths: &[PathBuf],
    config: &Config,
    confirmed: bool,
    handler: &signal::ShutdownHandler,
    quiet: bool,
) -> Result<ExitCode> {
    let (result, summary) = dedup.run_paths(paths).context("Deduplication failed")?;
    let mut exit_code = ExitCode::for_outcome(result.has_duplicates(), summary.has_skipped());

    match config.action {
        ActionMode::Report => {
            write_report(&Report::for_clusters(&result, &summary, exit_code), config)?;
        }
        ActionMode::Delete => {
            if !config.dry_run && !confirmed {
                bail!("Refusing to delete duplicates without --yes (use --dry-run to preview)");
            }
            if handler.is_shutdown_requested() {
                return Err(EngineError::Interrupted.into());
            }

            let plan = DeletionPlan::from_result(&result).context("Cannot plan deletion")?;
            let outcome =
                delete_batch::<NoDeleteProgress>(&plan, &config.delete_config(), None);
            for (path, reason) in &outcome.failures {
                log::error!("Failed to delete {}: {}", path.display(), reason);
            }
            if !quiet {
                eprintln!("{}", outcome.summary());
            }
            if !outcome.all_succeeded() {
                exit_code = ExitCode::PartialSuccess;
            }
            if config.output_dir.is_some() {
                write_report(&Report::for_clusters(&result, &summary, exit_code), config)?;
            }
        }
    }

    if !quiet {
        print_summary(&summary, "duplicate(s)");
    }
    Ok(exit_code)
}

fn run_pairs(
    dedup: &Deduplicator,
    paths: &[PathBuf],
    config: &Config,
    quiet: bool,
) -> Result<ExitCode> {
    if config.action != ActionMode::Report {
        bail!("The pairs command only supports --action report");
    }

    let (pairs, summary) = dedup.pairs_paths(paths).context("Pair listing failed")?;
    let exit_code = ExitCode::for_outcome(!pairs.is_empty(), summary.has_skipped());
    write_report(&Report::for_pairs(&pairs, &summary, exit_code), config)?;

    if !quiet {
        print_summary(&summary, "similar pair(s)");
    }
    Ok(exit_code)
}

fn write_report(report: &Report<'_>, config: &Config) -> Result<()> {
    match config.output_dir {
        Some(ref dir) => {
            report
                .write_to_dir(config.format, dir)
                .with_context(|| format!("Failed to write report to {}", dir.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            report
                .write_to(config.format, &mut out)
                .context("Failed to write report")?;
            out.flush().context("Failed to write report")?;
        }
    }
    Ok(())
}

/// Colored one-line summary on stderr; stdout is reserved for reports.
fn print_summary(summary: &DedupSummary, found: &str) {
    let skipped = summary.skipped.len();
    let skipped = if skipped > 0 {
        skipped.red().bold().to_string()
    } else {
        skipped.to_string()
    };
    eprintln!(
        "{} {} document(s) compared, {} {}, {} unique, {} skipped (threshold {}, {:.2?})",
        "neardup:".bold(),
        summary.represented,
        summary.duplicates.yellow().bold(),
        found,
        summary.representatives.green(),
        skipped,
        SimilarityScore::new(summary.metric, summary.threshold),
        summary.total_duration,
    );
}
