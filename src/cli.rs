//! Command-line interface definitions for neardup.
//!
//! Global options (verbosity, color, config file) come first, then one of two
//! subcommands that share the same run arguments:
//!
//! ```bash
//! # Keep one document per group of near-duplicates, write unique_files.txt
//! # and duplicates.txt
//! neardup dedup ./articles --metric jaccard --threshold 0.8 --output-dir out
//!
//! # List every similar pair, without clustering
//! neardup pairs ./articles --metric cosine --format json
//!
//! # Move duplicates to the trash
//! neardup dedup ./articles --action delete --yes
//! ```
//!
//! Run options are all optional so that an omitted flag never overrides the
//! configuration file or the environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::actions::{ActionMode, ReportFormat};
use crate::metric::MetricKind;

/// Near-duplicate text document finder.
///
/// neardup compares documents with one of four metrics (SimHash Hamming
/// distance, shingle Jaccard similarity, Levenshtein edit distance or TF-IDF
/// cosine similarity), keeps the first document of every group of
/// near-duplicates and reports or removes the rest.
#[derive(Debug, Parser)]
#[command(name = "neardup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Plain ASCII progress bars for screen readers
    #[arg(long, global = true)]
    pub accessible: bool,

    /// Configuration file (default: platform config dir, config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Named profile from the configuration file
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Write the effective configuration to FILE as TOML, then run
    #[arg(long, global = true, value_name = "FILE")]
    pub save_config: Option<PathBuf>,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Keep one representative per group of near-duplicates
    Dedup(RunArgs),
    /// List every pair of similar documents
    Pairs(RunArgs),
}

impl Commands {
    /// Arguments of either subcommand.
    #[must_use]
    pub fn args(&self) -> &RunArgs {
        match self {
            Commands::Dedup(args) | Commands::Pairs(args) => args,
        }
    }
}

/// Arguments shared by `dedup` and `pairs`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directories (their text files, sorted by name) or files (in the given order)
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Similarity metric
    #[arg(short, long, value_enum)]
    pub metric: Option<MetricKind>,

    /// Duplicate threshold in the metric's unit
    ///
    /// Defaults: hamming 3, jaccard 0.8, levenshtein 50, cosine 0.95.
    #[arg(short, long, value_name = "VALUE", allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Shingle length in words (jaccard)
    #[arg(short = 'k', long, value_name = "K")]
    pub shingle_size: Option<usize>,

    /// Vocabulary size cap (cosine)
    #[arg(long, value_name = "N")]
    pub max_features: Option<usize>,

    /// Keep English stop words in the TF-IDF vocabulary (cosine)
    #[arg(long)]
    pub keep_stop_words: bool,

    /// Normalize text (NFC, lowercase, no punctuation) before building
    #[arg(long, overrides_with = "no_normalize")]
    pub normalize: bool,

    /// Compare text as written
    #[arg(long, overrides_with = "normalize")]
    pub no_normalize: bool,

    /// File extensions to read from directories (comma-separated)
    #[arg(short, long = "ext", value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Read every regular file in a directory, whatever its extension
    #[arg(long, conflicts_with = "extensions")]
    pub all_files: bool,

    /// Skip hidden files (starting with .)
    #[arg(long, overrides_with = "no_skip_hidden")]
    pub skip_hidden: bool,

    /// Include hidden files
    #[arg(long, overrides_with = "skip_hidden")]
    pub no_skip_hidden: bool,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Worker threads for building representations (default: all cores)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Fail on the first document that cannot be represented
    #[arg(long)]
    pub strict: bool,

    /// What to do with the result
    #[arg(short, long, value_enum)]
    pub action: Option<ActionMode>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Write report files into this directory instead of stdout
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Delete permanently instead of moving to trash
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long)]
    pub permanent: bool,

    /// Show what would be deleted without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Confirm deletion (required for --action delete unless --dry-run)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl RunArgs {
    /// `Some` when `--normalize` or `--no-normalize` was given.
    #[must_use]
    pub fn normalize_override(&self) -> Option<bool> {
        flag_pair(self.normalize, self.no_normalize)
    }

    /// `Some` when `--skip-hidden` or `--no-skip-hidden` was given.
    #[must_use]
    pub fn skip_hidden_override(&self) -> Option<bool> {
        flag_pair(self.skip_hidden, self.no_skip_hidden)
    }
}

fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
