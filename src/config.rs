//! Application configuration.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. The TOML file (`--config`, else `config.toml` in the platform config dir)
//! 3. A named `[profile.<name>]` table from that file (`--profile`)
//! 4. `NEARDUP_*` environment variables (`NEARDUP_METRIC=cosine`)
//! 5. Command-line flags
//!
//! ```toml
//! metric = "jaccard"
//! shingle_size = 3
//!
//! [profile.news]
//! metric = "cosine"
//! threshold = 0.9
//! ```
//!
//! A file that fails to parse is reported and ignored. Unknown keys are
//! reported with the closest known key as a suggestion.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::value::{Dict, Value};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::{ActionMode, DeleteConfig, ReportFormat};
use crate::cli::{Cli, RunArgs};
use crate::corpus::SourceConfig;
use crate::engine::DedupConfig;
use crate::metric::{MetricError, MetricKind};
use crate::representation::{BuilderOptions, DEFAULT_MAX_FEATURES, DEFAULT_SHINGLE_SIZE};

/// Prefix of the environment variables read into the configuration.
pub const ENV_PREFIX: &str = "NEARDUP_";

/// Keys accepted at the top level of the file and inside profiles.
const KNOWN_KEYS: &[&str] = &[
    "metric",
    "threshold",
    "shingle_size",
    "max_features",
    "stop_words",
    "normalize",
    "extensions",
    "all_files",
    "skip_hidden",
    "ignore_patterns",
    "threads",
    "strict",
    "action",
    "format",
    "output_dir",
    "permanent",
    "dry_run",
    "accessible",
    "profile",
];

/// Errors from validating or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Shingles must hold at least one word.
    #[error("shingle_size must be at least 1")]
    InvalidShingleSize,

    /// The vocabulary cap must allow at least one term.
    #[error("max_features must be at least 1")]
    InvalidMaxFeatures,

    /// Zero worker threads.
    #[error("threads must be at least 1 (omit it to use all cores)")]
    InvalidThreads,

    /// Threshold outside the metric's domain.
    #[error(transparent)]
    InvalidThreshold(#[from] MetricError),

    /// The platform has no configuration directory.
    #[error("Could not determine the configuration directory")]
    NoConfigDir,

    /// Could not write the configuration file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// File being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Could not serialize the configuration.
    #[error("Could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Effective settings of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Similarity metric.
    pub metric: MetricKind,
    /// Threshold; the metric default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Shingle length in words.
    pub shingle_size: usize,
    /// TF-IDF vocabulary cap.
    pub max_features: usize,
    /// Remove English stop words before TF-IDF fitting.
    pub stop_words: bool,
    /// Normalize text before building representations.
    pub normalize: bool,
    /// Extensions read from directories.
    pub extensions: Vec<String>,
    /// Read every file in a directory, ignoring `extensions`.
    pub all_files: bool,
    /// Skip hidden files.
    pub skip_hidden: bool,
    /// Gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
    /// Worker threads; all cores when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Fail on the first document that cannot be represented.
    pub strict: bool,
    /// What to do with the result.
    pub action: ActionMode,
    /// Report format.
    pub format: ReportFormat,
    /// Directory receiving report files; stdout when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Delete permanently instead of moving to trash.
    pub permanent: bool,
    /// Report deletions without performing them.
    pub dry_run: bool,
    /// ASCII-only progress output.
    pub accessible: bool,
    /// Named override tables.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub profile: BTreeMap<String, Dict>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metric: MetricKind::default(),
            threshold: None,
            shingle_size: DEFAULT_SHINGLE_SIZE,
            max_features: DEFAULT_MAX_FEATURES,
            stop_words: true,
            normalize: false,
            extensions: vec!["txt".to_string()],
            all_files: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            threads: None,
            strict: false,
            action: ActionMode::default(),
            format: ReportFormat::default(),
            output_dir: None,
            permanent: false,
            dry_run: false,
            accessible: false,
            profile: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load from `explicit_path`, or from the default path when `None`.
    #[must_use]
    pub fn load(explicit_path: Option<&Path>, profile: Option<&str>) -> Self {
        match explicit_path {
            Some(path) => Self::load_from_path(path, profile),
            None => match Self::default_path() {
                Ok(path) => Self::load_from_path(path, profile),
                Err(e) => {
                    log::debug!("{e}, using defaults and environment");
                    Self::from_figment(Self::base_figment(None), profile)
                }
            },
        }
    }

    /// Load from a TOML file. A missing file means defaults plus environment.
    #[must_use]
    pub fn load_from_path(path: impl AsRef<Path>, profile: Option<&str>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            log::debug!("Loading configuration from {}", path.display());
            warn_unknown_keys(path);
        } else {
            log::debug!("No configuration file at {}", path.display());
        }
        Self::from_figment(Self::base_figment(Some(path)), profile)
    }

    fn base_figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        }
    }

    fn from_figment(base: Figment, profile: Option<&str>) -> Self {
        let mut figment = base.clone();
        if let Some(name) = profile {
            match base.find_value(&format!("profile.{name}")) {
                Ok(value) => {
                    log::debug!("Applying profile '{name}'");
                    figment = figment.merge(Serialized::defaults(value));
                }
                Err(_) => log::warn!("Profile '{name}' not found, using base configuration"),
            }
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]));

        match figment.extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// `config.toml` in the platform configuration directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if the platform has none.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("com", "neardup", "neardup")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Write the configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, content).map_err(io_error)
    }

    /// Reject settings no run can use.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shingle_size == 0 {
            return Err(ConfigError::InvalidShingleSize);
        }
        if self.max_features == 0 {
            return Err(ConfigError::InvalidMaxFeatures);
        }
        if self.threads == Some(0) {
            return Err(ConfigError::InvalidThreads);
        }
        if let Some(threshold) = self.threshold {
            self.metric.build().validate_threshold(threshold)?;
        }
        Ok(())
    }

    /// Apply global CLI flags.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if cli.accessible {
            self.accessible = true;
        }
    }

    /// Apply subcommand flags. Only flags that were given override.
    pub fn merge_run_args(&mut self, args: &RunArgs) {
        if let Some(metric) = args.metric {
            if metric != self.metric && args.threshold.is_none() && self.threshold.is_some() {
                // A configured threshold belongs to the configured metric
                log::debug!("Metric changed to {metric}, dropping configured threshold");
                self.threshold = None;
            }
            self.metric = metric;
        }
        if let Some(threshold) = args.threshold {
            self.threshold = Some(threshold);
        }
        if let Some(k) = args.shingle_size {
            self.shingle_size = k;
        }
        if let Some(n) = args.max_features {
            self.max_features = n;
        }
        if args.keep_stop_words {
            self.stop_words = false;
        }
        if let Some(normalize) = args.normalize_override() {
            self.normalize = normalize;
        }
        if !args.extensions.is_empty() {
            self.extensions.clone_from(&args.extensions);
            self.all_files = false;
        }
        if args.all_files {
            self.all_files = true;
        }
        if let Some(skip) = args.skip_hidden_override() {
            self.skip_hidden = skip;
        }
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
        if let Some(threads) = args.threads {
            self.threads = Some(threads);
        }
        if args.strict {
            self.strict = true;
        }
        if let Some(action) = args.action {
            self.action = action;
        }
        if let Some(format) = args.format {
            self.format = format;
        }
        if let Some(ref dir) = args.output_dir {
            self.output_dir = Some(dir.clone());
        }
        if args.permanent {
            self.permanent = true;
        }
        if args.dry_run {
            self.dry_run = true;
        }
    }

    /// Engine settings. Shutdown flag and progress are attached by the caller.
    #[must_use]
    pub fn dedup_config(&self) -> DedupConfig {
        let mut config = DedupConfig::new(self.metric);
        config.threshold = self.threshold;
        config.builder_options = BuilderOptions {
            shingle_size: self.shingle_size,
            max_features: self.max_features,
            stop_words: self.stop_words,
            normalize: self.normalize,
        };
        config.threads = self.threads.unwrap_or(0);
        config.strict = self.strict;
        config
    }

    /// Directory listing settings.
    #[must_use]
    pub fn source_config(&self) -> SourceConfig {
        let config = SourceConfig::default()
            .with_skip_hidden(self.skip_hidden)
            .with_ignore_patterns(self.ignore_patterns.clone());
        if self.all_files {
            config.all_files()
        } else {
            config.with_extensions(self.extensions.clone())
        }
    }

    /// Deletion settings.
    #[must_use]
    pub fn delete_config(&self) -> DeleteConfig {
        let config = if self.permanent {
            DeleteConfig::permanent()
        } else {
            DeleteConfig::trash()
        };
        config.with_dry_run(self.dry_run)
    }
}

/// Log a warning for each unknown key in the file, suggesting a known one.
fn warn_unknown_keys(path: &Path) {
    let Ok(data) = Figment::from(Toml::file(path)).extract::<Dict>() else {
        return;
    };

    for key in data.keys() {
        check_key(key, None);
    }

    if let Some(Value::Dict(_, profiles)) = data.get("profile") {
        for (name, table) in profiles {
            if let Value::Dict(_, fields) = table {
                for key in fields.keys() {
                    check_key(key, Some(name));
                }
            }
        }
    }
}

fn check_key(key: &str, profile: Option<&str>) {
    if let (Some(name), "profile") = (profile, key) {
        log::warn!("Profiles cannot be nested (in profile '{name}')");
        return;
    }
    if KNOWN_KEYS.contains(&key) {
        return;
    }
    let location = profile.map_or_else(String::new, |p| format!(" in profile '{p}'"));
    match suggest_key(key) {
        Some(suggestion) => log::warn!(
            "Unknown configuration key '{key}'{location}, did you mean '{suggestion}'?"
        ),
        None => log::warn!("Unknown configuration key '{key}'{location}"),
    }
}

/// Closest known key within edit distance 3.
fn suggest_key(key: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|known| (*known, strsim::levenshtein(key, known)))
        .filter(|(_, distance)| *distance <= 3)
        .min_by_key(|(_, distance)| *distance)
        .map(|(known, _)| known)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.metric, MetricKind::Hamming);
        assert_eq!(config.shingle_size, 5);
        assert_eq!(config.extensions, vec!["txt"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config {
            shingle_size: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidShingleSize)));

        config.shingle_size = 3;
        config.threads = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreads)));

        config.threads = None;
        config.metric = MetricKind::Jaccard;
        config.threshold = Some(1.5);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold(_))));

        config.metric = MetricKind::Cosine;
        config.threshold = Some(-0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_suggest_key() {
        assert_eq!(suggest_key("shingle_sise"), Some("shingle_size"));
        assert_eq!(suggest_key("treshold"), Some("threshold"));
        assert_eq!(suggest_key("completely_unrelated"), None);
    }

    #[test]
    fn test_merge_run_args_only_given_flags() {
        let mut config = Config {
            metric: MetricKind::Jaccard,
            shingle_size: 4,
            normalize: true,
            ..Config::default()
        };
        let cli = Cli::try_parse_from(["neardup", "dedup", ".", "-t", "0.6"]).unwrap();
        config.merge_run_args(cli.command.args());

        assert_eq!(config.metric, MetricKind::Jaccard);
        assert_eq!(config.threshold, Some(0.6));
        assert_eq!(config.shingle_size, 4);
        assert!(config.normalize);
    }

    #[test]
    fn test_merge_metric_drops_foreign_threshold() {
        let mut config = Config {
            metric: MetricKind::Jaccard,
            threshold: Some(0.7),
            ..Config::default()
        };
        let cli = Cli::try_parse_from(["neardup", "dedup", ".", "-m", "levenshtein"]).unwrap();
        config.merge_run_args(cli.command.args());
        assert_eq!(config.metric, MetricKind::Levenshtein);
        assert_eq!(config.threshold, None);
    }

    #[test]
    fn test_dedup_config_mapping() {
        let config = Config {
            metric: MetricKind::Cosine,
            threshold: Some(0.9),
            max_features: 10,
            stop_words: false,
            threads: Some(2),
            ..Config::default()
        };
        let dedup = config.dedup_config();
        assert_eq!(dedup.metric, MetricKind::Cosine);
        assert_eq!(dedup.effective_threshold(), 0.9);
        assert_eq!(dedup.builder_options.max_features, 10);
        assert!(!dedup.builder_options.stop_words);
        assert_eq!(dedup.threads, 2);
    }

    #[test]
    fn test_source_config_mapping() {
        let config = Config {
            extensions: vec![".MD".to_string()],
            ..Config::default()
        };
        assert_eq!(config.source_config().extensions, vec!["md"]);

        let config = Config {
            all_files: true,
            ..Config::default()
        };
        assert!(config.source_config().extensions.is_empty());
    }
}
