//! Integration tests for the configuration stack: defaults, TOML files,
//! named profiles, environment variables, CLI overrides and validation.

use clap::Parser;
use neardup::actions::{ActionMode, ReportFormat};
use neardup::cli::Cli;
use neardup::config::{Config, ConfigError};
use neardup::metric::MetricKind;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all NEARDUP_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("NEARDUP_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let config = Config::default();
    assert_eq!(config.metric, MetricKind::Hamming);
    assert_eq!(config.threshold, None);
    assert_eq!(config.shingle_size, 5);
    assert_eq!(config.max_features, 5000);
    assert!(config.stop_words);
    assert_eq!(config.action, ActionMode::Report);
    assert_eq!(config.format, ReportFormat::Text);
    assert!(config.profile.is_empty());
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
metric = "jaccard"
threshold = 0.7
shingle_size = 3
extensions = ["txt", "md"]
format = "json"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path, None);
    assert_eq!(config.metric, MetricKind::Jaccard);
    assert_eq!(config.threshold, Some(0.7));
    assert_eq!(config.shingle_size, 3);
    assert_eq!(config.extensions, vec!["txt", "md"]);
    assert_eq!(config.format, ReportFormat::Json);
    assert_eq!(config.max_features, 5000);
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let config = Config::load_from_path(dir.path().join("nonexistent.toml"), None);
    assert_eq!(config.metric, MetricKind::Hamming);
    assert_eq!(config.shingle_size, 5);
}

#[test]
fn test_config_save_and_reload() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = Config {
        metric: MetricKind::Cosine,
        threshold: Some(0.9),
        max_features: 200,
        ..Config::default()
    };
    config.save(&path).unwrap();

    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains("metric = \"cosine\""));
    assert!(saved.contains("max_features = 200"));

    let reloaded = Config::load_from_path(&path, None);
    assert_eq!(reloaded.metric, MetricKind::Cosine);
    assert_eq!(reloaded.threshold, Some(0.9));
    assert_eq!(reloaded.max_features, 200);
}

#[test]
fn test_config_hierarchy_file_env_cli() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    // 1. File overrides defaults
    fs::write(&path, "metric = \"jaccard\"\nshingle_size = 4\n").unwrap();

    // 2. Environment overrides the file
    std::env::set_var("NEARDUP_SHINGLE_SIZE", "2");

    let mut config = Config::load_from_path(&path, None);
    assert_eq!(config.metric, MetricKind::Jaccard);
    assert_eq!(config.shingle_size, 2);

    // 3. CLI overrides the environment
    let cli = Cli::try_parse_from(["neardup", "dedup", ".", "-k", "6"]).unwrap();
    config.merge_cli(&cli);
    config.merge_run_args(cli.command.args());
    assert_eq!(config.shingle_size, 6);
    assert_eq!(config.metric, MetricKind::Jaccard);

    std::env::remove_var("NEARDUP_SHINGLE_SIZE");
}

#[test]
fn test_boolean_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    fs::write(&path, "normalize = true\nskip_hidden = true\n").unwrap();
    let mut config = Config::load_from_path(&path, None);
    assert!(config.normalize);
    assert!(config.skip_hidden);

    let cli =
        Cli::try_parse_from(["neardup", "dedup", ".", "--no-normalize", "--no-skip-hidden"])
            .unwrap();
    config.merge_run_args(cli.command.args());
    assert!(!config.normalize);
    assert!(!config.skip_hidden);

    let mut config = Config::default();
    let cli = Cli::try_parse_from(["neardup", "dedup", ".", "--normalize"]).unwrap();
    config.merge_run_args(cli.command.args());
    assert!(config.normalize);
}

#[test]
fn test_config_load_profile() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
metric = "jaccard"
shingle_size = 3

[profile.news]
metric = "cosine"
threshold = 0.9

[profile.code]
metric = "levenshtein"
normalize = true
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path, Some("news"));
    assert_eq!(config.metric, MetricKind::Cosine);
    assert_eq!(config.threshold, Some(0.9));
    assert_eq!(config.shingle_size, 3);

    let config = Config::load_from_path(&path, Some("code"));
    assert_eq!(config.metric, MetricKind::Levenshtein);
    assert!(config.normalize);

    let config = Config::load_from_path(&path, None);
    assert_eq!(config.metric, MetricKind::Jaccard);
    assert_eq!(config.profile.len(), 2);
    assert!(config.profile.contains_key("news"));
}

#[test]
fn test_config_profile_not_found_falls_back_to_base() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "metric = \"jaccard\"\n[profile.news]\nmetric = \"cosine\"\n").unwrap();

    let config = Config::load_from_path(&path, Some("missing"));
    assert_eq!(config.metric, MetricKind::Jaccard);
}

#[test]
fn test_env_overrides_profile() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[profile.news]\nmetric = \"cosine\"\n").unwrap();

    std::env::set_var("NEARDUP_METRIC", "levenshtein");
    let config = Config::load_from_path(&path, Some("news"));
    assert_eq!(config.metric, MetricKind::Levenshtein);
    std::env::remove_var("NEARDUP_METRIC");
}

#[test]
fn test_unknown_key_is_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    // 'shingle_sise' is a typo for 'shingle_size'
    fs::write(&path, "shingle_sise = 2\nmetric = \"cosine\"\n").unwrap();

    let config = Config::load_from_path(&path, None);
    assert_eq!(config.shingle_size, 5);
    assert_eq!(config.metric, MetricKind::Cosine);
}

#[test]
fn test_invalid_type_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "shingle_size = \"three\"\n").unwrap();

    let config = Config::load_from_path(&path, None);
    assert_eq!(config.shingle_size, 5);
}

#[test]
fn test_invalid_metric_name_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "metric = \"euclidean\"\n").unwrap();

    let config = Config::load_from_path(&path, None);
    assert_eq!(config.metric, MetricKind::Hamming);
}

#[test]
fn test_validation_of_loaded_values() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    fs::write(&path, "metric = \"jaccard\"\nthreshold = 2.0\n").unwrap();
    let config = Config::load_from_path(&path, None);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidThreshold(_))
    ));

    fs::write(&path, "threads = 0\n").unwrap();
    let config = Config::load_from_path(&path, None);
    assert!(matches!(config.validate(), Err(ConfigError::InvalidThreads)));

    fs::write(&path, "shingle_size = 0\n").unwrap();
    let config = Config::load_from_path(&path, None);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidShingleSize)
    ));
}

#[test]
fn test_cli_ignore_patterns_extend_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "ignore_patterns = [\"draft*\"]\n").unwrap();

    let mut config = Config::load_from_path(&path, None);
    let cli = Cli::try_parse_from(["neardup", "dedup", ".", "--ignore", "*.bak"]).unwrap();
    config.merge_run_args(cli.command.args());
    assert_eq!(config.ignore_patterns, vec!["draft*", "*.bak"]);
}
