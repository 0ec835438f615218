use clap::Parser;
use neardup::cli::Cli;
use neardup::config::Config;
use neardup::error::ExitCode;
use neardup::metric::MetricKind;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const NOTE: &str = "reminder to renew the parking permit before the end of the month";
const NOTE_TYPO: &str = "reminder to renew the parking permit before the end of the mnoth";
const OTHER: &str = "grocery list: oat milk, rye bread, two lemons and a bag of coffee beans";

fn workspace(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempdir().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    for (name, content) in files {
        fs::write(docs.join(name), content).unwrap();
    }
    dir
}

/// Run the app against `<dir>/docs` with an isolated config file.
fn run(dir: &Path, extra: &[&str]) -> anyhow::Result<ExitCode> {
    let config = dir.join("none.toml");
    let docs = dir.join("docs");
    let out = dir.join("out");
    let mut args = vec![
        "neardup".to_string(),
        "-q".to_string(),
        "--config".to_string(),
        config.to_string_lossy().into_owned(),
    ];
    args.extend(extra.iter().map(|s| (*s).to_string()));
    args.push(docs.to_string_lossy().into_owned());
    args.push("--output-dir".to_string());
    args.push(out.to_string_lossy().into_owned());

    let cli = Cli::try_parse_from(args).unwrap();
    neardup::run_app(cli)
}

#[test]
fn test_exit_code_success_with_duplicates() {
    let dir = workspace(&[("a.txt", NOTE.as_bytes()), ("b.txt", NOTE_TYPO.as_bytes())]);
    let code = run(dir.path(), &["dedup", "-m", "levenshtein", "-t", "5"]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let duplicates = fs::read_to_string(dir.path().join("out").join("duplicates.txt")).unwrap();
    assert_eq!(duplicates.lines().count(), 1);
}

#[test]
fn test_exit_code_no_duplicates() {
    let dir = workspace(&[("a.txt", NOTE.as_bytes()), ("b.txt", OTHER.as_bytes())]);
    let code = run(dir.path(), &["dedup", "-m", "jaccard", "-k", "2"]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_exit_code_partial_success_on_unreadable_document() {
    let dir = workspace(&[
        ("a.txt", NOTE.as_bytes()),
        ("b.txt", NOTE.as_bytes()),
        ("c.txt", &[0xff, 0xfe, 0x00, 0x9f]),
    ]);
    let code = run(dir.path(), &["dedup", "-m", "cosine", "-f", "json"]).unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out").join("report.json")).unwrap())
            .unwrap();
    assert_eq!(report["skipped"].as_array().unwrap().len(), 1);
    assert_eq!(report["summary"]["exit_code_name"], "ND003");
}

#[test]
fn test_strict_mode_fails_on_unreadable_document() {
    let dir = workspace(&[("a.txt", NOTE.as_bytes()), ("b.txt", &[0xff, 0xfe])]);
    let err = run(dir.path(), &["dedup", "--strict"]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_delete_requires_confirmation() {
    let dir = workspace(&[("a.txt", NOTE.as_bytes()), ("b.txt", NOTE.as_bytes())]);
    let err = run(dir.path(), &["dedup", "--action", "delete", "--permanent"]).unwrap_err();
    assert!(err.to_string().contains("--yes"));
    assert!(dir.path().join("docs").join("b.txt").exists());
}

#[test]
fn test_delete_dry_run_needs_no_confirmation() {
    let dir = workspace(&[("a.txt", NOTE.as_bytes()), ("b.txt", NOTE.as_bytes())]);
    let code = run(
        dir.path(),
        &["dedup", "--action", "delete", "--permanent", "--dry-run"],
    )
    .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(dir.path().join("docs").join("b.txt").exists());
}

#[test]
fn test_permanent_delete_with_confirmation() {
    let dir = workspace(&[
        ("a.txt", NOTE.as_bytes()),
        ("b.txt", NOTE.as_bytes()),
        ("c.txt", OTHER.as_bytes()),
    ]);
    let code = run(
        dir.path(),
        &["dedup", "-m", "levenshtein", "-t", "5", "-a", "delete", "--permanent", "-y"],
    )
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    let docs = dir.path().join("docs");
    assert!(docs.join("a.txt").exists());
    assert!(!docs.join("b.txt").exists());
    assert!(docs.join("c.txt").exists());
    // The report is still written when an output directory is given
    assert!(dir.path().join("out").join("unique_files.txt").exists());
}

#[test]
fn test_pairs_command_writes_pair_listing() {
    let dir = workspace(&[
        ("a.txt", NOTE.as_bytes()),
        ("b.txt", NOTE_TYPO.as_bytes()),
        ("c.txt", NOTE.as_bytes()),
    ]);
    let code = run(dir.path(), &["pairs", "-m", "levenshtein", "-t", "5"]).unwrap();
    assert_eq!(code, ExitCode::Success);

    let listing = fs::read_to_string(dir.path().join("out").join("similar_pairs.txt")).unwrap();
    assert_eq!(listing.lines().count(), 3);
}

#[test]
fn test_pairs_command_rejects_delete() {
    let dir = workspace(&[("a.txt", NOTE.as_bytes())]);
    let err = run(dir.path(), &["pairs", "--action", "delete", "-y"]).unwrap_err();
    assert!(err.to_string().contains("report"));
}

#[test]
fn test_invalid_threshold_is_an_error() {
    let dir = workspace(&[("a.txt", NOTE.as_bytes())]);
    let err = run(dir.path(), &["dedup", "-m", "jaccard", "-t", "1.5"]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_aliased_path_does_not_delete_its_only_copy() {
    let dir = workspace(&[("a.txt", NOTE.as_bytes())]);
    let docs = dir.path().join("docs");
    let alias = docs.join("..").join("docs").join("a.txt");
    let args = [
        "neardup".to_string(),
        "-q".to_string(),
        "--config".to_string(),
        dir.path().join("none.toml").to_string_lossy().into_owned(),
        "dedup".to_string(),
        docs.to_string_lossy().into_owned(),
        alias.to_string_lossy().into_owned(),
        "--action".to_string(),
        "delete".to_string(),
        "--permanent".to_string(),
        "--yes".to_string(),
    ];

    let code = neardup::run_app(Cli::try_parse_from(args).unwrap()).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(docs.join("a.txt").exists());
}

#[test]
fn test_save_config_writes_effective_settings() {
    let dir = workspace(&[("a.txt", NOTE.as_bytes()), ("b.txt", OTHER.as_bytes())]);
    let saved = dir.path().join("saved").join("config.toml");
    let code = run(
        dir.path(),
        &[
            "--save-config",
            &saved.to_string_lossy(),
            "dedup",
            "-m",
            "jaccard",
            "-k",
            "3",
        ],
    )
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);

    let config = Config::load_from_path(&saved, None);
    assert_eq!(config.metric, MetricKind::Jaccard);
    assert_eq!(config.shingle_size, 3);
}
