use neardup::actions::report::{CSV_FILE, DUPLICATES_FILE, JSON_FILE, PAIRS_FILE, UNIQUE_FILE};
use neardup::actions::{Report, ReportFormat};
use neardup::engine::{DedupConfig, Deduplicator};
use neardup::error::ExitCode;
use neardup::metric::MetricKind;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn corpus_dir() -> (tempfile::TempDir, Vec<PathBuf>) {
    let dir = tempdir().unwrap();
    let texts = [
        ("a.txt", "the committee approved the new budget for public libraries this year"),
        ("b.txt", "the committee approved the new budget for public libraries this spring"),
        ("c.txt", "local team wins the championship after a dramatic overtime finish"),
    ];
    let paths = texts
        .iter()
        .map(|(name, text)| {
            let path = dir.path().join(name);
            fs::write(&path, text).unwrap();
            path
        })
        .collect();
    (dir, paths)
}

fn dedup() -> Deduplicator {
    Deduplicator::new(
        DedupConfig::new(MetricKind::Jaccard)
            .with_threshold(0.8)
            .with_shingle_size(2),
    )
}

#[test]
fn test_text_report_lists_representatives_and_pairs() {
    let (dir, paths) = corpus_dir();
    let out = dir.path().join("out");
    let (result, summary) = dedup().run_paths(&paths).unwrap();

    Report::for_clusters(&result, &summary, ExitCode::Success)
        .write_to_dir(ReportFormat::Text, &out)
        .unwrap();

    let unique = fs::read_to_string(out.join(UNIQUE_FILE)).unwrap();
    let unique: Vec<&str> = unique.lines().collect();
    assert_eq!(
        unique,
        vec![
            paths[0].to_string_lossy().as_ref(),
            paths[2].to_string_lossy().as_ref()
        ]
    );

    let duplicates = fs::read_to_string(out.join(DUPLICATES_FILE)).unwrap();
    assert_eq!(
        duplicates,
        format!("{} -- {}\n", paths[0].display(), paths[1].display())
    );
}

#[test]
fn test_pairs_text_report() {
    let (dir, paths) = corpus_dir();
    let (pairs, summary) = dedup().pairs_paths(&paths).unwrap();

    Report::for_pairs(&pairs, &summary, ExitCode::Success)
        .write_to_dir(ReportFormat::Text, dir.path())
        .unwrap();
    let listing = fs::read_to_string(dir.path().join(PAIRS_FILE)).unwrap();
    assert_eq!(listing.lines().count(), 1);
}

#[test]
fn test_json_report_round_trips_through_serde() {
    let (dir, paths) = corpus_dir();
    let (result, summary) = dedup().run_paths(&paths).unwrap();

    Report::for_clusters(&result, &summary, ExitCode::Success)
        .write_to_dir(ReportFormat::Json, dir.path())
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(JSON_FILE)).unwrap()).unwrap();

    assert_eq!(json["representatives"].as_array().unwrap().len(), 2);
    assert_eq!(json["duplicates"].as_array().unwrap().len(), 1);
    assert_eq!(json["summary"]["metric"], "jaccard");
    assert_eq!(json["summary"]["threshold"], 0.8);
    assert_eq!(json["summary"]["exit_code_name"], "ND000");
}

#[test]
fn test_csv_report_has_one_row_per_document() {
    let (dir, paths) = corpus_dir();
    let (result, summary) = dedup().run_paths(&paths).unwrap();

    Report::for_clusters(&result, &summary, ExitCode::Success)
        .write_to_dir(ReportFormat::Csv, dir.path())
        .unwrap();
    let mut reader = csv::Reader::from_path(dir.path().join(CSV_FILE)).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[2][0], "duplicate");
    assert_eq!(&rows[2][3], "jaccard");
}

#[test]
fn test_report_to_stream() {
    let (_dir, paths) = corpus_dir();
    let (result, summary) = dedup().run_paths(&paths).unwrap();

    let mut buf = Vec::new();
    Report::for_clusters(&result, &summary, ExitCode::Success)
        .write_to(ReportFormat::Text, &mut buf)
        .unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains(" -- "));
}
