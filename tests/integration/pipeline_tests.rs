use neardup::corpus::{load_documents, unique_paths, DirectorySource, DocumentId, SourceConfig};
use neardup::engine::{DedupConfig, Deduplicator, EngineError};
use neardup::metric::MetricKind;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

const ARTICLE: &str = "the quick brown fox jumps over the lazy dog near the river bank";
const ARTICLE_EDIT: &str = "the quick brown fox jumps over the lazy dog near the river bend";
const UNRELATED: &str = "quarterly earnings beat expectations as cloud revenue grew sharply \
    while hardware sales declined across every region, prompting analysts to revise \
    their forecasts for the coming fiscal year";

fn jaccard() -> Deduplicator {
    Deduplicator::new(
        DedupConfig::new(MetricKind::Jaccard)
            .with_threshold(0.8)
            .with_shingle_size(2),
    )
}

#[test]
fn test_directory_listing_is_sorted_by_name() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("c.txt"), UNRELATED).unwrap();
    fs::write(dir.path().join("a.txt"), ARTICLE).unwrap();
    fs::write(dir.path().join("b.txt"), ARTICLE_EDIT).unwrap();
    fs::write(dir.path().join("notes.md"), ARTICLE).unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("d.txt"), ARTICLE).unwrap();

    let paths = DirectorySource::new(dir.path(), SourceConfig::default())
        .list()
        .unwrap();
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
}

#[test]
fn test_directory_run_keeps_first_by_name() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.txt"), ARTICLE_EDIT).unwrap();
    fs::write(dir.path().join("a.txt"), ARTICLE).unwrap();
    fs::write(dir.path().join("c.txt"), UNRELATED).unwrap();

    let paths = DirectorySource::new(dir.path(), SourceConfig::default())
        .list()
        .unwrap();
    let (result, summary) = jaccard().run_paths(&paths).unwrap();

    assert_eq!(
        result.representatives,
        vec![
            DocumentId::Path(dir.path().join("a.txt")),
            DocumentId::Path(dir.path().join("c.txt")),
        ]
    );
    assert_eq!(
        result.duplicate_pairs[0].duplicate,
        DocumentId::Path(dir.path().join("b.txt"))
    );
    assert_eq!(summary.total_documents, 3);
}

#[test]
fn test_explicit_file_order_is_kept() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, ARTICLE).unwrap();
    fs::write(&b, ARTICLE_EDIT).unwrap();

    let (result, _) = jaccard().run_paths(&[b.clone(), a.clone()]).unwrap();
    assert_eq!(result.representatives, vec![DocumentId::Path(b)]);
    assert_eq!(result.duplicate_pairs[0].duplicate, DocumentId::Path(a));
}

#[test]
fn test_unreadable_files_are_skipped() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.txt");
    let binary = dir.path().join("binary.txt");
    let missing = dir.path().join("missing.txt");
    fs::write(&good, ARTICLE).unwrap();
    fs::write(&binary, [0xff, 0xfe, 0x00, 0x81]).unwrap();

    let loaded = load_documents(&[good.clone(), binary.clone(), missing.clone()], None).unwrap();
    assert_eq!(loaded.corpus.len(), 1);
    assert_eq!(loaded.skipped.len(), 2);

    let (result, summary) = jaccard()
        .run_paths(&[good.clone(), binary, missing])
        .unwrap();
    assert_eq!(result.representatives, vec![DocumentId::Path(good)]);
    assert_eq!(summary.skipped.len(), 2);
    assert!(summary.has_skipped());
}

#[test]
fn test_strict_mode_fails_on_unreadable_file() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.txt");
    let missing = dir.path().join("missing.txt");
    fs::write(&good, ARTICLE).unwrap();

    let strict = Deduplicator::new(DedupConfig::new(MetricKind::Levenshtein).with_strict(true));
    match strict.run_paths(&[good, missing.clone()]) {
        Err(EngineError::Unreadable { id, .. }) => assert_eq!(id, DocumentId::Path(missing)),
        other => panic!("expected Unreadable, got {other:?}"),
    }
}

#[test]
fn test_same_file_under_two_spellings_is_loaded_once() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, ARTICLE).unwrap();
    fs::write(&b, ARTICLE_EDIT).unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let alias = dir.path().join("sub").join("..").join("a.txt");

    assert_eq!(
        unique_paths(vec![a.clone(), alias.clone(), b.clone(), a.clone()]),
        vec![a.clone(), b.clone()]
    );

    let (result, summary) = jaccard().run_paths(&[a.clone(), alias, b.clone()]).unwrap();
    assert_eq!(summary.total_documents, 2);
    assert_eq!(result.representatives, vec![DocumentId::Path(a)]);
    assert_eq!(result.duplicate_pairs.len(), 1);
    assert_eq!(result.duplicate_pairs[0].duplicate, DocumentId::Path(b));
}

#[test]
fn test_ignore_and_hidden_filters() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("keep.txt"), ARTICLE).unwrap();
    fs::write(dir.path().join("draft-1.txt"), ARTICLE).unwrap();
    fs::write(dir.path().join(".hidden.txt"), ARTICLE).unwrap();

    let config = SourceConfig::default()
        .with_skip_hidden(true)
        .with_ignore_patterns(vec!["draft-*".to_string()]);
    let paths = DirectorySource::new(dir.path(), config).list().unwrap();
    assert_eq!(paths, vec![dir.path().join("keep.txt")]);
}

#[test]
fn test_all_files_reads_every_extension() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.md"), ARTICLE).unwrap();
    fs::write(dir.path().join("b"), ARTICLE).unwrap();

    let paths = DirectorySource::new(dir.path(), SourceConfig::default().all_files())
        .list()
        .unwrap();
    assert_eq!(paths.len(), 2);
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = tempdir().unwrap();
    let result = DirectorySource::new(&dir.path().join("nope"), SourceConfig::default()).list();
    assert!(result.is_err());
}

#[test]
fn test_pairs_lists_every_similar_pair() {
    let dir = tempdir().unwrap();
    let paths: Vec<PathBuf> = ["a.txt", "b.txt", "c.txt"]
        .iter()
        .map(|name| dir.path().join(name))
        .collect();
    fs::write(&paths[0], ARTICLE).unwrap();
    fs::write(&paths[1], ARTICLE).unwrap();
    fs::write(&paths[2], ARTICLE).unwrap();

    let (pairs, summary) = jaccard().pairs_paths(&paths).unwrap();
    assert_eq!(pairs.len(), 3);
    assert_eq!(summary.comparisons, 3);
    // Unlike clustering, b and c are also reported together
    assert!(pairs.iter().any(|p| p.representative == DocumentId::Path(paths[1].clone())
        && p.duplicate == DocumentId::Path(paths[2].clone())));

    let (result, _) = jaccard().run_paths(&paths).unwrap();
    assert_eq!(result.duplicate_pairs.len(), 2);
}

#[test]
fn test_every_metric_runs_on_a_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), ARTICLE).unwrap();
    fs::write(dir.path().join("b.txt"), ARTICLE).unwrap();
    fs::write(dir.path().join("c.txt"), UNRELATED).unwrap();
    let paths = DirectorySource::new(dir.path(), SourceConfig::default())
        .list()
        .unwrap();

    for metric in MetricKind::ALL {
        let (result, summary) = Deduplicator::with_defaults(metric).run_paths(&paths).unwrap();
        assert_eq!(result.duplicate_pairs.len(), 1, "{metric}");
        assert_eq!(summary.metric, metric);
        assert_eq!(summary.threshold, metric.default_threshold());
    }
}
