use neardup::actions::{
    delete_batch, DeleteConfig, DeleteError, DeletionPlan, NoDeleteProgress,
};
use neardup::corpus::Corpus;
use neardup::engine::{DedupConfig, Deduplicator};
use neardup::metric::MetricKind;
use std::fs;
use tempfile::tempdir;

const TEXT: &str = "meeting notes: ship the release candidate on friday after final review";

#[test]
fn test_permanent_delete_removes_only_duplicates() {
    let dir = tempdir().unwrap();
    let keep = dir.path().join("a.txt");
    let dup1 = dir.path().join("b.txt");
    let dup2 = dir.path().join("c.txt");
    for path in [&keep, &dup1, &dup2] {
        fs::write(path, TEXT).unwrap();
    }

    let (result, _) = Deduplicator::with_defaults(MetricKind::Levenshtein)
        .run_paths(&[keep.clone(), dup1.clone(), dup2.clone()])
        .unwrap();
    let plan = DeletionPlan::from_result(&result).unwrap();
    assert_eq!(plan.paths(), &[dup1.clone(), dup2.clone()]);

    let outcome = delete_batch::<NoDeleteProgress>(&plan, &DeleteConfig::permanent(), None);
    assert!(outcome.all_succeeded());
    assert_eq!(outcome.success_count(), 2);
    assert_eq!(outcome.bytes_freed, 2 * TEXT.len() as u64);

    assert!(keep.exists());
    assert!(!dup1.exists());
    assert!(!dup2.exists());
}

#[test]
fn test_dry_run_touches_nothing() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, TEXT).unwrap();
    fs::write(&b, TEXT).unwrap();

    let (result, _) = Deduplicator::with_defaults(MetricKind::Hamming)
        .run_paths(&[a.clone(), b.clone()])
        .unwrap();
    let plan = DeletionPlan::from_result(&result).unwrap();
    let outcome = delete_batch::<NoDeleteProgress>(
        &plan,
        &DeleteConfig::permanent().with_dry_run(true),
        None,
    );

    assert!(outcome.dry_run);
    assert_eq!(outcome.success_count(), 1);
    assert!(outcome.summary().starts_with("Would delete"));
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn test_in_memory_documents_cannot_be_deleted() {
    let corpus = Corpus::from_texts([TEXT, TEXT]);
    let (result, _) = Deduplicator::new(DedupConfig::new(MetricKind::Cosine))
        .run(&corpus)
        .unwrap();
    assert!(matches!(
        DeletionPlan::from_result(&result),
        Err(DeleteError::NotAFile(_))
    ));
}

#[test]
fn test_missing_file_is_reported_and_batch_continues() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    for path in [&a, &b, &c] {
        fs::write(path, TEXT).unwrap();
    }

    let (result, _) = Deduplicator::with_defaults(MetricKind::Jaccard)
        .run_paths(&[a.clone(), b.clone(), c.clone()])
        .unwrap();
    let plan = DeletionPlan::from_result(&result).unwrap();
    fs::remove_file(&b).unwrap();

    let outcome = delete_batch::<NoDeleteProgress>(&plan, &DeleteConfig::permanent(), None);
    assert_eq!(outcome.failure_count(), 1);
    assert_eq!(outcome.success_count(), 1);
    assert!(a.exists());
    assert!(!c.exists());
}
