//! End-to-end deduplication pipeline.
//!
//! # Phases
//!
//! 1. **Check**: builder and metric must agree on the representation, and the
//!    threshold must be in the metric's domain
//! 2. **Fit**: one corpus-wide pass for builders that need it (TF-IDF)
//! 3. **Build**: representations computed on a rayon pool, collected in input order
//! 4. **Cluster**: greedy first-match clustering, single-threaded
//!
//! Documents that cannot be represented are skipped with a warning, or abort
//! the run in strict mode.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;

use super::{ClusterResult, DedupEngine, DuplicatePair, EngineError};
use crate::corpus::source::{load_documents_with_progress, LoadedCorpus};
use crate::corpus::{Corpus, Document, DocumentId, SkippedDocument};
use crate::metric::MetricKind;
use crate::progress::ProgressCallback;
use crate::representation::{
    builder_for, BuilderOptions, Representation, RepresentationError, RepresentationKind,
};

/// Configuration for a deduplication run.
#[derive(Clone)]
pub struct DedupConfig {
    /// Similarity metric.
    pub metric: MetricKind,
    /// Threshold in the metric's unit; the metric default when `None`.
    pub threshold: Option<f64>,
    /// Representation to build; the one the metric expects when `None`.
    pub representation: Option<RepresentationKind>,
    /// Options passed to the representation builder.
    pub builder_options: BuilderOptions,
    /// Worker threads for building representations (0 = all cores).
    pub threads: usize,
    /// Abort on the first document that cannot be represented.
    pub strict: bool,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for DedupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupConfig")
            .field("metric", &self.metric)
            .field("threshold", &self.threshold)
            .field("representation", &self.representation)
            .field("builder_options", &self.builder_options)
            .field("threads", &self.threads)
            .field("strict", &self.strict)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self::new(MetricKind::default())
    }
}

impl DedupConfig {
    /// Create a configuration for a metric with all other settings at defaults.
    #[must_use]
    pub fn new(metric: MetricKind) -> Self {
        Self {
            metric,
            threshold: None,
            representation: None,
            builder_options: BuilderOptions::default(),
            threads: 0,
            strict: false,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Build a representation other than the one the metric expects.
    ///
    /// Any mismatch is rejected when the run starts.
    #[must_use]
    pub fn with_representation(mut self, kind: RepresentationKind) -> Self {
        self.representation = Some(kind);
        self
    }

    /// Set the shingle length.
    #[must_use]
    pub fn with_shingle_size(mut self, k: usize) -> Self {
        self.builder_options.shingle_size = k.max(1);
        self
    }

    /// Set the TF-IDF vocabulary cap.
    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.builder_options.max_features = max_features.max(1);
        self
    }

    /// Enable/disable English stop-word removal for TF-IDF.
    #[must_use]
    pub fn with_stop_words(mut self, enabled: bool) -> Self {
        self.builder_options.stop_words = enabled;
        self
    }

    /// Enable/disable text normalization before building.
    #[must_use]
    pub fn with_normalize(mut self, enabled: bool) -> Self {
        self.builder_options.normalize = enabled;
        self
    }

    /// Set the worker thread count (0 = all cores).
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Enable/disable strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// The threshold actually used.
    #[must_use]
    pub fn effective_threshold(&self) -> f64 {
        self.threshold
            .unwrap_or_else(|| self.metric.default_threshold())
    }

    /// The representation actually built.
    #[must_use]
    pub fn effective_representation(&self) -> RepresentationKind {
        self.representation
            .unwrap_or_else(|| self.metric.expects())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from a deduplication run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupSummary {
    /// Metric used
    pub metric: MetricKind,
    /// Threshold used
    pub threshold: f64,
    /// Documents in the corpus (after loading)
    pub total_documents: usize,
    /// Documents that were represented and clustered
    pub represented: usize,
    /// Documents kept as representatives
    pub representatives: usize,
    /// Documents judged duplicates (or similar pairs, in pair mode)
    pub duplicates: usize,
    /// Metric evaluations performed
    pub comparisons: usize,
    /// Documents left out, with reasons
    pub skipped: Vec<SkippedDocument>,
    /// Duration of the corpus fit
    #[serde(skip)]
    pub fit_duration: Duration,
    /// Duration of the representation build
    #[serde(skip)]
    pub build_duration: Duration,
    /// Duration of clustering
    #[serde(skip)]
    pub cluster_duration: Duration,
    /// Duration of the entire run
    #[serde(skip)]
    pub total_duration: Duration,
}

impl DedupSummary {
    /// Check if any document was skipped.
    #[must_use]
    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Percentage of represented documents that were duplicates.
    #[must_use]
    pub fn duplicate_percentage(&self) -> f64 {
        if self.represented == 0 {
            0.0
        } else {
            (self.duplicates as f64 / self.represented as f64) * 100.0
        }
    }
}

/// Runs the full deduplication pipeline.
///
/// # Example
///
/// ```no_run
/// use neardup::engine::{DedupConfig, Deduplicator};
/// use neardup::metric::MetricKind;
/// use std::path::PathBuf;
///
/// let dedup = Deduplicator::new(DedupConfig::new(MetricKind::Hamming));
/// let paths = vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")];
/// let (result, summary) = dedup.run_paths(&paths).unwrap();
/// println!("{} unique, {} skipped", result.representatives.len(), summary.skipped.len());
/// ```
#[derive(Debug)]
pub struct Deduplicator {
    config: DedupConfig,
}

impl Deduplicator {
    /// Create a new pipeline with the given configuration.
    #[must_use]
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// Create a pipeline for a metric with default settings.
    #[must_use]
    pub fn with_defaults(metric: MetricKind) -> Self {
        Self::new(DedupConfig::new(metric))
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Load files in the given order, then cluster them.
    ///
    /// Unreadable files are recorded as skipped.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run); also `EngineError::Source` on interruption while
    /// loading and `EngineError::Unreadable` for an unreadable file in strict mode.
    pub fn run_paths(
        &self,
        paths: &[PathBuf],
    ) -> Result<(ClusterResult, DedupSummary), EngineError> {
        let loaded = self.load(paths)?;
        let (result, mut summary) = self.run(&loaded.corpus)?;
        let mut skipped = loaded.skipped;
        skipped.append(&mut summary.skipped);
        summary.skipped = skipped;
        Ok((result, summary))
    }

    /// Cluster an in-memory corpus.
    ///
    /// # Errors
    ///
    /// - `EngineError::MetricMismatch` if the builder and metric disagree
    /// - `EngineError::Metric` if the threshold is invalid
    /// - `EngineError::Representation` in strict mode when a document fails
    /// - `EngineError::Interrupted` on shutdown
    pub fn run(&self, corpus: &Corpus) -> Result<(ClusterResult, DedupSummary), EngineError> {
        let start = Instant::now();
        let (engine, entries, mut summary) = self.prepare(corpus)?;

        let cluster_start = Instant::now();
        let (result, comparisons) = engine.cluster_counted(&entries)?;
        summary.cluster_duration = cluster_start.elapsed();
        summary.comparisons = comparisons;
        summary.representatives = result.representatives.len();
        summary.duplicates = result.duplicate_pairs.len();
        summary.total_duration = start.elapsed();

        log::info!(
            "Deduplication complete: {} unique, {} duplicate(s), {} skipped in {:.2?}",
            summary.representatives,
            summary.duplicates,
            summary.skipped.len(),
            summary.total_duration
        );

        Ok((result, summary))
    }

    /// List every similar pair in an in-memory corpus, without clustering.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn pairs(&self, corpus: &Corpus) -> Result<(Vec<DuplicatePair>, DedupSummary), EngineError> {
        let start = Instant::now();
        let (engine, entries, mut summary) = self.prepare(corpus)?;

        let cluster_start = Instant::now();
        let pairs = engine.similar_pairs(&entries)?;
        let n = entries.len();
        summary.comparisons = n * n.saturating_sub(1) / 2;
        summary.duplicates = pairs.len();
        summary.cluster_duration = cluster_start.elapsed();
        summary.total_duration = start.elapsed();

        Ok((pairs, summary))
    }

    /// Same as [`pairs`](Self::pairs), loading files first.
    ///
    /// # Errors
    ///
    /// Same as [`run_paths`](Self::run_paths).
    pub fn pairs_paths(
        &self,
        paths: &[PathBuf],
    ) -> Result<(Vec<DuplicatePair>, DedupSummary), EngineError> {
        let loaded = self.load(paths)?;
        let (pairs, mut summary) = self.pairs(&loaded.corpus)?;
        let mut skipped = loaded.skipped;
        skipped.append(&mut summary.skipped);
        summary.skipped = skipped;
        Ok((pairs, summary))
    }

    fn load(&self, paths: &[PathBuf]) -> Result<LoadedCorpus, EngineError> {
        let mut loaded = load_documents_with_progress(
            paths,
            self.config.shutdown_flag.as_ref(),
            self.config.progress_callback.as_ref(),
        )?;
        if self.config.strict && !loaded.skipped.is_empty() {
            let first = loaded.skipped.swap_remove(0);
            return Err(EngineError::Unreadable {
                id: first.id,
                reason: first.reason,
            });
        }
        Ok(loaded)
    }

    /// Check, fit and build. Returns the engine and the represented documents.
    #[allow(clippy::type_complexity)]
    fn prepare(
        &self,
        corpus: &Corpus,
    ) -> Result<(DedupEngine, Vec<(DocumentId, Representation)>, DedupSummary), EngineError>
    {
        let config = &self.config;
        let metric = config.metric;
        let kind = config.effective_representation();

        if kind != metric.expects() {
            return Err(EngineError::MetricMismatch {
                metric,
                expected: metric.expects(),
                found: kind,
            });
        }

        let mut engine = DedupEngine::for_metric(metric, config.threshold)?;
        if let Some(ref flag) = config.shutdown_flag {
            engine = engine.with_shutdown_flag(flag.clone());
        }
        if let Some(ref cb) = config.progress_callback {
            engine = engine.with_progress_callback(cb.clone());
        }

        let mut summary = DedupSummary {
            metric,
            threshold: engine.threshold(),
            total_documents: corpus.len(),
            ..DedupSummary::default()
        };

        if config.is_shutdown_requested() {
            return Err(EngineError::Interrupted);
        }

        let builder = builder_for(kind, &config.builder_options);

        // Fit is a barrier: every build below sees the finished context
        let fit_start = Instant::now();
        let context = builder.fit(corpus);
        summary.fit_duration = fit_start.elapsed();
        if kind.requires_fit() {
            log::info!(
                "Fitted {} over {} document(s) in {:.2?}",
                kind,
                corpus.len(),
                summary.fit_duration
            );
        }

        if config.is_shutdown_requested() {
            return Err(EngineError::Interrupted);
        }

        let build_start = Instant::now();
        let built = self.build_all(corpus, |doc| builder.build(doc, &context));
        summary.build_duration = build_start.elapsed();

        if config.is_shutdown_requested() {
            return Err(EngineError::Interrupted);
        }

        let mut entries = Vec::with_capacity(built.len());
        for (doc, outcome) in corpus.iter().zip(built) {
            match outcome {
                Some(Ok(rep)) => entries.push((doc.id().clone(), rep)),
                Some(Err(e)) => {
                    if config.strict {
                        return Err(EngineError::Representation(e));
                    }
                    log::warn!("Skipping {}: {}", doc.id(), e);
                    summary
                        .skipped
                        .push(SkippedDocument::new(doc.id().clone(), e.to_string()));
                }
                None => return Err(EngineError::Interrupted),
            }
        }

        summary.represented = entries.len();
        log::debug!(
            "Built {} {} representation(s) in {:.2?}",
            entries.len(),
            kind,
            summary.build_duration
        );

        Ok((engine, entries, summary))
    }

    /// Build every document on the worker pool. `None` marks documents skipped
    /// because shutdown was requested.
    fn build_all<F>(
        &self,
        corpus: &Corpus,
        build: F,
    ) -> Vec<Option<Result<Representation, RepresentationError>>>
    where
        F: Fn(&Document) -> Result<Representation, RepresentationError> + Send + Sync,
    {
        let config = &self.config;
        let progress = config.progress_callback.as_ref();
        let completed = AtomicUsize::new(0);

        if let Some(cb) = progress {
            cb.on_phase_start("building", corpus.len());
        }

        let run = || {
            corpus
                .documents()
                .par_iter()
                .map(|doc| {
                    if config.is_shutdown_requested() {
                        return None;
                    }
                    let outcome = build(doc);
                    if let Some(cb) = progress {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        cb.on_progress(done, &doc.id().to_string());
                    }
                    Some(outcome)
                })
                .collect::<Vec<_>>()
        };

        let built = match rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                log::warn!(
                    "Failed to create thread pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                run()
            }
        };

        if let Some(cb) = progress {
            cb.on_phase_end("building");
        }

        built
    }
}
