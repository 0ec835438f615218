//! Greedy first-match clustering.
//!
//! Documents are visited in input order. Each one is compared against the
//! current representatives, oldest first, and attached to the first one whose
//! score passes the threshold. A document that matches nothing becomes a new
//! representative.
//!
//! This is single-linkage against representatives only: a duplicate never
//! attracts later documents, and the result depends on input order. The
//! engine never reorders its input.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::EngineError;
use crate::corpus::DocumentId;
use crate::metric::{MetricKind, SimilarityMetric, SimilarityScore};
use crate::progress::ProgressCallback;
use crate::representation::Representation;

/// A duplicate attached to its representative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// Kept document
    pub representative: DocumentId,
    /// Document judged a near-duplicate of the representative
    pub duplicate: DocumentId,
    /// Score between the two
    pub score: SimilarityScore,
}

/// Outcome of one clustering run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    /// Kept documents, in input order
    pub representatives: Vec<DocumentId>,
    /// Every removed document with the representative it matched
    pub duplicate_pairs: Vec<DuplicatePair>,
}

impl ClusterResult {
    /// Number of documents clustered.
    #[must_use]
    pub fn total(&self) -> usize {
        self.representatives.len() + self.duplicate_pairs.len()
    }

    /// Check if any duplicate was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.duplicate_pairs.is_empty()
    }

    /// Duplicates of one representative, in input order.
    pub fn duplicates_of<'a>(
        &'a self,
        representative: &'a DocumentId,
    ) -> impl Iterator<Item = &'a DocumentId> + 'a {
        self.duplicate_pairs
            .iter()
            .filter(move |p| &p.representative == representative)
            .map(|p| &p.duplicate)
    }
}

/// Clusters represented documents with one metric and threshold.
pub struct DedupEngine {
    metric: Box<dyn SimilarityMetric>,
    threshold: f64,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for DedupEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupEngine")
            .field("metric", &self.metric.kind())
            .field("threshold", &self.threshold)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl DedupEngine {
    /// Create an engine for a metric and threshold.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Metric` if the threshold is outside the metric's domain.
    pub fn new(metric: Box<dyn SimilarityMetric>, threshold: f64) -> Result<Self, EngineError> {
        metric.validate_threshold(threshold)?;
        Ok(Self {
            metric,
            threshold,
            shutdown_flag: None,
            progress_callback: None,
        })
    }

    /// Create an engine for a metric kind, using its default threshold when none is given.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Metric` if the threshold is outside the metric's domain.
    pub fn for_metric(kind: MetricKind, threshold: Option<f64>) -> Result<Self, EngineError> {
        Self::new(
            kind.build(),
            threshold.unwrap_or_else(|| kind.default_threshold()),
        )
    }

    /// Set the shutdown flag checked between documents.
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

    /// The configured metric.
    #[must_use]
    pub fn metric(&self) -> &dyn SimilarityMetric {
        self.metric.as_ref()
    }

    /// The configured threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Fail before any comparison if a representation has the wrong variant.
    fn check_representations(
        &self,
        entries: &[(DocumentId, Representation)],
    ) -> Result<(), EngineError> {
        let expected = self.metric.expects();
        if let Some((id, rep)) = entries.iter().find(|(_, rep)| rep.kind() != expected) {
            log::error!(
                "Representation of {} is a {}, metric {} needs {}",
                id,
                rep.kind(),
                self.metric.kind(),
                expected
            );
            return Err(EngineError::MetricMismatch {
                metric: self.metric.kind(),
                expected,
                found: rep.kind(),
            });
        }
        Ok(())
    }

    /// Cluster documents in input order.
    ///
    /// `entries` pairs each document id with its representation; the slice
    /// order is the comparison order.
    ///
    /// # Errors
    ///
    /// - `EngineError::MetricMismatch` if any representation has the wrong variant
    ///   (checked before any comparison)
    /// - `EngineError::Interrupted` if shutdown is requested between documents
    pub fn cluster(
        &self,
        entries: &[(DocumentId, Representation)],
    ) -> Result<ClusterResult, EngineError> {
        self.cluster_counted(entries).map(|(result, _)| result)
    }

    /// Same as [`cluster`](Self::cluster), also returning the number of comparisons made.
    ///
    /// # Errors
    ///
    /// Same as [`cluster`](Self::cluster).
    pub fn cluster_counted(
        &self,
        entries: &[(DocumentId, Representation)],
    ) -> Result<(ClusterResult, usize), EngineError> {
        self.check_representations(entries)?;

        log::info!(
            "Clustering {} document(s) with {} (threshold {})",
            entries.len(),
            self.metric.kind(),
            self.threshold
        );

        if let Some(ref cb) = self.progress_callback {
            cb.on_phase_start("clustering", entries.len());
        }

        let mut result = ClusterResult::default();
        // Indices into `entries` of the representatives, in insertion order
        let mut kept: Vec<usize> = Vec::new();
        let mut comparisons = 0usize;

        for (i, (id, rep)) in entries.iter().enumerate() {
            if self.is_shutdown_requested() {
                log::debug!("Clustering: Shutdown requested after {} document(s)", i);
                return Err(EngineError::Interrupted);
            }

            let mut matched = None;
            for &k in &kept {
                let score = self.metric.score(&entries[k].1, rep)?;
                comparisons += 1;
                if self.metric.is_duplicate(score, self.threshold) {
                    matched = Some((k, score));
                    break;
                }
            }

            match matched {
                Some((k, score)) => {
                    let representative = &entries[k].0;
                    log::info!("Duplicate found: {} is similar to {} ({})", id, representative, score);
                    result.duplicate_pairs.push(DuplicatePair {
                        representative: representative.clone(),
                        duplicate: id.clone(),
                        score,
                    });
                }
                None => {
                    log::trace!("New representative: {}", id);
                    kept.push(i);
                    result.representatives.push(id.clone());
                }
            }

            if let Some(ref cb) = self.progress_callback {
                cb.on_progress(i + 1, &id.to_string());
            }
        }

        if let Some(ref cb) = self.progress_callback {
            cb.on_phase_end("clustering");
        }

        log::info!(
            "Clustering complete: {} representative(s), {} duplicate(s), {} comparison(s)",
            result.representatives.len(),
            result.duplicate_pairs.len(),
            comparisons
        );

        Ok((result, comparisons))
    }

    /// List every pair `(i, j)` with `i < j` whose score passes the threshold.
    ///
    /// Unlike [`cluster`](Self::cluster) this compares all pairs and selects no
    /// representatives; a document may appear in many pairs. The earlier
    /// document is reported as `representative`.
    ///
    /// # Errors
    ///
    /// Same as [`cluster`](Self::cluster).
    pub fn similar_pairs(
        &self,
        entries: &[(DocumentId, Representation)],
    ) -> Result<Vec<DuplicatePair>, EngineError> {
        self.check_representations(entries)?;

        if let Some(ref cb) = self.progress_callback {
            cb.on_phase_start("comparing", entries.len());
        }

        let mut pairs = Vec::new();
        for (i, (left_id, left)) in entries.iter().enumerate() {
            if self.is_shutdown_requested() {
                return Err(EngineError::Interrupted);
            }

            for (right_id, right) in &entries[i + 1..] {
                let score = self.metric.score(left, right)?;
                if self.metric.is_duplicate(score, self.threshold) {
                    log::debug!("Similar pair: {} and {} ({})", left_id, right_id, score);
                    pairs.push(DuplicatePair {
                        representative: left_id.clone(),
                        duplicate: right_id.clone(),
                        score,
                    });
                }
            }

            if let Some(ref cb) = self.progress_callback {
                cb.on_progress(i + 1, &left_id.to_string());
            }
        }

        if let Some(ref cb) = self.progress_callback {
            cb.on_phase_end("comparing");
        }

        log::info!("Found {} similar pair(s)", pairs.len());
        Ok(pairs)
    }
}
