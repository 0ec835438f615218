//! Greedy near-duplicate clustering and the end-to-end pipeline.
//!
//! # Overview
//!
//! - [`DedupEngine`] runs the greedy first-match clustering over documents
//!   that already have representations.
//! - [`Deduplicator`] drives a whole run: corpus fit, parallel build,
//!   clustering, with skipped documents and timings collected in a
//!   [`DedupSummary`].
//!
//! # Example
//!
//! ```
//! use neardup::corpus::Corpus;
//! use neardup::engine::{DedupConfig, Deduplicator};
//! use neardup::metric::MetricKind;
//!
//! let corpus = Corpus::from_texts([
//!     "the cat sat on the mat",
//!     "the cat sat on the mat today",
//!     "a completely different sentence about dogs",
//! ]);
//! let config = DedupConfig::new(MetricKind::Jaccard)
//!     .with_threshold(0.8)
//!     .with_shingle_size(3);
//! let (result, summary) = Deduplicator::new(config).run(&corpus).unwrap();
//!
//! assert_eq!(result.representatives.len(), 2);
//! assert_eq!(summary.duplicates, 1);
//! ```

pub mod cluster;
pub mod pipeline;

pub use cluster::{ClusterResult, DedupEngine, DuplicatePair};
pub use pipeline::{DedupConfig, DedupSummary, Deduplicator};

use crate::corpus::source::SourceError;
use crate::corpus::DocumentId;
use crate::metric::{MetricError, MetricKind};
use crate::representation::{RepresentationError, RepresentationKind};

/// Errors that can occur while deduplicating.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The representations do not match what the metric consumes.
    #[error("Metric {metric} expects {expected} representations, got {found}")]
    MetricMismatch {
        /// Configured metric
        metric: MetricKind,
        /// Variant the metric consumes
        expected: RepresentationKind,
        /// Variant that was supplied
        found: RepresentationKind,
    },

    /// Scoring or threshold validation failed.
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// A document could not be represented (strict mode only).
    #[error(transparent)]
    Representation(#[from] RepresentationError),

    /// Reading the corpus failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A file could not be read (strict mode only).
    #[error("Cannot read {id}: {reason}")]
    Unreadable {
        /// File that failed
        id: DocumentId,
        /// Why it failed
        reason: String,
    },

    /// The run was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Deduplication interrupted by user")]
    Interrupted,
}

impl EngineError {
    /// Check if this error is a user interruption.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            Self::Interrupted | Self::Source(SourceError::Interrupted)
        )
    }
}
