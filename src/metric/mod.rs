//! Similarity metrics over document representations.
//!
//! Each metric consumes exactly one [`RepresentationKind`] and scores pairs in
//! its own unit. Whether a score counts as a duplicate depends on the metric's
//! [`Direction`]: distances must stay at or below the threshold, similarities
//! must reach it.
//!
//! | Metric        | Expects        | Direction | Domain     | Default threshold |
//! |---------------|----------------|-----------|------------|-------------------|
//! | `hamming`     | fingerprint    | distance  | 0..=64     | 3                 |
//! | `jaccard`     | shingle set    | similarity| 0.0..=1.0  | 0.8               |
//! | `levenshtein` | raw text       | distance  | 0..        | 50                |
//! | `cosine`      | vector space   | similarity| -1.0..=1.0 | 0.95              |

mod cosine;
mod hamming;
mod jaccard;
mod levenshtein;

use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::representation::{Representation, RepresentationKind};

pub use cosine::Cosine;
pub use hamming::Hamming;
pub use jaccard::Jaccard;
pub use levenshtein::Levenshtein;

/// Available similarity metrics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Bit distance between SimHash fingerprints
    #[default]
    Hamming,
    /// Overlap of word shingle sets
    Jaccard,
    /// Character edit distance between raw texts
    Levenshtein,
    /// Angle between TF-IDF vectors
    Cosine,
}

impl MetricKind {
    /// All metrics, in declaration order.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Hamming,
        MetricKind::Jaccard,
        MetricKind::Levenshtein,
        MetricKind::Cosine,
    ];

    /// Representation consumed by this metric.
    #[must_use]
    pub fn expects(self) -> RepresentationKind {
        match self {
            Self::Hamming => RepresentationKind::Fingerprint,
            Self::Jaccard => RepresentationKind::ShingleSet,
            Self::Levenshtein => RepresentationKind::RawText,
            Self::Cosine => RepresentationKind::VectorSpace,
        }
    }

    /// Which side of the threshold counts as a duplicate.
    #[must_use]
    pub fn direction(self) -> Direction {
        match self {
            Self::Hamming | Self::Levenshtein => Direction::LowerIsCloser,
            Self::Jaccard | Self::Cosine => Direction::HigherIsCloser,
        }
    }

    /// Range of valid scores (and thresholds).
    #[must_use]
    pub fn domain(self) -> Domain {
        match self {
            Self::Hamming => Domain::integral(0.0, Some(f64::from(u64::BITS))),
            Self::Jaccard => Domain::real(0.0, Some(1.0)),
            Self::Levenshtein => Domain::integral(0.0, None),
            Self::Cosine => Domain::real(-1.0, Some(1.0)),
        }
    }

    /// Threshold used when none is configured.
    #[must_use]
    pub fn default_threshold(self) -> f64 {
        match self {
            Self::Hamming => 3.0,
            Self::Jaccard => 0.8,
            Self::Levenshtein => 50.0,
            Self::Cosine => 0.95,
        }
    }

    /// Instantiate the metric.
    #[must_use]
    pub fn build(self) -> Box<dyn SimilarityMetric> {
        match self {
            Self::Hamming => Box::new(Hamming),
            Self::Jaccard => Box::new(Jaccard),
            Self::Levenshtein => Box::new(Levenshtein),
            Self::Cosine => Box::new(Cosine),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hamming => write!(f, "hamming"),
            Self::Jaccard => write!(f, "jaccard"),
            Self::Levenshtein => write!(f, "levenshtein"),
            Self::Cosine => write!(f, "cosine"),
        }
    }
}

/// Threshold comparison direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Distance: duplicate iff `score <= threshold`
    LowerIsCloser,
    /// Similarity: duplicate iff `score >= threshold`
    HigherIsCloser,
}

impl Direction {
    /// Apply the threshold rule.
    #[must_use]
    pub fn passes(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::LowerIsCloser => value <= threshold,
            Self::HigherIsCloser => value >= threshold,
        }
    }
}

/// Closed range of values a metric can produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    /// Smallest possible value
    pub min: f64,
    /// Largest possible value, if bounded
    pub max: Option<f64>,
    /// Scores are whole numbers
    pub integral: bool,
}

impl Domain {
    fn integral(min: f64, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            integral: true,
        }
    }

    fn real(min: f64, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            integral: false,
        }
    }

    /// Check if a value lies in the domain.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && self.max.is_none_or(|max| value <= max)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {}]", self.min, max),
            None => write!(f, "[{}, inf)", self.min),
        }
    }
}

/// A score tagged with the metric that produced it.
///
/// Scores of different metrics are not comparable: `partial_cmp` returns
/// `None` across metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    /// Metric that produced the score
    pub metric: MetricKind,
    /// Score value in the metric's unit
    pub value: f64,
}

impl SimilarityScore {
    /// Create a new score.
    #[must_use]
    pub fn new(metric: MetricKind, value: f64) -> Self {
        Self { metric, value }
    }
}

impl PartialOrd for SimilarityScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.metric != other.metric {
            return None;
        }
        self.value.partial_cmp(&other.value)
    }
}

impl fmt::Display for SimilarityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.metric.domain().integral {
            write!(f, "{}: {}", self.metric, self.value)
        } else {
            write!(f, "{}: {:.4}", self.metric, self.value)
        }
    }
}

/// Errors that can occur while scoring.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    /// A representation of the wrong variant was passed to a metric.
    #[error("Metric {metric} expects a {expected} representation, got {found}")]
    IncompatibleRepresentation {
        /// Metric doing the scoring
        metric: MetricKind,
        /// Variant the metric consumes
        expected: RepresentationKind,
        /// Variant it received
        found: RepresentationKind,
    },

    /// The threshold lies outside the metric's domain.
    #[error("Invalid {metric} threshold {threshold}: must lie in {domain}")]
    InvalidThreshold {
        /// Metric being configured
        metric: MetricKind,
        /// Rejected value
        threshold: f64,
        /// Valid range
        domain: Domain,
    },
}

/// Scores pairs of representations.
pub trait SimilarityMetric: Send + Sync {
    /// Which metric this is.
    fn kind(&self) -> MetricKind;

    /// Representation consumed by this metric.
    fn expects(&self) -> RepresentationKind {
        self.kind().expects()
    }

    /// Which side of the threshold counts as a duplicate.
    fn direction(&self) -> Direction {
        self.kind().direction()
    }

    /// Range of valid scores.
    fn domain(&self) -> Domain {
        self.kind().domain()
    }

    /// Score a pair of representations.
    ///
    /// # Errors
    ///
    /// Returns `MetricError::IncompatibleRepresentation` if either input is not
    /// the variant this metric expects.
    fn score(
        &self,
        a: &Representation,
        b: &Representation,
    ) -> Result<SimilarityScore, MetricError>;

    /// Apply the threshold rule to a score produced by this metric.
    fn is_duplicate(&self, score: SimilarityScore, threshold: f64) -> bool {
        debug_assert_eq!(score.metric, self.kind());
        self.direction().passes(score.value, threshold)
    }

    /// Check that a threshold is meaningful for this metric.
    ///
    /// # Errors
    ///
    /// Returns `MetricError::InvalidThreshold` if it is NaN or out of domain.
    fn validate_threshold(&self, threshold: f64) -> Result<(), MetricError> {
        let domain = self.domain();
        if domain.contains(threshold) {
            Ok(())
        } else {
            Err(MetricError::InvalidThreshold {
                metric: self.kind(),
                threshold,
                domain,
            })
        }
    }
}

/// Build the incompatibility error for a pair where at least one side is wrong.
fn incompatible(metric: MetricKind, a: &Representation, b: &Representation) -> MetricError {
    let expected = metric.expects();
    let found = if a.kind() == expected {
        b.kind()
    } else {
        a.kind()
    };
    MetricError::IncompatibleRepresentation {
        metric,
        expected,
        found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representation::Fingerprint;

    #[test]
    fn test_metric_pairs_with_representation() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.build().kind(), kind);
            assert_eq!(kind.build().expects(), kind.expects());
        }
    }

    #[test]
    fn test_default_thresholds_in_domain() {
        for kind in MetricKind::ALL {
            let metric = kind.build();
            assert!(metric.validate_threshold(kind.default_threshold()).is_ok());
        }
    }

    #[test]
    fn test_direction_rule() {
        assert!(Direction::LowerIsCloser.passes(3.0, 3.0));
        assert!(!Direction::LowerIsCloser.passes(4.0, 3.0));
        assert!(Direction::HigherIsCloser.passes(0.8, 0.8));
        assert!(!Direction::HigherIsCloser.passes(0.79, 0.8));
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(Jaccard.validate_threshold(1.5).is_err());
        assert!(Jaccard.validate_threshold(f64::NAN).is_err());
        assert!(Hamming.validate_threshold(65.0).is_err());
        assert!(Levenshtein.validate_threshold(-1.0).is_err());
        assert!(Levenshtein.validate_threshold(10_000.0).is_ok());
        assert!(Cosine.validate_threshold(-1.0).is_ok());
    }

    #[test]
    fn test_scores_across_metrics_not_comparable() {
        let a = SimilarityScore::new(MetricKind::Hamming, 1.0);
        let b = SimilarityScore::new(MetricKind::Levenshtein, 2.0);
        assert_eq!(a.partial_cmp(&b), None);

        let c = SimilarityScore::new(MetricKind::Hamming, 2.0);
        assert_eq!(a.partial_cmp(&c), Some(Ordering::Less));
    }

    #[test]
    fn test_score_display() {
        assert_eq!(
            SimilarityScore::new(MetricKind::Hamming, 2.0).to_string(),
            "hamming: 2"
        );
        assert_eq!(
            SimilarityScore::new(MetricKind::Jaccard, 0.8).to_string(),
            "jaccard: 0.8000"
        );
    }

    #[test]
    fn test_incompatible_reports_wrong_side() {
        let fp = Representation::Fingerprint(Fingerprint::new(1));
        let raw = Representation::RawText("x".into());
        let err = Hamming.score(&fp, &raw).unwrap_err();
        assert_eq!(
            err,
            MetricError::IncompatibleRepresentation {
                metric: MetricKind::Hamming,
                expected: RepresentationKind::Fingerprint,
                found: RepresentationKind::RawText,
            }
        );
    }

    #[test]
    fn test_metric_kind_serde() {
        let json = serde_json::to_string(&MetricKind::Levenshtein).unwrap();
        assert_eq!(json, "\"levenshtein\"");
        let kind: MetricKind = serde_json::from_str("\"cosine\"").unwrap();
        assert_eq!(kind, MetricKind::Cosine);
    }
}
