use super::{incompatible, MetricError, MetricKind, SimilarityMetric, SimilarityScore};
use crate::representation::Representation;

/// Minimum number of single-character insertions, deletions and substitutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl SimilarityMetric for Levenshtein {
    fn kind(&self) -> MetricKind {
        MetricKind::Levenshtein
    }

    fn score(
        &self,
        a: &Representation,
        b: &Representation,
    ) -> Result<SimilarityScore, MetricError> {
        match (a.as_raw_text(), b.as_raw_text()) {
            (Some(x), Some(y)) => Ok(SimilarityScore::new(
                MetricKind::Levenshtein,
                strsim::levenshtein(x, y) as f64,
            )),
            _ => Err(incompatible(MetricKind::Levenshtein, a, b)),
        }
    }
}
