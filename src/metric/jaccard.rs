use super::{incompatible, MetricError, MetricKind, SimilarityMetric, SimilarityScore};
use crate::representation::Representation;

/// `|A ∩ B| / |A ∪ B|` over shingle sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jaccard;

impl SimilarityMetric for Jaccard {
    fn kind(&self) -> MetricKind {
        MetricKind::Jaccard
    }

    fn score(
        &self,
        a: &Representation,
        b: &Representation,
    ) -> Result<SimilarityScore, MetricError> {
        match (a.as_shingles(), b.as_shingles()) {
            (Some(x), Some(y)) => Ok(SimilarityScore::new(MetricKind::Jaccard, x.jaccard(y))),
            _ => Err(incompatible(MetricKind::Jaccard, a, b)),
        }
    }
}
