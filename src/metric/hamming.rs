use super::{incompatible, MetricError, MetricKind, SimilarityMetric, SimilarityScore};
use crate::representation::Representation;

/// Number of differing bits between two fingerprints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hamming;

impl SimilarityMetric for Hamming {
    fn kind(&self) -> MetricKind {
        MetricKind::Hamming
    }

    fn score(
        &self,
        a: &Representation,
        b: &Representation,
    ) -> Result<SimilarityScore, MetricError> {
        match (a.as_fingerprint(), b.as_fingerprint()) {
            (Some(x), Some(y)) => Ok(SimilarityScore::new(
                MetricKind::Hamming,
                f64::from(x.hamming_distance(y)),
            )),
            _ => Err(incompatible(MetricKind::Hamming, a, b)),
        }
    }
}
