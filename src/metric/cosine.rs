use super::{incompatible, MetricError, MetricKind, SimilarityMetric, SimilarityScore};
use crate::representation::Representation;

/// Cosine of the angle between two vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl SimilarityMetric for Cosine {
    fn kind(&self) -> MetricKind {
        MetricKind::Cosine
    }

    fn score(
        &self,
        a: &Representation,
        b: &Representation,
    ) -> Result<SimilarityScore, MetricError> {
        match (a.as_vector(), b.as_vector()) {
            (Some(x), Some(y)) => Ok(SimilarityScore::new(MetricKind::Cosine, x.cosine(y))),
            _ => Err(incompatible(MetricKind::Cosine, a, b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representation::SparseVector;

    fn vector(entries: Vec<(u32, f64)>) -> Representation {
        Representation::Vector(SparseVector::from_entries(entries))
    }

    #[test]
    fn test_cosine_parallel_and_orthogonal() {
        let a = vector(vec![(0, 1.0), (1, 1.0)]);
        let b = vector(vec![(0, 2.0), (1, 2.0)]);
        let c = vector(vec![(2, 1.0)]);

        let same = Cosine.score(&a, &b).unwrap();
        assert!((same.value - 1.0).abs() < 1e-12);
        assert!(Cosine.is_duplicate(same, 0.95));

        let orthogonal = Cosine.score(&a, &c).unwrap();
        assert_eq!(orthogonal.value, 0.0);
        assert!(!Cosine.is_duplicate(orthogonal, 0.95));
    }

    #[test]
    fn test_cosine_zero_vector() {
        let zero = vector(vec![]);
        let a = vector(vec![(0, 1.0)]);
        assert_eq!(Cosine.score(&zero, &a).unwrap().value, 0.0);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = vector(vec![(0, 1.0)]);
        let b = vector(vec![(0, -1.0)]);
        assert!((Cosine.score(&a, &b).unwrap().value + 1.0).abs() < 1e-12);
    }
}
