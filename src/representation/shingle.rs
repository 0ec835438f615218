//! Word k-shingles.
//!
//! A shingle is a window of `k` consecutive whitespace tokens. Each shingle is
//! stored as a 64-bit id taken from the BLAKE3 hash of its tokens, so sets are
//! compact and ids are stable across runs, platforms and compiler versions.

use std::collections::HashSet;

use super::{
    normalize_text, CorpusContext, Representation, RepresentationBuilder, RepresentationError,
    RepresentationKind,
};
use crate::corpus::Document;

/// Default shingle length in tokens.
pub const DEFAULT_SHINGLE_SIZE: usize = 5;

/// Set of shingle ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShingleSet {
    ids: HashSet<u64>,
}

impl ShingleSet {
    /// Shingle a text into windows of `k` tokens.
    ///
    /// Texts with fewer than `k` tokens produce an empty set.
    #[must_use]
    pub fn from_text(text: &str, k: usize) -> Self {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if k == 0 || tokens.len() < k {
            return Self::default();
        }
        Self {
            ids: tokens.windows(k).map(shingle_id).collect(),
        }
    }

    /// Number of distinct shingles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of shingles present in both sets.
    #[must_use]
    pub fn intersection_len(&self, other: &Self) -> usize {
        let (small, large) = if self.ids.len() <= other.ids.len() {
            (&self.ids, &other.ids)
        } else {
            (&other.ids, &self.ids)
        };
        small.iter().filter(|id| large.contains(id)).count()
    }

    /// Number of shingles present in either set.
    #[must_use]
    pub fn union_len(&self, other: &Self) -> usize {
        self.ids.len() + other.ids.len() - self.intersection_len(other)
    }

    /// Jaccard similarity `|A ∩ B| / |A ∪ B|`, defined as 0 when both sets are empty.
    #[must_use]
    pub fn jaccard(&self, other: &Self) -> f64 {
        let union = self.union_len(other);
        if union == 0 {
            return 0.0;
        }
        self.intersection_len(other) as f64 / union as f64
    }
}

impl FromIterator<u64> for ShingleSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Stable 64-bit id of one shingle.
fn shingle_id(tokens: &[&str]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    for token in tokens {
        hasher.update(token.as_bytes());
        // Unit separator keeps token boundaries distinct
        hasher.update(&[0x1f]);
    }
    let hash = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

/// Builds [`ShingleSet`] representations.
#[derive(Debug, Clone)]
pub struct ShingleBuilder {
    k: usize,
    normalize: bool,
}

impl ShingleBuilder {
    /// Create a builder for shingles of `k` tokens. `k` is clamped to at least 1.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            normalize: false,
        }
    }

    /// Normalize text before shingling.
    #[must_use]
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Shingle length in tokens.
    #[must_use]
    pub fn shingle_size(&self) -> usize {
        self.k
    }
}

impl Default for ShingleBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SHINGLE_SIZE)
    }
}

impl RepresentationBuilder for ShingleBuilder {
    fn kind(&self) -> RepresentationKind {
        RepresentationKind::ShingleSet
    }

    fn build(
        &self,
        document: &Document,
        _context: &CorpusContext,
    ) -> Result<Representation, RepresentationError> {
        let normalized;
        let text = if self.normalize {
            normalized = normalize_text(document.text());
            normalized.as_str()
        } else {
            document.text()
        };

        let found = text.split_whitespace().count();
        if found < self.k {
            return Err(RepresentationError::EmptyDocument {
                id: document.id().clone(),
                required: self.k,
                found,
            });
        }

        Ok(Representation::Shingles(ShingleSet::from_text(text, self.k)))
    }
}
