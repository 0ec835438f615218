//! SimHash fingerprints.
//!
//! A fingerprint is a 64-bit summary of a document's whitespace tokens,
//! built so that documents sharing most of their tokens land a small Hamming
//! distance apart. Token order does not matter.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    normalize_text, CorpusContext, Representation, RepresentationBuilder, RepresentationError,
    RepresentationKind,
};
use crate::corpus::Document;

/// Width of a fingerprint in bits.
pub const FINGERPRINT_BITS: u32 = u64::BITS;

/// A 64-bit SimHash fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Wrap raw fingerprint bits.
    #[must_use]
    pub fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Compute the fingerprint of a text.
    #[must_use]
    pub fn of_text(text: &str) -> Self {
        Self(simhash::simhash(text))
    }

    /// Raw fingerprint bits.
    #[must_use]
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Number of differing bits.
    #[must_use]
    pub fn hamming_distance(self, other: Self) -> u32 {
        simhash::hamming_distance(self.0, other.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Builds [`Fingerprint`] representations.
#[derive(Debug, Clone, Default)]
pub struct SimHashBuilder {
    normalize: bool,
}

impl SimHashBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize text before fingerprinting.
    #[must_use]
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

impl RepresentationBuilder for SimHashBuilder {
    fn kind(&self) -> RepresentationKind {
        RepresentationKind::Fingerprint
    }

    fn build(
        &self,
        document: &Document,
        _context: &CorpusContext,
    ) -> Result<Representation, RepresentationError> {
        let fingerprint = if self.normalize {
            let text = normalize_text(document.text());
            ensure_tokens(document, &text)?;
            Fingerprint::of_text(&text)
        } else {
            ensure_tokens(document, document.text())?;
            Fingerprint::of_text(document.text())
        };

        log::trace!("Fingerprint {} for {}", fingerprint, document.id());
        Ok(Representation::Fingerprint(fingerprint))
    }
}

fn ensure_tokens(document: &Document, text: &str) -> Result<(), RepresentationError> {
    if text.split_whitespace().next().is_none() {
        return Err(RepresentationError::EmptyDocument {
            id: document.id().clone(),
            required: 1,
            found: 0,
        });
    }
    Ok(())
}
