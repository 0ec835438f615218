//! Document representations and their builders.
//!
//! A representation is the comparable form of a document. Four variants exist,
//! each paired with one similarity metric:
//!
//! | Variant        | Builder             | Metric       |
//! |----------------|---------------------|--------------|
//! | `Fingerprint`  | [`SimHashBuilder`]  | Hamming      |
//! | `Shingles`     | [`ShingleBuilder`]  | Jaccard      |
//! | `RawText`      | [`RawTextBuilder`]  | Levenshtein  |
//! | `Vector`       | [`TfidfBuilder`]    | Cosine       |
//!
//! # Two-phase contract
//!
//! Building is split into [`RepresentationBuilder::fit`], which sees the whole
//! corpus once, and [`RepresentationBuilder::build`], which turns one document
//! into a representation. Per-document builders keep the default no-op `fit`;
//! the TF-IDF builder learns its vocabulary there. Once `fit` has returned,
//! `build` calls are independent and may run in parallel.
//!
//! # Example
//!
//! ```
//! use neardup::corpus::Corpus;
//! use neardup::representation::{RepresentationBuilder, ShingleBuilder};
//!
//! let corpus = Corpus::from_texts(["the cat sat on the mat"]);
//! let builder = ShingleBuilder::new(3);
//! let context = builder.fit(&corpus);
//! let rep = builder.build(&corpus.documents()[0], &context).unwrap();
//! assert_eq!(rep.as_shingles().unwrap().len(), 4);
//! ```

pub mod fingerprint;
pub mod raw;
pub mod shingle;
pub mod tfidf;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::corpus::{Corpus, Document, DocumentId};

pub use fingerprint::{Fingerprint, SimHashBuilder};
pub use raw::RawTextBuilder;
pub use shingle::{ShingleBuilder, ShingleSet, DEFAULT_SHINGLE_SIZE};
pub use tfidf::{SparseVector, TfidfBuilder, TfidfModel, DEFAULT_MAX_FEATURES};

/// The comparable form of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    /// 64-bit SimHash fingerprint.
    Fingerprint(Fingerprint),
    /// Set of word k-shingles.
    Shingles(ShingleSet),
    /// The text itself.
    RawText(String),
    /// Corpus-fitted TF-IDF vector.
    Vector(SparseVector),
}

impl Representation {
    /// The variant of this representation.
    #[must_use]
    pub fn kind(&self) -> RepresentationKind {
        match self {
            Self::Fingerprint(_) => RepresentationKind::Fingerprint,
            Self::Shingles(_) => RepresentationKind::ShingleSet,
            Self::RawText(_) => RepresentationKind::RawText,
            Self::Vector(_) => RepresentationKind::VectorSpace,
        }
    }

    /// Get the fingerprint, if this is one.
    #[must_use]
    pub fn as_fingerprint(&self) -> Option<Fingerprint> {
        match self {
            Self::Fingerprint(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the shingle set, if this is one.
    #[must_use]
    pub fn as_shingles(&self) -> Option<&ShingleSet> {
        match self {
            Self::Shingles(s) => Some(s),
            _ => None,
        }
    }

    /// Get the raw text, if this is one.
    #[must_use]
    pub fn as_raw_text(&self) -> Option<&str> {
        match self {
            Self::RawText(t) => Some(t),
            _ => None,
        }
    }

    /// Get the vector, if this is one.
    #[must_use]
    pub fn as_vector(&self) -> Option<&SparseVector> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }
}

/// Representation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentationKind {
    /// Fixed-width bit fingerprint.
    Fingerprint,
    /// Set of k-shingles.
    ShingleSet,
    /// Raw text.
    RawText,
    /// Vector in a corpus-fitted space.
    VectorSpace,
}

impl RepresentationKind {
    /// Whether the builder for this kind needs a corpus-wide fit.
    #[must_use]
    pub fn requires_fit(self) -> bool {
        matches!(self, Self::VectorSpace)
    }
}

impl fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fingerprint => write!(f, "fingerprint"),
            Self::ShingleSet => write!(f, "shingle set"),
            Self::RawText => write!(f, "raw text"),
            Self::VectorSpace => write!(f, "vector space embedding"),
        }
    }
}

/// State produced by [`RepresentationBuilder::fit`].
#[derive(Debug, Clone, Default)]
pub enum CorpusContext {
    /// No corpus-wide state; documents are built independently.
    #[default]
    PerDocument,
    /// Fitted TF-IDF vocabulary and IDF weights.
    Tfidf(Arc<TfidfModel>),
}

/// Errors that can occur while building a representation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RepresentationError {
    /// The document has too few tokens for this representation.
    #[error("Empty document {id}: {found} token(s), at least {required} required")]
    EmptyDocument {
        /// Offending document
        id: DocumentId,
        /// Minimum token count
        required: usize,
        /// Token count found
        found: usize,
    },

    /// A corpus-fitted builder was asked to build without a fitted context.
    #[error("No fitted corpus context available to build {id}")]
    MissingCorpusContext {
        /// Document being built
        id: DocumentId,
    },
}

/// Converts documents into comparable representations.
///
/// Implementations must be deterministic: the same document (and, for
/// corpus-fitted builders, the same corpus) always yields the same value.
pub trait RepresentationBuilder: Send + Sync {
    /// Variant produced by this builder.
    fn kind(&self) -> RepresentationKind;

    /// Corpus-wide fit. Per-document builders keep this no-op.
    fn fit(&self, _corpus: &Corpus) -> CorpusContext {
        CorpusContext::PerDocument
    }

    /// Build the representation of one document.
    ///
    /// # Errors
    ///
    /// Returns `RepresentationError` when the document cannot be represented.
    fn build(
        &self,
        document: &Document,
        context: &CorpusContext,
    ) -> Result<Representation, RepresentationError>;
}

/// Options shared by the builder factory.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderOptions {
    /// Shingle length in tokens.
    pub shingle_size: usize,
    /// Vocabulary cap for the TF-IDF builder.
    pub max_features: usize,
    /// Remove English stop words before TF-IDF fitting.
    pub stop_words: bool,
    /// Normalize text before building.
    pub normalize: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            shingle_size: DEFAULT_SHINGLE_SIZE,
            max_features: DEFAULT_MAX_FEATURES,
            stop_words: true,
            normalize: false,
        }
    }
}

/// Create the builder for a representation kind.
#[must_use]
pub fn builder_for(
    kind: RepresentationKind,
    options: &BuilderOptions,
) -> Box<dyn RepresentationBuilder> {
    match kind {
        RepresentationKind::Fingerprint => {
            Box::new(SimHashBuilder::new().with_normalize(options.normalize))
        }
        RepresentationKind::ShingleSet => Box::new(
            ShingleBuilder::new(options.shingle_size).with_normalize(options.normalize),
        ),
        RepresentationKind::RawText => {
            Box::new(RawTextBuilder::new().with_normalize(options.normalize))
        }
        RepresentationKind::VectorSpace => Box::new(
            TfidfBuilder::new()
                .with_max_features(options.max_features)
                .with_stop_words(options.stop_words),
        ),
    }
}

/// Normalize text for robust similarity comparison.
///
/// Normalization includes:
/// - Unicode NFC composition
/// - Converting to lowercase
/// - Removing ASCII punctuation
/// - Collapsing whitespace
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.nfc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
