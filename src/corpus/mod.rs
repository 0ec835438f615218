//! Document model and corpus loading.
//!
//! This module provides functionality for:
//! - The immutable [`Document`] record and its [`DocumentId`]
//! - The ordered [`Corpus`] consumed by the rest of the pipeline
//! - Reading documents from a flat directory or an explicit file list
//!
//! # Ordering
//!
//! Every document carries an ordinal, assigned when it is pushed into a
//! [`Corpus`]. The ordinal defines comparison order and the tie-break: when two
//! documents collide, the one with the smaller ordinal is kept.
//!
//! # Example
//!
//! ```
//! use neardup::corpus::{Corpus, DocumentId};
//!
//! let corpus = Corpus::from_texts(["first text", "second text"]);
//! assert_eq!(corpus.len(), 2);
//! assert_eq!(corpus.documents()[1].id(), &DocumentId::Index(1));
//! ```

pub mod source;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use source::{
    load_documents, load_documents_with_progress, path_key, read_document, unique_paths,
    DirectorySource, LoadedCorpus, SourceConfig, SourceError,
};

/// Stable identifier of a document within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    /// Document read from a file.
    Path(PathBuf),
    /// In-memory document, identified by its position in the input list.
    Index(usize),
}

impl DocumentId {
    /// Get the file path, if this document came from disk.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<PathBuf> for DocumentId {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<usize> for DocumentId {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A text document. The text is immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: DocumentId,
    ordinal: usize,
    text: String,
}

impl Document {
    /// Document identifier.
    #[must_use]
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Position in the input sequence.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Raw text content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered collection of documents.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Create an empty corpus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from in-memory texts, identified by their index.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut corpus = Self::new();
        for (i, text) in texts.into_iter().enumerate() {
            corpus.push(DocumentId::Index(i), text);
        }
        corpus
    }

    /// Append a document; its ordinal is the current length of the corpus.
    pub fn push(&mut self, id: impl Into<DocumentId>, text: impl Into<String>) {
        let ordinal = self.documents.len();
        self.documents.push(Document {
            id: id.into(),
            ordinal,
            text: text.into(),
        });
    }

    /// Documents in input order.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the corpus is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate over documents in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// Errors that can occur while reading a single document.
#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    /// The file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file content is not valid UTF-8.
    #[error("Invalid UTF-8 in {path} at byte {valid_up_to}")]
    Encoding {
        /// Path of the offending file
        path: PathBuf,
        /// Length of the valid UTF-8 prefix
        valid_up_to: usize,
    },

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    /// Path of the document that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Encoding { path, .. } | Self::Io { path, .. } => path,
        }
    }
}

/// A document that was left out of the run, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDocument {
    /// Identifier of the skipped document
    pub id: DocumentId,
    /// Human-readable reason
    pub reason: String,
}

impl SkippedDocument {
    /// Create a new skipped-document record.
    #[must_use]
    pub fn new(id: DocumentId, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }
}
