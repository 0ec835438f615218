//! TF-IDF vector space fitted over the whole corpus.
//!
//! # Overview
//!
//! Fitting learns a vocabulary and inverse document frequencies from every
//! document in the corpus; only then can individual documents be vectorized.
//! The weighting follows the usual smoothed scheme:
//!
//! - tokens: lowercase runs of two or more word characters
//! - optional English stop-word removal
//! - vocabulary: the `max_features` most frequent terms across the corpus
//!   (ties broken alphabetically), indexed in alphabetical order
//! - `idf(t) = ln((1 + n) / (1 + df(t))) + 1`
//! - `weight(t, d) = count(t, d) * idf(t)`, then L2-normalized per document

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::{CorpusContext, Representation, RepresentationBuilder, RepresentationError, RepresentationKind};
use crate::corpus::{Corpus, Document};

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 5000;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is a valid regex"));

/// Common English function words dropped when stop-word removal is enabled.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "also", "am", "among",
    "an", "and", "any", "are", "as", "at", "be", "became", "because", "been", "before", "being",
    "below", "between", "both", "but", "by", "can", "cannot", "could", "did", "do", "does",
    "doing", "done", "down", "during", "each", "either", "else", "etc", "even", "ever", "every",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "into", "is", "it",
    "its", "itself", "just", "least", "less", "may", "me", "might", "more", "most", "much",
    "must", "my", "myself", "neither", "never", "no", "nor", "not", "now", "of", "off", "often",
    "on", "once", "only", "or", "other", "otherwise", "our", "ours", "ourselves", "out", "over",
    "own", "per", "perhaps", "rather", "same", "she", "should", "since", "so", "some", "still",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "therefore", "these", "they", "this", "those", "though", "through", "thus", "to", "too",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what",
    "when", "where", "whether", "which", "while", "who", "whom", "whose", "why", "will", "with",
    "within", "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    ENGLISH_STOP_WORDS.binary_search(&token).is_ok()
}

/// Lowercase word tokens of two or more characters.
fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lower)
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Sparse vector with entries sorted by dimension index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f64)>,
}

impl SparseVector {
    /// Build from `(index, value)` pairs. Entries are sorted and zeros dropped.
    #[must_use]
    pub fn from_entries(mut entries: Vec<(u32, f64)>) -> Self {
        entries.retain(|&(_, v)| v != 0.0);
        entries.sort_by_key(|&(i, _)| i);
        Self { entries }
    }

    /// Non-zero entries in index order.
    #[must_use]
    pub fn entries(&self) -> &[(u32, f64)] {
        &self.entries
    }

    /// Number of non-zero entries.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Check if all components are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Euclidean norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|&(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_val) = self.entries[i];
            let (b_idx, b_val) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_val * b_val;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine of the angle between two vectors, clamped to [-1, 1].
    ///
    /// Returns 0 when either vector is zero.
    #[must_use]
    pub fn cosine(&self, other: &Self) -> f64 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0)
    }

    fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, v) in &mut self.entries {
                *v /= norm;
            }
        }
        self
    }
}

/// Fitted vocabulary and IDF weights.
#[derive(Debug, Clone, Default)]
pub struct TfidfModel {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f64>,
    stop_words: bool,
    documents: usize,
}

impl TfidfModel {
    /// Fit the model over an iterator of texts.
    pub fn fit<'a, I>(texts: I, max_features: usize, stop_words: bool) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut term_frequency: HashMap<String, usize> = HashMap::new();
        let mut documents = 0;

        for text in texts {
            documents += 1;
            let mut seen: HashMap<String, usize> = HashMap::new();
            for token in tokenize(text) {
                if stop_words && is_stop_word(&token) {
                    continue;
                }
                *seen.entry(token).or_default() += 1;
            }
            for (term, count) in seen {
                *term_frequency.entry(term.clone()).or_default() += count;
                *document_frequency.entry(term).or_default() += 1;
            }
        }

        let mut terms: Vec<(String, usize)> = term_frequency.into_iter().collect();
        if terms.len() > max_features {
            terms.sort_by(|(a_term, a_count), (b_term, b_count)| {
                b_count.cmp(a_count).then_with(|| a_term.cmp(b_term))
            });
            terms.truncate(max_features);
        }
        let mut selected: Vec<String> = terms.into_iter().map(|(term, _)| term).collect();
        selected.sort();

        let n = documents as f64;
        let mut vocabulary = HashMap::with_capacity(selected.len());
        let mut idf = Vec::with_capacity(selected.len());
        for (index, term) in selected.into_iter().enumerate() {
            let df = document_frequency.get(&term).copied().unwrap_or(0) as f64;
            idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term, index as u32);
        }

        log::debug!(
            "TF-IDF fitted on {} document(s), vocabulary size {}",
            documents,
            vocabulary.len()
        );

        Self {
            vocabulary,
            idf,
            stop_words,
            documents,
        }
    }

    /// Vectorize a text in the fitted space.
    #[must_use]
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<u32, usize> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *counts.entry(index).or_default() += 1;
            }
        }

        let entries = counts
            .into_iter()
            .map(|(index, count)| (index, count as f64 * self.idf[index as usize]))
            .collect();
        SparseVector::from_entries(entries).normalized()
    }

    /// Number of terms in the vocabulary.
    #[must_use]
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// IDF weight of a term, if it is in the vocabulary.
    #[must_use]
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary
            .get(term)
            .map(|&index| self.idf[index as usize])
    }

    /// Whether stop words were removed during fitting.
    #[must_use]
    pub fn removes_stop_words(&self) -> bool {
        self.stop_words
    }

    /// Number of documents seen during fitting.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents
    }
}

/// Builds TF-IDF [`SparseVector`] representations.
#[derive(Debug, Clone)]
pub struct TfidfBuilder {
    max_features: usize,
    stop_words: bool,
}

impl Default for TfidfBuilder {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            stop_words: true,
        }
    }
}

impl TfidfBuilder {
    /// Create a builder with the default vocabulary cap and stop-word removal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the vocabulary cap (at least 1).
    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features.max(1);
        self
    }

    /// Enable/disable English stop-word removal.
    #[must_use]
    pub fn with_stop_words(mut self, stop_words: bool) -> Self {
        self.stop_words = stop_words;
        self
    }
}

impl RepresentationBuilder for TfidfBuilder {
    fn kind(&self) -> RepresentationKind {
        RepresentationKind::VectorSpace
    }

    fn fit(&self, corpus: &Corpus) -> CorpusContext {
        let model = TfidfModel::fit(
            corpus.iter().map(Document::text),
            self.max_features,
            self.stop_words,
        );
        CorpusContext::Tfidf(Arc::new(model))
    }

    fn build(
        &self,
        document: &Document,
        context: &CorpusContext,
    ) -> Result<Representation, RepresentationError> {
        let CorpusContext::Tfidf(model) = context else {
            return Err(RepresentationError::MissingCorpusContext {
                id: document.id().clone(),
            });
        };

        // Only stop words or out-of-vocabulary terms: cosine is undefined
        let vector = model.transform(document.text());
        if vector.is_zero() {
            return Err(RepresentationError::EmptyDocument {
                id: document.id().clone(),
                required: 1,
                found: vector.nnz(),
            });
        }

        Ok(Representation::Vector(vector))
    }
}
