//! Raw-text representation for edit-distance comparison.

use super::{
    normalize_text, CorpusContext, Representation, RepresentationBuilder, RepresentationError,
    RepresentationKind,
};
use crate::corpus::Document;

/// Builds [`Representation::RawText`]. Defined on every input, including empty text.
#[derive(Debug, Clone, Default)]
pub struct RawTextBuilder {
    normalize: bool,
}

impl RawTextBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize text before comparison.
    #[must_use]
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

impl RepresentationBuilder for RawTextBuilder {
    fn kind(&self) -> RepresentationKind {
        RepresentationKind::RawText
    }

    fn build(
        &self,
        document: &Document,
        _context: &CorpusContext,
    ) -> Result<Representation, RepresentationError> {
        let text = if self.normalize {
            normalize_text(document.text())
        } else {
            document.text().to_owned()
        };
        Ok(Representation::RawText(text))
    }
}
