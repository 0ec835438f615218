//! Line-oriented text output.
//!
//! Representatives are written one per line; pairs as
//! `<representative> -- <duplicate>`.

use std::io::{self, Write};

use crate::corpus::DocumentId;
use crate::engine::DuplicatePair;

/// Separator between the two documents of a pair.
pub const PAIR_SEPARATOR: &str = " -- ";

/// Plain text formatter.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    representatives: &'a [DocumentId],
    pairs: &'a [DuplicatePair],
}

impl<'a> TextOutput<'a> {
    /// Create a new text formatter.
    #[must_use]
    pub fn new(representatives: &'a [DocumentId], pairs: &'a [DuplicatePair]) -> Self {
        Self {
            representatives,
            pairs,
        }
    }

    /// Write representatives, one per line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_representatives<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for id in self.representatives {
            writeln!(writer, "{id}")?;
        }
        Ok(())
    }

    /// Write pairs, one per line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_pairs<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for pair in self.pairs {
            writeln!(
                writer,
                "{}{}{}",
                pair.representative, PAIR_SEPARATOR, pair.duplicate
            )?;
        }
        Ok(())
    }

    /// Write representatives followed by pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.write_representatives(writer)?;
        self.write_pairs(writer)?;
        writer.flush()
    }
}
