//! CSV output formatter for deduplication results.
//!
//! One row is generated per document: representatives first, then every
//! duplicate.
//!
//! # Columns
//!
//! - `role`: `representative` or `duplicate`
//! - `document`: Document identifier (path or index)
//! - `representative`: The representative the document belongs to
//! - `metric`: Metric name
//! - `score`: Score against the representative (empty for representatives)

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::corpus::DocumentId;
use crate::engine::DuplicatePair;
use crate::metric::MetricKind;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single row in the CSV output.
#[derive(Debug, Serialize)]
struct CsvRow {
    role: &'static str,
    document: String,
    representative: String,
    metric: MetricKind,
    score: Option<f64>,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    metric: MetricKind,
    representatives: &'a [DocumentId],
    pairs: &'a [DuplicatePair],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(
        metric: MetricKind,
        representatives: &'a [DocumentId],
        pairs: &'a [DuplicatePair],
    ) -> Self {
        Self {
            metric,
            representatives,
            pairs,
        }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for id in self.representatives {
            csv_writer.serialize(CsvRow {
                role: "representative",
                document: id.to_string(),
                representative: id.to_string(),
                metric: self.metric,
                score: None,
            })?;
        }

        for pair in self.pairs {
            csv_writer.serialize(CsvRow {
                role: "duplicate",
                document: pair.duplicate.to_string(),
                representative: pair.representative.to_string(),
                metric: pair.score.metric,
                score: Some(pair.score.value),
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
