//! JSON output formatter for deduplication results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2024-05-01T12:00:00+00:00",
//!   "representatives": ["docs/a.txt", "docs/c.txt"],
//!   "duplicates": [
//!     {
//!       "representative": "docs/a.txt",
//!       "duplicate": "docs/b.txt",
//!       "metric": "hamming",
//!       "score": 2.0
//!     }
//!   ],
//!   "skipped": [{ "id": "docs/bin.txt", "reason": "Invalid UTF-8 ..." }],
//!   "summary": {
//!     "metric": "hamming",
//!     "threshold": 3.0,
//!     "total_documents": 4,
//!     "duplicates": 1,
//!     "exit_code": 3,
//!     "exit_code_name": "ND003"
//!   }
//! }
//! ```
//!
//! `representatives` is omitted for pair listings, which select none.

use std::io::Write;

use chrono::Utc;
use serde::Serialize;

use crate::corpus::SkippedDocument;
use crate::engine::{ClusterResult, DedupSummary, DuplicatePair};
use crate::error::ExitCode;
use crate::metric::MetricKind;

/// A single duplicate pair in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonPair {
    /// Kept document
    pub representative: String,
    /// Near-duplicate document
    pub duplicate: String,
    /// Metric that produced the score
    pub metric: MetricKind,
    /// Score in the metric's unit
    pub score: f64,
}

impl From<&DuplicatePair> for JsonPair {
    fn from(pair: &DuplicatePair) -> Self {
        Self {
            representative: pair.representative.to_string(),
            duplicate: pair.duplicate.to_string(),
            metric: pair.score.metric,
            score: pair.score.value,
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Metric used
    pub metric: MetricKind,
    /// Threshold used
    pub threshold: f64,
    /// Documents in the corpus
    pub total_documents: usize,
    /// Documents represented and compared
    pub represented: usize,
    /// Documents kept
    pub representatives: usize,
    /// Duplicates (or similar pairs) found
    pub duplicates: usize,
    /// Documents skipped
    pub skipped: usize,
    /// Metric evaluations performed
    pub comparisons: usize,
    /// Duration of the corpus fit in milliseconds
    pub fit_duration_ms: u64,
    /// Duration of the representation build in milliseconds
    pub build_duration_ms: u64,
    /// Duration of clustering in milliseconds
    pub cluster_duration_ms: u64,
    /// Duration of the entire run in milliseconds
    pub total_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "ND000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a run summary and an exit code.
    #[must_use]
    pub fn from_summary(summary: &DedupSummary, exit_code: ExitCode) -> Self {
        Self {
            metric: summary.metric,
            threshold: summary.threshold,
            total_documents: summary.total_documents,
            represented: summary.represented,
            representatives: summary.representatives,
            duplicates: summary.duplicates,
            skipped: summary.skipped.len(),
            comparisons: summary.comparisons,
            fit_duration_ms: summary.fit_duration.as_millis() as u64,
            build_duration_ms: summary.build_duration.as_millis() as u64,
            cluster_duration_ms: summary.cluster_duration.as_millis() as u64,
            total_duration_ms: summary.total_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Report creation time (RFC 3339)
    pub generated_at: String,
    /// Kept documents, in input order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representatives: Option<Vec<String>>,
    /// Duplicate pairs
    pub duplicates: Vec<JsonPair>,
    /// Documents left out of the run
    pub skipped: Vec<SkippedDocument>,
    /// Run statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create JSON output for a clustering result.
    #[must_use]
    pub fn from_clusters(
        result: &ClusterResult,
        summary: &DedupSummary,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            representatives: Some(
                result
                    .representatives
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            ),
            duplicates: result.duplicate_pairs.iter().map(JsonPair::from).collect(),
            skipped: summary.skipped.clone(),
            summary: JsonSummary::from_summary(summary, exit_code),
        }
    }

    /// Create JSON output for an all-pairs listing.
    #[must_use]
    pub fn from_pairs(pairs: &[DuplicatePair], summary: &DedupSummary, exit_code: ExitCode) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            representatives: None,
            duplicates: pairs.iter().map(JsonPair::from).collect(),
            skipped: summary.skipped.clone(),
            summary: JsonSummary::from_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
