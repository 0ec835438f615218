//! Output formatters for deduplication results.
//!
//! This module provides different output formats:
//! - Plain text, one document per line, for shell pipelines
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! # Example
//!
//! ```
//! use neardup::corpus::Corpus;
//! use neardup::engine::Deduplicator;
//! use neardup::error::ExitCode;
//! use neardup::metric::MetricKind;
//! use neardup::output::json::JsonOutput;
//!
//! let corpus = Corpus::from_texts(["same words here", "same words here"]);
//! let (result, summary) = Deduplicator::with_defaults(MetricKind::Hamming)
//!     .run(&corpus)
//!     .unwrap();
//!
//! let output = JsonOutput::from_clusters(&result, &summary, ExitCode::Success);
//! assert_eq!(output.duplicates.len(), 1);
//! ```

pub mod csv;
pub mod json;
pub mod text;

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;
