//! Writing results to files or streams.
//!
//! A report covers either a clustering result (representatives plus their
//! duplicates) or an all-pairs listing. In an output directory the text
//! format writes `unique_files.txt` and `duplicates.txt` (or
//! `similar_pairs.txt` for a listing); JSON and CSV write one file each.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::ReportFormat;
use crate::corpus::DocumentId;
use crate::engine::{ClusterResult, DedupSummary, DuplicatePair};
use crate::error::ExitCode;
use crate::output::csv::CsvOutputError;
use crate::output::json::JsonOutputError;
use crate::output::{CsvOutput, JsonOutput, TextOutput};

/// File receiving representatives in text format.
pub const UNIQUE_FILE: &str = "unique_files.txt";
/// File receiving duplicate pairs in text format.
pub const DUPLICATES_FILE: &str = "duplicates.txt";
/// File receiving an all-pairs listing in text format.
pub const PAIRS_FILE: &str = "similar_pairs.txt";
/// File receiving the JSON report.
pub const JSON_FILE: &str = "report.json";
/// File receiving the CSV report.
pub const CSV_FILE: &str = "report.csv";

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Could not create or write a report file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// File or directory being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Writing to a stream failed.
    #[error("I/O error: {0}")]
    Stream(#[from] io::Error),

    /// JSON output failed.
    #[error(transparent)]
    Json(#[from] JsonOutputError),

    /// CSV output failed.
    #[error(transparent)]
    Csv(#[from] CsvOutputError),
}

/// What a report describes.
#[derive(Debug, Clone, Copy)]
enum Content<'a> {
    Clusters(&'a ClusterResult),
    Pairs(&'a [DuplicatePair]),
}

/// A report ready to be written in any [`ReportFormat`].
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    content: Content<'a>,
    summary: &'a DedupSummary,
    exit_code: ExitCode,
}

impl<'a> Report<'a> {
    /// Report a clustering result.
    #[must_use]
    pub fn for_clusters(
        result: &'a ClusterResult,
        summary: &'a DedupSummary,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            content: Content::Clusters(result),
            summary,
            exit_code,
        }
    }

    /// Report an all-pairs listing.
    #[must_use]
    pub fn for_pairs(
        pairs: &'a [DuplicatePair],
        summary: &'a DedupSummary,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            content: Content::Pairs(pairs),
            summary,
            exit_code,
        }
    }

    fn representatives(&self) -> &'a [DocumentId] {
        match self.content {
            Content::Clusters(result) => &result.representatives,
            Content::Pairs(_) => &[],
        }
    }

    fn pairs(&self) -> &'a [DuplicatePair] {
        match self.content {
            Content::Clusters(result) => &result.duplicate_pairs,
            Content::Pairs(pairs) => pairs,
        }
    }

    fn json(&self) -> JsonOutput {
        match self.content {
            Content::Clusters(result) => {
                JsonOutput::from_clusters(result, self.summary, self.exit_code)
            }
            Content::Pairs(pairs) => JsonOutput::from_pairs(pairs, self.summary, self.exit_code),
        }
    }

    /// Write the report to a stream.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if writing or serialization fails.
    pub fn write_to<W: Write>(&self, format: ReportFormat, writer: &mut W) -> Result<(), ReportError> {
        match format {
            ReportFormat::Text => {
                TextOutput::new(self.representatives(), self.pairs()).write_to(writer)?;
            }
            ReportFormat::Json => self.json().write_to(writer, true)?,
            ReportFormat::Csv => {
                CsvOutput::new(self.summary.metric, self.representatives(), self.pairs())
                    .write_to(writer)?;
            }
        }
        Ok(())
    }

    /// Write the report files into a directory, creating it if needed.
    ///
    /// Returns the files written.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if the directory or a file cannot be written.
    pub fn write_to_dir(&self, format: ReportFormat, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(dir).map_err(|source| ReportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::new();
        match format {
            ReportFormat::Text => {
                let text = TextOutput::new(self.representatives(), self.pairs());
                match self.content {
                    Content::Clusters(_) => {
                        written.push(write_file(dir, UNIQUE_FILE, |w| {
                            text.write_representatives(w)
                        })?);
                        written.push(write_file(dir, DUPLICATES_FILE, |w| text.write_pairs(w))?);
                    }
                    Content::Pairs(_) => {
                        written.push(write_file(dir, PAIRS_FILE, |w| text.write_pairs(w))?);
                    }
                }
            }
            ReportFormat::Json => {
                let json = self.json();
                written.push(write_file(dir, JSON_FILE, |w| {
                    json.write_to(w, true).map_err(|e| match e {
                        JsonOutputError::Io(io) => io,
                        other => io::Error::new(io::ErrorKind::InvalidData, other),
                    })
                })?);
            }
            ReportFormat::Csv => {
                let csv = CsvOutput::new(self.summary.metric, self.representatives(), self.pairs());
                written.push(write_file(dir, CSV_FILE, |w| {
                    csv.write_to(w).map_err(|e| match e {
                        CsvOutputError::Io(io) => io,
                        other => io::Error::new(io::ErrorKind::InvalidData, other),
                    })
                })?);
            }
        }

        for path in &written {
            log::info!("Wrote {}", path.display());
        }
        Ok(written)
    }
}

fn write_file<F>(dir: &Path, name: &str, write: F) -> Result<PathBuf, ReportError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let path = dir.join(name);
    let to_report_error = |source| ReportError::Io {
        path: path.clone(),
        source,
    };
    let file = File::create(&path).map_err(to_report_error)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(to_report_error)?;
    writer.flush().map_err(to_report_error)?;
    Ok(path)
}
