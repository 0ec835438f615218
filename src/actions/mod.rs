//! Actions taken on a finished deduplication result.
//!
//! This module provides functionality for:
//! - Reports in text, JSON or CSV, to a stream or an output directory
//! - Safe removal of duplicates via the trash crate
//! - Permanent removal (explicit opt-in) and dry runs
//!
//! Actions only ever run on a complete [`ClusterResult`](crate::engine::ClusterResult);
//! an interrupted or failed run never reaches this module.
//!
//! ```no_run
//! use neardup::actions::{delete_batch, DeleteConfig, DeletionPlan, NoDeleteProgress};
//! use neardup::engine::ClusterResult;
//!
//! let result = ClusterResult::default();
//! let plan = DeletionPlan::from_result(&result).unwrap();
//! let outcome = delete_batch::<NoDeleteProgress>(&plan, &DeleteConfig::trash(), None);
//! println!("{}", outcome.summary());
//! ```

pub mod delete;
pub mod report;

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use delete::{
    delete_batch, delete_to_trash, permanent_delete, BatchDeleteResult, DeleteConfig,
    DeleteError, DeleteProgressCallback, DeleteResult, DeletionPlan, NoDeleteProgress,
};
pub use report::{Report, ReportError};

/// What to do with the result.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ActionMode {
    /// Write representatives and duplicate pairs
    #[default]
    Report,
    /// Remove duplicates, keeping every representative
    Delete,
}

impl fmt::Display for ActionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionMode::Report => write!(f, "report"),
            ActionMode::Delete => write!(f, "delete"),
        }
    }
}

/// Report output format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One document per line
    #[default]
    Text,
    /// JSON document for scripting
    Json,
    /// CSV for spreadsheets
    Csv,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Csv => write!(f, "csv"),
        }
    }
}
