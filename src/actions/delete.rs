//! Removal of duplicate documents.
//!
//! # Overview
//!
//! Deletion always works from a complete [`ClusterResult`]:
//! - [`DeletionPlan::from_result`] selects the duplicates and validates that
//!   no representative is among them and that every duplicate is a file
//! - [`delete_batch`] moves the planned files to the system trash (default,
//!   recoverable) or removes them permanently
//!
//! A dry run walks the same plan, reporting what would be removed.
//!
//! # Example
//!
//! ```no_run
//! use neardup::actions::delete::{delete_batch, DeleteConfig, DeletionPlan, NoDeleteProgress};
//! use neardup::engine::ClusterResult;
//!
//! let result = ClusterResult::default();
//! let plan = DeletionPlan::from_result(&result).unwrap();
//! let outcome = delete_batch::<NoDeleteProgress>(&plan, &DeleteConfig::default(), None);
//! println!("{}", outcome.summary());
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use thiserror::Error;

use crate::corpus::{path_key, DocumentId};
use crate::engine::ClusterResult;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0} - try running with elevated privileges")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// A representative was selected for deletion.
    #[error("refusing to delete representative {0}")]
    RepresentativeSelected(DocumentId),

    /// A duplicate is an in-memory document with no file behind it.
    #[error("duplicate {0} is not a file")]
    NotAFile(DocumentId),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::RepresentativeSelected(id) | Self::NotAFile(id) => id.as_path(),
        }
    }
}

/// Result of a successful deletion operation.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, permanent: bool) -> Self {
        Self {
            path,
            size,
            permanent,
        }
    }
}

/// Results of a batch deletion operation.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted files (or files that would be, in a dry run).
    pub successes: Vec<DeleteResult>,
    /// Failed deletions with their errors.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes freed.
    pub bytes_freed: u64,
    /// Nothing was actually removed.
    pub dry_run: bool,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Total number of attempted deletions.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "Would delete" } else { "Deleted" };
        let freed = ByteSize::b(self.bytes_freed);
        if self.all_succeeded() {
            format!("{} {} file(s), {} freed", verb, self.success_count(), freed)
        } else {
            format!(
                "{} {} file(s), {} failed, {} freed",
                verb,
                self.success_count(),
                self.failure_count(),
                freed
            )
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone)]
pub struct DeleteConfig {
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
    /// Report what would be deleted without touching any file.
    pub dry_run: bool,
    /// Continue on error (process remaining files even if some fail).
    pub continue_on_error: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            permanent: false,
            dry_run: false,
            continue_on_error: true,
        }
    }
}

impl DeleteConfig {
    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self::default()
    }

    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self {
            permanent: true,
            ..Self::default()
        }
    }

    /// Enable/disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable/disable continue on error.
    #[must_use]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}

/// Callback trait for deletion progress reporting.
pub trait DeleteProgressCallback: Send + Sync {
    /// Called before each file deletion.
    fn on_before_delete(&self, path: &Path, index: usize, total: usize);

    /// Called after successful deletion.
    fn on_delete_success(&self, path: &Path, size: u64);

    /// Called after failed deletion.
    fn on_delete_failure(&self, path: &Path, error: &str);

    /// Called when batch operation completes.
    fn on_complete(&self, result: &BatchDeleteResult);
}

/// Progress callback that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeleteProgress;

impl DeleteProgressCallback for NoDeleteProgress {
    fn on_before_delete(&self, _: &Path, _: usize, _: usize) {}
    fn on_delete_success(&self, _: &Path, _: u64) {}
    fn on_delete_failure(&self, _: &Path, _: &str) {}
    fn on_complete(&self, _: &BatchDeleteResult) {}
}

/// Validated list of files to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    paths: Vec<PathBuf>,
}

impl DeletionPlan {
    /// Select every duplicate of a clustering result for removal.
    ///
    /// # Errors
    ///
    /// - `RepresentativeSelected` if a duplicate is also a representative
    /// - `NotAFile` if a duplicate has no file path
    pub fn from_result(result: &ClusterResult) -> Result<Self, DeleteError> {
        let paths = result
            .duplicate_pairs
            .iter()
            .map(|pair| match &pair.duplicate {
                DocumentId::Path(p) => Ok(p.clone()),
                other => Err(DeleteError::NotAFile(other.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let plan = Self { paths };
        plan.validate(result)?;
        Ok(plan)
    }

    /// Check that no representative is scheduled for removal, under any spelling of its path.
    ///
    /// # Errors
    ///
    /// Returns `RepresentativeSelected` for the first representative found in the plan.
    pub fn validate(&self, result: &ClusterResult) -> Result<(), DeleteError> {
        // Compare files, not spellings
        let selected: HashSet<PathBuf> = self.paths.iter().map(|p| path_key(p)).collect();
        for rep in &result.representatives {
            if rep.as_path().is_some_and(|p| selected.contains(&path_key(p))) {
                log::error!("Representative {} was selected for deletion", rep);
                return Err(DeleteError::RepresentativeSelected(rep.clone()));
            }
        }
        log::debug!(
            "Deletion validated: {} file(s) selected, {} representative(s) preserved",
            self.paths.len(),
            result.representatives.len()
        );
        Ok(())
    }

    /// Files to remove, in input order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of files to remove.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the plan removes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn metadata_error(path: &Path, e: io::Error) -> DeleteError {
    match e.kind() {
        io::ErrorKind::NotFound => DeleteError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => DeleteError::PermissionDenied(path.to_path_buf()),
        _ => DeleteError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

/// Delete a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| metadata_error(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({})", path.display(), ByteSize::b(size));

    Ok(DeleteResult::new(path.to_path_buf(), size, false))
}

/// Permanently delete a single file.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `PermanentDeleteFailed` if the delete operation fails
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| metadata_error(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Permanently deleted: {} ({})", path.display(), ByteSize::b(size));

    Ok(DeleteResult::new(path.to_path_buf(), size, true))
}

/// Check that a file exists and would be deletable, without deleting it.
fn dry_run_delete(path: &Path, permanent: bool) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| metadata_error(path, e))?
        .len();
    log::info!("Would delete: {} ({})", path.display(), ByteSize::b(size));
    Ok(DeleteResult::new(path.to_path_buf(), size, permanent))
}

/// Delete every file in a plan.
///
/// Processes all files, continuing on error if configured to do so.
pub fn delete_batch<C: DeleteProgressCallback>(
    plan: &DeletionPlan,
    config: &DeleteConfig,
    callback: Option<&C>,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult {
        dry_run: config.dry_run,
        ..BatchDeleteResult::default()
    };
    let total = plan.len();

    for (index, path) in plan.paths().iter().enumerate() {
        if let Some(cb) = callback {
            cb.on_before_delete(path, index, total);
        }

        let delete_result = if config.dry_run {
            dry_run_delete(path, config.permanent)
        } else if config.permanent {
            permanent_delete(path)
        } else {
            delete_to_trash(path)
        };

        match delete_result {
            Ok(del) => {
                result.bytes_freed += del.size;
                if let Some(cb) = callback {
                    cb.on_delete_success(path, del.size);
                }
                result.successes.push(del);
            }
            Err(e) => {
                let error_msg = e.to_string();
                log::warn!("Failed to delete {}: {}", path.display(), error_msg);

                if let Some(cb) = callback {
                    cb.on_delete_failure(path, &error_msg);
                }

                result.failures.push((path.clone(), error_msg));

                if !config.continue_on_error {
                    log::info!("Stopping batch deletion due to error (continue_on_error=false)");
                    break;
                }
            }
        }
    }

    if let Some(cb) = callback {
        cb.on_complete(&result);
    }

    log::info!("{}", result.summary());

    result
}
