//! Exit codes and machine-readable errors.

use serde::Serialize;

use crate::engine::EngineError;

/// Process exit codes.
///
/// - 0: Completed and duplicates (or similar pairs) were found
/// - 1: General error
/// - 2: Completed, nothing similar found
/// - 3: Completed, but some documents were skipped
/// - 130: Interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were found.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Every document is unique.
    NoDuplicates = 2,
    /// Completed with skipped documents.
    PartialSuccess = 3,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code name.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "ND000",
            Self::GeneralError => "ND001",
            Self::NoDuplicates => "ND002",
            Self::PartialSuccess => "ND003",
            Self::Interrupted => "ND130",
        }
    }

    /// Exit code of a completed run. Skipped documents take precedence.
    #[must_use]
    pub fn for_outcome(found_duplicates: bool, skipped_any: bool) -> Self {
        if skipped_any {
            Self::PartialSuccess
        } else if found_duplicates {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }

    /// Exit code of a failed run: `Interrupted` if the chain holds an
    /// interrupted [`EngineError`], else `GeneralError`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        let interrupted = err
            .chain()
            .filter_map(|e| e.downcast_ref::<EngineError>())
            .any(EngineError::is_interrupted);
        if interrupted {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Error report printed to stderr with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The code name (e.g., "ND001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable message, including causes
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
