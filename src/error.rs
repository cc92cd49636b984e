//! Exit codes and structured error output.

use serde::Serialize;

use crate::duplicates::FinderError;
use crate::placement::PlacementError;

/// Process exit codes.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (unexpected failure)
/// - 2: Nothing to do (no duplicates, or no candidates at all)
/// - 3: Partial success (completed with per-file failures)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Run completed and duplicates were found.
    Success = 0,
    /// An unexpected or fatal error occurred.
    GeneralError = 1,
    /// Run completed but found no duplicates.
    NoDuplicates = 2,
    /// Run completed but some files could not be read or copied.
    PartialSuccess = 3,
    /// Run was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "UQ000",
            Self::GeneralError => "UQ001",
            Self::NoDuplicates => "UQ002",
            Self::PartialSuccess => "UQ003",
            Self::Interrupted => "UQ130",
        }
    }

    /// Map a failed run to its exit code.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err
            .downcast_ref::<FinderError>()
            .is_some_and(|e| matches!(e, FinderError::Interrupted))
        {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "UQ001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Destination that two sources collided on, if that was the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collision: Option<String>,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        let collision = match err.downcast_ref::<PlacementError>() {
            Some(PlacementError::DestinationCollision { destination, .. }) => {
                Some(destination.display().to_string())
            }
            _ => None,
        };
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            collision,
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
