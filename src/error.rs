//! Error types for export parsing, merging and report synthesis.

use thiserror::Error;

/// Errors raised while turning a directory of exports into reports.
///
/// None of these are transient, so nothing in the crate retries them; the whole
/// directory fails and no partial result is returned.
#[derive(Debug, Error)]
pub enum RubricError {
    /// A required column is missing, or a row or footer does not look like the export format.
    #[error("malformed export {file}: {reason}")]
    MalformedExport { file: String, reason: String },

    /// A merged row could not be tied back to a usable student identifier.
    #[error("unresolved student in merged row {row}: {reason}")]
    UnresolvedStudent { row: usize, reason: String },

    /// A concurrent extraction task panicked, was cancelled, or lost its permit.
    #[error("extraction task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl RubricError {
    pub(crate) fn malformed(file: &str, reason: impl Into<String>) -> Self {
        RubricError::MalformedExport {
            file: file.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RubricError>;
