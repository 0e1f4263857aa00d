//! Error types module
//!
//! All pipeline-level failures are unified under [`PipelineError`]. Each
//! variant identifies the object and step it belongs to so that a failed
//! import or job can be attributed and re-run.

use std::io;

use crate::models::{Checksum, JobKind, ObjectId, VersionRef};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of an error for operators and retry policies
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FETCH_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the operator
    fn suggested_action(&self) -> Option<&'static str>;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A single descriptor could not be fetched during an import.
    /// `index` is the zero-based position in the descriptor list.
    #[error("Fetch failed for object {object_id} at descriptor #{index} ({label}, {uri}): {source}")]
    Fetch {
        object_id: ObjectId,
        index: usize,
        label: String,
        uri: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Checksum mismatch for object {object_id} version {version_ref}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        object_id: ObjectId,
        version_ref: VersionRef,
        expected: Checksum,
        actual: Checksum,
    },

    #[error("Job {job_id} ({kind}) failed for object {object_id}: {source}")]
    JobExecution {
        job_id: uuid::Uuid,
        kind: JobKind,
        object_id: ObjectId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Store error ({context}): {source}")]
    Store {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> Self {
        PipelineError::Store {
            context: "io".to_string(),
            source: err.into(),
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn pipeline_error_static_metadata(
    err: &PipelineError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        PipelineError::Configuration(_) => (
            "CONFIGURATION_ERROR",
            false,
            Some("Set the missing configuration and re-run"),
            LogLevel::Error,
        ),
        PipelineError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the supplied arguments and try again"),
            LogLevel::Debug,
        ),
        PipelineError::NotFound(_) => (
            "NOT_FOUND",
            false,
            Some("Verify the object ID exists"),
            LogLevel::Debug,
        ),
        PipelineError::Fetch { .. } => (
            "FETCH_ERROR",
            true,
            Some("Re-run the import with the unprocessed suffix of the descriptor list"),
            LogLevel::Error,
        ),
        PipelineError::ChecksumMismatch { .. } => (
            "CHECKSUM_MISMATCH",
            false,
            Some("Inspect the fixity log and re-import the affected version"),
            LogLevel::Warn,
        ),
        PipelineError::JobExecution { .. } => (
            "JOB_EXECUTION_ERROR",
            true,
            Some("Inspect the job report and re-enqueue the job"),
            LogLevel::Error,
        ),
        PipelineError::Store { .. } => (
            "STORE_ERROR",
            true,
            Some("Retry after the store becomes available"),
            LogLevel::Error,
        ),
        PipelineError::Internal(_) => ("INTERNAL_ERROR", true, None, LogLevel::Error),
    }
}

impl ErrorMetadata for PipelineError {
    fn error_code(&self) -> &'static str {
        pipeline_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        pipeline_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        pipeline_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        pipeline_error_static_metadata(self).3
    }
}
