//! Failures returned by job handlers.
//!
//! The variant decides what the dispatcher does next: a recoverable failure
//! goes back to the end of its lane while `max_retries` allows it, an
//! unrecoverable one is reported straight away.

use thiserror::Error;

use crate::error::{ErrorMetadata, PipelineError};

#[derive(Debug, Error)]
pub enum JobError {
    /// A tool crashed or a store write failed; running again may succeed.
    #[error("{0:#}")]
    Recoverable(anyhow::Error),

    /// The content cannot be processed or the object is gone.
    #[error("{0:#}")]
    Unrecoverable(anyhow::Error),
}

impl JobError {
    pub fn recoverable(err: impl Into<anyhow::Error>) -> Self {
        JobError::Recoverable(err.into())
    }

    pub fn unrecoverable(err: impl Into<anyhow::Error>) -> Self {
        JobError::Unrecoverable(err.into())
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, JobError::Recoverable(_))
    }

    /// The underlying cause, for wrapping into a [`PipelineError::JobExecution`].
    pub fn into_inner(self) -> anyhow::Error {
        match self {
            JobError::Recoverable(err) | JobError::Unrecoverable(err) => err,
        }
    }
}

/// Untyped handler failures are assumed transient.
impl From<anyhow::Error> for JobError {
    fn from(err: anyhow::Error) -> Self {
        JobError::Recoverable(err)
    }
}

impl From<PipelineError> for JobError {
    fn from(err: PipelineError) -> Self {
        if err.is_recoverable() {
            JobError::Recoverable(err.into())
        } else {
            JobError::Unrecoverable(err.into())
        }
    }
}

/// `?`-friendly marking of a failure as final
pub trait JobResultExt<T> {
    fn unrecoverable(self) -> Result<T, JobError>;
}

impl<T, E: Into<anyhow::Error>> JobResultExt<T> for Result<T, E> {
    fn unrecoverable(self) -> Result<T, JobError> {
        self.map_err(JobError::unrecoverable)
    }
}
