//! Invocation error types.

use std::path::PathBuf;

use super::{ExecutionResult, OutputSource};

/// A git invocation that exited unexpectedly.
///
/// Returned when the exit code is not a success code and the classified
/// kind, if any, was not on the caller's expected list.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{message}")]
pub struct GitError {
    result: ExecutionResult,
    args: Vec<String>,
    message: String,
    is_raw_message: bool,
}

impl GitError {
    /// Build the error, choosing the message from the result.
    #[must_use]
    pub fn new(result: ExecutionResult, args: Vec<String>) -> Self {
        let (message, is_raw_message) = result.user_message();
        Self {
            result,
            args,
            message,
            is_raw_message,
        }
    }

    /// The result of the failed invocation.
    #[must_use]
    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    /// Arguments git was invoked with.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Message for display.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `true` when the message is git's own output rather than a curated
    /// description.
    #[must_use]
    pub fn is_raw_message(&self) -> bool {
        self.is_raw_message
    }
}

/// Errors returned by [`super::GitInvoker::invoke`].
#[derive(thiserror::Error, Debug)]
pub enum ExecError {
    /// Git ran and failed in a way the caller did not expect.
    #[error(transparent)]
    Git(Box<GitError>),

    /// The git executable could not be found.
    #[error("{operation}: git executable not found: {path}")]
    GitNotFound { operation: String, path: PathBuf },

    /// The working directory does not exist.
    #[error("{operation}: working directory does not exist: {path}")]
    RepositoryDoesNotExist { operation: String, path: PathBuf },

    /// A captured stream exceeded the configured limit.
    #[error("{operation}: {stream} exceeded maximum buffer size of {limit} bytes")]
    MaxBufferExceeded {
        operation: String,
        stream: OutputSource,
        limit: usize,
        /// Last bytes of the overflowing stream.
        tail: Vec<u8>,
    },

    /// Spawning or talking to the process failed.
    #[error("{operation}: I/O error: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecError {
    /// Logical operation name, for errors that occurred before or outside
    /// git's own reporting.
    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        match self {
            Self::Git(_) => None,
            Self::GitNotFound { operation, .. }
            | Self::RepositoryDoesNotExist { operation, .. }
            | Self::MaxBufferExceeded { operation, .. }
            | Self::Io { operation, .. } => Some(operation),
        }
    }

    /// The structured git error, if this is one.
    #[must_use]
    pub fn as_git_error(&self) -> Option<&GitError> {
        match self {
            Self::Git(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<GitError> for ExecError {
    fn from(err: GitError) -> Self {
        Self::Git(Box::new(err))
    }
}
