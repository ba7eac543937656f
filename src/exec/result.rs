//! Invocation results.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::GitErrorKind;

/// Which standard stream a piece of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSource {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// One reconstructed terminal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub source: OutputSource,
    /// Line bytes, including the terminator that ended it, if any.
    pub bytes: Vec<u8>,
}

impl OutputLine {
    /// Line text without its trailing terminator.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        let trimmed = self
            .bytes
            .strip_suffix(b"\n")
            .unwrap_or(&self.bytes);
        String::from_utf8_lossy(trimmed)
    }
}

/// Outcome of a git invocation that was not escalated to an error.
///
/// When the exit code was unexpected but the classified kind was on the
/// caller's expected list, [`ExecutionResult::error_kind`] is set.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    exit_code: i32,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    combined_output: String,
    working_dir: PathBuf,
    error_kind: Option<GitErrorKind>,
    elapsed: Duration,
}

impl ExecutionResult {
    /// Assemble a result.
    #[must_use]
    pub fn new(
        exit_code: i32,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        combined_output: String,
        working_dir: PathBuf,
        error_kind: Option<GitErrorKind>,
        elapsed: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            combined_output,
            working_dir,
            error_kind,
            elapsed,
        }
    }

    /// Process exit code, `-1` if the process was killed by a signal.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Raw captured standard output.
    #[must_use]
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Raw captured standard error.
    #[must_use]
    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// Standard output decoded as UTF-8, lossily.
    #[must_use]
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Standard error decoded as UTF-8, lossily.
    #[must_use]
    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Reconstructed lines of both streams, in arrival order.
    #[must_use]
    pub fn combined_output(&self) -> &str {
        &self.combined_output
    }

    /// Working directory the process ran in.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Classified error kind, if the exit code was not a success code and
    /// the output matched a known signature.
    #[must_use]
    pub fn error_kind(&self) -> Option<GitErrorKind> {
        self.error_kind
    }

    /// Curated description of the classified error, if it has one.
    #[must_use]
    pub fn error_description(&self) -> Option<&'static str> {
        self.error_kind.and_then(|kind| kind.description().curated())
    }

    /// Wall time from spawn to exit.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Message to show a user for this result.
    ///
    /// Prefers the curated description, then the raw combined output,
    /// stderr and stdout, in that order. The flag is `true` when the message
    /// is git's raw output.
    #[must_use]
    pub fn user_message(&self) -> (String, bool) {
        if let Some(description) = self.error_description() {
            return (description.to_string(), false);
        }
        if !self.combined_output.is_empty() {
            return (self.combined_output.clone(), true);
        }
        if !self.stderr.is_empty() {
            return (self.stderr_text().into_owned(), true);
        }
        if !self.stdout.is_empty() {
            return (self.stdout_text().into_owned(), true);
        }
        ("Unknown error".to_string(), false)
    }
}
