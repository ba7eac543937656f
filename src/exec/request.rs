//! Invocation requests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tokio::sync::mpsc::UnboundedSender;

use super::OutputLine;
use crate::classify::GitErrorKind;

/// How captured output should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// Output is text; stdout is also searched when classifying failures.
    #[default]
    Text,
    /// Output is binary (blobs, archives); only stderr is classified.
    Raw,
}

/// Per-invocation options.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Environment variables layered over the baseline.
    pub env: HashMap<String, String>,
    /// Exit codes treated as success.
    pub success_exit_codes: BTreeSet<i32>,
    /// Error kinds returned as results instead of errors.
    pub expected_errors: HashSet<GitErrorKind>,
    /// Bytes written to the process's standard input, which is then closed.
    pub stdin: Option<Vec<u8>>,
    pub encoding: OutputEncoding,
    /// Passed to the environment provider.
    pub is_background_task: bool,
    /// Maximum bytes captured per stream; exceeding it is an error.
    pub max_buffer: Option<usize>,
    /// Receives reconstructed lines as they are produced.
    pub output_sink: Option<UnboundedSender<OutputLine>>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            env: HashMap::new(),
            success_exit_codes: BTreeSet::from([0]),
            expected_errors: HashSet::new(),
            stdin: None,
            encoding: OutputEncoding::default(),
            is_background_task: false,
            max_buffer: None,
            output_sink: None,
        }
    }
}

/// A single git invocation.
///
/// Built once with the consuming builder methods and never changed after.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    args: Vec<String>,
    working_dir: PathBuf,
    name: String,
    options: ExecOptions,
}

impl ExecutionRequest {
    /// Create a request with default options.
    ///
    /// `name` identifies the logical operation in logs and errors.
    #[must_use]
    pub fn new<I, S>(args: I, working_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            working_dir: working_dir.into(),
            name: name.into(),
            options: ExecOptions::default(),
        }
    }

    /// Replace all options at once.
    #[must_use]
    pub fn options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    /// Set an environment variable for this invocation.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Replace the set of exit codes treated as success.
    #[must_use]
    pub fn success_exit_codes(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.options.success_exit_codes = codes.into_iter().collect();
        self
    }

    /// Return `kind` as a result instead of an error.
    #[must_use]
    pub fn expect_error(mut self, kind: GitErrorKind) -> Self {
        self.options.expected_errors.insert(kind);
        self
    }

    /// Write `input` to the process's standard input.
    #[must_use]
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.options.stdin = Some(input.into());
        self
    }

    /// Set how output is interpreted.
    #[must_use]
    pub fn encoding(mut self, encoding: OutputEncoding) -> Self {
        self.options.encoding = encoding;
        self
    }

    /// Mark this as a background task.
    #[must_use]
    pub fn background(mut self, is_background_task: bool) -> Self {
        self.options.is_background_task = is_background_task;
        self
    }

    /// Limit bytes captured per stream.
    #[must_use]
    pub fn max_buffer(mut self, limit: usize) -> Self {
        self.options.max_buffer = Some(limit);
        self
    }

    /// Forward reconstructed lines to `sink` as they arrive.
    #[must_use]
    pub fn output_sink(mut self, sink: UnboundedSender<OutputLine>) -> Self {
        self.options.output_sink = Some(sink);
        self
    }

    /// Arguments passed to git.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Working directory for the process.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Logical operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invocation options.
    #[must_use]
    pub fn exec_options(&self) -> &ExecOptions {
        &self.options
    }

    /// Check whether `kind` is on the expected list.
    #[must_use]
    pub fn expects(&self, kind: GitErrorKind) -> bool {
        self.options.expected_errors.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = ExecutionRequest::new(["status"], "/repo", "getStatus");
        assert_eq!(request.args(), ["status"]);
        assert_eq!(request.working_dir(), Path::new("/repo"));
        assert_eq!(request.name(), "getStatus");
        assert_eq!(
            request.exec_options().success_exit_codes,
            BTreeSet::from([0])
        );
        assert!(request.exec_options().expected_errors.is_empty());
        assert!(request.exec_options().stdin.is_none());
        assert_eq!(request.exec_options().encoding, OutputEncoding::Text);
        assert!(request.exec_options().max_buffer.is_none());
    }

    #[test]
    fn test_builder_chaining() {
        let request = ExecutionRequest::new(vec!["merge", "topic"], "/repo", "merge")
            .env("GIT_AUTHOR_NAME", "Someone")
            .success_exit_codes([0, 1])
            .expect_error(GitErrorKind::MergeConflicts)
            .stdin("input")
            .encoding(OutputEncoding::Raw)
            .background(true)
            .max_buffer(1024);

        let options = request.exec_options();
        assert_eq!(options.env.get("GIT_AUTHOR_NAME").map(String::as_str), Some("Someone"));
        assert_eq!(options.success_exit_codes, BTreeSet::from([0, 1]));
        assert!(request.expects(GitErrorKind::MergeConflicts));
        assert!(!request.expects(GitErrorKind::RebaseConflicts));
        assert_eq!(options.stdin.as_deref(), Some(b"input".as_slice()));
        assert_eq!(options.encoding, OutputEncoding::Raw);
        assert!(options.is_background_task);
        assert_eq!(options.max_buffer, Some(1024));
    }

    #[test]
    fn test_request_is_clone() {
        let request = ExecutionRequest::new(["log"], "/repo", "log").env("A", "1");
        let cloned = request.clone();
        assert_eq!(request.args(), cloned.args());
        assert_eq!(request.exec_options().env, cloned.exec_options().env);
    }
}
