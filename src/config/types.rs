//! Configuration types.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::{ErrorSignatures, GitErrorKind, Signature};
use crate::stream::DEFAULT_LINE_CAPACITY;

use super::ConfigError;

/// An additional signature appended to the built-in table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignatureConfig {
    /// Kind reported when the pattern matches.
    pub kind: GitErrorKind,
    /// Regular expression matched against git's output.
    pub pattern: String,
}

/// Configuration for the git invoker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokerConfig {
    /// Git executable to run.
    #[serde(default = "default_git_path")]
    pub git_path: PathBuf,
    /// Maximum reconstructed line length.
    #[serde(default = "default_line_capacity")]
    pub line_capacity: usize,
    /// Bytes of each stream kept for diagnostics.
    #[serde(default = "default_tail_capacity")]
    pub tail_capacity: usize,
    /// Default per-stream capture limit, if any.
    #[serde(default)]
    pub max_buffer: Option<usize>,
    /// Invocations slower than this are logged at info level.
    #[serde(default = "default_slow_command_threshold_ms")]
    pub slow_command_threshold_ms: u64,
    /// Baseline environment applied to every invocation.
    #[serde(default = "default_environment")]
    pub environment: HashMap<String, String>,
    /// Extra signatures, checked after the built-in ones.
    #[serde(default)]
    pub signatures: Vec<SignatureConfig>,
}

fn default_git_path() -> PathBuf {
    PathBuf::from("git")
}

fn default_line_capacity() -> usize {
    DEFAULT_LINE_CAPACITY
}

fn default_tail_capacity() -> usize {
    4096
}

fn default_slow_command_threshold_ms() -> u64 {
    5000
}

fn default_environment() -> HashMap<String, String> {
    HashMap::from([("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())])
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            git_path: default_git_path(),
            line_capacity: default_line_capacity(),
            tail_capacity: default_tail_capacity(),
            max_buffer: None,
            slow_command_threshold_ms: default_slow_command_threshold_ms(),
            environment: default_environment(),
            signatures: Vec::new(),
        }
    }
}

impl InvokerConfig {
    /// Create a configuration running a specific git executable.
    #[must_use]
    pub fn with_git_path(git_path: impl Into<PathBuf>) -> Self {
        Self {
            git_path: git_path.into(),
            ..Default::default()
        }
    }

    /// Threshold above which an invocation counts as slow.
    #[must_use]
    pub fn slow_command_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_command_threshold_ms)
    }

    /// Check values that cannot be expressed in the type.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroCapacity` if a capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("line_capacity"));
        }
        if self.tail_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("tail_capacity"));
        }
        Ok(())
    }

    /// Build the signature table: defaults followed by configured extras.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSignature` if an extra pattern does not
    /// compile.
    pub fn build_signatures(&self) -> Result<ErrorSignatures, ConfigError> {
        let mut table = ErrorSignatures::with_default_signatures();
        for extra in &self.signatures {
            let signature = Signature::new(extra.kind, &extra.pattern).map_err(|e| {
                ConfigError::InvalidSignature {
                    pattern: extra.pattern.clone(),
                    source: e,
                }
            })?;
            table.add(signature);
        }
        Ok(table)
    }
}
