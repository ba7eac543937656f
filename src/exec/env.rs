//! Environment assembly for git processes.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

/// Terminal type forced on every invocation so git never attempts
/// interactive or smart-terminal behavior.
pub const TERM_VALUE: &str = "dumb";

/// Supplies per-invocation environment, typically credential helper and
/// authentication bridging variables.
#[async_trait]
pub trait EnvironmentProvider: Send + Sync {
    /// Variables to set for a git process running in `path`.
    async fn environment_for(
        &self,
        path: &Path,
        is_background_task: bool,
    ) -> HashMap<String, String>;
}

/// Provider that adds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnvironment;

#[async_trait]
impl EnvironmentProvider for NoEnvironment {
    async fn environment_for(
        &self,
        _path: &Path,
        _is_background_task: bool,
    ) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Provider returning the same variables for every invocation.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    vars: HashMap<String, String>,
}

impl StaticEnvironment {
    /// Create a provider from a fixed set of variables.
    #[must_use]
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

#[async_trait]
impl EnvironmentProvider for StaticEnvironment {
    async fn environment_for(
        &self,
        _path: &Path,
        _is_background_task: bool,
    ) -> HashMap<String, String> {
        self.vars.clone()
    }
}

/// Layer environment maps, later layers winning, then force `TERM`.
///
/// The result holds only overrides; the inherited process environment is
/// left to the spawned command.
#[must_use]
pub fn merge_environment<'a>(
    layers: impl IntoIterator<Item = &'a HashMap<String, String>>,
) -> HashMap<String, String> {
    let mut merged = HashMap::new();
    for layer in layers {
        merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged.insert("TERM".to_string(), TERM_VALUE.to_string());
    merged
}
