//! Lock file path recovery.

use std::path::{PathBuf, MAIN_SEPARATOR};
use std::sync::LazyLock;

use regex::Regex;

use super::GitErrorKind;
use crate::exec::ExecutionResult;

static CONFIG_LOCK_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"error: could not lock config file (.+): File exists")
        .map_err(|e| tracing::warn!(error = %e, "Failed to compile config lock pattern"))
        .ok()
});

/// Path of the `.lock` file blocking a config write.
///
/// Only results classified as [`GitErrorKind::ConfigLockFileAlreadyExists`]
/// carry one. Git reports the config path with forward slashes; it is
/// converted to the native separator and resolved against the working
/// directory of the invocation.
#[must_use]
pub fn config_lock_file_path(result: &ExecutionResult) -> Option<PathBuf> {
    if result.error_kind() != Some(GitErrorKind::ConfigLockFileAlreadyExists) {
        return None;
    }

    let stderr = result.stderr_text();
    let captures = CONFIG_LOCK_PATTERN.as_ref()?.captures(&stderr)?;
    let reported = captures.get(1)?.as_str();

    let native = if MAIN_SEPARATOR == '/' {
        reported.to_string()
    } else {
        reported.replace('/', &MAIN_SEPARATOR.to_string())
    };

    Some(result.working_dir().join(format!("{native}.lock")))
}
