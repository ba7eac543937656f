//! Git progress line parsing.
//!
//! Recognizes the lines git writes to stderr while counting, compressing,
//! receiving or resolving objects, after `\r` redraws have been collapsed:
//!
//! ```text
//! remote: Counting objects: 100% (12/12), done.
//! Receiving objects:  45% (450/1000), 1.20 MiB | 1.00 MiB/s
//! Enumerating objects: 1234, done.
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

const REMOTE_PREFIX: &str = "remote: ";
const DONE_SUFFIX: &str = ", done.";

static PERCENT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(r"^(?P<title>[A-Za-z][A-Za-z ]*):\s+(?P<percent>\d{1,3})%\s+\((?P<value>\d+)/(?P<total>\d+)\)")
});

static COUNTER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^(?P<title>[A-Za-z][A-Za-z ]*):\s+(?P<value>\d+)(?:,|$)"));

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|e| tracing::warn!(pattern, error = %e, "Failed to compile progress pattern"))
        .ok()
}

/// One parsed progress line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitProgress {
    /// Phase name, e.g. `Receiving objects`.
    pub title: String,
    /// Percentage, when git reports one.
    pub percent: Option<u8>,
    /// Items processed so far.
    pub value: u64,
    /// Total items, when known.
    pub total: Option<u64>,
    /// The phase finished.
    pub done: bool,
    /// The line came from the remote side (`remote: ` prefix).
    pub remote: bool,
}

/// Parse a reconstructed git output line as progress.
///
/// Returns `None` for anything that is not a progress line.
#[must_use]
pub fn parse_progress(line: &str) -> Option<GitProgress> {
    let line = line.trim_end();
    let (line, remote) = match line.strip_prefix(REMOTE_PREFIX) {
        Some(rest) => (rest.trim_start(), true),
        None => (line, false),
    };
    let done = line.ends_with(DONE_SUFFIX);

    if let Some(caps) = PERCENT_PATTERN.as_ref().and_then(|re| re.captures(line)) {
        return Some(GitProgress {
            title: caps["title"].trim_end().to_string(),
            percent: caps["percent"].parse().ok().filter(|p| *p <= 100),
            value: caps["value"].parse().ok()?,
            total: caps["total"].parse().ok(),
            done,
            remote,
        });
    }

    let caps = COUNTER_PATTERN.as_ref()?.captures(line)?;
    Some(GitProgress {
        title: caps["title"].trim_end().to_string(),
        percent: None,
        value: caps["value"].parse().ok()?,
        total: None,
        done,
        remote,
    })
}

impl GitProgress {
    /// Completion in `[0.0, 1.0]`, when it can be derived.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Option<f64> {
        if let Some(percent) = self.percent {
            return Some(f64::from(percent) / 100.0);
        }
        self.total
            .filter(|total| *total > 0)
            .map(|total| self.value as f64 / total as f64)
    }
}
