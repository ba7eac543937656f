//! Colored terminal output for the command-line front end.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::classify::{GitErrorKind, Signature};
use crate::exec::{ExecutionResult, GitError, OutputLine, OutputSource};
use crate::progress::{parse_progress, GitProgress};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Truncate a string to at most `max_len` characters, adding an ellipsis
/// if anything was cut.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Render a progress line compactly.
#[must_use]
pub fn format_progress(progress: &GitProgress) -> String {
    let mut out = progress.title.clone();
    if let Some(percent) = progress.percent {
        out.push_str(&format!(" {percent:>3}%"));
    }
    match progress.total {
        Some(total) => out.push_str(&format!(" ({}/{total})", progress.value)),
        None => out.push_str(&format!(" {}", progress.value)),
    }
    if progress.done {
        out.push_str(", done");
    }
    out
}

/// Print one reconstructed output line as it arrives.
pub fn print_output_line(line: &OutputLine) {
    let text = line.text();
    let text = text.trim_end_matches('\n');

    if let Some(progress) = parse_progress(text) {
        let tag = if progress.remote {
            "[REMOTE]"
        } else {
            "[PROGRESS]"
        };
        println!("{} {}", tag.cyan().bold(), format_progress(&progress));
    } else {
        match line.source {
            OutputSource::Stdout => println!("{text}"),
            OutputSource::Stderr => println!("{}", text.dimmed()),
        }
    }
    let _ = io::stdout().flush();
}

/// Print the outcome of an invocation that did not fail.
pub fn print_result(name: &str, result: &ExecutionResult) {
    let elapsed = format!("{}ms", result.elapsed().as_millis());
    match result.error_kind() {
        Some(kind) => println!(
            "{} {} {} code={} kind={} {}",
            timestamp().dimmed(),
            "[EXPECTED]".yellow().bold(),
            name.bold(),
            result.exit_code(),
            kind.yellow(),
            elapsed.dimmed()
        ),
        None => println!(
            "{} {} {} code={} {}",
            timestamp().dimmed(),
            "[OK]".green().bold(),
            name.bold(),
            result.exit_code(),
            elapsed.dimmed()
        ),
    }
    let _ = io::stdout().flush();
}

/// Print a git failure with its classification.
pub fn print_git_error(name: &str, error: &GitError) {
    let result = error.result();
    let kind = result
        .error_kind()
        .map_or_else(|| "unclassified".to_string(), |kind| kind.to_string());
    eprintln!(
        "{} {} {} code={} kind={}",
        timestamp().dimmed(),
        "[GIT]".red().bold(),
        name.bold(),
        result.exit_code(),
        kind.red()
    );
    for line in error.message().lines() {
        eprintln!("  {line}");
    }
    let _ = io::stderr().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}

/// Width of the kind column in the signature listing.
const KIND_COLUMN_WIDTH: usize = 40;

/// Left-align a kind name in a column of `width` characters.
#[must_use]
pub fn kind_column(kind: GitErrorKind, width: usize) -> String {
    format!("{:<width$}", kind.to_string())
}

/// Print one signature table entry.
pub fn print_signature(index: usize, signature: &Signature) {
    let kind = signature.kind();
    let marker = if kind.is_authentication_failure() {
        "auth".magenta().to_string()
    } else {
        "    ".to_string()
    };
    println!(
        "{:>3} {} {} {}",
        index.dimmed(),
        marker,
        kind_column(kind, KIND_COLUMN_WIDTH).cyan(),
        truncate(signature.pattern(), 80)
    );
}

/// Print the curated description of a kind, if it has one.
pub fn print_description(kind: GitErrorKind) {
    if let Some(description) = kind.description().curated() {
        println!("    {}", description.dimmed());
    }
}
