//! Process invoker tests.
//!
//! These run `sh -c <script>` in place of git so the exit code and both
//! output streams are fully controlled.

mod invoker_test;

use std::path::Path;

use git_invoke::config::InvokerConfig;
use git_invoke::exec::{ExecutionRequest, GitInvoker};

pub fn sh_invoker() -> GitInvoker {
    GitInvoker::new(InvokerConfig::with_git_path("sh")).expect("Default config should be valid")
}

pub fn script(dir: &Path, name: &str, script: &str) -> ExecutionRequest {
    ExecutionRequest::new(["-c", script], dir, name)
}

/// Verify the public exec surface is reachable from the crate root.
#[test]
fn test_all_exec_types_exported() {
    use git_invoke::exec::{
        diagnostic_message, EnvironmentProvider, ExecError, ExecOptions, ExecutionResult,
        GitError, NoEnvironment, OutputEncoding, OutputLine, OutputSource, StaticEnvironment,
        TERM_VALUE,
    };

    let _ = ExecOptions::default();
    let _ = OutputEncoding::Raw;
    let _: Box<dyn EnvironmentProvider> = Box::new(NoEnvironment);
    let _ = StaticEnvironment::new(std::collections::HashMap::new());
    let _: fn(&[String], &ExecutionResult) -> String = diagnostic_message;
    let _: Option<&GitError> = None;
    let _: Option<ExecError> = None;
    let _: Option<OutputLine> = None;
    assert_eq!(OutputSource::Stdout.to_string(), "stdout");
    assert_eq!(TERM_VALUE, "dumb");
}
