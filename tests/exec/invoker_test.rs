//! End-to-end invocation tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use git_invoke::classify::{config_lock_file_path, GitErrorKind};
use git_invoke::config::InvokerConfig;
use git_invoke::exec::{
    ExecError, GitInvoker, OutputEncoding, OutputSource, StaticEnvironment,
};
use tempfile::tempdir;
use tokio::sync::mpsc;

use super::{script, sh_invoker};

#[tokio::test]
async fn successful_run_returns_result() {
    let dir = tempdir().unwrap();
    let request = script(dir.path(), "status", "echo hello");

    let result = sh_invoker().invoke(&request).await.unwrap();

    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.stdout(), b"hello\n");
    assert!(result.stderr().is_empty());
    assert_eq!(result.combined_output(), "hello\n");
    assert_eq!(result.error_kind(), None);
    assert_eq!(result.working_dir(), dir.path());
}

#[tokio::test]
async fn classified_failure_escalates_with_curated_message() {
    let dir = tempdir().unwrap();
    let request = script(
        dir.path(),
        "fetch",
        "echo \"fatal: Authentication failed for 'https://example.com/r.git/'\" >&2; exit 128",
    );

    let err = sh_invoker().invoke(&request).await.unwrap_err();

    let git_error = err.as_git_error().expect("Should be a git error");
    let result = git_error.result();
    assert_eq!(result.exit_code(), 128);
    assert_eq!(
        result.error_kind(),
        Some(GitErrorKind::HttpsAuthenticationFailed)
    );
    assert!(GitErrorKind::HttpsAuthenticationFailed.is_authentication_failure());
    assert!(!git_error.is_raw_message());
    assert_eq!(Some(git_error.message()), result.error_description());
    assert_eq!(git_error.args()[0], "-c");
}

#[tokio::test]
async fn unclassified_failure_uses_raw_output() {
    let dir = tempdir().unwrap();
    let request = script(dir.path(), "odd", "echo 'something odd' >&2; exit 2");

    let err = sh_invoker().invoke(&request).await.unwrap_err();

    let ExecError::Git(git_error) = err else {
        panic!("Expected git error");
    };
    assert_eq!(git_error.result().error_kind(), None);
    assert!(git_error.is_raw_message());
    assert_eq!(git_error.message(), "something odd\n");
    assert_eq!(git_error.to_string(), "something odd\n");
}

#[tokio::test]
async fn silent_failure_reports_unknown_error() {
    let dir = tempdir().unwrap();
    let request = script(dir.path(), "silent", "exit 3");

    let err = sh_invoker().invoke(&request).await.unwrap_err();

    let git_error = err.as_git_error().unwrap();
    assert_eq!(git_error.message(), "Unknown error");
    assert!(!git_error.is_raw_message());
}

#[tokio::test]
async fn expected_error_is_returned_as_result() {
    let dir = tempdir().unwrap();
    let request = script(
        dir.path(),
        "merge",
        "echo 'CONFLICT (content): Merge conflict in a.txt' >&2; exit 1",
    )
    .expect_error(GitErrorKind::MergeConflicts);

    let result = sh_invoker().invoke(&request).await.unwrap();

    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.error_kind(), Some(GitErrorKind::MergeConflicts));
}

#[tokio::test]
async fn raw_encoding_skips_stdout_classification() {
    let dir = tempdir().unwrap();
    let request = script(
        dir.path(),
        "merge",
        "echo 'CONFLICT (content): Merge conflict in a.txt'; exit 1",
    )
    .encoding(OutputEncoding::Raw)
    .expect_error(GitErrorKind::MergeConflicts);

    let err = sh_invoker().invoke(&request).await.unwrap_err();

    assert_eq!(err.as_git_error().unwrap().result().error_kind(), None);
}

#[tokio::test]
async fn stderr_signature_wins_over_stdout() {
    let dir = tempdir().unwrap();
    let request = script(
        dir.path(),
        "push",
        "echo 'CONFLICT (content): Merge conflict in a.txt'; \
         echo 'fatal: the remote end hung up unexpectedly' >&2; exit 1",
    );

    let err = sh_invoker().invoke(&request).await.unwrap_err();

    assert_eq!(
        err.as_git_error().unwrap().result().error_kind(),
        Some(GitErrorKind::RemoteDisconnection)
    );
}

#[tokio::test]
async fn custom_success_codes_accept_nonzero_exit() {
    let dir = tempdir().unwrap();
    let request = script(dir.path(), "diff", "echo changed; exit 1").success_exit_codes([0, 1]);

    let result = sh_invoker().invoke(&request).await.unwrap();

    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.error_kind(), None);
}

#[tokio::test]
async fn zero_exit_outside_success_codes_fails() {
    let dir = tempdir().unwrap();
    let request = script(dir.path(), "diff", "exit 0").success_exit_codes([1]);

    let err = sh_invoker().invoke(&request).await.unwrap_err();

    assert_eq!(err.as_git_error().unwrap().result().exit_code(), 0);
}

#[tokio::test]
async fn environment_layers_merge_with_term_forced() {
    let dir = tempdir().unwrap();
    let provider = StaticEnvironment::new(HashMap::from([
        ("FROM_PROVIDER".to_string(), "provider".to_string()),
        ("SHARED".to_string(), "provider".to_string()),
        ("TERM".to_string(), "xterm-256color".to_string()),
    ]));
    let invoker = sh_invoker().with_environment_provider(Arc::new(provider));
    let request = script(
        dir.path(),
        "env",
        "printf '%s|%s|%s|%s|%s' \"$TERM\" \"$FROM_CALLER\" \"$FROM_PROVIDER\" \"$SHARED\" \"$GIT_TERMINAL_PROMPT\"",
    )
    .env("FROM_CALLER", "caller")
    .env("SHARED", "caller")
    .env("TERM", "vt100");

    let result = invoker.invoke(&request).await.unwrap();

    assert_eq!(result.stdout_text(), "dumb|caller|provider|provider|0");
}

#[tokio::test]
async fn stdin_is_delivered() {
    let dir = tempdir().unwrap();
    let request = script(dir.path(), "hash-object", "cat").stdin("piped input");

    let result = sh_invoker().invoke(&request).await.unwrap();

    assert_eq!(result.stdout(), b"piped input");
}

#[tokio::test]
async fn stdin_ignored_by_process_is_not_an_error() {
    let dir = tempdir().unwrap();
    let request = script(dir.path(), "ignore", "exit 0").stdin(vec![b'x'; 1 << 20]);

    let result = sh_invoker().invoke(&request).await.unwrap();

    assert_eq!(result.exit_code(), 0);
}

#[tokio::test]
async fn carriage_returns_collapse_in_combined_output() {
    let dir = tempdir().unwrap();
    let request = script(
        dir.path(),
        "clone",
        "printf 'Receiving objects:  50%%\\rReceiving objects: 100%%\\n' >&2",
    );

    let result = sh_invoker().invoke(&request).await.unwrap();

    assert_eq!(result.combined_output(), "Receiving objects: 100%\n");
    assert_eq!(
        result.stderr(),
        b"Receiving objects:  50%\rReceiving objects: 100%\n"
    );
}

#[tokio::test]
async fn output_sink_receives_lines_from_both_streams() {
    let dir = tempdir().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let request = script(dir.path(), "pull", "echo one; echo two >&2").output_sink(tx);

    let result = sh_invoker().invoke(&request).await.unwrap();
    drop(request);

    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        lines.push((line.source, line.text().into_owned()));
    }
    lines.sort_by_key(|(source, _)| *source == OutputSource::Stderr);

    assert_eq!(
        lines,
        vec![
            (OutputSource::Stdout, "one\n".to_string()),
            (OutputSource::Stderr, "two\n".to_string()),
        ]
    );
    assert_eq!(result.combined_output().len(), "one\ntwo\n".len());
}

#[tokio::test]
async fn max_buffer_overflow_is_distinct_failure() {
    let dir = tempdir().unwrap();
    let request = script(dir.path(), "log", "yes | head -c 100000").max_buffer(1000);

    let err = sh_invoker().invoke(&request).await.unwrap_err();

    let ExecError::MaxBufferExceeded {
        operation,
        stream,
        limit,
        tail,
    } = err
    else {
        panic!("Expected max buffer failure");
    };
    assert_eq!(operation, "log");
    assert_eq!(stream, OutputSource::Stdout);
    assert_eq!(limit, 1000);
    assert!(!tail.is_empty());
    assert!(tail.len() <= InvokerConfig::default().tail_capacity);
    assert!(tail.iter().all(|b| *b == b'y' || *b == b'\n'));
}

#[tokio::test]
async fn max_buffer_overflow_returns_while_descendant_keeps_writing() {
    let dir = tempdir().unwrap();
    let request = script(dir.path(), "log", "yes; true").max_buffer(1000);

    let outcome = tokio::time::timeout(Duration::from_secs(10), sh_invoker().invoke(&request))
        .await
        .expect("Invocation should not hang after overflow");

    match outcome {
        Err(ExecError::MaxBufferExceeded { stream, limit, .. }) => {
            assert_eq!(stream, OutputSource::Stdout);
            assert_eq!(limit, 1000);
        }
        other => panic!("Expected max buffer failure, got {other:?}"),
    }
}

#[tokio::test]
async fn combined_output_keeps_character_split_by_line_capacity() {
    let dir = tempdir().unwrap();
    let invoker = GitInvoker::new(InvokerConfig {
        git_path: "sh".into(),
        line_capacity: 4,
        ..Default::default()
    })
    .unwrap();
    let request = script(dir.path(), "log", "printf 'abc\\303\\251\\n'");

    let result = invoker.invoke(&request).await.unwrap();

    assert_eq!(result.stdout_text(), "abc\u{e9}\n");
    assert_eq!(result.combined_output(), "abc\u{e9}\n");
}

#[tokio::test]
async fn missing_executable_is_git_not_found() {
    let dir = tempdir().unwrap();
    let invoker =
        GitInvoker::new(InvokerConfig::with_git_path("/nonexistent/git-invoke-test-git")).unwrap();
    let request = script(dir.path(), "status", "true");

    let err = invoker.invoke(&request).await.unwrap_err();

    assert!(matches!(err, ExecError::GitNotFound { .. }));
    assert_eq!(err.operation(), Some("status"));
}

#[tokio::test]
async fn missing_working_directory_is_repository_does_not_exist() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("gone");
    let request = script(&missing, "status", "true");

    let err = sh_invoker().invoke(&request).await.unwrap_err();

    match err {
        ExecError::RepositoryDoesNotExist { operation, path } => {
            assert_eq!(operation, "status");
            assert_eq!(path, missing);
        }
        other => panic!("Expected missing repository, got {other:?}"),
    }
}

#[tokio::test]
async fn killed_process_reports_negative_exit_code() {
    let dir = tempdir().unwrap();
    let request = script(dir.path(), "gc", "kill -9 $$");

    let err = sh_invoker().invoke(&request).await.unwrap_err();

    assert_eq!(err.as_git_error().unwrap().result().exit_code(), -1);
}

#[tokio::test]
async fn config_lock_path_recovered_from_failure() {
    let dir = tempdir().unwrap();
    let request = script(
        dir.path(),
        "config",
        "echo 'error: could not lock config file .git/config: File exists' >&2; exit 255",
    );

    let err = sh_invoker().invoke(&request).await.unwrap_err();

    let result = err.as_git_error().unwrap().result();
    assert_eq!(
        result.error_kind(),
        Some(GitErrorKind::ConfigLockFileAlreadyExists)
    );
    assert_eq!(
        config_lock_file_path(result),
        Some(dir.path().join(".git").join("config.lock"))
    );
}

#[tokio::test]
async fn extra_config_signature_classifies_output() {
    let dir = tempdir().unwrap();
    let config = InvokerConfig {
        git_path: "sh".into(),
        signatures: vec![git_invoke::config::SignatureConfig {
            kind: GitErrorKind::LfsAttributeDoesNotMatch,
            pattern: "custom hook rejected".to_string(),
        }],
        ..Default::default()
    };
    let invoker = GitInvoker::new(config).unwrap();
    let request = script(dir.path(), "push", "echo 'custom hook rejected' >&2; exit 1");

    let err = invoker.invoke(&request).await.unwrap_err();

    assert_eq!(
        err.as_git_error().unwrap().result().error_kind(),
        Some(GitErrorKind::LfsAttributeDoesNotMatch)
    );
}

#[tokio::test]
async fn concurrent_invocations_share_invoker() {
    let dir = tempdir().unwrap();
    let invoker = Arc::new(sh_invoker());

    let mut handles = Vec::new();
    for i in 0..8 {
        let invoker = Arc::clone(&invoker);
        let path = dir.path().to_path_buf();
        handles.push(tokio::spawn(async move {
            let request = script(&path, "echo", &format!("echo {i}"));
            invoker.invoke(&request).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.stdout_text(), format!("{i}\n"));
    }
}
