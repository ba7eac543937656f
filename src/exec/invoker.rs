//! Git process invocation.
//!
//! Spawns git, feeds both output streams through the line reconstructor
//! and a diagnostic tail buffer as they arrive, then classifies the exit.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

use super::env::{merge_environment, EnvironmentProvider, NoEnvironment};
use super::{
    ExecError, ExecutionRequest, ExecutionResult, GitError, OutputEncoding, OutputLine,
    OutputSource,
};
use crate::classify::ErrorSignatures;
use crate::config::{ConfigError, InvokerConfig};
use crate::stream::{LineReconstructor, TailBuffer, READ_CHUNK_SIZE};

/// Runs git invocations.
///
/// Cheap to share behind an `Arc`; each call to [`GitInvoker::invoke`]
/// owns its own process and stream state.
pub struct GitInvoker {
    config: InvokerConfig,
    line_capacity: NonZeroUsize,
    tail_capacity: NonZeroUsize,
    signatures: Arc<ErrorSignatures>,
    environment: Arc<dyn EnvironmentProvider>,
}

impl std::fmt::Debug for GitInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitInvoker")
            .field("config", &self.config)
            .field("signatures", &self.signatures.len())
            .finish_non_exhaustive()
    }
}

impl GitInvoker {
    /// Create an invoker from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a capacity is zero or an extra signature
    /// does not compile.
    pub fn new(config: InvokerConfig) -> Result<Self, ConfigError> {
        let line_capacity = NonZeroUsize::new(config.line_capacity)
            .ok_or(ConfigError::ZeroCapacity("line_capacity"))?;
        let tail_capacity = NonZeroUsize::new(config.tail_capacity)
            .ok_or(ConfigError::ZeroCapacity("tail_capacity"))?;
        let signatures = if config.signatures.is_empty() {
            ErrorSignatures::shared_default()
        } else {
            Arc::new(config.build_signatures()?)
        };

        Ok(Self {
            config,
            line_capacity,
            tail_capacity,
            signatures,
            environment: Arc::new(NoEnvironment),
        })
    }

    /// Use `provider` to supply per-invocation environment.
    #[must_use]
    pub fn with_environment_provider(mut self, provider: Arc<dyn EnvironmentProvider>) -> Self {
        self.environment = provider;
        self
    }

    /// Replace the signature table.
    #[must_use]
    pub fn with_signatures(mut self, signatures: Arc<ErrorSignatures>) -> Self {
        self.signatures = signatures;
        self
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Get the signature table.
    #[must_use]
    pub fn signatures(&self) -> &ErrorSignatures {
        &self.signatures
    }

    /// Run git and wait for it to exit.
    ///
    /// Returns the result when the exit code is a success code or the
    /// classified error is one the request expects.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Git` for any other exit, and the remaining
    /// variants for failures to spawn or talk to the process.
    pub async fn invoke(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecError> {
        let options = request.exec_options();
        let operation = request.name();
        let started = Instant::now();

        let env = self.build_environment(request).await;

        tracing::debug!(
            operation = %operation,
            args = ?request.args(),
            working_dir = %request.working_dir().display(),
            "Spawning git"
        );

        let mut cmd = Command::new(&self.config.git_path);
        cmd.args(request.args())
            .current_dir(request.working_dir())
            .envs(&env)
            .stdin(if options.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| self.spawn_error(request, e))?;

        let stdin_task = match (child.stdin.take(), &options.stdin) {
            (Some(mut pipe), Some(input)) => {
                let input = input.clone();
                Some(tokio::spawn(async move {
                    let written = pipe.write_all(&input).await;
                    drop(pipe);
                    written
                }))
            }
            _ => None,
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| missing_pipe(operation, OutputSource::Stdout))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| missing_pipe(operation, OutputSource::Stderr))?;

        let settings = CaptureSettings {
            line_capacity: self.line_capacity,
            tail_capacity: self.tail_capacity,
            max_buffer: options.max_buffer.or(self.config.max_buffer),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let stdout_task = tokio::spawn(capture(stdout, OutputSource::Stdout, settings, tx.clone()));
        let stderr_task = tokio::spawn(capture(stderr, OutputSource::Stderr, settings, tx));

        let mut combined_output = String::new();
        let mut stdout_decoder = LineDecoder::default();
        let mut stderr_decoder = LineDecoder::default();
        while let Some(event) = rx.recv().await {
            match event {
                CaptureEvent::Line(line) => {
                    let decoder = match line.source {
                        OutputSource::Stdout => &mut stdout_decoder,
                        OutputSource::Stderr => &mut stderr_decoder,
                    };
                    decoder.decode(&line.bytes, &mut combined_output);
                    if let Some(sink) = &options.output_sink {
                        let _ = sink.send(line);
                    }
                }
                CaptureEvent::Overflow(source) => {
                    tracing::warn!(
                        operation = %operation,
                        %source,
                        limit = ?settings.max_buffer,
                        "Output exceeded maximum buffer, killing git"
                    );
                    if let Err(e) = child.start_kill() {
                        tracing::debug!(error = %e, "Failed to kill git");
                    }
                }
            }
        }

        stdout_decoder.finish(&mut combined_output);
        stderr_decoder.finish(&mut combined_output);

        let stdout = join_capture(stdout_task, operation).await?;
        let stderr = join_capture(stderr_task, operation).await?;
        let status = child.wait().await.map_err(|e| io_error(operation, e))?;

        if let Some(task) = stdin_task {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!(operation = %operation, "Git exited before reading all of stdin");
                }
                Ok(Err(e)) => return Err(io_error(operation, e)),
                Err(e) => return Err(io_error(operation, std::io::Error::other(e))),
            }
        }

        for captured in [&stdout, &stderr] {
            if captured.overflowed {
                return Err(ExecError::MaxBufferExceeded {
                    operation: operation.to_string(),
                    stream: captured.source,
                    limit: settings.max_buffer.unwrap_or_default(),
                    tail: captured.tail.clone(),
                });
            }
        }

        let exit_code = exit_code_of(status);
        let error_kind = {
            let stderr_text = String::from_utf8_lossy(&stderr.bytes);
            let stdout_text = match options.encoding {
                OutputEncoding::Text => Some(String::from_utf8_lossy(&stdout.bytes)),
                OutputEncoding::Raw => None,
            };
            self.signatures.classify(
                exit_code,
                &options.success_exit_codes,
                &stderr_text,
                stdout_text.as_deref(),
            )
        };

        let elapsed = started.elapsed();
        if elapsed >= self.config.slow_command_threshold() {
            tracing::info!(
                operation = %operation,
                args = ?request.args(),
                ?elapsed,
                "Slow git command"
            );
        } else {
            tracing::debug!(operation = %operation, exit_code, ?elapsed, "Git exited");
        }

        let result = ExecutionResult::new(
            exit_code,
            stdout.bytes,
            stderr.bytes,
            combined_output,
            request.working_dir().to_path_buf(),
            error_kind,
            elapsed,
        );

        let succeeded = options.success_exit_codes.contains(&exit_code);
        if succeeded || error_kind.is_some_and(|kind| request.expects(kind)) {
            return Ok(result);
        }

        let diagnostic = diagnostic_message(request.args(), &result);
        tracing::error!(operation = %operation, "{diagnostic}");

        Err(GitError::new(result, request.args().to_vec()).into())
    }

    async fn build_environment(&self, request: &ExecutionRequest) -> HashMap<String, String> {
        let options = request.exec_options();
        let provided = self
            .environment
            .environment_for(request.working_dir(), options.is_background_task)
            .await;
        merge_environment([&self.config.environment, &options.env, &provided])
    }

    fn spawn_error(&self, request: &ExecutionRequest, err: std::io::Error) -> ExecError {
        let operation = request.name().to_string();
        tracing::warn!(operation = %operation, error = %err, "Failed to spawn git");

        if err.kind() == std::io::ErrorKind::NotFound {
            if !request.working_dir().exists() {
                return ExecError::RepositoryDoesNotExist {
                    operation,
                    path: request.working_dir().to_path_buf(),
                };
            }
            return ExecError::GitNotFound {
                operation,
                path: self.config.git_path.clone(),
            };
        }

        ExecError::Io {
            operation,
            source: err,
        }
    }
}

/// Compose the log message for an unexpected exit.
#[must_use]
pub fn diagnostic_message(args: &[String], result: &ExecutionResult) -> String {
    let mut lines = vec![format!(
        "`git {}` exited with an unexpected code: {}.",
        args.join(" "),
        result.exit_code()
    )];

    if !result.stdout().is_empty() {
        lines.push("stdout:".to_string());
        lines.push(result.stdout_text().into_owned());
    }

    if !result.stderr().is_empty() {
        lines.push("stderr:".to_string());
        lines.push(result.stderr_text().into_owned());
    }

    if let Some(kind) = result.error_kind() {
        match result.error_description() {
            Some(description) => {
                lines.push(format!("(The error was parsed as {kind}: {description})"));
            }
            None => lines.push(format!("(The error was parsed as {kind})")),
        }
    }

    lines.join("\n")
}

/// Decodes one stream's lines into text.
///
/// A line forced out at capacity can end inside a multi-byte character; the
/// incomplete tail is held back and joined with the next line of the same
/// stream.
#[derive(Debug, Default)]
struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    fn decode(&mut self, bytes: &[u8], out: &mut String) {
        self.pending.extend_from_slice(bytes);
        let split = self.pending.len() - incomplete_suffix_len(&self.pending);
        out.push_str(&String::from_utf8_lossy(&self.pending[..split]));
        self.pending.drain(..split);
    }

    fn finish(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            out.push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
    }
}

/// Length of a truncated UTF-8 sequence at the end of `bytes`, or 0.
fn incomplete_suffix_len(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let width = match byte {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return 0,
        };
        return if back < width { back } else { 0 };
    }
    0
}

#[derive(Debug, Clone, Copy)]
struct CaptureSettings {
    line_capacity: NonZeroUsize,
    tail_capacity: NonZeroUsize,
    max_buffer: Option<usize>,
}

#[derive(Debug)]
enum CaptureEvent {
    Line(OutputLine),
    Overflow(OutputSource),
}

#[derive(Debug)]
struct Captured {
    source: OutputSource,
    bytes: Vec<u8>,
    tail: Vec<u8>,
    overflowed: bool,
}

/// Read one stream to EOF, or until it overflows `max_buffer`.
///
/// On overflow the reader is dropped at once. Anything still writing to the
/// pipe, including helpers git forked that inherited it, then fails with
/// `EPIPE` instead of keeping the stream open.
async fn capture<R>(
    mut reader: R,
    source: OutputSource,
    settings: CaptureSettings,
    tx: UnboundedSender<CaptureEvent>,
) -> std::io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let mut lines = LineReconstructor::new(settings.line_capacity);
    let mut tail = TailBuffer::new(settings.tail_capacity);
    let mut bytes = Vec::new();
    let mut overflowed = false;
    let mut buf = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let chunk = &buf[..n];
        tail.push(chunk);

        if settings
            .max_buffer
            .is_some_and(|limit| bytes.len() + n > limit)
        {
            overflowed = true;
            let _ = tx.send(CaptureEvent::Overflow(source));
            break;
        }

        bytes.extend_from_slice(chunk);
        for line in lines.push(chunk) {
            let _ = tx.send(CaptureEvent::Line(OutputLine {
                source,
                bytes: line,
            }));
        }
    }
    drop(reader);

    if !overflowed {
        if let Some(line) = lines.flush() {
            let _ = tx.send(CaptureEvent::Line(OutputLine {
                source,
                bytes: line,
            }));
        }
    }

    Ok(Captured {
        source,
        bytes,
        tail: tail.finish().unwrap_or_default(),
        overflowed,
    })
}

async fn join_capture(
    task: JoinHandle<std::io::Result<Captured>>,
    operation: &str,
) -> Result<Captured, ExecError> {
    match task.await {
        Ok(Ok(captured)) => Ok(captured),
        Ok(Err(e)) => Err(io_error(operation, e)),
        Err(e) => Err(io_error(operation, std::io::Error::other(e))),
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or_else(|| {
        tracing::debug!(?status, "Git terminated by signal");
        -1
    })
}

fn io_error(operation: &str, source: std::io::Error) -> ExecError {
    ExecError::Io {
        operation: operation.to_string(),
        source,
    }
}

fn missing_pipe(operation: &str, source: OutputSource) -> ExecError {
    io_error(
        operation,
        std::io::Error::other(format!("git {source} was not captured")),
    )
}
