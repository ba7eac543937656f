//! git-invoke - run git and report classified results.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use git_invoke::classify::GitErrorKind;
use git_invoke::config::{ConfigLoader, InvokerConfig};
use git_invoke::display;
use git_invoke::exec::{ExecError, ExecutionRequest, ExecutionResult, GitInvoker};

#[derive(Parser)]
#[command(
    name = "git-invoke",
    about = "Run git and classify its failures",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file to use instead of the search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one git command.
    Run {
        /// Working directory.
        #[arg(short = 'C', long = "dir", default_value = ".")]
        dir: PathBuf,
        /// Operation name used in logs and errors.
        #[arg(long, default_value = "run")]
        name: String,
        /// Exit codes treated as success (default 0).
        #[arg(long = "ok-code")]
        ok_codes: Vec<i32>,
        /// Error kinds that should not fail the run, e.g. `merge_conflicts`.
        #[arg(long = "expect", value_parser = parse_kind)]
        expect: Vec<GitErrorKind>,
        /// Fail when a captured stream grows past this many bytes.
        #[arg(long)]
        max_buffer: Option<usize>,
        /// Print the result as JSON instead of streaming output.
        #[arg(long)]
        json: bool,
        /// Arguments passed to git.
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },
    /// List the error signature table.
    Signatures {
        /// Also print curated descriptions.
        #[arg(long)]
        describe: bool,
    },
}

fn parse_kind(value: &str) -> Result<GitErrorKind, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown error kind: {value}"))
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Option<InvokerConfig> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    match loader.load() {
        Ok(config) => Some(config),
        Err(e) => {
            display::print_error(&e.to_string());
            None
        }
    }
}

fn result_json(result: &ExecutionResult) -> serde_json::Value {
    serde_json::json!({
        "exit_code": result.exit_code(),
        "error_kind": result.error_kind(),
        "description": result.error_description(),
        "stdout": result.stdout_text(),
        "stderr": result.stderr_text(),
        "combined_output": result.combined_output(),
        "elapsed_ms": u64::try_from(result.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

#[allow(clippy::too_many_arguments)]
async fn run(
    config: InvokerConfig,
    dir: PathBuf,
    name: String,
    ok_codes: Vec<i32>,
    expect: Vec<GitErrorKind>,
    max_buffer: Option<usize>,
    json: bool,
    args: Vec<String>,
) -> ExitCode {
    let invoker = match GitInvoker::new(config) {
        Ok(invoker) => invoker,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let dir = std::path::absolute(&dir).unwrap_or(dir);
    let mut request = ExecutionRequest::new(args, dir, name.clone());
    if !ok_codes.is_empty() {
        request = request.success_exit_codes(ok_codes);
    }
    for kind in expect {
        request = request.expect_error(kind);
    }
    if let Some(limit) = max_buffer {
        request = request.max_buffer(limit);
    }

    let printer = if json {
        None
    } else {
        let (tx, mut rx) = mpsc::unbounded_channel();
        request = request.output_sink(tx);
        Some(tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                display::print_output_line(&line);
            }
        }))
    };

    let outcome = invoker.invoke(&request).await;
    drop(request);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    match outcome {
        Ok(result) => {
            if json {
                println!("{}", result_json(&result));
            } else {
                display::print_result(&name, &result);
            }
            ExitCode::SUCCESS
        }
        Err(ExecError::Git(error)) => {
            if json {
                println!("{}", result_json(error.result()));
            } else {
                display::print_git_error(&name, &error);
            }
            let code = u8::try_from(error.result().exit_code()).unwrap_or(1);
            ExitCode::from(code.max(1))
        }
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(config) = load_config(cli.config) else {
        return ExitCode::FAILURE;
    };

    match cli.command {
        Commands::Run {
            dir,
            name,
            ok_codes,
            expect,
            max_buffer,
            json,
            args,
        } => run(config, dir, name, ok_codes, expect, max_buffer, json, args).await,
        Commands::Signatures { describe } => {
            let signatures = match config.build_signatures() {
                Ok(signatures) => signatures,
                Err(e) => {
                    display::print_error(&e.to_string());
                    return ExitCode::FAILURE;
                }
            };
            for (index, signature) in signatures.signatures().iter().enumerate() {
                display::print_signature(index, signature);
                if describe {
                    display::print_description(signature.kind());
                }
            }
            ExitCode::SUCCESS
        }
    }
}
