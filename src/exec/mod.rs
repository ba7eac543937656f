//! Git process invocation, results and errors.

mod env;
mod error;
mod invoker;
mod request;
mod result;

pub use env::{merge_environment, EnvironmentProvider, NoEnvironment, StaticEnvironment, TERM_VALUE};
pub use error::{ExecError, GitError};
pub use invoker::{diagnostic_message, GitInvoker};
pub use request::{ExecOptions, ExecutionRequest, OutputEncoding};
pub use result::{ExecutionResult, OutputLine, OutputSource};
