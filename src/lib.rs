//! git-invoke - run the git CLI as a subprocess and classify its failures.

pub mod classify;
pub mod config;
pub mod display;
pub mod exec;
pub mod progress;
pub mod stream;
