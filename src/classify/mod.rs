//! Classification of git failures.
//!
//! Maps an exit code plus captured output to a closed set of
//! [`GitErrorKind`]s, and extracts structured details from a few of them.

mod kind;
mod lock;
mod signatures;

pub use kind::{ErrorDescription, GitErrorKind};
pub use lock::config_lock_file_path;
pub use signatures::{
    classify, ErrorSignatures, Signature, DEFAULT_SIGNATURES, SIGNATURE_TABLE_VERSION,
};
