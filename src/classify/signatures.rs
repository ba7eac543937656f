//! Signature table mapping git output to error kinds.
//!
//! The table is data: an ordered list of `(kind, pattern)` pairs, checked
//! first to last. Patterns match git's English output; a localized git can
//! produce text none of them match, in which case the failure stays
//! unclassified.

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::GitErrorKind;

/// Version of [`DEFAULT_SIGNATURES`]. Bump when entries change.
pub const SIGNATURE_TABLE_VERSION: u32 = 1;

/// Built-in signatures, in match priority order.
pub const DEFAULT_SIGNATURES: &[(GitErrorKind, &str)] = &[
    (
        GitErrorKind::SshKeyAuditUnverified,
        r"ERROR: ([\s\S]+?)\n+\[EPOLICYKEYAGE\]\n+fatal: Could not read from remote repository.",
    ),
    (
        GitErrorKind::HttpsAuthenticationFailed,
        r"fatal: Authentication failed for 'https://",
    ),
    (
        GitErrorKind::SshAuthenticationFailed,
        r"fatal: Authentication failed",
    ),
    (
        GitErrorKind::SshPermissionDenied,
        r"fatal: Could not read from remote repository.",
    ),
    (
        GitErrorKind::HttpsAuthenticationFailed,
        r"The requested URL returned error: 403",
    ),
    (
        GitErrorKind::RemoteDisconnection,
        r"fatal: [Tt]he remote end hung up unexpectedly",
    ),
    (
        GitErrorKind::HostDown,
        r"fatal: unable to access '(.+)': Failed to connect to (.+): Host is down",
    ),
    (
        GitErrorKind::HostDown,
        r"Cloning into '(.+)'...\nfatal: unable to access '(.+)': Could not resolve host: (.+)",
    ),
    (
        GitErrorKind::RebaseConflicts,
        r"Failed to merge in the changes.",
    ),
    (
        GitErrorKind::MergeConflicts,
        r"(Merge conflict|Automatic merge failed; fix conflicts and then commit the result)",
    ),
    (
        GitErrorKind::HttpsRepositoryNotFound,
        r"fatal: repository '(.+)' not found",
    ),
    (
        GitErrorKind::SshRepositoryNotFound,
        r"ERROR: Repository not found",
    ),
    (
        GitErrorKind::PushNotFastForward,
        r"\((non-fast-forward|fetch first)\)\nerror: failed to push some refs to '.*'",
    ),
    (
        GitErrorKind::BranchDeletionFailed,
        r"error: unable to delete '(.+)': remote ref does not exist",
    ),
    (
        GitErrorKind::DefaultBranchDeletionFailed,
        r"\[remote rejected\] (.+) \(deletion of the current branch prohibited\)",
    ),
    (
        GitErrorKind::RevertConflicts,
        r"error: could not revert .*\nhint: after resolving the conflicts, mark the corrected paths\nhint: with 'git add <paths>' or 'git rm <paths>'\nhint: and commit the result with 'git commit'",
    ),
    (
        GitErrorKind::EmptyRebasePatch,
        r"Applying: .*\nNo changes - did you forget to use 'git add'\?\nIf there is nothing left to stage, chances are that something else\n.*",
    ),
    (
        GitErrorKind::NoMatchingRemoteBranch,
        r"There are no candidates for (rebasing|merging) among the refs that you just fetched.\nGenerally this means that you provided a wildcard refspec which had no\nmatches on the remote end.",
    ),
    (
        GitErrorKind::NoExistingRemoteBranch,
        r"Your configuration specifies to merge with the ref '(.+)'\nfrom the remote, but no such ref was fetched.",
    ),
    (GitErrorKind::NothingToCommit, r"nothing to commit"),
    (
        GitErrorKind::NoSubmoduleMapping,
        r"[Nn]o submodule mapping found in .gitmodules for path '(.+)'",
    ),
    (
        GitErrorKind::SubmoduleRepositoryDoesNotExist,
        r"fatal: repository '(.+)' does not exist\nfatal: clone of '.+' into submodule path '(.+)' failed",
    ),
    (
        GitErrorKind::InvalidSubmoduleSha,
        r"Fetched in submodule path '(.+)', but it did not contain (.+). Direct fetching of that commit failed.",
    ),
    (
        GitErrorKind::LocalPermissionDenied,
        r"fatal: could not create work tree dir '(.+)'.*: Permission denied",
    ),
    (
        GitErrorKind::InvalidMerge,
        r"merge: (.+) - not something we can merge",
    ),
    (GitErrorKind::InvalidRebase, r"invalid upstream (.+)"),
    (
        GitErrorKind::NonFastForwardMergeIntoEmptyHead,
        r"fatal: Non-fast-forward commit does not make sense into an empty head",
    ),
    (
        GitErrorKind::PatchDoesNotApply,
        r"error: (.+): (patch does not apply|already exists in working directory)",
    ),
    (
        GitErrorKind::BranchAlreadyExists,
        r"fatal: [Aa] branch named '(.+)' already exists.?",
    ),
    (GitErrorKind::BadRevision, r"fatal: bad revision '(.*)'"),
    (
        GitErrorKind::NotAGitRepository,
        r"fatal: [Nn]ot a git repository \(or any of the parent directories\): (.*)",
    ),
    (
        GitErrorKind::CannotMergeUnrelatedHistories,
        r"fatal: refusing to merge unrelated histories",
    ),
    (
        GitErrorKind::LfsAttributeDoesNotMatch,
        r"The .+ attribute should be .+ but is .+",
    ),
    (
        GitErrorKind::BranchRenameFailed,
        r"fatal: Branch rename failed",
    ),
    (
        GitErrorKind::PathDoesNotExist,
        r"fatal: path '(.+)' does not exist .+",
    ),
    (
        GitErrorKind::InvalidObjectName,
        r"fatal: invalid object name '(.+)'.",
    ),
    (
        GitErrorKind::OutsideRepository,
        r"fatal: .+: '(.+)' is outside repository",
    ),
    (
        GitErrorKind::LockFileAlreadyExists,
        r"Another git process seems to be running in this repository, e.g.",
    ),
    (
        GitErrorKind::NoMergeToAbort,
        r"fatal: There is no merge to abort",
    ),
    (
        GitErrorKind::LocalChangesOverwritten,
        r"error: (?:Your local changes to the following|The following untracked working tree) files would be overwritten by checkout:",
    ),
    (
        GitErrorKind::UnresolvedConflicts,
        r"You must edit all merge conflicts and then\nmark them as resolved using git add|fatal: Exiting because of an unresolved conflict",
    ),
    (
        GitErrorKind::GpgFailedToSignData,
        r"error: gpg failed to sign the data",
    ),
    (
        GitErrorKind::ConflictModifyDeletedInBranch,
        r"CONFLICT \(modify/delete\): (.+) deleted in (.+) and modified in (.+)",
    ),
    (GitErrorKind::PushWithFileSizeExceedingLimit, r"error: GH001: "),
    (GitErrorKind::HexBranchNameRejected, r"error: GH002: "),
    (
        GitErrorKind::ForcePushRejected,
        r"error: GH003: Sorry, force-pushing to (.+) is not allowed.",
    ),
    (
        GitErrorKind::InvalidRefLength,
        r"error: GH005: Sorry, refs longer than (.+) bytes are not allowed",
    ),
    (
        GitErrorKind::ProtectedBranchRequiresReview,
        r"error: GH006: Protected branch update failed for (.+)\nremote: error: At least one approved review is required",
    ),
    (
        GitErrorKind::ProtectedBranchForcePush,
        r"error: GH006: Protected branch update failed for (.+)\nremote: error: Cannot force-push to a protected branch",
    ),
    (
        GitErrorKind::ProtectedBranchDeleteRejected,
        r"error: GH006: Protected branch update failed for (.+)\nremote: error: Cannot delete a protected branch",
    ),
    (
        GitErrorKind::ProtectedBranchRequiredStatus,
        r#"error: GH006: Protected branch update failed for (.+).\nremote: error: Required status check "(.+)" is expected"#,
    ),
    (
        GitErrorKind::PushWithPrivateEmail,
        r"error: GH007: Your push would publish a private email address.",
    ),
    (
        GitErrorKind::ConfigLockFileAlreadyExists,
        r"error: could not lock config file (.+): File exists",
    ),
    (
        GitErrorKind::RemoteAlreadyExists,
        r"error: remote (.+) already exists.",
    ),
    (
        GitErrorKind::TagAlreadyExists,
        r"fatal: tag '(.+)' already exists",
    ),
    (
        GitErrorKind::MergeWithLocalChanges,
        r"error: Your local changes to the following files would be overwritten by merge:\n",
    ),
    (
        GitErrorKind::RebaseWithLocalChanges,
        r"error: cannot (pull with rebase|rebase): You have unstaged changes\.\n\s*error: [Pp]lease commit or stash them\.",
    ),
    (
        GitErrorKind::MergeCommitNoMainlineOption,
        r"error: commit (.+) is a merge but no -m option was given",
    ),
    (
        GitErrorKind::UnsafeDirectory,
        r"fatal: detected dubious ownership in repository at (.+)",
    ),
    (
        GitErrorKind::PathExistsButNotInRef,
        r"fatal: path '(.+)' exists on disk, but not in '(.+)'",
    ),
];

static DEFAULT_TABLE: LazyLock<Arc<ErrorSignatures>> =
    LazyLock::new(|| Arc::new(ErrorSignatures::with_default_signatures()));

/// A single compiled signature.
#[derive(Debug, Clone)]
pub struct Signature {
    kind: GitErrorKind,
    pattern: Regex,
}

impl Signature {
    /// Compile a signature.
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if the pattern is invalid.
    pub fn new(kind: GitErrorKind, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            pattern: Regex::new(pattern)?,
        })
    }

    /// Check if the text matches this signature.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// The kind this signature maps to.
    #[must_use]
    pub fn kind(&self) -> GitErrorKind {
        self.kind
    }

    /// The pattern string (for debugging/display).
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Ordered collection of signatures used to classify git output.
#[derive(Debug, Clone, Default)]
pub struct ErrorSignatures {
    signatures: Vec<Signature>,
}

impl ErrorSignatures {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signatures: Vec::new(),
        }
    }

    /// Create a table from [`DEFAULT_SIGNATURES`].
    #[must_use]
    pub fn with_default_signatures() -> Self {
        let signatures = DEFAULT_SIGNATURES
            .iter()
            .filter_map(|(kind, pattern)| match Signature::new(*kind, pattern) {
                Ok(signature) => Some(signature),
                Err(e) => {
                    tracing::warn!(kind = %kind, error = %e, "Failed to compile default signature");
                    None
                }
            })
            .collect();
        Self { signatures }
    }

    /// Shared instance of the default table.
    #[must_use]
    pub fn shared_default() -> Arc<Self> {
        Arc::clone(&DEFAULT_TABLE)
    }

    /// Append a signature; it is checked after all existing ones.
    pub fn add(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    /// Number of signatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Check if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// All signatures in priority order.
    #[must_use]
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// First kind whose signature matches `text`.
    #[must_use]
    pub fn match_text(&self, text: &str) -> Option<GitErrorKind> {
        self.signatures
            .iter()
            .find(|signature| signature.matches(text))
            .map(Signature::kind)
    }

    /// Classify a finished invocation.
    ///
    /// Returns `None` when the exit code is a success code or when nothing
    /// in stderr, then stdout, matches a signature.
    #[must_use]
    pub fn classify(
        &self,
        exit_code: i32,
        success_codes: &BTreeSet<i32>,
        stderr: &str,
        stdout: Option<&str>,
    ) -> Option<GitErrorKind> {
        if success_codes.contains(&exit_code) {
            return None;
        }
        self.match_text(stderr)
            .or_else(|| stdout.and_then(|text| self.match_text(text)))
    }
}

/// Classify with the default table and the default success code `0`.
#[must_use]
pub fn classify(exit_code: i32, stderr: &str, stdout: &str) -> Option<GitErrorKind> {
    DEFAULT_TABLE.classify(exit_code, &BTreeSet::from([0]), stderr, Some(stdout))
}
