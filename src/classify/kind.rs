//! Classified git error kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A known failure condition recognized in git's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitErrorKind {
    // Authentication
    SshKeyAuditUnverified,
    SshAuthenticationFailed,
    SshPermissionDenied,
    HttpsAuthenticationFailed,
    // Connectivity
    RemoteDisconnection,
    HostDown,
    // History conflicts
    RebaseConflicts,
    MergeConflicts,
    RevertConflicts,
    CannotMergeUnrelatedHistories,
    PushNotFastForward,
    NonFastForwardMergeIntoEmptyHead,
    UnresolvedConflicts,
    ConflictModifyDeletedInBranch,
    EmptyRebasePatch,
    // Remote lookup
    HttpsRepositoryNotFound,
    SshRepositoryNotFound,
    NoMatchingRemoteBranch,
    NoExistingRemoteBranch,
    BranchDeletionFailed,
    DefaultBranchDeletionFailed,
    // Hosting policy rejections
    PushWithFileSizeExceedingLimit,
    HexBranchNameRejected,
    ForcePushRejected,
    InvalidRefLength,
    ProtectedBranchRequiresReview,
    ProtectedBranchForcePush,
    ProtectedBranchDeleteRejected,
    ProtectedBranchRequiredStatus,
    PushWithPrivateEmail,
    // Submodules
    NoSubmoduleMapping,
    SubmoduleRepositoryDoesNotExist,
    InvalidSubmoduleSha,
    // Local state
    NothingToCommit,
    LocalPermissionDenied,
    InvalidMerge,
    InvalidRebase,
    PatchDoesNotApply,
    BranchAlreadyExists,
    BadRevision,
    NotAGitRepository,
    LfsAttributeDoesNotMatch,
    BranchRenameFailed,
    PathDoesNotExist,
    InvalidObjectName,
    OutsideRepository,
    LockFileAlreadyExists,
    NoMergeToAbort,
    LocalChangesOverwritten,
    GpgFailedToSignData,
    ConfigLockFileAlreadyExists,
    RemoteAlreadyExists,
    TagAlreadyExists,
    MergeWithLocalChanges,
    RebaseWithLocalChanges,
    MergeCommitNoMainlineOption,
    UnsafeDirectory,
    PathExistsButNotInRef,
}

/// Human-readable explanation attached to a classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDescription {
    /// A curated message that replaces git's own output.
    Curated(&'static str),
    /// Git's raw message is more useful than anything generic.
    ToolOutput,
}

impl ErrorDescription {
    /// The curated text, if any.
    #[must_use]
    pub fn curated(self) -> Option<&'static str> {
        match self {
            Self::Curated(text) => Some(text),
            Self::ToolOutput => None,
        }
    }
}

const AUTHENTICATION_FAILED: &str = "Authentication failed. Some common reasons include:\n\n\
    - You are not logged in to your account.\n\
    - You may need to log out and log back in to refresh your token.\n\
    - You do not have permission to access this repository.\n\
    - The repository is archived and you do not have permission to push to it.\n\
    - Your SSH key is not registered with the host.";

const REPOSITORY_NOT_FOUND: &str = "The repository does not seem to exist anymore. \
    You may not have access, or it may have been deleted or renamed.";

impl GitErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: &'static [GitErrorKind] = &[
        Self::SshKeyAuditUnverified,
        Self::SshAuthenticationFailed,
        Self::SshPermissionDenied,
        Self::HttpsAuthenticationFailed,
        Self::RemoteDisconnection,
        Self::HostDown,
        Self::RebaseConflicts,
        Self::MergeConflicts,
        Self::RevertConflicts,
        Self::CannotMergeUnrelatedHistories,
        Self::PushNotFastForward,
        Self::NonFastForwardMergeIntoEmptyHead,
        Self::UnresolvedConflicts,
        Self::ConflictModifyDeletedInBranch,
        Self::EmptyRebasePatch,
        Self::HttpsRepositoryNotFound,
        Self::SshRepositoryNotFound,
        Self::NoMatchingRemoteBranch,
        Self::NoExistingRemoteBranch,
        Self::BranchDeletionFailed,
        Self::DefaultBranchDeletionFailed,
        Self::PushWithFileSizeExceedingLimit,
        Self::HexBranchNameRejected,
        Self::ForcePushRejected,
        Self::InvalidRefLength,
        Self::ProtectedBranchRequiresReview,
        Self::ProtectedBranchForcePush,
        Self::ProtectedBranchDeleteRejected,
        Self::ProtectedBranchRequiredStatus,
        Self::PushWithPrivateEmail,
        Self::NoSubmoduleMapping,
        Self::SubmoduleRepositoryDoesNotExist,
        Self::InvalidSubmoduleSha,
        Self::NothingToCommit,
        Self::LocalPermissionDenied,
        Self::InvalidMerge,
        Self::InvalidRebase,
        Self::PatchDoesNotApply,
        Self::BranchAlreadyExists,
        Self::BadRevision,
        Self::NotAGitRepository,
        Self::LfsAttributeDoesNotMatch,
        Self::BranchRenameFailed,
        Self::PathDoesNotExist,
        Self::InvalidObjectName,
        Self::OutsideRepository,
        Self::LockFileAlreadyExists,
        Self::NoMergeToAbort,
        Self::LocalChangesOverwritten,
        Self::GpgFailedToSignData,
        Self::ConfigLockFileAlreadyExists,
        Self::RemoteAlreadyExists,
        Self::TagAlreadyExists,
        Self::MergeWithLocalChanges,
        Self::RebaseWithLocalChanges,
        Self::MergeCommitNoMainlineOption,
        Self::UnsafeDirectory,
        Self::PathExistsButNotInRef,
    ];

    /// Check whether this kind means the user could not be authenticated.
    ///
    /// Callers typically react to all of these the same way, by asking the
    /// user to sign in again.
    #[must_use]
    pub fn is_authentication_failure(self) -> bool {
        matches!(
            self,
            Self::SshAuthenticationFailed
                | Self::SshPermissionDenied
                | Self::HttpsAuthenticationFailed
                | Self::HttpsRepositoryNotFound
                | Self::SshRepositoryNotFound
        )
    }

    /// Explanation to show for this kind.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn description(self) -> ErrorDescription {
        use ErrorDescription::{Curated, ToolOutput};

        match self {
            Self::SshKeyAuditUnverified => Curated("The SSH key is unverified."),
            Self::SshAuthenticationFailed
            | Self::SshPermissionDenied
            | Self::HttpsAuthenticationFailed => Curated(AUTHENTICATION_FAILED),
            Self::RemoteDisconnection => Curated(
                "The remote disconnected. Check your Internet connection and try again.",
            ),
            Self::HostDown => {
                Curated("The host is down. Check your Internet connection and try again.")
            }
            Self::RebaseConflicts => Curated(
                "We found some conflicts while trying to rebase. \
                 Please resolve the conflicts before continuing.",
            ),
            Self::MergeConflicts => Curated(
                "We found some conflicts while trying to merge. \
                 Please resolve the conflicts and commit the changes.",
            ),
            Self::RevertConflicts => {
                Curated("To finish reverting, please merge and commit the changes.")
            }
            Self::CannotMergeUnrelatedHistories => {
                Curated("Unable to merge unrelated histories in this repository.")
            }
            Self::PushNotFastForward => Curated(
                "The repository has been updated since you last pulled. \
                 Try pulling before pushing.",
            ),
            Self::NonFastForwardMergeIntoEmptyHead => Curated(
                "The merge you attempted is not a fast-forward, \
                 so it cannot be performed on an empty branch.",
            ),
            Self::UnresolvedConflicts => {
                Curated("There are unresolved conflicts in the working directory.")
            }
            Self::EmptyRebasePatch => Curated("There aren't any changes left to apply."),
            Self::HttpsRepositoryNotFound | Self::SshRepositoryNotFound => {
                Curated(REPOSITORY_NOT_FOUND)
            }
            Self::NoMatchingRemoteBranch => {
                Curated("There aren't any remote branches that match the current branch.")
            }
            Self::NoExistingRemoteBranch => Curated("The remote branch does not exist."),
            Self::BranchDeletionFailed => {
                Curated("Could not delete the branch. It was probably already deleted.")
            }
            Self::DefaultBranchDeletionFailed => Curated(
                "The branch is the repository's default branch and cannot be deleted.",
            ),
            Self::PushWithFileSizeExceedingLimit => Curated(
                "The push operation includes a file which exceeds the host's file size \
                 restriction. Please remove the file from history and try again.",
            ),
            Self::HexBranchNameRejected => Curated(
                "The branch name cannot be a 40-character string of hexadecimal characters, \
                 as this is the format that Git uses for representing objects.",
            ),
            Self::ForcePushRejected => {
                Curated("The force push has been rejected for the current branch.")
            }
            Self::InvalidRefLength => Curated("A ref cannot be longer than 255 characters."),
            Self::ProtectedBranchRequiresReview => Curated(
                "This branch is protected and any changes require an approved review. \
                 Open a pull request with changes targeting this branch instead.",
            ),
            Self::ProtectedBranchForcePush => {
                Curated("This branch is protected from force-push operations.")
            }
            Self::ProtectedBranchDeleteRejected => Curated(
                "This branch cannot be deleted from the remote repository \
                 because it is marked as protected.",
            ),
            Self::ProtectedBranchRequiredStatus => Curated(
                "The push was rejected by the remote server \
                 because a required status check has not been satisfied.",
            ),
            Self::PushWithPrivateEmail => Curated(
                "Cannot push these commits as they contain an email address \
                 marked as private on the host.",
            ),
            Self::NoSubmoduleMapping => Curated(
                "A submodule was removed from .gitmodules, but the folder still exists \
                 in the repository. Delete the folder, commit the change, then try again.",
            ),
            Self::SubmoduleRepositoryDoesNotExist => {
                Curated("A submodule points to a location which does not exist.")
            }
            Self::InvalidSubmoduleSha => {
                Curated("A submodule points to a commit which does not exist.")
            }
            Self::NothingToCommit => Curated("There are no changes to commit."),
            Self::LocalPermissionDenied => Curated("Permission denied."),
            Self::InvalidMerge => Curated("This is not something we can merge."),
            Self::InvalidRebase => Curated("This is not something we can rebase."),
            Self::PatchDoesNotApply => Curated(
                "The requested changes conflict with one or more files in the repository.",
            ),
            Self::BranchAlreadyExists => Curated("A branch with that name already exists."),
            Self::BadRevision => Curated("Bad revision."),
            Self::NotAGitRepository => Curated("This is not a git repository."),
            Self::LfsAttributeDoesNotMatch => Curated(
                "Git LFS attribute found in global Git configuration \
                 does not match expected value.",
            ),
            Self::BranchRenameFailed => Curated("The branch could not be renamed."),
            Self::PathDoesNotExist => Curated("The path does not exist on disk."),
            Self::InvalidObjectName => {
                Curated("The object was not found in the Git repository.")
            }
            Self::OutsideRepository => {
                Curated("This path is not a valid path inside the repository.")
            }
            Self::LockFileAlreadyExists => Curated(
                "A lock file already exists in the repository, \
                 which blocks this operation from completing.",
            ),
            Self::NoMergeToAbort => {
                Curated("There is no merge in progress, so there is nothing to abort.")
            }
            Self::LocalChangesOverwritten => Curated(
                "Unable to switch branches as there are working directory changes \
                 which would be overwritten. Please commit or stash your changes.",
            ),
            Self::TagAlreadyExists => Curated("A tag with that name already exists."),
            Self::GpgFailedToSignData
            | Self::ConfigLockFileAlreadyExists
            | Self::RemoteAlreadyExists
            | Self::ConflictModifyDeletedInBranch
            | Self::MergeWithLocalChanges
            | Self::RebaseWithLocalChanges
            | Self::MergeCommitNoMainlineOption
            | Self::UnsafeDirectory
            | Self::PathExistsButNotInRef => ToolOutput,
        }
    }
}

impl fmt::Display for GitErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
