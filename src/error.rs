//! Error types for GitPocket

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum GitPocketError {
    #[error("Not a Git repository: {0}")]
    NotARepository(String),

    #[error("Repository is empty. Commit first.")]
    RepositoryEmpty,

    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("No stash entry at stash@{{{0}}}")]
    StashNotFound(usize),

    #[error("Remote not found: {0}")]
    RemoteNotFound(String),

    #[error("Cannot delete active branch: {0}")]
    CannotDeleteCurrent(String),

    #[error("Uncommitted changes in the working tree")]
    DirtyWorkingTree,

    #[error("HEAD is detached")]
    DetachedHead,

    #[error("No remote main/master branch")]
    NoDefaultRemoteBranch,

    #[error("Invalid remote URL: {0}")]
    InvalidRemoteUrl(String),

    #[error("Path is not conflicting: {0}")]
    PathNotConflicting(String),

    #[error("Another operation is in progress: {0}")]
    OperationInProgress(String),

    #[error("Merge stopped with conflicts: {0}")]
    MergeConflict(String),

    #[error("Rebase stopped with conflicts: {0}")]
    RebaseConflict(String),

    #[error("Cherry-pick stopped with conflicts: {0}")]
    CherryPickConflict(String),

    #[error("Revert stopped with conflicts: {0}")]
    RevertConflict(String),

    #[error("Stash apply stopped with conflicts: {0}")]
    StashConflict(String),

    #[error("Push rejected: {0}")]
    PushRejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Git error: {0}")]
    Git(git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Credential store error: {0}")]
    CredentialStore(#[from] keyring::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Classify a backend error into the transport, credential or generic buckets.
impl From<git2::Error> for GitPocketError {
    fn from(err: git2::Error) -> Self {
        match (err.code(), err.class()) {
            (git2::ErrorCode::Auth, _) | (git2::ErrorCode::Certificate, _) => {
                GitPocketError::Authentication(err.message().to_string())
            }
            (git2::ErrorCode::NotFastForward, _) => {
                GitPocketError::PushRejected(err.message().to_string())
            }
            (
                _,
                git2::ErrorClass::Net
                | git2::ErrorClass::Http
                | git2::ErrorClass::Ssl
                | git2::ErrorClass::Ssh,
            ) => GitPocketError::Network(err.message().to_string()),
            _ => GitPocketError::Git(err),
        }
    }
}

/// Taxonomy tag carried by failed outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotARepository,
    RepositoryEmpty,
    CommitNotFound,
    BranchNotFound,
    StashNotFound,
    RemoteNotFound,
    CannotDeleteCurrent,
    DirtyWorkingTree,
    DetachedHead,
    NoDefaultRemoteBranch,
    InvalidRemoteUrl,
    PathNotConflicting,
    OperationInProgress,
    MergeConflict,
    RebaseConflict,
    CherryPickConflict,
    RevertConflict,
    StashConflict,
    PushRejected,
    NetworkFailure,
    AuthFailure,
    BackendFailure,
}

impl ErrorKind {
    /// Conflict kinds leave the working tree in a resolvable state.
    pub fn is_conflict(self) -> bool {
        matches!(
            self,
            ErrorKind::MergeConflict
                | ErrorKind::RebaseConflict
                | ErrorKind::CherryPickConflict
                | ErrorKind::RevertConflict
                | ErrorKind::StashConflict
        )
    }
}

impl GitPocketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GitPocketError::NotARepository(_) => ErrorKind::NotARepository,
            GitPocketError::RepositoryEmpty => ErrorKind::RepositoryEmpty,
            GitPocketError::CommitNotFound(_) => ErrorKind::CommitNotFound,
            GitPocketError::BranchNotFound(_) => ErrorKind::BranchNotFound,
            GitPocketError::StashNotFound(_) => ErrorKind::StashNotFound,
            GitPocketError::RemoteNotFound(_) => ErrorKind::RemoteNotFound,
            GitPocketError::CannotDeleteCurrent(_) => ErrorKind::CannotDeleteCurrent,
            GitPocketError::DirtyWorkingTree => ErrorKind::DirtyWorkingTree,
            GitPocketError::DetachedHead => ErrorKind::DetachedHead,
            GitPocketError::NoDefaultRemoteBranch => ErrorKind::NoDefaultRemoteBranch,
            GitPocketError::InvalidRemoteUrl(_) => ErrorKind::InvalidRemoteUrl,
            GitPocketError::PathNotConflicting(_) => ErrorKind::PathNotConflicting,
            GitPocketError::OperationInProgress(_) => ErrorKind::OperationInProgress,
            GitPocketError::MergeConflict(_) => ErrorKind::MergeConflict,
            GitPocketError::RebaseConflict(_) => ErrorKind::RebaseConflict,
            GitPocketError::CherryPickConflict(_) => ErrorKind::CherryPickConflict,
            GitPocketError::RevertConflict(_) => ErrorKind::RevertConflict,
            GitPocketError::StashConflict(_) => ErrorKind::StashConflict,
            GitPocketError::PushRejected(_) => ErrorKind::PushRejected,
            GitPocketError::Network(_) => ErrorKind::NetworkFailure,
            GitPocketError::Authentication(_) => ErrorKind::AuthFailure,
            GitPocketError::Git(_)
            | GitPocketError::Io(_)
            | GitPocketError::Serialization(_)
            | GitPocketError::CredentialStore(_)
            | GitPocketError::OperationFailed(_) => ErrorKind::BackendFailure,
        }
    }
}

/// Serializable error response for callers that forward errors over IPC
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub code: ErrorKind,
    pub message: String,
}

impl From<&GitPocketError> for ErrorResponse {
    fn from(error: &GitPocketError) -> Self {
        ErrorResponse {
            code: error.kind(),
            message: error.to_string(),
        }
    }
}

impl Serialize for GitPocketError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorResponse::from(self).serialize(serializer)
    }
}

/// Result type alias for GitPocket operations
pub type Result<T> = std::result::Result<T, GitPocketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_code_maps_to_auth_failure() {
        let err = git2::Error::new(
            git2::ErrorCode::Auth,
            git2::ErrorClass::Http,
            "authentication required",
        );
        assert_eq!(GitPocketError::from(err).kind(), ErrorKind::AuthFailure);
    }

    #[test]
    fn test_net_class_maps_to_network_failure() {
        let err = git2::Error::new(
            git2::ErrorCode::GenericError,
            git2::ErrorClass::Net,
            "failed to resolve address",
        );
        assert_eq!(GitPocketError::from(err).kind(), ErrorKind::NetworkFailure);
    }

    #[test]
    fn test_other_backend_errors_are_backend_failures() {
        let err = git2::Error::new(
            git2::ErrorCode::Locked,
            git2::ErrorClass::Index,
            "index is locked",
        );
        assert_eq!(GitPocketError::from(err).kind(), ErrorKind::BackendFailure);
    }

    #[test]
    fn test_conflict_kinds() {
        assert!(ErrorKind::MergeConflict.is_conflict());
        assert!(ErrorKind::StashConflict.is_conflict());
        assert!(!ErrorKind::DirtyWorkingTree.is_conflict());
    }

    #[test]
    fn test_error_serializes_with_code() {
        let json = serde_json::to_value(GitPocketError::DirtyWorkingTree).unwrap();
        assert_eq!(json["code"], "DIRTY_WORKING_TREE");
        assert_eq!(json["message"], "Uncommitted changes in the working tree");
    }
}
