//! Repository and working-tree models

use serde::{Deserialize, Serialize};

/// Repository state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepositoryState {
    Clean,
    Merge,
    Revert,
    Cherrypick,
    Bisect,
    Rebase,
    ApplyMailbox,
}

impl From<git2::RepositoryState> for RepositoryState {
    fn from(state: git2::RepositoryState) -> Self {
        match state {
            git2::RepositoryState::Clean => RepositoryState::Clean,
            git2::RepositoryState::Merge => RepositoryState::Merge,
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                RepositoryState::Revert
            }
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                RepositoryState::Cherrypick
            }
            git2::RepositoryState::Bisect => RepositoryState::Bisect,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => RepositoryState::Rebase,
            git2::RepositoryState::ApplyMailbox
            | git2::RepositoryState::ApplyMailboxOrRebase => RepositoryState::ApplyMailbox,
        }
    }
}

impl std::fmt::Display for RepositoryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RepositoryState::Clean => "clean",
            RepositoryState::Merge => "merge",
            RepositoryState::Revert => "revert",
            RepositoryState::Cherrypick => "cherry-pick",
            RepositoryState::Bisect => "bisect",
            RepositoryState::Rebase => "rebase",
            RepositoryState::ApplyMailbox => "apply-mailbox",
        };
        f.write_str(label)
    }
}

/// Kind of change for a single path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Untracked,
    Missing,
    Conflicting,
}

/// A changed path in the working tree or index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    pub path: String,
    pub kind: ChangeKind,
}

/// Per-category counts of working-tree status
///
/// Categories follow the index/workdir split: `added`, `changed` and `removed`
/// compare the index with HEAD; `modified`, `untracked` and `missing` compare
/// the working tree with the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub added: usize,
    pub changed: usize,
    pub modified: usize,
    pub untracked: usize,
    pub missing: usize,
    pub removed: usize,
    pub conflicting: usize,
}

impl StatusCounts {
    /// Pending changes shown on the dashboard; conflicts are counted separately.
    pub fn pending(&self) -> usize {
        self.added + self.changed + self.modified + self.untracked + self.missing + self.removed
    }
}

/// Dashboard state for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DashboardSnapshot {
    #[serde(rename_all = "camelCase")]
    Success {
        current_branch: String,
        pending_change_count: usize,
        unpushed_commit_count: usize,
        conflict_file_count: usize,
    },
    NotInitialized,
    Error {
        reason: String,
    },
}
