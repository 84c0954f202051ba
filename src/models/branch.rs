//! Branch and stash models

use serde::{Deserialize, Serialize};

/// Whether a branch lives in `refs/heads` or `refs/remotes`.
///
/// The declaration order is the listing order: local branches sort before
/// remote-tracking ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchKind {
    Local,
    Remote,
}

/// Branch information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchInfo {
    /// Name without the `refs/heads/` or `refs/remotes/` prefix
    pub short_name: String,
    pub full_ref: String,
    pub kind: BranchKind,
    pub is_current: bool,
}

impl BranchInfo {
    /// Listing order: current branch first, then local before remote, then by name.
    pub fn sort(branches: &mut [BranchInfo]) {
        branches.sort_by(|a, b| {
            (!a.is_current, a.kind, &a.short_name).cmp(&(!b.is_current, b.kind, &b.short_name))
        });
    }
}

/// Stash entry
///
/// `index` is positional: dropping entry `k` shifts every entry above it down
/// by one, so the list must be fetched again after any stash mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StashEntry {
    pub index: usize,
    pub message: String,
    pub short_hash: String,
}
