//! Dashboard snapshot

use super::{commit, staging};
use crate::error::Result;
use crate::models::DashboardSnapshot;
use crate::services::RepositoryHandle;
use crate::utils;

/// Computes the dashboard view of one repository
pub struct StatusAggregator<'a> {
    handle: &'a mut RepositoryHandle,
}

impl RepositoryHandle {
    pub fn status(&mut self) -> StatusAggregator<'_> {
        StatusAggregator { handle: self }
    }
}

impl StatusAggregator<'_> {
    /// Current branch and counters, computed fresh on every call.
    ///
    /// Any failure replaces the whole snapshot with `Error`.
    pub fn snapshot(&mut self) -> DashboardSnapshot {
        if !self.handle.is_repository() {
            return DashboardSnapshot::NotInitialized;
        }

        match self.try_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Dashboard snapshot failed: {}", e);
                DashboardSnapshot::Error {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn try_snapshot(&mut self) -> Result<DashboardSnapshot> {
        let remote_name = self.handle.remote_name().to_string();
        let repo = self.handle.ensure_open()?;

        let current_branch = utils::current_branch_label(repo)?;
        let counts = staging::status_counts(repo)?;

        let unpushed_commit_count = if utils::remote_url(repo, &remote_name)?.is_some() {
            commit::unpushed_count(repo, &remote_name)?
        } else {
            0
        };

        let conflict_file_count = utils::conflicted_paths(&repo.index()?)?.len();

        Ok(DashboardSnapshot::Success {
            current_branch,
            pending_change_count: counts.pending(),
            unpushed_commit_count,
            conflict_file_count,
        })
    }
}
