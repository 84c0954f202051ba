//! Point-in-time history operations: checkout, reset, revert and cherry-pick

use serde::{Deserialize, Serialize};

use super::commit::CommitHistoryService;
use crate::error::{GitPocketError, Result};
use crate::models::{short_hash, Outcome};
use crate::utils;

/// How far a reset reaches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetMode {
    /// Move the branch only
    Soft,
    /// Move the branch and reset the index, keeping working files
    #[default]
    Mixed,
    /// Discard index and working tree changes
    Hard,
}

impl From<ResetMode> for git2::ResetType {
    fn from(mode: ResetMode) -> Self {
        match mode {
            ResetMode::Soft => git2::ResetType::Soft,
            ResetMode::Mixed => git2::ResetType::Mixed,
            ResetMode::Hard => git2::ResetType::Hard,
        }
    }
}

impl CommitHistoryService<'_> {
    /// Detach HEAD at a commit
    pub fn checkout(&mut self, hash: &str) -> Outcome {
        let result = self.try_checkout(hash);
        Outcome::recover("checkout commit", result)
    }

    fn try_checkout(&mut self, hash: &str) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        utils::head_commit(repo)?;
        let commit = utils::resolve_commit(repo, hash)?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();
        repo.checkout_tree(commit.as_object(), Some(&mut checkout))?;
        repo.set_head_detached(commit.id())?;

        Ok(Outcome::completed(format!(
            "HEAD detached at {}",
            short_hash(&commit.id().to_string())
        )))
    }

    /// Mixed reset, or hard when `hard` is set
    pub fn reset(&mut self, hash: &str, hard: bool) -> Outcome {
        let mode = if hard { ResetMode::Hard } else { ResetMode::Mixed };
        self.reset_with(hash, mode)
    }

    pub fn reset_with(&mut self, hash: &str, mode: ResetMode) -> Outcome {
        let result = self.try_reset(hash, mode);
        Outcome::recover("reset", result)
    }

    fn try_reset(&mut self, hash: &str, mode: ResetMode) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        utils::head_commit(repo)?;
        utils::ensure_clean_state(repo)?;
        let commit = utils::resolve_commit(repo, hash)?;

        repo.reset(commit.as_object(), mode.into(), None)?;

        Ok(Outcome::completed(format!(
            "Reset to {}",
            short_hash(&commit.id().to_string())
        )))
    }

    /// Commit the inverse of `hash` on top of HEAD. Merge commits are reverted
    /// against their first parent.
    pub fn revert(&mut self, hash: &str) -> Outcome {
        let result = self.try_revert(hash);
        Outcome::recover("revert", result)
    }

    fn try_revert(&mut self, hash: &str) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        let head = utils::head_commit(repo)?;
        utils::ensure_clean_state(repo)?;
        let commit = utils::resolve_commit(repo, hash)?;

        if commit.parent_count() == 0 {
            return Err(GitPocketError::OperationFailed(
                "Cannot revert root commit".to_string(),
            ));
        }
        let signature = utils::signature(repo)?;

        let mut opts = git2::RevertOptions::new();
        if commit.parent_count() > 1 {
            opts.mainline(1);
        }
        repo.revert(&commit, Some(&mut opts))?;

        let mut index = repo.index()?;
        if index.has_conflicts() {
            let paths = utils::conflicted_paths(&index)?;
            return Err(GitPocketError::RevertConflict(paths.join(", ")));
        }

        let tree_oid = index.write_tree()?;
        let tree = repo.find_tree(tree_oid)?;
        let message = format!(
            "Revert \"{}\"\n\nThis reverts commit {}.",
            commit.summary().unwrap_or(""),
            commit.id()
        );

        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &message,
            &tree,
            &[&head],
        )?;
        repo.cleanup_state()?;

        Ok(Outcome::completed(format!(
            "Reverted {}",
            short_hash(&commit.id().to_string())
        )))
    }

    /// Apply `hash` on top of HEAD, keeping its author and message
    pub fn cherry_pick(&mut self, hash: &str) -> Outcome {
        let result = self.try_cherry_pick(hash);
        Outcome::recover("cherry-pick", result)
    }

    fn try_cherry_pick(&mut self, hash: &str) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        let head = utils::head_commit(repo)?;
        utils::ensure_clean_state(repo)?;
        let commit = utils::resolve_commit(repo, hash)?;

        if commit.parent_count() == 0 {
            return Err(GitPocketError::OperationFailed(
                "Cannot cherry-pick root commit".to_string(),
            ));
        }
        let committer = utils::signature(repo)?;

        let mut opts = git2::CherrypickOptions::new();
        if commit.parent_count() > 1 {
            opts.mainline(1);
        }
        repo.cherrypick(&commit, Some(&mut opts))?;

        let mut index = repo.index()?;
        if index.has_conflicts() {
            let paths = utils::conflicted_paths(&index)?;
            return Err(GitPocketError::CherryPickConflict(paths.join(", ")));
        }

        let tree_oid = index.write_tree()?;
        let tree = repo.find_tree(tree_oid)?;

        repo.commit(
            Some("HEAD"),
            &commit.author(),
            &committer,
            commit.message().unwrap_or(""),
            &tree,
            &[&head],
        )?;
        repo.cleanup_state()?;

        Ok(Outcome::completed(format!(
            "Cherry-picked {}",
            short_hash(&commit.id().to_string())
        )))
    }
}
