//! Branch listing, switching and integration

use git2::build::CheckoutBuilder;

use super::merge;
use crate::error::{GitPocketError, Result};
use crate::models::{BranchInfo, BranchKind, Outcome};
use crate::services::RepositoryHandle;
use crate::utils;

/// Branch operations on one repository
pub struct BranchOrchestrator<'a> {
    handle: &'a mut RepositoryHandle,
}

impl RepositoryHandle {
    pub fn branches(&mut self) -> BranchOrchestrator<'_> {
        BranchOrchestrator { handle: self }
    }
}

impl BranchOrchestrator<'_> {
    /// Local and remote-tracking branches, current branch first.
    ///
    /// Symbolic remote refs such as `origin/HEAD` are skipped.
    pub fn list_rich(&mut self) -> Result<Vec<BranchInfo>> {
        let repo = self.handle.ensure_open()?;
        let current = utils::head_branch_ref(repo)?;
        let mut branches = Vec::new();

        for branch_result in repo.branches(None)? {
            let (branch, branch_type) = branch_result?;
            let reference = branch.get();
            let full_ref = reference.name().unwrap_or("").to_string();

            let kind = match branch_type {
                git2::BranchType::Local => BranchKind::Local,
                git2::BranchType::Remote => BranchKind::Remote,
            };
            if kind == BranchKind::Remote
                && (reference.symbolic_target().is_some() || full_ref.ends_with("/HEAD"))
            {
                continue;
            }

            branches.push(BranchInfo {
                short_name: branch.name()?.unwrap_or("").to_string(),
                is_current: current.as_deref() == Some(full_ref.as_str()),
                full_ref,
                kind,
            });
        }

        BranchInfo::sort(&mut branches);
        Ok(branches)
    }

    /// Switch to `name`, creating it from a remote branch or from HEAD when
    /// no local branch exists.
    pub fn checkout(&mut self, name: &str) -> Outcome {
        let result = self.try_checkout(name);
        Outcome::recover("checkout branch", result)
    }

    fn try_checkout(&mut self, name: &str) -> Result<Outcome> {
        let remote_name = self.handle.remote_name().to_string();
        let repo = &*self.handle.ensure_open()?;
        let head = utils::head_commit(repo)?;

        if utils::current_branch(repo)?.as_deref() == Some(name) {
            return Ok(Outcome::up_to_date(format!("Already on {}", name)));
        }

        let local_ref = format!("refs/heads/{}", name);

        if repo.find_branch(name, git2::BranchType::Local).is_ok() {
            switch_to(repo, &local_ref)?;
            return Ok(Outcome::completed(format!("Switched to {}", name)));
        }

        // The working tree is written before the new ref exists, so a refused
        // checkout leaves no branch behind.
        if let Some(remote_branch) = find_remote_branch(repo, &remote_name, name)? {
            let upstream = remote_branch.name()?.unwrap_or("").to_string();
            let commit = remote_branch.get().peel_to_commit()?;
            tracing::debug!("Creating {} from {}", name, upstream);

            checkout_commit_tree(repo, &commit)?;
            let mut local = repo.branch(name, &commit, false)?;
            local.set_upstream(Some(&upstream))?;
            repo.set_head(&local_ref)?;
            return Ok(Outcome::completed(format!(
                "Switched to {} tracking {}",
                name, upstream
            )));
        }

        repo.branch(name, &head, false)?;
        repo.set_head(&local_ref)?;
        Ok(Outcome::completed(format!("Created and switched to {}", name)))
    }

    /// Create a local branch at HEAD without switching
    pub fn create(&mut self, name: &str) -> Outcome {
        let result = self.try_create(name);
        Outcome::recover("create branch", result)
    }

    fn try_create(&mut self, name: &str) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        let head = utils::head_commit(repo)?;
        repo.branch(name, &head, false)?;
        Ok(Outcome::completed(format!("Branch {} created", name)))
    }

    /// Force-delete a local branch other than the current one
    pub fn delete(&mut self, name: &str) -> Outcome {
        let result = self.try_delete(name);
        Outcome::recover("delete branch", result)
    }

    fn try_delete(&mut self, name: &str) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;

        if utils::current_branch(repo)?.as_deref() == Some(name) {
            return Err(GitPocketError::CannotDeleteCurrent(name.to_string()));
        }

        let mut branch = repo
            .find_branch(name, git2::BranchType::Local)
            .map_err(|_| GitPocketError::BranchNotFound(name.to_string()))?;
        branch.delete()?;

        Ok(Outcome::completed(format!("Branch {} deleted", name)))
    }

    /// Rename the checked-out branch
    pub fn rename(&mut self, new_name: &str) -> Outcome {
        let result = self.try_rename(new_name);
        Outcome::recover("rename branch", result)
    }

    fn try_rename(&mut self, new_name: &str) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;

        if !git2::Branch::name_is_valid(new_name)? {
            return Err(GitPocketError::OperationFailed(format!(
                "Invalid branch name: {}",
                new_name
            )));
        }

        let current = utils::current_branch(repo)?.ok_or(GitPocketError::DetachedHead)?;
        let new_ref = format!("refs/heads/{}", new_name);

        match repo.find_branch(&current, git2::BranchType::Local) {
            Ok(mut branch) => {
                branch.rename(new_name, false)?;
                repo.set_head(&new_ref)?;
            }
            // Unborn branch: no ref yet, only HEAD names it
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                repo.set_head(&new_ref)?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Outcome::completed(format!(
            "Renamed {} to {}",
            current, new_name
        )))
    }

    /// Merge a branch (local, remote or full ref) into HEAD
    pub fn merge(&mut self, spec: &str) -> Outcome {
        let result = self
            .handle
            .ensure_open()
            .and_then(|repo| merge::merge_into_head(repo, spec));
        Outcome::recover("merge", result)
    }

    /// Rebase the current branch onto another branch
    pub fn rebase(&mut self, spec: &str) -> Outcome {
        let result = self
            .handle
            .ensure_open()
            .and_then(|repo| merge::rebase_onto(repo, spec));
        Outcome::recover("rebase", result)
    }

    pub fn continue_rebase(&mut self) -> Outcome {
        let result = self
            .handle
            .ensure_open()
            .and_then(|repo| merge::continue_rebase(repo));
        Outcome::recover("continue rebase", result)
    }

    pub fn abort_rebase(&mut self) -> Outcome {
        let result = self
            .handle
            .ensure_open()
            .and_then(|repo| merge::abort_rebase(repo));
        Outcome::recover("abort rebase", result)
    }
}

/// Check out a branch ref without overwriting local modifications, then
/// point HEAD at it
fn switch_to(repo: &git2::Repository, full_ref: &str) -> Result<()> {
    let target = repo.find_reference(full_ref)?.peel_to_commit()?;
    checkout_commit_tree(repo, &target)?;
    repo.set_head(full_ref)?;
    Ok(())
}

fn checkout_commit_tree(repo: &git2::Repository, commit: &git2::Commit) -> Result<()> {
    let mut checkout = CheckoutBuilder::new();
    checkout.safe();
    repo.checkout_tree(commit.as_object(), Some(&mut checkout))?;
    Ok(())
}

/// Remote-tracking branch whose name ends in `/name`, preferring the configured remote
fn find_remote_branch<'r>(
    repo: &'r git2::Repository,
    remote_name: &str,
    name: &str,
) -> Result<Option<git2::Branch<'r>>> {
    if let Ok(branch) = repo.find_branch(
        &format!("{}/{}", remote_name, name),
        git2::BranchType::Remote,
    ) {
        return Ok(Some(branch));
    }

    let suffix = format!("/{}", name);
    for branch_result in repo.branches(Some(git2::BranchType::Remote))? {
        let (branch, _) = branch_result?;
        if branch.get().symbolic_target().is_some() {
            continue;
        }
        let matches = branch
            .name()?
            .map(|short| short.ends_with(&suffix))
            .unwrap_or(false);
        if matches {
            return Ok(Some(branch));
        }
    }

    Ok(None)
}
