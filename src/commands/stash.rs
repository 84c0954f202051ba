//! Stash creation, application and listing

use super::staging;
use crate::error::{GitPocketError, Result};
use crate::models::{short_hash, Outcome, StashEntry};
use crate::services::RepositoryHandle;
use crate::utils;

/// Stash operations on one repository.
///
/// Entries are addressed by position (0 = newest), so every mutation shifts
/// the indices of older entries.
pub struct StashOrchestrator<'a> {
    handle: &'a mut RepositoryHandle,
}

impl RepositoryHandle {
    pub fn stash(&mut self) -> StashOrchestrator<'_> {
        StashOrchestrator { handle: self }
    }
}

impl StashOrchestrator<'_> {
    /// Stash working tree changes; an empty message uses git's "WIP on <branch>" text
    pub fn create(&mut self, message: &str) -> Outcome {
        let result = self.try_create(message);
        Outcome::recover("stash", result)
    }

    fn try_create(&mut self, message: &str) -> Result<Outcome> {
        let include_untracked = self.handle.settings().stash_include_untracked;
        let repo = self.handle.ensure_open()?;
        utils::head_commit(repo)?;
        let signature = utils::signature(repo)?;

        let mut flags = git2::StashFlags::DEFAULT;
        if include_untracked {
            flags |= git2::StashFlags::INCLUDE_UNTRACKED;
        }

        let message = message.trim();
        let message = if message.is_empty() {
            None
        } else {
            Some(message)
        };

        match repo.stash_save2(&signature, message, Some(flags)) {
            Ok(oid) => {
                tracing::debug!("Created stash {}", oid);
                let saved = list_entries(repo)?
                    .into_iter()
                    .next()
                    .map(|entry| entry.message)
                    .unwrap_or_else(|| oid.to_string());
                Ok(Outcome::completed(format!("Stashed: {}", saved)))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                Ok(Outcome::no_changes("No local changes to stash"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply the entry at `index`, dropping it afterwards when `drop` is set.
    ///
    /// The drop only happens after a successful apply.
    pub fn apply(&mut self, index: usize, drop: bool) -> Outcome {
        let result = self.try_apply(index, drop);
        Outcome::recover("apply stash", result)
    }

    fn try_apply(&mut self, index: usize, drop: bool) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        ensure_entry(repo, index)?;
        let dirty = staging::has_uncommitted_changes(repo)?;

        if let Err(e) = repo.stash_apply(index, None) {
            let refused = matches!(
                e.code(),
                git2::ErrorCode::Conflict | git2::ErrorCode::MergeConflict
            );
            if !refused {
                return Err(e.into());
            }
            if let Some(paths) = index_conflicts(repo)? {
                return Err(GitPocketError::StashConflict(paths.join(", ")));
            }
            // libgit2 refuses to overwrite local edits without touching the index
            if dirty {
                tracing::debug!("Stash apply refused: {}", e.message());
                return Err(GitPocketError::DirtyWorkingTree);
            }
            return Err(GitPocketError::StashConflict(e.message().to_string()));
        }

        if let Some(paths) = index_conflicts(repo)? {
            return Err(GitPocketError::StashConflict(paths.join(", ")));
        }

        if drop {
            repo.stash_drop(index)?;
            return Ok(Outcome::completed(format!(
                "Applied and dropped stash@{{{}}}",
                index
            )));
        }

        Ok(Outcome::completed(format!("Applied stash@{{{}}}", index)))
    }

    pub fn drop(&mut self, index: usize) -> Outcome {
        let result = self.try_drop(index);
        Outcome::recover("drop stash", result)
    }

    fn try_drop(&mut self, index: usize) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        ensure_entry(repo, index)?;
        repo.stash_drop(index)?;
        Ok(Outcome::completed(format!("Dropped stash@{{{}}}", index)))
    }

    /// Stash entries, newest first
    pub fn list(&mut self) -> Result<Vec<StashEntry>> {
        let repo = self.handle.ensure_open()?;
        list_entries(repo)
    }
}

/// Conflicting paths in the on-disk index, `None` when there are none
fn index_conflicts(repo: &git2::Repository) -> Result<Option<Vec<String>>> {
    let mut index = repo.index()?;
    index.read(true)?;
    if !index.has_conflicts() {
        return Ok(None);
    }
    Ok(Some(utils::conflicted_paths(&index)?))
}

fn list_entries(repo: &mut git2::Repository) -> Result<Vec<StashEntry>> {
    let mut entries = Vec::new();

    repo.stash_foreach(|index, message, oid| {
        entries.push(StashEntry {
            index,
            message: message.to_string(),
            short_hash: short_hash(&oid.to_string()),
        });
        true
    })?;

    Ok(entries)
}

fn ensure_entry(repo: &mut git2::Repository, index: usize) -> Result<()> {
    if index >= list_entries(repo)?.len() {
        return Err(GitPocketError::StashNotFound(index));
    }
    Ok(())
}
