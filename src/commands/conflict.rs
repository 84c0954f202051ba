//! Conflict listing and single-file resolution

use std::path::{Path, PathBuf};

use crate::error::{GitPocketError, Result};
use crate::models::{ConflictSide, ConflictVersions, Outcome, RepositoryState};
use crate::services::RepositoryHandle;
use crate::utils;

/// Resolves conflicts left by a merge, rebase, cherry-pick, revert or stash apply
pub struct ConflictResolver<'a> {
    handle: &'a mut RepositoryHandle,
}

impl RepositoryHandle {
    pub fn conflicts(&mut self) -> ConflictResolver<'_> {
        ConflictResolver { handle: self }
    }
}

impl ConflictResolver<'_> {
    /// Conflicting paths, sorted
    pub fn list_conflicts(&mut self) -> Result<Vec<String>> {
        let repo = self.handle.ensure_open()?;
        let index = repo.index()?;
        utils::conflicted_paths(&index)
    }

    pub fn resolve_ours(&mut self, path: &str) -> Outcome {
        let result = self.try_resolve(path, ConflictSide::Ours);
        Outcome::recover("resolve using ours", result)
    }

    pub fn resolve_theirs(&mut self, path: &str) -> Outcome {
        let result = self.try_resolve(path, ConflictSide::Theirs);
        Outcome::recover("resolve using theirs", result)
    }

    /// Write the chosen side to the working file and stage it. A side that
    /// deleted the file removes it from disk and index.
    fn try_resolve(&mut self, path: &str, side: ConflictSide) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        let file = workdir_path(repo, path)?;
        let mut index = repo.index()?;

        let conflict = find_conflict(&index, path)?
            .ok_or_else(|| GitPocketError::PathNotConflicting(path.to_string()))?;
        let chosen = match side {
            ConflictSide::Ours => conflict.our,
            ConflictSide::Theirs => conflict.their,
        };

        match chosen {
            Some(entry) => {
                let blob = repo.find_blob(entry.id)?;
                if let Some(parent) = file.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&file, blob.content())?;
                index.add_path(Path::new(path))?;
            }
            None => {
                if file.exists() {
                    std::fs::remove_file(&file)?;
                }
                index.remove_path(Path::new(path))?;
            }
        }
        index.write()?;

        let label = match side {
            ConflictSide::Ours => "ours",
            ConflictSide::Theirs => "theirs",
        };
        Ok(Outcome::completed(format!("Resolved {} using {}", path, label)))
    }

    /// Text of every side of a conflicting file
    pub fn versions(&mut self, path: &str) -> Result<ConflictVersions> {
        let repo = self.handle.ensure_open()?;
        let file = workdir_path(repo, path)?;
        let index = repo.index()?;

        let conflict = find_conflict(&index, path)?
            .ok_or_else(|| GitPocketError::PathNotConflicting(path.to_string()))?;

        let blob_text = |entry: Option<git2::IndexEntry>| -> Result<Option<String>> {
            match entry {
                Some(entry) => {
                    let blob = repo.find_blob(entry.id)?;
                    Ok(Some(String::from_utf8_lossy(blob.content()).to_string()))
                }
                None => Ok(None),
            }
        };

        let working = if file.exists() {
            Some(String::from_utf8_lossy(&std::fs::read(&file)?).to_string())
        } else {
            None
        };

        Ok(ConflictVersions {
            path: path.to_string(),
            ancestor: blob_text(conflict.ancestor)?,
            ours: blob_text(conflict.our)?,
            theirs: blob_text(conflict.their)?,
            working,
        })
    }

    /// Working-tree content of a file, conflict markers included
    pub fn read_file(&mut self, path: &str) -> Result<String> {
        let repo = self.handle.ensure_open()?;
        let file = workdir_path(repo, path)?;
        Ok(String::from_utf8_lossy(&std::fs::read(file)?).to_string())
    }

    /// Abandon the operation in progress and restore HEAD
    pub fn abort(&mut self) -> Outcome {
        let result = self.try_abort();
        Outcome::recover("abort", result)
    }

    fn try_abort(&mut self) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        let state = repo.state();

        match state {
            git2::RepositoryState::Clean => Ok(Outcome::no_changes("No operation in progress")),
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => {
                repo.open_rebase(None)?.abort()?;
                Ok(Outcome::completed("Rebase aborted"))
            }
            _ => {
                repo.cleanup_state()?;
                let head = utils::head_commit(repo)?;
                repo.reset(head.as_object(), git2::ResetType::Hard, None)?;
                Ok(Outcome::completed(format!(
                    "Aborted {}",
                    RepositoryState::from(state)
                )))
            }
        }
    }
}

fn workdir_path(repo: &git2::Repository, path: &str) -> Result<PathBuf> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| GitPocketError::OperationFailed("Repository has no working tree".to_string()))?;

    let relative = Path::new(path);
    if relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(GitPocketError::OperationFailed(format!(
            "Path escapes the working tree: {}",
            path
        )));
    }
    Ok(workdir.join(relative))
}

fn find_conflict(index: &git2::Index, path: &str) -> Result<Option<git2::IndexConflict>> {
    for conflict in index.conflicts()? {
        let conflict = conflict?;
        let matches = [&conflict.ancestor, &conflict.our, &conflict.their]
            .iter()
            .any(|entry| {
                entry
                    .as_ref()
                    .map(|e| e.path.as_slice() == path.as_bytes())
                    .unwrap_or(false)
            });
        if matches {
            return Ok(Some(conflict));
        }
    }
    Ok(None)
}
