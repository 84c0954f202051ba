//! Working tree status, staging and commits

use std::path::Path;

use crate::error::{GitPocketError, Result};
use crate::models::{ChangeEntry, ChangeKind, Outcome, StatusCounts};
use crate::services::RepositoryHandle;
use crate::utils;

/// Working tree operations on one repository
pub struct WorkingTree<'a> {
    handle: &'a mut RepositoryHandle,
}

impl RepositoryHandle {
    pub fn working_tree(&mut self) -> WorkingTree<'_> {
        WorkingTree { handle: self }
    }
}

impl WorkingTree<'_> {
    /// Changed paths, sorted by path
    pub fn changes(&mut self) -> Result<Vec<ChangeEntry>> {
        let repo = self.handle.ensure_open()?;
        change_entries(repo)
    }

    /// Per-category status counts
    pub fn counts(&mut self) -> Result<StatusCounts> {
        let repo = self.handle.ensure_open()?;
        status_counts(repo)
    }

    /// Stage the given entries; deleted and missing paths are removed from the index
    pub fn stage(&mut self, entries: &[ChangeEntry]) -> Outcome {
        let result = self.try_stage(entries);
        Outcome::recover("stage", result)
    }

    fn try_stage(&mut self, entries: &[ChangeEntry]) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        let mut index = repo.index()?;

        for entry in entries {
            let path = Path::new(&entry.path);
            match entry.kind {
                ChangeKind::Deleted | ChangeKind::Missing => index.remove_path(path)?,
                _ => index.add_path(path)?,
            }
        }

        index.write()?;
        Ok(Outcome::completed(format!("Staged {} file(s)", entries.len())))
    }

    /// Stage every change in the working tree, including deletions
    pub fn stage_all(&mut self) -> Outcome {
        let result = self.try_stage_all();
        Outcome::recover("stage all", result)
    }

    fn try_stage_all(&mut self) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        let mut index = repo.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(Outcome::completed("Staged all changes"))
    }

    /// Commit the index.
    ///
    /// With `amend`, HEAD is rewritten in place and keeps its parents. While a
    /// merge is pending, MERGE_HEAD becomes the second parent and the merge
    /// state is cleared.
    pub fn commit(&mut self, message: &str, amend: bool) -> Outcome {
        let result = self.try_commit(message, amend);
        Outcome::recover("commit", result)
    }

    fn try_commit(&mut self, message: &str, amend: bool) -> Result<Outcome> {
        let repo = self.handle.ensure_open()?;
        let state = repo.state();

        let mut merge_heads = Vec::new();
        if state == git2::RepositoryState::Merge {
            repo.mergehead_foreach(|oid| {
                merge_heads.push(*oid);
                true
            })?;
        }

        let mut index = repo.index()?;
        if index.has_conflicts() {
            let paths = utils::conflicted_paths(&index)?;
            return Err(GitPocketError::MergeConflict(paths.join(", ")));
        }

        let tree_oid = index.write_tree()?;
        let tree = repo.find_tree(tree_oid)?;
        let signature = utils::signature(repo)?;

        if amend {
            let head_commit = utils::head_commit(repo)?;
            head_commit.amend(
                Some("HEAD"),
                None,
                Some(&signature),
                None,
                Some(message),
                Some(&tree),
            )?;
            return Ok(Outcome::completed("Commit amended!"));
        }

        let mut parents = Vec::new();
        match utils::head_commit(repo) {
            Ok(head) => parents.push(head),
            Err(GitPocketError::RepositoryEmpty) => {}
            Err(e) => return Err(e),
        }
        for oid in merge_heads {
            parents.push(repo.find_commit(oid)?);
        }
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parent_refs,
        )?;

        if matches!(
            state,
            git2::RepositoryState::Merge
                | git2::RepositoryState::CherryPick
                | git2::RepositoryState::Revert
        ) {
            repo.cleanup_state()?;
        }

        Ok(Outcome::completed("Committed!"))
    }

    /// Message of the HEAD commit, empty on an unborn branch
    pub fn last_commit_message(&mut self) -> Result<String> {
        let repo = self.handle.ensure_open()?;
        match utils::head_commit(repo) {
            Ok(commit) => Ok(commit.message().unwrap_or("").to_string()),
            Err(GitPocketError::RepositoryEmpty) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}

fn statuses(repo: &git2::Repository) -> Result<git2::Statuses<'_>> {
    let mut opts = git2::StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .include_unmodified(false);
    Ok(repo.statuses(Some(&mut opts))?)
}

/// Count status entries per category. A path staged as new and then edited
/// counts once as added and once as modified.
pub(crate) fn status_counts(repo: &git2::Repository) -> Result<StatusCounts> {
    let mut counts = StatusCounts::default();

    for entry in statuses(repo)?.iter() {
        let status = entry.status();

        if status.is_conflicted() {
            counts.conflicting += 1;
            continue;
        }
        if status.is_index_new() {
            counts.added += 1;
        }
        if status.intersects(
            git2::Status::INDEX_MODIFIED
                | git2::Status::INDEX_RENAMED
                | git2::Status::INDEX_TYPECHANGE,
        ) {
            counts.changed += 1;
        }
        if status.is_index_deleted() {
            counts.removed += 1;
        }
        if status.is_wt_new() {
            counts.untracked += 1;
        }
        if status.intersects(
            git2::Status::WT_MODIFIED | git2::Status::WT_RENAMED | git2::Status::WT_TYPECHANGE,
        ) {
            counts.modified += 1;
        }
        if status.is_wt_deleted() {
            counts.missing += 1;
        }
    }

    Ok(counts)
}

/// Changed paths with one entry per (path, kind), sorted by path
pub(crate) fn change_entries(repo: &git2::Repository) -> Result<Vec<ChangeEntry>> {
    let mut entries = Vec::new();

    for entry in statuses(repo)?.iter() {
        let path = entry.path().unwrap_or("").to_string();
        let status = entry.status();

        let mut push = |kind| {
            entries.push(ChangeEntry {
                path: path.clone(),
                kind,
            })
        };

        if status.is_conflicted() {
            push(ChangeKind::Conflicting);
            continue;
        }
        if status.is_index_new() {
            push(ChangeKind::Added);
        }
        if status.intersects(
            git2::Status::INDEX_MODIFIED
                | git2::Status::INDEX_RENAMED
                | git2::Status::INDEX_TYPECHANGE
                | git2::Status::WT_MODIFIED
                | git2::Status::WT_RENAMED
                | git2::Status::WT_TYPECHANGE,
        ) {
            push(ChangeKind::Modified);
        }
        if status.is_index_deleted() {
            push(ChangeKind::Deleted);
        }
        if status.is_wt_new() {
            push(ChangeKind::Untracked);
        }
        if status.is_wt_deleted() {
            push(ChangeKind::Missing);
        }
    }

    entries.sort_by(|a, b| (&a.path, a.kind).cmp(&(&b.path, b.kind)));
    entries.dedup();
    Ok(entries)
}

/// Staged or tracked-file changes; untracked files do not count
pub(crate) fn has_uncommitted_changes(repo: &git2::Repository) -> Result<bool> {
    let dirty = statuses(repo)?.iter().any(|entry| {
        let status = entry.status();
        status.is_conflicted()
            || status.intersects(
                git2::Status::INDEX_NEW
                    | git2::Status::INDEX_MODIFIED
                    | git2::Status::INDEX_DELETED
                    | git2::Status::INDEX_RENAMED
                    | git2::Status::INDEX_TYPECHANGE
                    | git2::Status::WT_MODIFIED
                    | git2::Status::WT_DELETED
                    | git2::Status::WT_RENAMED
                    | git2::Status::WT_TYPECHANGE,
            )
    });
    Ok(dirty)
}
