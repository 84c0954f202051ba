//! Lookups shared by the orchestrators

use crate::error::{GitPocketError, Result};
use crate::models::{short_hash, RepositoryState};

const HEADS_PREFIX: &str = "refs/heads/";

/// Commit HEAD points at; `RepositoryEmpty` while the branch is unborn
pub fn head_commit(repo: &git2::Repository) -> Result<git2::Commit<'_>> {
    match repo.head() {
        Ok(head) => Ok(head.peel_to_commit()?),
        Err(e)
            if e.code() == git2::ErrorCode::UnbornBranch
                || e.code() == git2::ErrorCode::NotFound =>
        {
            Err(GitPocketError::RepositoryEmpty)
        }
        Err(e) => Err(e.into()),
    }
}

/// Full ref name HEAD points at (`refs/heads/main`), also for an unborn branch.
///
/// Returns `None` when HEAD is detached.
pub fn head_branch_ref(repo: &git2::Repository) -> Result<Option<String>> {
    let head = repo.find_reference("HEAD")?;
    Ok(head
        .symbolic_target()
        .filter(|target| target.starts_with(HEADS_PREFIX))
        .map(|target| target.to_string()))
}

/// Short name of the checked-out branch, `None` when detached
pub fn current_branch(repo: &git2::Repository) -> Result<Option<String>> {
    Ok(head_branch_ref(repo)?.map(|full| full[HEADS_PREFIX.len()..].to_string()))
}

/// Branch name for display, or the short hash of a detached HEAD
pub fn current_branch_label(repo: &git2::Repository) -> Result<String> {
    if let Some(branch) = current_branch(repo)? {
        return Ok(branch);
    }
    let oid = repo.head()?.target().ok_or(GitPocketError::DetachedHead)?;
    Ok(short_hash(&oid.to_string()))
}

/// Resolve a full or abbreviated hash (or any revision) to its commit
pub fn resolve_commit<'r>(repo: &'r git2::Repository, spec: &str) -> Result<git2::Commit<'r>> {
    repo.revparse_single(spec)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|_| GitPocketError::CommitNotFound(spec.to_string()))
}

/// Refuse to start a history-changing operation while another one is pending
pub fn ensure_clean_state(repo: &git2::Repository) -> Result<()> {
    let state = repo.state();
    if state != git2::RepositoryState::Clean {
        return Err(GitPocketError::OperationInProgress(
            RepositoryState::from(state).to_string(),
        ));
    }
    Ok(())
}

/// Paths with conflict entries in the index, sorted
pub fn conflicted_paths(index: &git2::Index) -> Result<Vec<String>> {
    let mut paths = Vec::new();
    for conflict in index.conflicts()? {
        let conflict = conflict?;
        let entry = conflict
            .our
            .as_ref()
            .or(conflict.their.as_ref())
            .or(conflict.ancestor.as_ref());
        if let Some(entry) = entry {
            paths.push(String::from_utf8_lossy(&entry.path).to_string());
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Configured commit signature
pub fn signature(repo: &git2::Repository) -> Result<git2::Signature<'static>> {
    repo.signature().map_err(|_| {
        GitPocketError::OperationFailed(
            "No identity configured. Set user.name and user.email first.".to_string(),
        )
    })
}

/// URL of the named remote; empty values count as absent
pub fn remote_url(repo: &git2::Repository, remote_name: &str) -> Result<Option<String>> {
    let config = repo.config()?;
    match config.get_string(&format!("remote.{}.url", remote_name)) {
        Ok(url) if !url.trim().is_empty() => Ok(Some(url)),
        Ok(_) => Ok(None),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Commit the upstream of the current branch points at.
///
/// Uses the configured upstream, falling back to `refs/remotes/<remote>/<branch>`.
/// `None` when HEAD is detached or no remote-tracking ref exists.
pub fn tracking_oid(repo: &git2::Repository, remote_name: &str) -> Result<Option<git2::Oid>> {
    let Some(branch_ref) = head_branch_ref(repo)? else {
        return Ok(None);
    };

    let tracking_ref = match repo.branch_upstream_name(&branch_ref) {
        Ok(name) => name.as_str().map(|s| s.to_string()),
        Err(_) => None,
    }
    .unwrap_or_else(|| {
        format!(
            "refs/remotes/{}/{}",
            remote_name,
            &branch_ref[HEADS_PREFIX.len()..]
        )
    });

    match repo.refname_to_id(&tracking_ref) {
        Ok(oid) => Ok(Some(oid)),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
