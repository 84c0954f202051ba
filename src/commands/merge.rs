//! Merge and rebase engine shared by branch and sync operations

use git2::build::CheckoutBuilder;

use super::staging;
use crate::error::{GitPocketError, Result};
use crate::models::Outcome;
use crate::utils;

/// Find a branch by local name, remote name (`origin/main`) or full ref
pub(crate) fn resolve_branch_ref<'r>(
    repo: &'r git2::Repository,
    spec: &str,
) -> Result<git2::Reference<'r>> {
    repo.find_reference(&format!("refs/heads/{}", spec))
        .or_else(|_| repo.find_reference(&format!("refs/remotes/{}", spec)))
        .or_else(|_| repo.find_reference(spec))
        .map_err(|_| GitPocketError::BranchNotFound(spec.to_string()))
}

/// Merge a branch into HEAD
pub(crate) fn merge_into_head(repo: &git2::Repository, spec: &str) -> Result<Outcome> {
    utils::ensure_clean_state(repo)?;

    let reference = resolve_branch_ref(repo, spec)?;
    let label = reference.shorthand().unwrap_or(spec).to_string();
    let annotated = repo.reference_to_annotated_commit(&reference)?;

    merge_annotated(repo, &annotated, &label)
}

/// Merge an annotated commit into HEAD.
///
/// Fast-forwards when possible. A conflicting merge stops with the merge
/// state left in place so the conflicts can be resolved and committed.
pub(crate) fn merge_annotated(
    repo: &git2::Repository,
    annotated: &git2::AnnotatedCommit,
    label: &str,
) -> Result<Outcome> {
    let (analysis, _preference) = repo.merge_analysis(&[annotated])?;

    if analysis.is_up_to_date() {
        return Ok(Outcome::up_to_date(format!("Already up to date with {}", label)));
    }

    if analysis.is_unborn() {
        let branch_ref = utils::head_branch_ref(repo)?.ok_or(GitPocketError::DetachedHead)?;

        // Check out while HEAD is still unborn so every file counts as new
        let target = repo.find_object(annotated.id(), None)?;
        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        repo.checkout_tree(&target, Some(&mut checkout))?;

        repo.reference(
            &branch_ref,
            annotated.id(),
            true,
            &format!("merge {}: initial", label),
        )?;
        repo.set_head(&branch_ref)?;
        return Ok(Outcome::completed(format!("Fast-forwarded to {}", label)));
    }

    if analysis.is_fast_forward() {
        let target = repo.find_object(annotated.id(), None)?;
        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        repo.checkout_tree(&target, Some(&mut checkout))?;

        match utils::head_branch_ref(repo)? {
            Some(branch_ref) => {
                repo.find_reference(&branch_ref)?
                    .set_target(annotated.id(), &format!("merge {}: Fast-forward", label))?;
            }
            None => repo.set_head_detached(annotated.id())?,
        }
        return Ok(Outcome::completed(format!("Fast-forwarded to {}", label)));
    }

    let signature = utils::signature(repo)?;
    repo.merge(&[annotated], None, None)?;

    let mut index = repo.index()?;
    if index.has_conflicts() {
        let paths = utils::conflicted_paths(&index)?;
        tracing::info!("Merge of {} stopped on {} conflicting file(s)", label, paths.len());
        return Err(GitPocketError::MergeConflict(paths.join(", ")));
    }

    let tree_oid = index.write_tree()?;
    let tree = repo.find_tree(tree_oid)?;
    let head = utils::head_commit(repo)?;
    let theirs = repo.find_commit(annotated.id())?;
    let branch = utils::current_branch_label(repo)?;

    let message = format!("Merge {} into {}", label, branch);
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        &message,
        &tree,
        &[&head, &theirs],
    )?;
    repo.cleanup_state()?;

    Ok(Outcome::completed(format!("Merged {} into {}", label, branch)))
}

/// Replay the current branch onto another branch
pub(crate) fn rebase_onto(repo: &git2::Repository, spec: &str) -> Result<Outcome> {
    utils::ensure_clean_state(repo)?;
    if staging::has_uncommitted_changes(repo)? {
        return Err(GitPocketError::DirtyWorkingTree);
    }

    let onto_ref = resolve_branch_ref(repo, spec)?;
    let label = onto_ref.shorthand().unwrap_or(spec).to_string();
    let onto = repo.reference_to_annotated_commit(&onto_ref)?;

    rebase_annotated(repo, &onto, &label)
}

/// Replay HEAD onto an annotated commit. Conflicts leave the rebase in
/// progress for [`continue_rebase`] or [`abort_rebase`].
pub(crate) fn rebase_annotated(
    repo: &git2::Repository,
    onto: &git2::AnnotatedCommit,
    label: &str,
) -> Result<Outcome> {
    let head_commit = utils::head_commit(repo)?;
    if head_commit.id() == onto.id() || repo.graph_descendant_of(head_commit.id(), onto.id())? {
        return Ok(Outcome::up_to_date(format!("Already up to date with {}", label)));
    }

    let signature = utils::signature(repo)?;
    let head = repo.head()?;
    let head_annotated = repo.reference_to_annotated_commit(&head)?;

    let mut rebase = repo.rebase(Some(&head_annotated), Some(onto), None, None)?;
    let applied = replay(repo, &mut rebase, &signature)?;

    Ok(Outcome::completed(format!(
        "Rebased {} commit(s) onto {}",
        applied, label
    )))
}

/// Commit the resolved step of a stopped rebase and replay the rest
pub(crate) fn continue_rebase(repo: &git2::Repository) -> Result<Outcome> {
    let mut rebase = open_rebase(repo)?;
    let signature = utils::signature(repo)?;

    let index = repo.index()?;
    if index.has_conflicts() {
        let paths = utils::conflicted_paths(&index)?;
        return Err(GitPocketError::RebaseConflict(paths.join(", ")));
    }

    let mut applied = 0;
    if rebase.operation_current().is_some() {
        applied += commit_step(&mut rebase, &signature)?;
    }
    applied += replay(repo, &mut rebase, &signature)?;

    Ok(Outcome::completed(format!(
        "Rebase completed, {} commit(s) applied",
        applied
    )))
}

pub(crate) fn abort_rebase(repo: &git2::Repository) -> Result<Outcome> {
    let mut rebase = open_rebase(repo)?;
    rebase.abort()?;
    Ok(Outcome::completed("Rebase aborted"))
}

fn open_rebase(repo: &git2::Repository) -> Result<git2::Rebase<'_>> {
    repo.open_rebase(None).map_err(|e| {
        if e.code() == git2::ErrorCode::NotFound {
            GitPocketError::OperationFailed("No rebase in progress".to_string())
        } else {
            e.into()
        }
    })
}

fn replay(
    repo: &git2::Repository,
    rebase: &mut git2::Rebase,
    signature: &git2::Signature,
) -> Result<usize> {
    let mut applied = 0;

    while let Some(op) = rebase.next() {
        let _op = op?;

        let index = repo.index()?;
        if index.has_conflicts() {
            let paths = utils::conflicted_paths(&index)?;
            tracing::info!("Rebase stopped on {} conflicting file(s)", paths.len());
            return Err(GitPocketError::RebaseConflict(paths.join(", ")));
        }

        applied += commit_step(rebase, signature)?;
    }

    rebase.finish(Some(signature))?;
    Ok(applied)
}

/// Commit the current rebase step; a patch that is already upstream is skipped
fn commit_step(rebase: &mut git2::Rebase, signature: &git2::Signature) -> Result<usize> {
    match rebase.commit(None, signature, None) {
        Ok(_) => Ok(1),
        Err(e) if e.code() == git2::ErrorCode::Applied => {
            tracing::debug!("Skipping already applied patch");
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}
