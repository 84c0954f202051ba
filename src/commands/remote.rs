//! Fetch, pull, push and remote linking against the configured remote

use std::cell::RefCell;
use std::rc::Rc;

use git2::build::CheckoutBuilder;

use super::{merge, staging};
use crate::config::PullStrategy;
use crate::error::{GitPocketError, Result};
use crate::models::Outcome;
use crate::services::{CredentialsHelper, RepositoryHandle};
use crate::utils;

/// Branch names `link_and_repair` looks for, in order of preference
const DEFAULT_BRANCH_CANDIDATES: [&str; 2] = ["main", "master"];

/// Synchronization with the single configured remote
pub struct SyncOrchestrator<'a> {
    handle: &'a mut RepositoryHandle,
}

impl RepositoryHandle {
    pub fn sync(&mut self) -> SyncOrchestrator<'_> {
        SyncOrchestrator { handle: self }
    }
}

impl SyncOrchestrator<'_> {
    /// Fetch all configured refspecs. An empty token fetches anonymously.
    pub fn fetch(&mut self, token: &str) -> Outcome {
        let result = self.try_fetch(token);
        Outcome::recover("fetch", result)
    }

    fn try_fetch(&mut self, token: &str) -> Result<Outcome> {
        let remote_name = self.handle.remote_name().to_string();
        let repo = self.handle.ensure_open()?;
        fetch_remote(repo, &remote_name, token)?;
        Ok(Outcome::completed(format!("Fetched from {}", remote_name)))
    }

    /// Push the current branch to the same name on the remote.
    ///
    /// Force pushes are not confirmed here; callers gate them.
    pub fn push(&mut self, token: &str, force: bool) -> Outcome {
        let result = self.try_push(token, force);
        Outcome::recover("push", result)
    }

    fn try_push(&mut self, token: &str, force: bool) -> Result<Outcome> {
        let remote_name = self.handle.remote_name().to_string();
        let repo = self.handle.ensure_open()?;

        let branch = utils::current_branch(repo)?.ok_or(GitPocketError::DetachedHead)?;
        let head = utils::head_commit(repo)?;

        if utils::tracking_oid(repo, &remote_name)? == Some(head.id()) {
            return Ok(Outcome::up_to_date("Everything up-to-date"));
        }

        let mut remote = find_remote(repo, &remote_name)?;

        let rejections = Rc::new(RefCell::new(Vec::new()));
        let helper = CredentialsHelper::for_token(token);
        let mut callbacks = helper.get_callbacks();
        let sink = Rc::clone(&rejections);
        callbacks.push_update_reference(move |refname, status| {
            if let Some(message) = status {
                sink.borrow_mut().push(format!("{}: {}", refname, message));
            }
            Ok(())
        });

        let mut push_opts = git2::PushOptions::new();
        push_opts.remote_callbacks(callbacks);

        let refspec = format!(
            "{}refs/heads/{}:refs/heads/{}",
            if force { "+" } else { "" },
            branch,
            branch
        );
        tracing::debug!("Pushing {} to {}", refspec, remote_name);
        remote.push(&[refspec.as_str()], Some(&mut push_opts))?;

        let rejected = rejections.borrow();
        if !rejected.is_empty() {
            return Err(GitPocketError::PushRejected(rejected.join("; ")));
        }

        let mut local = repo.find_branch(&branch, git2::BranchType::Local)?;
        if local.upstream().is_err() {
            local.set_upstream(Some(&format!("{}/{}", remote_name, branch)))?;
            tracing::debug!("Set upstream of {} to {}/{}", branch, remote_name, branch);
        }

        let verb = if force { "Force-pushed" } else { "Pushed" };
        Ok(Outcome::completed(format!(
            "{} {} to {}",
            verb, branch, remote_name
        )))
    }

    /// Fetch, then merge or rebase the upstream into the current branch
    pub fn pull(&mut self, token: &str) -> Outcome {
        let result = self.try_pull(token);
        Outcome::recover("pull", result)
    }

    fn try_pull(&mut self, token: &str) -> Result<Outcome> {
        let remote_name = self.handle.remote_name().to_string();
        let strategy = self.handle.settings().pull_strategy;
        let repo = &*self.handle.ensure_open()?;

        utils::ensure_clean_state(repo)?;
        let branch_ref = utils::head_branch_ref(repo)?.ok_or(GitPocketError::DetachedHead)?;

        fetch_remote(repo, &remote_name, token)?;

        let upstream_ref = match repo.branch_upstream_name(&branch_ref) {
            Ok(name) => name.as_str().map(|s| s.to_string()),
            Err(_) => None,
        }
        .unwrap_or_else(|| {
            format!(
                "refs/remotes/{}/{}",
                remote_name,
                &branch_ref["refs/heads/".len()..]
            )
        });

        let upstream = repo
            .find_reference(&upstream_ref)
            .map_err(|_| GitPocketError::BranchNotFound(upstream_ref.clone()))?;
        let label = upstream.shorthand().unwrap_or(&upstream_ref).to_string();
        let annotated = repo.reference_to_annotated_commit(&upstream)?;

        let unborn = matches!(utils::head_commit(repo), Err(GitPocketError::RepositoryEmpty));

        match strategy {
            PullStrategy::Rebase if !unborn => {
                if staging::has_uncommitted_changes(repo)? {
                    return Err(GitPocketError::DirtyWorkingTree);
                }
                merge::rebase_annotated(repo, &annotated, &label)
            }
            _ => merge::merge_annotated(repo, &annotated, &label),
        }
    }

    /// Point the configured remote at an HTTP(S) URL with the standard fetch refspec
    pub fn add_remote(&mut self, url: &str) -> Outcome {
        let result = self.try_add_remote(url);
        Outcome::recover("add remote", result)
    }

    fn try_add_remote(&mut self, url: &str) -> Result<Outcome> {
        let url = validate_remote_url(url)?;
        let remote_name = self.handle.remote_name().to_string();
        let repo = self.handle.ensure_open()?;

        if repo.find_remote(&remote_name).is_ok() {
            repo.remote_set_url(&remote_name, &url)?;
        } else {
            repo.remote(&remote_name, &url)?;
        }

        let mut config = repo.config()?;
        config.set_multivar(
            &format!("remote.{}.fetch", remote_name),
            ".*",
            &format!("+refs/heads/*:refs/remotes/{}/*", remote_name),
        )?;

        Ok(Outcome::completed(format!("Remote {} set to {}", remote_name, url)))
    }

    /// Recover a working copy whose local branch is missing or unrelated to
    /// the remote: fetch, then reset a local `main`/`master` onto the remote
    /// one without overwriting local files.
    pub fn link_and_repair(&mut self, token: &str) -> Outcome {
        let result = self.try_link_and_repair(token);
        Outcome::recover("link and repair", result)
    }

    fn try_link_and_repair(&mut self, token: &str) -> Result<Outcome> {
        let remote_name = self.handle.remote_name().to_string();
        let repo = &*self.handle.ensure_open()?;

        fetch_remote(repo, &remote_name, token)?;

        let (name, oid) = default_remote_branch(repo, &remote_name)?
            .ok_or(GitPocketError::NoDefaultRemoteBranch)?;
        tracing::debug!("Repairing onto {}/{} at {}", remote_name, name, oid);

        let commit = repo.find_commit(oid)?;
        let local_ref = format!("refs/heads/{}", name);
        repo.reference(&local_ref, oid, true, "link and repair")?;

        let mut branch = repo.find_branch(&name, git2::BranchType::Local)?;
        branch.set_upstream(Some(&format!("{}/{}", remote_name, name)))?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe().allow_conflicts(true);
        repo.checkout_tree(commit.as_object(), Some(&mut checkout))?;
        repo.set_head(&local_ref)?;
        repo.reset(commit.as_object(), git2::ResetType::Mixed, None)?;

        Ok(Outcome::completed(format!(
            "Repaired & Linked to {}/{}",
            remote_name, name
        )))
    }
}

fn find_remote<'r>(repo: &'r git2::Repository, remote_name: &str) -> Result<git2::Remote<'r>> {
    if utils::remote_url(repo, remote_name)?.is_none() {
        return Err(GitPocketError::RemoteNotFound(remote_name.to_string()));
    }
    repo.find_remote(remote_name)
        .map_err(|_| GitPocketError::RemoteNotFound(remote_name.to_string()))
}

/// Fetch every configured refspec of the remote with token credentials
pub(crate) fn fetch_remote(repo: &git2::Repository, remote_name: &str, token: &str) -> Result<()> {
    let mut remote = find_remote(repo, remote_name)?;

    let helper = CredentialsHelper::for_token(token);
    let mut fetch_opts = git2::FetchOptions::new();
    fetch_opts.remote_callbacks(helper.get_callbacks());

    let refspecs: Vec<String> = remote
        .fetch_refspecs()?
        .iter()
        .filter_map(|s| s.map(|s| s.to_string()))
        .collect();
    let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();

    tracing::debug!(
        "Fetching {} ({} refspecs, anonymous: {})",
        remote_name,
        refspec_strs.len(),
        helper.is_anonymous()
    );
    remote.fetch(&refspec_strs, Some(&mut fetch_opts), None)?;
    Ok(())
}

fn validate_remote_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(GitPocketError::InvalidRemoteUrl("URL is empty".to_string()));
    }

    let parsed = url::Url::parse(trimmed)
        .map_err(|e| GitPocketError::InvalidRemoteUrl(format!("{}: {}", trimmed, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        scheme => Err(GitPocketError::InvalidRemoteUrl(format!(
            "{}: unsupported scheme {}",
            trimmed, scheme
        ))),
    }
}

/// Short name and tip of the remote branch to repair onto. A branch named
/// exactly `main` or `master` wins over one that only contains the word.
fn default_remote_branch(
    repo: &git2::Repository,
    remote_name: &str,
) -> Result<Option<(String, git2::Oid)>> {
    let prefix = format!("{}/", remote_name);
    let mut candidates = Vec::new();

    for branch_result in repo.branches(Some(git2::BranchType::Remote))? {
        let (branch, _) = branch_result?;
        let reference = branch.get();
        if reference.symbolic_target().is_some() {
            continue;
        }
        let (Some(full), Some(oid)) = (branch.name()?, reference.target()) else {
            continue;
        };
        if let Some(short) = full.strip_prefix(&prefix) {
            if short != "HEAD" {
                candidates.push((short.to_string(), oid));
            }
        }
    }
    candidates.sort();

    for wanted in DEFAULT_BRANCH_CANDIDATES {
        if let Some(found) = candidates.iter().find(|(name, _)| name == wanted) {
            return Ok(Some(found.clone()));
        }
        if let Some(found) = candidates.iter().find(|(name, _)| name.contains(wanted)) {
            return Ok(Some(found.clone()));
        }
    }

    Ok(None)
}
