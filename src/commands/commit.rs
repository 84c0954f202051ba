//! Commit history with pushed/unpushed classification

use crate::error::{GitPocketError, Result};
use crate::models::{CommitInfo, PushedStatus};
use crate::services::RepositoryHandle;
use crate::utils;

/// History listing and point-in-time operations on one repository
pub struct CommitHistoryService<'a> {
    pub(super) handle: &'a mut RepositoryHandle,
}

impl RepositoryHandle {
    pub fn history(&mut self) -> CommitHistoryService<'_> {
        CommitHistoryService { handle: self }
    }
}

impl CommitHistoryService<'_> {
    /// Full log from HEAD, newest first. Empty for a repository without commits.
    pub fn list(&mut self) -> Result<Vec<CommitInfo>> {
        let remote_name = self.handle.remote_name().to_string();
        let repo = self.handle.ensure_open()?;
        list_commits(repo, &remote_name)
    }

    /// Number of commits not yet on the remote-tracking ref
    pub fn unpushed_count(&mut self) -> Result<usize> {
        let remote_name = self.handle.remote_name().to_string();
        let repo = self.handle.ensure_open()?;
        unpushed_count(repo, &remote_name)
    }
}

pub(crate) fn list_commits(repo: &git2::Repository, remote_name: &str) -> Result<Vec<CommitInfo>> {
    let oids = walk_from_head(repo)?;
    let boundary = utils::tracking_oid(repo, remote_name)?;
    let statuses = classify_pushed(&oids, boundary);

    let mut commits = Vec::with_capacity(oids.len());
    for (oid, status) in oids.iter().zip(statuses) {
        let commit = repo.find_commit(*oid)?;
        commits.push(CommitInfo::from_git2(&commit, status));
    }
    Ok(commits)
}

pub(crate) fn unpushed_count(repo: &git2::Repository, remote_name: &str) -> Result<usize> {
    let oids = walk_from_head(repo)?;
    let boundary = utils::tracking_oid(repo, remote_name)?;
    Ok(classify_pushed(&oids, boundary)
        .into_iter()
        .filter(|status| *status == PushedStatus::Unpushed)
        .count())
}

fn walk_from_head(repo: &git2::Repository) -> Result<Vec<git2::Oid>> {
    let head = match utils::head_commit(repo) {
        Ok(commit) => commit.id(),
        Err(GitPocketError::RepositoryEmpty) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
    revwalk.push(head)?;

    Ok(revwalk.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Classify a log (newest first) against the remote-tracking commit.
///
/// Every commit before the boundary is unpushed; the boundary and everything
/// after it in the log are pushed. Without a boundary nothing is pushed. The
/// test is positional, so a boundary that is not an ancestor of HEAD leaves
/// the whole log unpushed.
pub fn classify_pushed(oids: &[git2::Oid], boundary: Option<git2::Oid>) -> Vec<PushedStatus> {
    let mut reached = false;
    oids.iter()
        .map(|oid| {
            if Some(*oid) == boundary {
                reached = true;
            }
            if reached {
                PushedStatus::Pushed
            } else {
                PushedStatus::Unpushed
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestRepo;

    fn oid(n: u8) -> git2::Oid {
        git2::Oid::from_bytes(&[n; 20]).unwrap()
    }

    #[test]
    fn test_classify_without_boundary() {
        let oids = vec![oid(3), oid(2), oid(1)];
        assert_eq!(
            classify_pushed(&oids, None),
            vec![PushedStatus::Unpushed; 3]
        );
    }

    #[test]
    fn test_classify_boundary_in_middle() {
        let oids = vec![oid(4), oid(3), oid(2), oid(1)];
        assert_eq!(
            classify_pushed(&oids, Some(oid(2))),
            vec![
                PushedStatus::Unpushed,
                PushedStatus::Unpushed,
                PushedStatus::Pushed,
                PushedStatus::Pushed
            ]
        );
    }

    #[test]
    fn test_classify_boundary_at_head() {
        let oids = vec![oid(2), oid(1)];
        assert_eq!(
            classify_pushed(&oids, Some(oid(2))),
            vec![PushedStatus::Pushed; 2]
        );
    }

    #[test]
    fn test_classify_boundary_not_in_log() {
        let oids = vec![oid(2), oid(1)];
        assert_eq!(
            classify_pushed(&oids, Some(oid(9))),
            vec![PushedStatus::Unpushed; 2]
        );
    }

    #[test]
    fn test_list_empty_repo() {
        let repo = TestRepo::new();
        let mut handle = repo.handle();
        assert!(handle.history().list().unwrap().is_empty());
        assert_eq!(handle.history().unpushed_count().unwrap(), 0);
    }

    #[test]
    fn test_list_newest_first_all_unpushed() {
        let repo = TestRepo::with_initial_commit();
        repo.create_commit("Second commit", &[("file2.txt", "content")]);
        repo.create_commit("Third commit", &[("file3.txt", "content")]);

        let mut handle = repo.handle();
        let commits = handle.history().list().unwrap();
        assert_eq!(commits.len(), 3);
        assert_eq!(commits[0].full_message, "Third commit");
        assert_eq!(commits[2].full_message, "Initial commit");
        assert_eq!(commits[0].oid, repo.head_oid().to_string());
        assert_eq!(commits[0].author_name, "Test User");
        assert!(commits
            .iter()
            .all(|c| c.pushed_status == PushedStatus::Unpushed));
        assert_eq!(handle.history().unpushed_count().unwrap(), 3);
    }

    #[test]
    fn test_list_uses_tracking_ref_boundary() {
        let repo = TestRepo::with_initial_commit();
        let branch = repo.current_branch();
        let pushed = repo.create_commit("Pushed", &[("pushed.txt", "p")]);
        repo.repo()
            .reference(
                &format!("refs/remotes/origin/{}", branch),
                pushed,
                true,
                "test",
            )
            .unwrap();
        repo.create_commit("Local only", &[("local.txt", "l")]);

        let mut handle = repo.handle();
        let statuses: Vec<_> = handle
            .history()
            .list()
            .unwrap()
            .into_iter()
            .map(|c| c.pushed_status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                PushedStatus::Unpushed,
                PushedStatus::Pushed,
                PushedStatus::Pushed
            ]
        );
        assert_eq!(handle.history().unpushed_count().unwrap(), 1);
    }
}
