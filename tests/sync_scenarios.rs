//! End-to-end scenarios against local bare remotes
//!
//! These drive the public handle API the way a client would: open a root,
//! mutate it through the orchestrators and read the dashboard back.

use std::path::Path;

use git2::Repository;
use gitpocket::commands::classify_pushed;
use gitpocket::models::{BranchKind, DashboardSnapshot, OutcomeStatus, PushedStatus};
use gitpocket::{ErrorKind, RepositoryHandle};
use tempfile::TempDir;

/// Create a repository with a configured identity
fn setup_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let repo = Repository::init(dir.path()).expect("Failed to init repo");

    let mut config = repo.config().expect("Failed to get config");
    config
        .set_str("user.name", "Test User")
        .expect("Failed to set user.name");
    config
        .set_str("user.email", "test@example.com")
        .expect("Failed to set user.email");

    (dir, repo)
}

fn setup_bare() -> (TempDir, Repository) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let repo = Repository::init_bare(dir.path()).expect("Failed to init bare repo");
    (dir, repo)
}

/// Write, stage and commit one file on HEAD
fn commit_file(repo: &Repository, path: &Path, name: &str, content: &str) -> git2::Oid {
    std::fs::write(path.join(name), content).expect("Failed to write file");

    let mut index = repo.index().expect("Failed to get index");
    index.add_path(Path::new(name)).expect("Failed to stage file");
    index.write().expect("Failed to write index");

    let tree_oid = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_oid).expect("Failed to find tree");
    let sig = repo.signature().expect("Failed to get signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.as_ref().into_iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, &format!("Add {}", name), &tree, &parents)
        .expect("Failed to create commit")
}

fn head_branch(repo: &Repository) -> String {
    repo.head()
        .expect("Failed to get HEAD")
        .shorthand()
        .expect("HEAD has no name")
        .to_string()
}

fn local_branches(repo: &Repository) -> Vec<(String, git2::Oid)> {
    let mut branches: Vec<_> = repo
        .branches(Some(git2::BranchType::Local))
        .expect("Failed to list branches")
        .map(|b| {
            let (branch, _) = b.expect("Failed to read branch");
            (
                branch.name().unwrap().unwrap().to_string(),
                branch.get().target().unwrap(),
            )
        })
        .collect();
    branches.sort();
    branches
}

#[test]
fn scenario_initialize_empty_root() {
    let dir = TempDir::new().unwrap();
    let mut handle = RepositoryHandle::new(dir.path());

    assert_eq!(handle.status().snapshot(), DashboardSnapshot::NotInitialized);

    let outcome = handle.initialize();
    assert!(outcome.is_success(), "{}", outcome.message);

    match handle.status().snapshot() {
        DashboardSnapshot::Success {
            current_branch,
            pending_change_count,
            unpushed_commit_count,
            conflict_file_count,
        } => {
            assert!(
                current_branch == "main" || current_branch == "master",
                "unexpected initial branch {}",
                current_branch
            );
            assert_eq!(pending_change_count, 0);
            assert_eq!(unpushed_commit_count, 0);
            assert_eq!(conflict_file_count, 0);
        }
        other => panic!("unexpected snapshot: {:?}", other),
    }
}

#[test]
fn scenario_local_only_commits() {
    let (dir, repo) = setup_repo();
    for name in ["a.txt", "b.txt", "c.txt"] {
        commit_file(&repo, dir.path(), name, name);
    }

    let mut handle = RepositoryHandle::new(dir.path());
    let commits = handle.history().list().unwrap();
    assert_eq!(commits.len(), 3);
    assert!(commits
        .iter()
        .all(|c| c.pushed_status == PushedStatus::Unpushed));

    match handle.status().snapshot() {
        DashboardSnapshot::Success {
            unpushed_commit_count,
            ..
        } => assert_eq!(unpushed_commit_count, 0),
        other => panic!("unexpected snapshot: {:?}", other),
    }
}

#[test]
fn scenario_linked_remote_in_sync() {
    let (remote_dir, _remote) = setup_bare();
    let (dir, repo) = setup_repo();
    commit_file(&repo, dir.path(), "a.txt", "a");
    commit_file(&repo, dir.path(), "b.txt", "b");
    repo.remote("origin", &remote_dir.path().to_string_lossy())
        .unwrap();

    let mut handle = RepositoryHandle::new(dir.path());
    let outcome = handle.sync().push("", false);
    assert!(outcome.is_success(), "{}", outcome.message);

    let commits = handle.history().list().unwrap();
    assert_eq!(commits.len(), 2);
    assert!(commits
        .iter()
        .all(|c| c.pushed_status == PushedStatus::Pushed));
    assert_eq!(handle.history().unpushed_count().unwrap(), 0);

    let again = handle.sync().push("", false);
    assert_eq!(again.status, OutcomeStatus::UpToDate);
    assert!(again.is_success());
}

#[test]
fn scenario_rebase_refused_when_dirty() {
    let (dir, repo) = setup_repo();
    commit_file(&repo, dir.path(), "a.txt", "a");
    let main = head_branch(&repo);
    let base = repo.head().unwrap().peel_to_commit().unwrap();
    repo.branch("feature", &base, false).unwrap();
    commit_file(&repo, dir.path(), "b.txt", "b");
    std::fs::write(dir.path().join("a.txt"), "edited").unwrap();

    let mut handle = RepositoryHandle::new(dir.path());
    assert!(handle.branches().checkout("feature").is_success());
    let head = repo.head().unwrap().target().unwrap();

    let outcome = handle.branches().rebase(&main);
    assert_eq!(outcome.kind(), Some(ErrorKind::DirtyWorkingTree));
    assert_eq!(repo.head().unwrap().target().unwrap(), head);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "edited"
    );
    assert_eq!(repo.state(), git2::RepositoryState::Clean);
}

#[test]
fn scenario_repair_without_default_branch() {
    let (remote_dir, _remote) = setup_bare();

    let (source_dir, source) = setup_repo();
    commit_file(&source, source_dir.path(), "x.txt", "x");
    let source_branch = head_branch(&source);
    source
        .remote("origin", &remote_dir.path().to_string_lossy())
        .unwrap();
    source
        .find_remote("origin")
        .unwrap()
        .push(
            &[format!("refs/heads/{}:refs/heads/feature/x", source_branch).as_str()],
            None,
        )
        .unwrap();

    let (dir, repo) = setup_repo();
    commit_file(&repo, dir.path(), "local.txt", "local");
    repo.remote("origin", &remote_dir.path().to_string_lossy())
        .unwrap();
    let before = local_branches(&repo);

    let mut handle = RepositoryHandle::new(dir.path());
    let outcome = handle.sync().link_and_repair("");
    assert_eq!(outcome.kind(), Some(ErrorKind::NoDefaultRemoteBranch));
    assert_eq!(local_branches(&repo), before);
}

#[test]
fn branch_listing_order_is_stable() {
    let (dir, repo) = setup_repo();
    let head = commit_file(&repo, dir.path(), "a.txt", "a");
    let commit = repo.find_commit(head).unwrap();
    for name in ["zeta", "alpha", "mid"] {
        repo.branch(name, &commit, false).unwrap();
    }
    for name in ["origin/alpha", "origin/omega"] {
        repo.reference(&format!("refs/remotes/{}", name), head, true, "test")
            .unwrap();
    }

    let mut handle = RepositoryHandle::new(dir.path());
    assert!(handle.branches().checkout("mid").is_success());

    let first = handle.branches().list_rich().unwrap();
    let names: Vec<_> = first.iter().map(|b| b.short_name.as_str()).collect();
    let main = head_branch(&repo);
    assert_eq!(names[0], "mid");
    assert!(first[0].is_current);

    let locals: Vec<_> = first
        .iter()
        .skip(1)
        .take_while(|b| b.kind == BranchKind::Local)
        .map(|b| b.short_name.clone())
        .collect();
    let mut expected = vec!["alpha".to_string(), "zeta".to_string(), main];
    expected.sort();
    assert_eq!(locals, expected);
    assert_eq!(&names[names.len() - 2..], &["origin/alpha", "origin/omega"]);

    let second = handle.branches().list_rich().unwrap();
    assert_eq!(first, second);
}

#[test]
fn pushed_boundary_on_linear_history() {
    let (dir, repo) = setup_repo();
    commit_file(&repo, dir.path(), "base.txt", "base");
    let boundary = commit_file(&repo, dir.path(), "r.txt", "r");
    commit_file(&repo, dir.path(), "c1.txt", "c1");
    commit_file(&repo, dir.path(), "c2.txt", "c2");
    let branch = head_branch(&repo);
    repo.reference(&format!("refs/remotes/origin/{}", branch), boundary, true, "test")
        .unwrap();
    repo.remote("origin", "https://example.com/repo.git").unwrap();

    let mut handle = RepositoryHandle::new(dir.path());
    let commits = handle.history().list().unwrap();
    let statuses: Vec<_> = commits.iter().map(|c| c.pushed_status).collect();
    assert_eq!(
        statuses,
        vec![
            PushedStatus::Unpushed,
            PushedStatus::Unpushed,
            PushedStatus::Pushed,
            PushedStatus::Pushed,
        ]
    );

    let oids: Vec<_> = commits
        .iter()
        .map(|c| git2::Oid::from_str(&c.oid).unwrap())
        .collect();
    assert_eq!(
        classify_pushed(&oids, None),
        vec![PushedStatus::Unpushed; 4]
    );
}

#[test]
fn stash_indices_shift_and_renumber() {
    let (dir, repo) = setup_repo();
    commit_file(&repo, dir.path(), "a.txt", "a");

    let mut handle = RepositoryHandle::new(dir.path());
    for round in 0..3 {
        std::fs::write(dir.path().join("a.txt"), format!("change {}", round)).unwrap();
        let outcome = handle.stash().create(&format!("round {}", round));
        assert!(outcome.is_success(), "{}", outcome.message);

        let entries = handle.stash().list().unwrap();
        assert_eq!(entries.len(), round + 1);
        assert!(entries[0].message.contains(&format!("round {}", round)));
    }

    assert!(handle.stash().drop(0).is_success());
    let entries = handle.stash().list().unwrap();
    let indices: Vec<_> = entries.iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert!(entries[0].message.contains("round 1"));
    assert!(entries[1].message.contains("round 0"));
}

#[test]
fn checkout_current_branch_is_idempotent() {
    let (dir, repo) = setup_repo();
    commit_file(&repo, dir.path(), "a.txt", "a");
    let main = head_branch(&repo);

    let mut handle = RepositoryHandle::new(dir.path());
    let outcome = handle.branches().checkout(&main);
    assert!(outcome.is_success(), "{}", outcome.message);
    assert_eq!(outcome.status, OutcomeStatus::UpToDate);

    match handle.status().snapshot() {
        DashboardSnapshot::Success { current_branch, .. } => assert_eq!(current_branch, main),
        other => panic!("unexpected snapshot: {:?}", other),
    }
}

#[test]
fn snapshot_failure_is_never_partial() {
    let (dir, repo) = setup_repo();
    commit_file(&repo, dir.path(), "a.txt", "a");
    std::fs::write(dir.path().join(".git").join("index"), b"not an index").unwrap();

    let mut handle = RepositoryHandle::new(dir.path());
    match handle.status().snapshot() {
        DashboardSnapshot::Error { reason } => assert!(!reason.is_empty()),
        other => panic!("expected an error snapshot, got {:?}", other),
    }
}
