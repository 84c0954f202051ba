//! Lifecycle of one opened repository

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{GitPocketError, Result};
use crate::models::Outcome;
use crate::services::CredentialsHelper;
use crate::utils;

/// Caller-owned handle on a single working-copy root.
///
/// Holds at most one live backend session. Every orchestrator calls
/// [`RepositoryHandle::ensure_open`] before touching repository state, so a
/// closed handle re-opens on the next operation. The handle does no locking:
/// operations take `&mut self`, and sharing across tasks goes through
/// [`crate::services::Workspace`].
pub struct RepositoryHandle {
    root: PathBuf,
    settings: Settings,
    session: Option<git2::Repository>,
}

impl RepositoryHandle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_settings(root, Settings::default())
    }

    pub fn with_settings(root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            root: root.into(),
            settings,
            session: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) fn remote_name(&self) -> &str {
        &self.settings.remote_name
    }

    /// Whether the root carries repository metadata
    pub fn is_repository(&self) -> bool {
        self.root.join(".git").exists()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Open the session if needed and return it
    pub fn ensure_open(&mut self) -> Result<&mut git2::Repository> {
        if self.session.is_none() {
            if !self.is_repository() {
                return Err(GitPocketError::NotARepository(
                    self.root.display().to_string(),
                ));
            }
            let repo = git2::Repository::open(&self.root).map_err(|e| {
                GitPocketError::NotARepository(format!(
                    "{}: {}",
                    self.root.display(),
                    e.message()
                ))
            })?;
            tracing::debug!("Opened repository at {}", self.root.display());
            self.session = Some(repo);
        }

        self.session
            .as_mut()
            .ok_or_else(|| GitPocketError::NotARepository(self.root.display().to_string()))
    }

    /// Drop the live session; the next operation opens a fresh one
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("Closed repository at {}", self.root.display());
        }
    }

    /// Create repository metadata at the root and open it
    pub fn initialize(&mut self) -> Outcome {
        let result = git2::Repository::init(&self.root)
            .map(|repo| {
                self.session = Some(repo);
                Outcome::completed("Repository initialized successfully!")
            })
            .map_err(GitPocketError::from);
        Outcome::recover("initialize", result)
    }

    /// Write `user.name` / `user.email`; empty values leave the config untouched
    pub fn configure_identity(&mut self, name: &str, email: &str) -> Outcome {
        let result = self.try_configure_identity(name, email);
        Outcome::recover("configure identity", result)
    }

    fn try_configure_identity(&mut self, name: &str, email: &str) -> Result<Outcome> {
        let repo = self.ensure_open()?;
        if name.is_empty() && email.is_empty() {
            return Ok(Outcome::no_changes("No identity values to save"));
        }

        let mut config = repo.config()?;
        if !name.is_empty() {
            config.set_str("user.name", name)?;
        }
        if !email.is_empty() {
            config.set_str("user.email", email)?;
        }
        Ok(Outcome::completed("Identity saved"))
    }

    /// URL of the configured remote
    pub fn remote_url(&mut self) -> Result<Option<String>> {
        let remote_name = self.settings.remote_name.clone();
        let repo = self.ensure_open()?;
        utils::remote_url(repo, &remote_name)
    }

    pub fn has_remote(&mut self) -> Result<bool> {
        Ok(self.remote_url()?.is_some())
    }

    /// Clone `url` into `parent/folder` and return a handle on the new copy.
    ///
    /// Refuses a destination that exists and is not empty, and removes a
    /// partially created destination when the clone fails.
    pub fn clone_into(
        url: &str,
        parent: &Path,
        folder: &str,
        token: &str,
        settings: Settings,
    ) -> (Option<RepositoryHandle>, Outcome) {
        let dest = parent.join(folder);

        let occupied = dest
            .read_dir()
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
        if occupied {
            let err = GitPocketError::OperationFailed(format!(
                "Folder exists & not empty: {}",
                dest.display()
            ));
            return (None, Outcome::recover("clone", Err(err)));
        }

        let helper = CredentialsHelper::for_token(token);
        let mut fetch_opts = git2::FetchOptions::new();
        fetch_opts.remote_callbacks(helper.get_callbacks());

        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch_opts);

        match builder.clone(url, &dest) {
            Ok(repo) => {
                let handle = RepositoryHandle {
                    root: dest,
                    settings,
                    session: Some(repo),
                };
                let outcome = Outcome::completed("Cloned successfully!");
                (Some(handle), Outcome::recover("clone", Ok(outcome)))
            }
            Err(e) => {
                if dest.exists() {
                    if let Err(cleanup) = std::fs::remove_dir_all(&dest) {
                        tracing::warn!("Failed to clean up {}: {}", dest.display(), cleanup);
                    }
                }
                (None, Outcome::recover("clone", Err(e.into())))
            }
        }
    }
}
