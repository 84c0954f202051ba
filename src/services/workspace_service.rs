//! Async facade that serializes operations on one repository

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::Settings;
use crate::error::{GitPocketError, Result};
use crate::models::{DashboardSnapshot, Outcome};
use crate::services::{RepositoryHandle, TokenStore};

/// Shared, async-friendly owner of a [`RepositoryHandle`].
///
/// Operations queue on an async mutex and run on the blocking pool. Network
/// operations read the token from the store and are bounded by the configured
/// timeout. A timed-out operation keeps running in the background and holds
/// the lock until it finishes.
#[derive(Clone)]
pub struct Workspace {
    handle: Arc<Mutex<RepositoryHandle>>,
    tokens: Arc<dyn TokenStore>,
    network_timeout: Option<Duration>,
}

impl Workspace {
    pub fn new(handle: RepositoryHandle, tokens: Arc<dyn TokenStore>) -> Self {
        let network_timeout = handle.settings().network_timeout();
        Self {
            handle: Arc::new(Mutex::new(handle)),
            tokens,
            network_timeout,
        }
    }

    pub fn open(root: impl Into<PathBuf>, settings: Settings, tokens: Arc<dyn TokenStore>) -> Self {
        Self::new(RepositoryHandle::with_settings(root, settings), tokens)
    }

    pub fn with_network_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.network_timeout = timeout;
        self
    }

    /// Run a blocking operation with exclusive access to the handle
    pub async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut RepositoryHandle) -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut guard = Arc::clone(&self.handle).lock_owned().await;
        tokio::task::spawn_blocking(move || op(&mut *guard))
            .await
            .map_err(|e| GitPocketError::OperationFailed(format!("Worker task failed: {}", e)))
    }

    async fn run_network<F>(&self, operation: &'static str, op: F) -> Outcome
    where
        F: FnOnce(&mut RepositoryHandle, &str) -> Outcome + Send + 'static,
    {
        let token = match self.tokens.token() {
            Ok(token) => token,
            Err(e) => return Outcome::recover(operation, Err(e)),
        };

        let task = self.run(move |handle| op(handle, &token));
        let result = match self.network_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(result) => result,
                Err(_) => Err(GitPocketError::Network(format!(
                    "{} timed out after {:?}",
                    operation, limit
                ))),
            },
            None => task.await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => Outcome::recover(operation, Err(e)),
        }
    }

    pub async fn fetch(&self) -> Outcome {
        self.run_network("fetch", |handle, token| handle.sync().fetch(token))
            .await
    }

    pub async fn push(&self, force: bool) -> Outcome {
        self.run_network("push", move |handle, token| {
            handle.sync().push(token, force)
        })
        .await
    }

    pub async fn pull(&self) -> Outcome {
        self.run_network("pull", |handle, token| handle.sync().pull(token))
            .await
    }

    pub async fn link_and_repair(&self) -> Outcome {
        self.run_network("link and repair", |handle, token| {
            handle.sync().link_and_repair(token)
        })
        .await
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.run(|handle| handle.status().snapshot())
            .await
            .unwrap_or_else(|e| DashboardSnapshot::Error {
                reason: e.to_string(),
            })
    }

    /// Drop the live session; the next operation re-opens it
    pub async fn close(&self) {
        self.handle.lock().await.close();
    }
}
