//! GitPocket core
//!
//! Repository state and synchronization for a mobile-first Git client:
//! branches, stashes, history, a single remote and the dashboard status
//! derived from them, on top of libgit2.

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod test_utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::{PullStrategy, Settings};
pub use error::{ErrorKind, GitPocketError, Result};
pub use models::{DashboardSnapshot, Outcome, OutcomeStatus, Severity};
pub use services::{RepositoryHandle, Workspace};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `filter`. Calling this more than once is
/// harmless; later calls leave the first subscriber in place.
pub fn init_tracing(filter: &str) {
    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if installed.is_ok() {
        tracing::info!("Starting GitPocket core");
    }
}
