//! Structured result of a mutating operation

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, GitPocketError, Result};

/// Display class for an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// What an operation ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "kind", rename_all = "camelCase")]
pub enum OutcomeStatus {
    Completed,
    /// Nothing needed to change (already merged, already pushed)
    UpToDate,
    /// Nothing to act on (no changes to stash)
    NoChanges,
    Failed(ErrorKind),
}

/// Result of an orchestrator operation: a short message plus a tag callers
/// branch on instead of inspecting the message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub severity: Severity,
    pub status: OutcomeStatus,
    pub message: String,
}

impl Outcome {
    pub fn completed(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            status: OutcomeStatus::Completed,
            message: message.into(),
        }
    }

    pub fn up_to_date(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            status: OutcomeStatus::UpToDate,
            message: message.into(),
        }
    }

    pub fn no_changes(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            status: OutcomeStatus::NoChanges,
            message: message.into(),
        }
    }

    pub fn failed(error: &GitPocketError) -> Self {
        let kind = error.kind();
        Self {
            severity: if kind.is_conflict() {
                Severity::Warning
            } else {
                Severity::Error
            },
            status: OutcomeStatus::Failed(kind),
            message: error.to_string(),
        }
    }

    /// Recover an operation result into an outcome, logging failures.
    pub fn recover(operation: &str, result: Result<Outcome>) -> Self {
        match result {
            Ok(outcome) => {
                tracing::info!("{}: {}", operation, outcome.message);
                outcome
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", operation, e);
                Outcome::failed(&e)
            }
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self.status {
            OutcomeStatus::Failed(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.status, OutcomeStatus::Failed(_))
    }

    /// True when the operation stopped on conflicts the user can resolve
    pub fn is_conflict(&self) -> bool {
        self.kind().map(ErrorKind::is_conflict).unwrap_or(false)
    }
}
