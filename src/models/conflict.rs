//! Conflict-related model types

use serde::{Deserialize, Serialize};

/// Text of each side of a conflicted file
///
/// A side is `None` when that side deleted the file or its content is not
/// valid UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictVersions {
    /// File path relative to repository root
    pub path: String,
    /// Base (ancestor) version
    pub ancestor: Option<String>,
    /// Our (current branch) version
    pub ours: Option<String>,
    /// Their (incoming) version
    pub theirs: Option<String>,
    /// Working tree content, usually with conflict markers
    pub working: Option<String>,
}

/// Which side of a conflict to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictSide {
    Ours,
    Theirs,
}
