//! Repository orchestrators
//!
//! Each orchestrator borrows a [`crate::services::RepositoryHandle`] mutably
//! and is obtained from it (`handle.branches()`, `handle.sync()`, ...).

pub mod branch;
pub mod commit;
pub mod conflict;
pub mod gitignore;
pub mod merge;
pub mod remote;
pub mod rewrite;
pub mod stash;
pub mod staging;
pub mod status;

pub use branch::BranchOrchestrator;
pub use commit::{classify_pushed, CommitHistoryService};
pub use conflict::ConflictResolver;
pub use gitignore::{add_to_gitignore, read_gitignore, templates, write_gitignore, IgnoreTemplate};
pub use remote::SyncOrchestrator;
pub use rewrite::ResetMode;
pub use stash::StashOrchestrator;
pub use staging::WorkingTree;
pub use status::StatusAggregator;
