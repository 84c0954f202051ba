//! Service layer for GitPocket
//!
//! The repository handle, credential plumbing and the async workspace facade.

pub mod credentials_service;
pub mod repo_handle;
pub mod workspace_service;

pub use credentials_service::{CredentialsHelper, KeyringTokenStore, MemoryTokenStore, TokenStore};
pub use repo_handle::RepositoryHandle;
pub use workspace_service::Workspace;
