//! Shared helpers over `git2::Repository`

pub mod repo;

pub use repo::*;
