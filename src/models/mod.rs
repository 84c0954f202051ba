//! Data models for GitPocket

pub mod branch;
pub mod commit;
pub mod conflict;
pub mod outcome;
pub mod repository;

pub use branch::*;
pub use commit::*;
pub use conflict::*;
pub use outcome::*;
pub use repository::*;
