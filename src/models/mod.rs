//! Data models for the application.
//!
//! These are read-only snapshots of a request as fetched from the OBS API.
//! Nothing here is cached or mutated; a fresh set is built for every render.

pub mod build_result;
pub mod comment;
pub mod diff;
pub mod request;

// Re-exports for convenient access
pub use build_result::BuildResult;
pub use comment::Comment;
pub use diff::{ChangeType, FileDiff, Issue};
pub use request::{Request, RequestAction, RequestState, RequestStateKind, Review, ReviewEvent};
