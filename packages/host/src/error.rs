//! Host shell errors.
//!
//! Load and mount failures are not errors here: they surface as
//! [`RemoteStatus::Unavailable`](crate::RemoteStatus::Unavailable) so the
//! shell can render a fallback.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// No remote's base path covers the route.
    #[error("no remote is registered for {path}")]
    NoRemoteForRoute { path: String },

    /// `retry` was called before any remote route was visited.
    #[error("no remote route to retry")]
    NothingToRetry,
}

pub type Result<T> = std::result::Result<T, HostError>;
