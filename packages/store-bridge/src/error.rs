//! Error types for the store bridge.

use thiserror::Error;

/// Errors raised while moving snapshots across the host/remote boundary.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The envelope carries a different kind of state than requested.
    #[error("state kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: String, actual: String },

    /// The envelope was produced by an incompatible schema version.
    #[error("unsupported {kind} state version {actual} (expected {expected})")]
    VersionMismatch {
        kind: String,
        expected: u32,
        actual: u32,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
