//! Error types for the lifecycle manager.

use thiserror::Error;

/// Boxed error raised by framework code (render roots, teardown hooks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A mount attempt failed. The host treats this as "remote unavailable".
#[derive(Debug, Error)]
pub enum MountError {
    /// The target element is not part of the document.
    #[error("[{remote}] mount element is required")]
    MissingElement { remote: String },

    /// The framework could not create a rendering root.
    #[error("[{remote}] failed to create render root: {source}")]
    RootCreation {
        remote: String,
        #[source]
        source: BoxError,
    },

    /// The initial render failed.
    #[error("[{remote}] initial render failed: {source}")]
    Render {
        remote: String,
        #[source]
        source: BoxError,
    },
}

/// A single teardown step failed.
///
/// Teardown errors are logged and never propagated.
#[derive(Debug, Error)]
pub enum TeardownError {
    #[error("render root unmount failed: {0}")]
    RenderRoot(#[source] BoxError),

    #[error("teardown hook {name} failed: {source}")]
    Hook {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// Result type alias for mount operations.
pub type Result<T> = std::result::Result<T, MountError>;
