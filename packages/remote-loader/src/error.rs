//! Error types for remote loading and registry configuration.

use thiserror::Error;

/// Why a remote could not be resolved to a mount function.
///
/// Load errors are carried inside a [`LoadResult`](crate::LoadResult) and
/// never escape the loader as a panic or an `Err` from `load_remote`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The entry URL could not be parsed.
    #[error("invalid remote entry URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// The network request failed.
    #[error("failed to fetch remote entry {url}: {message}")]
    Fetch { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("remote entry {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The artifact could not be parsed at all.
    #[error("malformed remote entry {url}: {message}")]
    Malformed { url: String, message: String },

    /// The artifact parsed but offers no module lookup.
    #[error("{url} is not a valid remote entry")]
    InvalidEntry { url: String },

    /// The entry does not expose the requested module.
    #[error("remote entry {url} does not expose {module}")]
    ModuleNotExposed { url: String, module: String },

    /// The exposed module is not linked into this host.
    #[error("module {module_id} exposed as {module} is not linked")]
    ModuleNotLinked { module: String, module_id: String },

    /// The module factory failed.
    #[error("module factory for {module} failed: {message}")]
    Factory { module: String, message: String },

    /// The module has no export with the mount function's name.
    #[error("module {module} has no mount function {function}")]
    MountFunctionMissing { module: String, function: String },
}

/// Errors reading the remote registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read registry file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse registry: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("duplicate remote key {key} in {environment} environment")]
    DuplicateKey { environment: String, key: String },

    #[error("remote {key}: {message}")]
    InvalidDescriptor { key: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;
