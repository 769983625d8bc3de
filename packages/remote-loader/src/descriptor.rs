//! Static description of a remote.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where a remote lives and how to mount it.
///
/// Descriptors are built once when configuration loads and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDescriptor {
    /// Display name.
    pub name: String,
    /// Federation identifier, unique per remote. Keys the mount-function cache.
    pub key: String,
    /// Entry artifact location. Keys the artifact cache.
    pub url: String,
    /// Exposed bootstrap module, e.g. `./bootstrap`.
    pub module_specifier: String,
    /// Export of the bootstrap module that mounts the remote.
    pub mount_function_name: String,
    /// Route prefix owned by this remote, e.g. `/blog`.
    pub base_path: String,
}

impl RemoteDescriptor {
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        url: impl Into<String>,
        module_specifier: impl Into<String>,
        mount_function_name: impl Into<String>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            url: url.into(),
            module_specifier: module_specifier.into(),
            mount_function_name: mount_function_name.into(),
            base_path: base_path.into(),
        }
    }

    /// Check the fields a loader and a router rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidDescriptor {
            key: self.key.clone(),
            message: message.to_string(),
        };
        if self.key.is_empty() {
            return Err(invalid("key must not be empty"));
        }
        if self.url.is_empty() {
            return Err(invalid("url must not be empty"));
        }
        if self.module_specifier.is_empty() {
            return Err(invalid("moduleSpecifier must not be empty"));
        }
        if self.mount_function_name.is_empty() {
            return Err(invalid("mountFunctionName must not be empty"));
        }
        if !self.base_path.starts_with('/') {
            return Err(invalid("basePath must start with '/'"));
        }
        Ok(())
    }

    /// Whether `path` falls under this remote's base path.
    pub fn owns_path(&self, path: &str) -> bool {
        let base = self.base_path.trim_end_matches('/');
        if base.is_empty() {
            return path.starts_with('/');
        }
        match path.strip_prefix(base) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
            None => false,
        }
    }

    /// `path` relative to the base path, always starting with `/`.
    ///
    /// Returns `None` if the path is outside this remote.
    pub fn relative_path(&self, path: &str) -> Option<String> {
        if !self.owns_path(path) {
            return None;
        }
        let base = self.base_path.trim_end_matches('/');
        let rest = &path[base.len()..];
        Some(if rest.is_empty() || rest.starts_with('?') {
            format!("/{rest}")
        } else {
            rest.to_string()
        })
    }
}
