//! Fetching entry artifacts.
//!
//! [`EntryImporter`] is the seam between the loader's caching and the
//! network, so tests can substitute an in-memory importer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::entry::{EntryManifest, ModuleLinker, RemoteEntry};
use crate::error::{ConfigError, LoadError};

/// Fetches and evaluates the entry artifact at a URL.
#[async_trait]
pub trait EntryImporter: Send + Sync {
    async fn import(&self, url: &str) -> Result<Arc<RemoteEntry>, LoadError>;
}

/// Loader settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Seconds before an entry fetch is abandoned.
    pub fetch_timeout_secs: u64,
}

impl LoaderConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 30,
        }
    }
}

/// Production importer: fetches the manifest over HTTP and links its
/// exposed modules against a [`ModuleLinker`].
pub struct HttpImporter {
    client: Client,
    linker: ModuleLinker,
}

impl HttpImporter {
    pub fn new(config: &LoaderConfig, linker: ModuleLinker) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(config.fetch_timeout()).build()?;
        Ok(Self { client, linker })
    }

    pub fn linker(&self) -> &ModuleLinker {
        &self.linker
    }
}

#[async_trait]
impl EntryImporter for HttpImporter {
    async fn import(&self, url: &str) -> Result<Arc<RemoteEntry>, LoadError> {
        let parsed = Url::parse(url).map_err(|e| LoadError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        debug!(url, "fetching remote entry");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| LoadError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| LoadError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let manifest = EntryManifest::parse(url, &body)?;
        Ok(Arc::new(manifest.link(url, &self.linker)))
    }
}
