//! # portal-remote-loader
//!
//! Resolves remote descriptors to mount functions.
//!
//! ## Pieces
//!
//! ### RemoteDescriptor and RemoteRegistry
//!
//! A [`RemoteDescriptor`] says where a remote's entry artifact lives and
//! which export mounts it. A [`RemoteRegistry`] holds the descriptors for
//! one deployment environment, either the builtin table or one read from a
//! TOML file:
//!
//! ```ignore
//! use portal_remote_loader::{Environment, RegistryConfig};
//!
//! let registry = RegistryConfig::from_file("remotes.toml")?
//!     .registry(Environment::from_env()?)?;
//! let blog = registry.resolve("/blog/42");
//! ```
//!
//! ### RemoteLoader
//!
//! Fetches entry artifacts through an [`EntryImporter`] and caches both the
//! artifact (by URL) and the resolved mount function (by key):
//!
//! ```ignore
//! use portal_remote_loader::{HttpImporter, LoaderConfig, ModuleLinker, RemoteLoader};
//!
//! let importer = HttpImporter::new(&LoaderConfig::default(), linker)?;
//! let loader = RemoteLoader::new(Arc::new(importer));
//!
//! let result = loader.load_remote(&descriptor).await;
//! match result.into_result() {
//!     Ok(mount) => { /* mount(&element, options) */ }
//!     Err(error) => { /* render a fallback */ }
//! }
//! ```

pub mod descriptor;
pub mod entry;
pub mod error;
pub mod importer;
pub mod loader;
pub mod registry;

pub use descriptor::RemoteDescriptor;
pub use entry::{
    EntryManifest, ModuleFactory, ModuleLinker, RemoteContainer, RemoteEntry, RemoteModule,
};
pub use error::{ConfigError, LoadError, Result};
pub use importer::{EntryImporter, HttpImporter, LoaderConfig};
pub use loader::{LoadResult, RemoteLoader};
pub use registry::{
    builtin_descriptors, Environment, RegistryConfig, RemoteRegistry, ENVIRONMENT_VAR,
};
