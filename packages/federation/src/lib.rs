//! Portal federation: a host shell composing independently built and
//! deployed remotes at run time.
//!
//! - [`store_bridge`]: state shared from the host to remotes through the
//!   `{get_state, subscribe}` adapter contract.
//! - [`lifecycle`]: the mount contract and the per-remote instance manager.
//! - [`remote_loader`]: descriptors, entry artifacts and the cached loader.
//! - [`host`]: routing, keep-alive and fallback handling.

pub use portal_host as host;
pub use portal_lifecycle as lifecycle;
pub use portal_remote_loader as remote_loader;
pub use portal_store_bridge as store_bridge;

pub use portal_host::{HostConfig, HostError, HostShell, RemoteStatus};
pub use portal_lifecycle::{
    AppBootstrap, AppBootstrapConfig, AppLifecycle, Document, Element, MountFn, MountOptions, Theme,
};
pub use portal_remote_loader::{
    Environment, HttpImporter, LoadError, LoadResult, LoaderConfig, ModuleLinker,
    RemoteDescriptor, RemoteLoader, RemoteRegistry,
};
pub use portal_store_bridge::{
    AuthState, HostStore, Mirror, PortalActions, PortalStores, StoreAdapter, ThemeState,
};
