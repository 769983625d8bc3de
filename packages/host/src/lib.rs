//! # portal-host
//!
//! The host shell. It maps routes to remotes through a
//! [`RemoteRegistry`](portal_remote_loader::RemoteRegistry), loads them
//! with a [`RemoteLoader`](portal_remote_loader::RemoteLoader), mounts
//! them into the shared [`Document`](portal_lifecycle::Document) and keeps
//! recently used remotes alive while hidden.
//!
//! ```ignore
//! use portal_host::{HostConfig, HostShell};
//!
//! let shell = HostShell::new(HostConfig::default(), registry, loader, document);
//! shell.navigate("/blog/posts/7").await?;
//! shell.navigate("/shopping").await?; // blog is deactivated, not unmounted
//! shell.set_theme(Theme::Dark);       // every mounted remote rerenders
//! ```

pub mod config;
pub mod error;
pub mod keep_alive;
pub mod shell;
pub mod status;

pub use config::HostConfig;
pub use error::{HostError, Result};
pub use keep_alive::{CachedRemote, KeepAlive};
pub use shell::HostShell;
pub use status::RemoteStatus;
