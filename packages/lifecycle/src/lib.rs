//! # portal-lifecycle
//!
//! The mount contract every remote honors, and the instance lifecycle
//! manager each remote embeds in its bootstrap module.
//!
//! ## The contract
//!
//! A remote exposes a [`MountFn`]: given an [`Element`] and
//! [`MountOptions`], it attaches itself and returns an [`AppLifecycle`]
//! handle. The host drives the instance only through that handle:
//!
//! - `on_parent_navigate(path)`: the host route changed
//! - `on_activated()` / `on_deactivated()`: keep-alive visibility changes
//! - `on_theme_change(theme)`
//! - `unmount()`
//!
//! ## The manager
//!
//! [`AppBootstrap`] implements the contract for one remote. It keeps one
//! instance per element, tears down a previous instance before mounting a
//! new one on the same element, ignores host navigation while an instance
//! is inactive, and runs every teardown step to completion even when some
//! of them fail.
//!
//! ```ignore
//! use portal_lifecycle::{AppBootstrap, AppBootstrapConfig, Document, MountOptions};
//!
//! let bootstrap = AppBootstrap::builder(
//!     AppBootstrapConfig::new("Blog", "blog"),
//!     document.clone(),
//!     |el| Ok(Box::new(BlogRoot::new(el)) as Box<dyn RenderRoot>),
//! )
//! .router(router)
//! .teardown("auth mirror", AUTH.dispose_hook())
//! .build();
//!
//! let mount_blog_app = bootstrap.mount_fn();
//! ```
//!
//! ## Document model
//!
//! There is no browser here. [`Document`] stands in for the page: it hands
//! out mount elements, holds style nodes injected by remotes, and carries
//! the `data-service` attribute naming the remote that currently owns the
//! page.

pub mod bootstrap;
pub mod contract;
pub mod dom;
pub mod error;
pub mod render;

pub use bootstrap::{
    AppBootstrap, AppBootstrapBuilder, AppBootstrapConfig, LifecycleHandle, MountState,
};
pub use contract::{AppLifecycle, MountFn, MountOptions, NavigateCallback, Theme};
pub use dom::{
    Document, Element, ElementId, HeadObserver, StyleNode, SERVICE_ATTRIBUTE,
    STYLE_OWNER_ATTRIBUTE,
};
pub use error::{BoxError, MountError, Result, TeardownError};
pub use render::{AppProps, RemoteRouter, RenderRoot, RootFactory};
