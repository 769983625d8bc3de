//! # portal-store-bridge
//!
//! Shared state between a portal host and the remotes it mounts.
//!
//! The host and its remotes do not share a build, a framework, or a
//! reactive runtime. The only thing they share is a [`StoreAdapter`]: a
//! `get_state` / `subscribe` pair over plain, serializable snapshots.
//!
//! ## Host side
//!
//! [`HostStore`] owns the authoritative state and publishes complete
//! snapshots to subscribers in subscription order:
//!
//! ```ignore
//! use portal_store_bridge::{HostStore, ThemeState};
//!
//! let theme = HostStore::new(ThemeState::default());
//! theme.toggle_theme();
//! assert!(theme.get_state().is_dark);
//! ```
//!
//! ## Remote side
//!
//! A remote keeps one [`Mirror`] per adapter, usually as a module-level
//! singleton. Every consumer inside the remote reads the mirror, so the
//! number of subscriptions crossing the host boundary stays at one per
//! adapter regardless of how many components use it:
//!
//! ```ignore
//! use std::sync::LazyLock;
//! use portal_store_bridge::{AuthState, Mirror};
//!
//! static AUTH: LazyLock<Mirror<AuthState>> = LazyLock::new(Mirror::new);
//!
//! AUTH.bind(stores.auth.clone());
//! let signed_in = AUTH.get().is_authenticated;
//! // at unmount:
//! AUTH.dispose();
//! ```
//!
//! ## Wire form
//!
//! When the two sides are compiled separately, snapshots cross the
//! boundary as an [`Envelope`] tagged with the state kind and schema
//! version. [`EncodingAdapter`] and [`EnvelopeAdapter`] convert between
//! a typed adapter and its wire form.

pub mod adapter;
pub mod envelope;
pub mod error;
pub mod host_store;
pub mod mirror;
pub mod state;

pub use adapter::{Listener, PortalActions, StoreAdapter, Unsubscribe};
pub use envelope::{EncodingAdapter, Envelope, EnvelopeAdapter};
pub use error::{BridgeError, Result};
pub use host_store::HostStore;
pub use mirror::Mirror;
pub use state::{AuthState, PortalStores, SharedState, ThemeState, UserProfile};
