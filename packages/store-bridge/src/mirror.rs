//! Remote-side read-only mirror of a host adapter.
//!
//! A `Mirror` is the framework bridge: it holds the one subscription a
//! remote keeps per adapter and fans each snapshot out to the remote's
//! own consumers through a local observer set.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::adapter::{Listener, StoreAdapter, Unsubscribe};
use crate::error::BridgeError;

struct MirrorState<T> {
    value: Arc<T>,
    source: Option<Arc<dyn StoreAdapter<T>>>,
    upstream: Option<Unsubscribe>,
    /// Bumped by every upstream snapshot.
    version: u64,
    next_watcher: u64,
    watchers: BTreeMap<u64, Listener<T>>,
}

struct Shared<T> {
    state: Mutex<MirrorState<T>>,
}

impl<T: Send + Sync + 'static> Shared<T> {
    fn replace(&self, next: Arc<T>) {
        let watchers: Vec<Listener<T>> = {
            let mut state = self.state.lock();
            state.value = next.clone();
            state.version += 1;
            state.watchers.values().cloned().collect()
        };
        for watcher in watchers {
            watcher(&next);
        }
    }
}

/// A read-only mirror of a [`StoreAdapter`].
///
/// The mirror connects on first use: it subscribes once, then reads
/// `get_state()` synchronously, so the first value a consumer sees is the
/// host's current state. After [`Mirror::dispose`] the value falls back to
/// `T::default()` and the next use connects again.
pub struct Mirror<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Mirror<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Default + Send + Sync + 'static> Default for Mirror<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default + Send + Sync + 'static> Mirror<T> {
    /// Create an unbound mirror. It reads `T::default()` until bound.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(MirrorState {
                    value: Arc::new(T::default()),
                    source: None,
                    upstream: None,
                    version: 0,
                    next_watcher: 0,
                    watchers: BTreeMap::new(),
                }),
            }),
        }
    }

    /// Create a mirror bound to `source`.
    pub fn with_adapter(source: Arc<dyn StoreAdapter<T>>) -> Self {
        let mirror = Self::new();
        mirror.bind(source);
        mirror
    }

    /// Point the mirror at `source`.
    ///
    /// A live subscription to a previous source is dropped first.
    pub fn bind(&self, source: Arc<dyn StoreAdapter<T>>) {
        let previous = {
            let mut state = self.shared.state.lock();
            state.source = Some(source);
            state.upstream.take()
        };
        if let Some(previous) = previous {
            tracing::debug!("mirror rebound, dropping previous subscription");
            previous.unsubscribe();
        }
    }

    /// Whether the mirror currently holds an upstream subscription.
    pub fn is_connected(&self) -> bool {
        self.shared.state.lock().upstream.is_some()
    }

    /// Current mirrored value.
    pub fn get(&self) -> Arc<T> {
        self.ensure_connected();
        self.shared.state.lock().value.clone()
    }

    /// Register a local consumer.
    ///
    /// Local consumers never subscribe to the host directly; they are fed
    /// from the mirror's single upstream subscription.
    pub fn watch(&self, watcher: Listener<T>) -> Unsubscribe {
        self.ensure_connected();
        let id = {
            let mut state = self.shared.state.lock();
            let id = state.next_watcher;
            state.next_watcher += 1;
            state.watchers.insert(id, watcher);
            id
        };
        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        Unsubscribe::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.state.lock().watchers.remove(&id);
            }
        })
    }

    /// Drop the upstream subscription and reset to `T::default()`.
    ///
    /// Returns `false` if the mirror was not connected.
    pub fn dispose(&self) -> bool {
        let upstream = {
            let mut state = self.shared.state.lock();
            state.value = Arc::new(T::default());
            state.watchers.clear();
            state.upstream.take()
        };
        match upstream {
            Some(upstream) => {
                upstream.unsubscribe();
                true
            }
            None => {
                tracing::debug!("mirror dispose called while not connected");
                false
            }
        }
    }

    /// A teardown hook that disposes this mirror.
    pub fn dispose_hook(
        &self,
    ) -> impl Fn() -> Result<(), BridgeError> + Send + Sync + 'static {
        let mirror = self.clone();
        move || {
            mirror.dispose();
            Ok(())
        }
    }

    fn ensure_connected(&self) {
        let (source, version) = {
            let state = self.shared.state.lock();
            if state.upstream.is_some() {
                return;
            }
            match &state.source {
                Some(source) => (source.clone(), state.version),
                None => return,
            }
        };

        let weak = Arc::downgrade(&self.shared);
        let upstream = source.subscribe(Arc::new(move |next: &Arc<T>| {
            if let Some(shared) = weak.upgrade() {
                shared.replace(next.clone());
            }
        }));
        let initial = source.get_state();

        let mut state = self.shared.state.lock();
        if state.upstream.is_some() {
            drop(state);
            upstream.unsubscribe();
            return;
        }
        // A snapshot delivered since subscribing is at least as new.
        if state.version == version {
            state.value = initial;
        }
        state.upstream = Some(upstream);
    }
}
