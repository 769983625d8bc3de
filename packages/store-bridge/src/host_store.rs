//! Host-owned authoritative state.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::adapter::{Listener, StoreAdapter, Unsubscribe};
use crate::state::ThemeState;

struct Inner<T> {
    state: Mutex<Arc<T>>,
    listeners: Mutex<Listeners<T>>,
}

struct Listeners<T> {
    next_id: u64,
    by_id: BTreeMap<u64, Listener<T>>,
}

/// A host-side store publishing complete snapshots.
///
/// Listeners are notified synchronously, in the order they subscribed.
/// Cloning a `HostStore` yields another handle to the same state.
pub struct HostStore<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for HostStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> HostStore<T> {
    /// Create a store holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(Arc::new(initial)),
                listeners: Mutex::new(Listeners {
                    next_id: 0,
                    by_id: BTreeMap::new(),
                }),
            }),
        }
    }

    /// Current snapshot.
    pub fn get_state(&self) -> Arc<T> {
        self.inner.state.lock().clone()
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().by_id.len()
    }

    /// Publish `next` unconditionally.
    pub fn replace_state(&self, next: T) {
        let snapshot = Arc::new(next);
        *self.inner.state.lock() = snapshot.clone();
        self.notify(&snapshot);
    }

    fn notify(&self, snapshot: &Arc<T>) {
        // Listeners may subscribe or unsubscribe while being notified.
        let listeners: Vec<Listener<T>> =
            self.inner.listeners.lock().by_id.values().cloned().collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl<T: PartialEq + Send + Sync + 'static> HostStore<T> {
    /// Publish `next` if it differs from the current state.
    ///
    /// Returns whether listeners were notified.
    pub fn set_state(&self, next: T) -> bool {
        let snapshot = {
            let mut state = self.inner.state.lock();
            if **state == next {
                return false;
            }
            let snapshot = Arc::new(next);
            *state = snapshot.clone();
            snapshot
        };
        self.notify(&snapshot);
        true
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> HostStore<T> {
    /// Edit a copy of the current state and publish it.
    pub fn update(&self, edit: impl FnOnce(&mut T)) -> bool {
        let mut next = (*self.get_state()).clone();
        edit(&mut next);
        self.set_state(next)
    }
}

impl HostStore<ThemeState> {
    /// Flip between light and dark.
    pub fn toggle_theme(&self) {
        self.update(|theme| theme.is_dark = !theme.is_dark);
    }
}

impl<T: Send + Sync + 'static> StoreAdapter<T> for HostStore<T> {
    fn get_state(&self) -> Arc<T> {
        HostStore::get_state(self)
    }

    fn subscribe(&self, listener: Listener<T>) -> Unsubscribe {
        let id = {
            let mut listeners = self.inner.listeners.lock();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.by_id.insert(id, listener);
            id
        };

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Unsubscribe::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.lock().by_id.remove(&id);
            }
        })
    }
}
