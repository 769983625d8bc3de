//! The `StoreAdapter` contract shared by the host and every remote.

use std::fmt;
use std::sync::Arc;

/// Callback invoked with every new snapshot.
///
/// Snapshots are complete states, never deltas. A listener replaces its
/// local copy wholesale.
pub type Listener<T> = Arc<dyn Fn(&Arc<T>) + Send + Sync>;

/// A minimal unit of shared state.
///
/// Implementations must not invoke the listener from inside `subscribe`;
/// the initial value is read through `get_state`.
pub trait StoreAdapter<T>: Send + Sync {
    /// Current snapshot.
    ///
    /// Repeated calls return the same `Arc` while the state is unchanged.
    fn get_state(&self) -> Arc<T>;

    /// Register a listener for future snapshots.
    fn subscribe(&self, listener: Listener<T>) -> Unsubscribe;
}

/// Commands a remote sends to the host that owns the shared stores.
///
/// Remotes never write to a [`StoreAdapter`]. State changes they need go
/// through these actions and come back as ordinary snapshots.
pub trait PortalActions: Send + Sync {
    /// Flip between the light and dark themes.
    fn toggle_theme(&self);

    /// Publish the host's chosen theme again.
    fn initialize_theme(&self);

    /// Sign the current user out.
    fn logout(&self);

    /// Ask the host to start a login, returning to `return_to` afterwards.
    fn request_login(&self, return_to: Option<&str>);

    /// Bearer token for calls the remote makes on the user's behalf.
    fn access_token(&self) -> Option<String>;
}

/// Handle returned by [`StoreAdapter::subscribe`].
///
/// Dropping the handle does not unsubscribe; call [`Unsubscribe::unsubscribe`].
#[must_use = "dropping an Unsubscribe leaves the listener registered"]
pub struct Unsubscribe {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Unsubscribe {
    /// Wrap a cancellation closure.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Remove the listener.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Chain another cancellation to run after this one.
    pub fn and_then(self, next: Unsubscribe) -> Self {
        Self::new(move || {
            self.unsubscribe();
            next.unsubscribe();
        })
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn unsubscribe_runs_cancel_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let handle = Unsubscribe::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        handle.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_does_not_cancel() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let handle = Unsubscribe::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        drop(handle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn and_then_runs_both() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (a, b) = (calls.clone(), calls.clone());
        let chained = Unsubscribe::new(move || {
            a.fetch_add(1, Ordering::SeqCst);
        })
        .and_then(Unsubscribe::new(move || {
            b.fetch_add(10, Ordering::SeqCst);
        }));
        chained.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn noop_is_harmless() {
        Unsubscribe::noop().unsubscribe();
    }
}
