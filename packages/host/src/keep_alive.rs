//! Mounted remotes retained while hidden.
//!
//! Each remote has at most one mounted instance in the shell. When more
//! than `capacity` are mounted, the least recently activated ones are
//! handed back for unmounting. The instance being shown is never evicted.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use portal_lifecycle::{AppLifecycle, Element};

/// A mounted remote held by the shell.
pub struct CachedRemote {
    key: String,
    element: Element,
    handle: Arc<dyn AppLifecycle>,
    last_activated: u64,
}

impl CachedRemote {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn handle(&self) -> &Arc<dyn AppLifecycle> {
        &self.handle
    }
}

impl fmt::Debug for CachedRemote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedRemote")
            .field("key", &self.key)
            .field("element", &self.element.id())
            .field("last_activated", &self.last_activated)
            .finish()
    }
}

#[derive(Debug)]
pub struct KeepAlive {
    capacity: usize,
    clock: u64,
    entries: HashMap<String, CachedRemote>,
}

impl KeepAlive {
    /// A capacity of zero is treated as one: the visible remote always stays.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            clock: 0,
            entries: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn handle(&self, key: &str) -> Option<Arc<dyn AppLifecycle>> {
        self.entries.get(key).map(|entry| entry.handle.clone())
    }

    /// Every mounted handle.
    pub fn handles(&self) -> Vec<Arc<dyn AppLifecycle>> {
        self.entries.values().map(|entry| entry.handle.clone()).collect()
    }

    /// Store a freshly mounted instance as the most recently activated.
    ///
    /// Returns the instance it replaces, which the caller must unmount.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        element: Element,
        handle: Arc<dyn AppLifecycle>,
    ) -> Option<CachedRemote> {
        let key = key.into();
        self.clock += 1;
        self.entries.insert(
            key.clone(),
            CachedRemote {
                key,
                element,
                handle,
                last_activated: self.clock,
            },
        )
    }

    /// Mark `key` as just activated.
    pub fn touch(&mut self, key: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                self.clock += 1;
                entry.last_activated = self.clock;
                true
            }
            None => false,
        }
    }

    /// Remove least recently activated entries until within capacity,
    /// never removing `visible`.
    pub fn evict(&mut self, visible: Option<&str>) -> Vec<CachedRemote> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .values()
                .filter(|entry| Some(entry.key.as_str()) != visible)
                .min_by_key(|entry| entry.last_activated)
                .map(|entry| entry.key.clone());
            match oldest.and_then(|key| self.entries.remove(&key)) {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        evicted
    }

    /// Remove every entry, oldest first.
    pub fn drain(&mut self) -> Vec<CachedRemote> {
        let mut all: Vec<_> = self.entries.drain().map(|(_, entry)| entry).collect();
        all.sort_by_key(|entry| entry.last_activated);
        all
    }
}
