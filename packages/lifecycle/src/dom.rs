//! A minimal shared document model.
//!
//! The host and every remote it mounts share one [`Document`]. It holds the
//! mount elements, the head style nodes injected by remotes, and the
//! document-level attributes used for cross-remote coordination.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Document attribute naming the remote that currently owns the page.
pub const SERVICE_ATTRIBUTE: &str = "data-service";

/// Style node attribute naming the remote that injected the node.
pub const STYLE_OWNER_ATTRIBUTE: &str = "data-mf-app";

/// Identifier of an [`Element`], unique within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ElementNode {
    id: ElementId,
    tag: String,
    content: Mutex<String>,
    attached: AtomicBool,
}

/// A mount point. Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct Element {
    node: Arc<ElementNode>,
}

impl Element {
    pub fn id(&self) -> ElementId {
        self.node.id
    }

    pub fn tag(&self) -> &str {
        &self.node.tag
    }

    pub fn content(&self) -> String {
        self.node.content.lock().clone()
    }

    pub fn set_content(&self, content: impl Into<String>) {
        *self.node.content.lock() = content.into();
    }

    pub fn clear(&self) {
        self.node.content.lock().clear();
    }

    /// Whether the element is still part of its document.
    pub fn is_attached(&self) -> bool {
        self.node.attached.load(Ordering::SeqCst)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.id.hash(state);
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.node.id)
            .field("tag", &self.node.tag)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// A style node in the document head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleNode {
    pub content: String,
    attributes: BTreeMap<String, String>,
}

impl StyleNode {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }
}

type HeadCallback = Arc<dyn Fn(&mut StyleNode) + Send + Sync>;

struct DocumentInner {
    next_element: AtomicU64,
    attributes: Mutex<BTreeMap<String, String>>,
    head: Mutex<Vec<StyleNode>>,
    observers: Mutex<BTreeMap<u64, HeadCallback>>,
    next_observer: AtomicU64,
}

/// The shared page. Cloning yields another handle to the same document.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DocumentInner {
                next_element: AtomicU64::new(1),
                attributes: Mutex::new(BTreeMap::new()),
                head: Mutex::new(Vec::new()),
                observers: Mutex::new(BTreeMap::new()),
                next_observer: AtomicU64::new(0),
            }),
        }
    }

    /// Create an attached element.
    pub fn create_element(&self, tag: impl Into<String>) -> Element {
        let id = ElementId(self.inner.next_element.fetch_add(1, Ordering::SeqCst));
        Element {
            node: Arc::new(ElementNode {
                id,
                tag: tag.into(),
                content: Mutex::new(String::new()),
                attached: AtomicBool::new(true),
            }),
        }
    }

    /// Remove an element from the document.
    pub fn detach(&self, element: &Element) {
        element.node.attached.store(false, Ordering::SeqCst);
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.attributes.lock().get(name).cloned()
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner
            .attributes
            .lock()
            .insert(name.into(), value.into());
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.inner.attributes.lock().remove(name)
    }

    /// The remote currently owning the page's service identity.
    pub fn service_owner(&self) -> Option<String> {
        self.attribute(SERVICE_ATTRIBUTE)
    }

    /// Take the service identity for `owner`, returning the previous owner.
    ///
    /// Used when a remote becomes the visible one.
    pub fn claim_service(&self, owner: &str) -> Option<String> {
        self.inner
            .attributes
            .lock()
            .insert(SERVICE_ATTRIBUTE.to_string(), owner.to_string())
    }

    /// Clear the service identity only if `owner` holds it.
    pub fn release_service(&self, owner: &str) -> bool {
        let mut attributes = self.inner.attributes.lock();
        if attributes.get(SERVICE_ATTRIBUTE).map(String::as_str) == Some(owner) {
            attributes.remove(SERVICE_ATTRIBUTE);
            true
        } else {
            false
        }
    }

    /// Insert a style node into the head.
    ///
    /// Head observers see the node before it becomes visible to readers.
    pub fn append_style(&self, mut style: StyleNode) {
        let observers: Vec<HeadCallback> = self.inner.observers.lock().values().cloned().collect();
        for observer in observers {
            observer(&mut style);
        }
        self.inner.head.lock().push(style);
    }

    pub fn styles(&self) -> Vec<StyleNode> {
        self.inner.head.lock().clone()
    }

    /// Remove head style nodes matching `predicate`, returning how many.
    pub fn remove_styles(&self, predicate: impl Fn(&StyleNode) -> bool) -> usize {
        let mut head = self.inner.head.lock();
        let before = head.len();
        head.retain(|style| !predicate(style));
        before - head.len()
    }

    /// Watch style nodes added to the head.
    pub fn observe_head(
        &self,
        callback: impl Fn(&mut StyleNode) + Send + Sync + 'static,
    ) -> HeadObserver {
        let id = self.inner.next_observer.fetch_add(1, Ordering::SeqCst);
        self.inner.observers.lock().insert(id, Arc::new(callback));
        HeadObserver {
            document: Arc::downgrade(&self.inner),
            id,
            connected: AtomicBool::new(true),
        }
    }

    pub fn head_observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("attributes", &*self.inner.attributes.lock())
            .field("styles", &self.inner.head.lock().len())
            .finish()
    }
}

/// Registration returned by [`Document::observe_head`].
pub struct HeadObserver {
    document: Weak<DocumentInner>,
    id: u64,
    connected: AtomicBool,
}

impl HeadObserver {
    /// Stop observing. Safe to call more than once.
    pub fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(document) = self.document.upgrade() {
            document.observers.lock().remove(&self.id);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for HeadObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadObserver")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
