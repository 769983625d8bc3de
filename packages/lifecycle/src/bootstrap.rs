//! The per-remote instance lifecycle manager.
//!
//! Each remote builds one [`AppBootstrap`] in its bootstrap module and
//! exposes [`AppBootstrap::mount_fn`] to the host. The bootstrap owns every
//! instance the remote has mounted, keyed by element; the host only ever
//! holds the [`LifecycleHandle`] returned from `mount`.
//!
//! Per element the state machine is:
//!
//! ```text
//! Unmounted ──mount──▶ Mounting ──render ok──▶ Active ◀──activate── Inactive
//!     ▲                    │                     │ ──deactivate──▶     │
//!     └──── render error ──┘                     └───── unmount ───────┴──▶ Unmounted
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, info_span, warn};

use crate::contract::{AppLifecycle, MountFn, MountOptions, NavigateCallback, Theme};
use crate::dom::{Document, Element, ElementId, HeadObserver, STYLE_OWNER_ATTRIBUTE};
use crate::error::{BoxError, MountError, Result, TeardownError};
use crate::render::{AppProps, RemoteRouter, RenderRoot, RootFactory};

/// Lifecycle state of one element as seen by a bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Unmounted,
    Mounting,
    Active,
    /// Hidden by keep-alive caching. Fully initialized.
    Inactive,
}

/// Identity of a remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppBootstrapConfig {
    /// Name used in logs.
    pub name: String,
    /// Value this remote writes to the document's service attribute and to
    /// the owner attribute of the styles it injects.
    pub data_service: String,
}

impl AppBootstrapConfig {
    pub fn new(name: impl Into<String>, data_service: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_service: data_service.into(),
        }
    }
}

type TeardownHook = Arc<dyn Fn() -> std::result::Result<(), BoxError> + Send + Sync>;

struct AppInstance {
    generation: u64,
    root: Arc<Mutex<Box<dyn RenderRoot>>>,
    state: MountState,
    active: Arc<AtomicBool>,
    theme: Theme,
    initial_path: String,
    on_navigate: NavigateCallback,
    style_observer: HeadObserver,
}

impl AppInstance {
    fn props(&self) -> AppProps {
        AppProps {
            initial_path: self.initial_path.clone(),
            theme: self.theme,
            on_navigate: self.on_navigate.clone(),
        }
    }
}

struct Inner {
    config: AppBootstrapConfig,
    document: Document,
    create_root: RootFactory,
    router: Option<Arc<dyn RemoteRouter>>,
    teardown: Vec<(String, TeardownHook)>,
    next_generation: AtomicU64,
    instances: Mutex<HashMap<ElementId, AppInstance>>,
}

impl Inner {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn data_service(&self) -> &str {
        &self.config.data_service
    }

    /// Remove the instance at `element` if it belongs to `generation`.
    fn take_instance(&self, element: &Element, generation: u64) -> Option<AppInstance> {
        let mut instances = self.instances.lock();
        match instances.get(&element.id()) {
            Some(instance) if instance.generation == generation => instances.remove(&element.id()),
            _ => None,
        }
    }

    fn with_instance<R>(
        &self,
        element: &Element,
        generation: u64,
        f: impl FnOnce(&mut AppInstance) -> R,
    ) -> Option<R> {
        let mut instances = self.instances.lock();
        instances
            .get_mut(&element.id())
            .filter(|instance| instance.generation == generation)
            .map(f)
    }

    /// Disconnect observers and unmount the rendering root. Never fails.
    fn release_instance(&self, instance: AppInstance) {
        instance.style_observer.disconnect();
        let unmounted = instance.root.lock().unmount();
        if let Err(source) = unmounted {
            let error = TeardownError::RenderRoot(source);
            warn!(remote = %self.name(), %error, "cleanup warning");
        }
    }

    fn observe_styles(&self) -> HeadObserver {
        let owner = self.config.data_service.clone();
        self.document.observe_head(move |style| {
            if !style.has_attribute(STYLE_OWNER_ATTRIBUTE) {
                style.set_attribute(STYLE_OWNER_ATTRIBUTE, owner.clone());
            }
        })
    }

    fn rerender(&self, element: &Element, generation: u64) {
        let Some((root, props)) = self.with_instance(element, generation, |instance| {
            (instance.root.clone(), instance.props())
        }) else {
            return;
        };
        let rendered = root.lock().render(&props);
        if let Err(source) = rendered {
            error!(remote = %self.name(), element = %element.id(), %source, "re-render failed");
        }
    }

    fn run_teardown_hooks(&self) {
        for (name, hook) in &self.teardown {
            if let Err(source) = hook() {
                let error = TeardownError::Hook {
                    name: name.clone(),
                    source,
                };
                warn!(remote = %self.name(), %error, "teardown step failed");
            }
        }
    }
}

fn forward_while_active(
    remote: String,
    active: Arc<AtomicBool>,
    host: Option<NavigateCallback>,
) -> NavigateCallback {
    Arc::new(move |path: &str| {
        if !active.load(Ordering::SeqCst) {
            debug!(%remote, path, "dropping route change from inactive instance");
            return;
        }
        debug!(%remote, path, "route changed");
        if let Some(host) = &host {
            host(path);
        }
    })
}

/// Builder for [`AppBootstrap`].
pub struct AppBootstrapBuilder {
    config: AppBootstrapConfig,
    document: Document,
    create_root: RootFactory,
    router: Option<Arc<dyn RemoteRouter>>,
    teardown: Vec<(String, TeardownHook)>,
}

impl AppBootstrapBuilder {
    /// The remote's internal router.
    pub fn router(mut self, router: Arc<dyn RemoteRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Register a cleanup step run when the remote's last instance unmounts.
    ///
    /// This is where store mirrors are disposed.
    pub fn teardown<F, E>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn() -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let hook: TeardownHook = Arc::new(move || hook().map_err(Into::into));
        self.teardown.push((name.into(), hook));
        self
    }

    pub fn build(self) -> AppBootstrap {
        AppBootstrap {
            inner: Arc::new(Inner {
                config: self.config,
                document: self.document,
                create_root: self.create_root,
                router: self.router,
                teardown: self.teardown,
                next_generation: AtomicU64::new(0),
                instances: Mutex::new(HashMap::new()),
            }),
        }
    }
}

/// A remote's bootstrap: mounts instances and tracks them per element.
#[derive(Clone)]
pub struct AppBootstrap {
    inner: Arc<Inner>,
}

impl AppBootstrap {
    pub fn builder<F>(
        config: AppBootstrapConfig,
        document: Document,
        create_root: F,
    ) -> AppBootstrapBuilder
    where
        F: Fn(&Element) -> std::result::Result<Box<dyn RenderRoot>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        AppBootstrapBuilder {
            config,
            document,
            create_root: Arc::new(create_root),
            router: None,
            teardown: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn data_service(&self) -> &str {
        self.inner.data_service()
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// Mount a fresh instance at `element`.
    ///
    /// An instance already mounted at `element` is torn down first, so an
    /// element never carries two live instances. Errors from the initial
    /// render are returned after the partial instance is rolled back.
    pub fn mount(&self, element: &Element, options: MountOptions) -> Result<LifecycleHandle> {
        let inner = &self.inner;
        let span = info_span!("mount", remote = %inner.name(), element = %element.id());
        let _entered = span.enter();

        if !element.is_attached() {
            error!("mount element is not attached");
            return Err(MountError::MissingElement {
                remote: inner.name().to_string(),
            });
        }

        let existing = inner.instances.lock().remove(&element.id());
        if let Some(existing) = existing {
            warn!("cleaning up existing instance");
            inner.release_instance(existing);
        }

        let MountOptions {
            initial_path,
            on_navigate,
            theme,
        } = options;
        let initial_path = initial_path.unwrap_or_else(|| "/".to_string());
        let theme = theme.unwrap_or_default();
        info!(%initial_path, %theme, "mounting app in embedded mode");

        let root = (inner.create_root)(element).map_err(|source| {
            error!(%source, "failed to create render root");
            MountError::RootCreation {
                remote: inner.name().to_string(),
                source,
            }
        })?;

        let active = Arc::new(AtomicBool::new(true));
        let generation = inner.next_generation.fetch_add(1, Ordering::SeqCst);
        let instance = AppInstance {
            generation,
            root: Arc::new(Mutex::new(root)),
            state: MountState::Mounting,
            active: active.clone(),
            theme,
            initial_path,
            on_navigate: forward_while_active(inner.name().to_string(), active, on_navigate),
            style_observer: inner.observe_styles(),
        };
        let root = instance.root.clone();
        let props = instance.props();
        inner.instances.lock().insert(element.id(), instance);

        if let Some(previous) = inner.document.claim_service(inner.data_service()) {
            if previous != inner.data_service() {
                debug!(%previous, "took over service identity");
            }
        }

        let rendered = root.lock().render(&props);
        if let Err(source) = rendered {
            error!(%source, "mount failed");
            if let Some(instance) = inner.take_instance(element, generation) {
                inner.release_instance(instance);
            }
            inner.document.release_service(inner.data_service());
            return Err(MountError::Render {
                remote: inner.name().to_string(),
                source,
            });
        }

        inner.with_instance(element, generation, |instance| {
            instance.state = MountState::Active;
        });
        info!("app mounted successfully");

        Ok(LifecycleHandle {
            inner: self.inner.clone(),
            element: element.clone(),
            generation,
        })
    }

    /// The mount function a remote exposes to the host.
    pub fn mount_fn(&self) -> MountFn {
        let bootstrap = self.clone();
        Arc::new(move |element: &Element, options: MountOptions| {
            bootstrap
                .mount(element, options)
                .map(|handle| Box::new(handle) as Box<dyn AppLifecycle>)
        })
    }

    pub fn state_of(&self, element: &Element) -> MountState {
        self.inner
            .instances
            .lock()
            .get(&element.id())
            .map(|instance| instance.state)
            .unwrap_or(MountState::Unmounted)
    }

    pub fn theme_of(&self, element: &Element) -> Option<Theme> {
        self.inner
            .instances
            .lock()
            .get(&element.id())
            .map(|instance| instance.theme)
    }

    pub fn mounted_count(&self) -> usize {
        self.inner.instances.lock().len()
    }
}

impl std::fmt::Debug for AppBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBootstrap")
            .field("config", &self.inner.config)
            .field("mounted", &self.mounted_count())
            .finish()
    }
}

/// The handle returned to the host for one mounted instance.
///
/// A handle only controls the instance it was created for. Once the
/// element is remounted, handles from earlier mounts become inert.
pub struct LifecycleHandle {
    inner: Arc<Inner>,
    element: Element,
    generation: u64,
}

impl LifecycleHandle {
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn state(&self) -> MountState {
        self.inner
            .with_instance(&self.element, self.generation, |instance| instance.state)
            .unwrap_or(MountState::Unmounted)
    }
}

impl AppLifecycle for LifecycleHandle {
    fn on_parent_navigate(&self, path: &str) {
        let remote = self.inner.name();
        match self.state() {
            MountState::Active => {
                info!(%remote, path, "received navigation from parent");
                match &self.inner.router {
                    Some(router) => router.navigate_to(path),
                    None => debug!(%remote, "no router, navigation ignored"),
                }
            }
            state => debug!(%remote, path, ?state, "skipping navigation"),
        }
    }

    fn on_activated(&self) {
        let activated = self.inner.with_instance(&self.element, self.generation, |instance| {
            instance.state = MountState::Active;
            instance.active.store(true, Ordering::SeqCst);
        });
        if activated.is_none() {
            debug!(remote = %self.inner.name(), "activate on unmounted instance ignored");
            return;
        }
        info!(remote = %self.inner.name(), "app activated (keep-alive)");
        self.inner.document.claim_service(self.inner.data_service());
        if let Some(router) = &self.inner.router {
            router.set_app_active(true);
        }
    }

    fn on_deactivated(&self) {
        let deactivated = self.inner.with_instance(&self.element, self.generation, |instance| {
            instance.state = MountState::Inactive;
            instance.active.store(false, Ordering::SeqCst);
        });
        if deactivated.is_none() {
            debug!(remote = %self.inner.name(), "deactivate on unmounted instance ignored");
            return;
        }
        info!(remote = %self.inner.name(), "app deactivated (keep-alive)");
        if let Some(router) = &self.inner.router {
            router.set_app_active(false);
        }
    }

    fn on_theme_change(&self, theme: Theme) {
        let changed = self.inner.with_instance(&self.element, self.generation, |instance| {
            let changed = instance.theme != theme;
            instance.theme = theme;
            changed
        });
        match changed {
            Some(true) => {
                info!(remote = %self.inner.name(), %theme, "theme changed");
                self.inner.rerender(&self.element, self.generation);
            }
            Some(false) => debug!(remote = %self.inner.name(), %theme, "theme unchanged"),
            None => debug!(
                remote = %self.inner.name(),
                "theme change on unmounted instance ignored"
            ),
        }
    }

    fn unmount(&self) {
        let inner = &self.inner;
        let span = info_span!("unmount", remote = %inner.name(), element = %self.element.id());
        let _entered = span.enter();

        let Some(instance) = inner.take_instance(&self.element, self.generation) else {
            debug!("already unmounted");
            return;
        };
        info!("unmounting app");
        inner.release_instance(instance);

        self.element.clear();
        if inner.document.release_service(inner.data_service()) {
            debug!("released service identity");
        }

        // Styles, the router and store mirrors are shared by every
        // instance of this remote.
        if inner.instances.lock().is_empty() {
            let owner = inner.data_service();
            let removed = inner
                .document
                .remove_styles(|style| style.attribute(STYLE_OWNER_ATTRIBUTE) == Some(owner));
            inner.run_teardown_hooks();
            if let Some(router) = &inner.router {
                router.reset();
            }
            info!(removed_styles = removed, "cleanup completed");
        } else {
            info!("cleanup completed, other instances still mounted");
        }
    }
}

impl std::fmt::Debug for LifecycleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleHandle")
            .field("remote", &self.inner.config.name)
            .field("element", &self.element.id())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StyleNode;
    use std::sync::atomic::AtomicUsize;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Journal {
        events: Mutex<Vec<String>>,
    }

    impl Journal {
        fn push(&self, event: impl Into<String>) {
            self.events.lock().push(event.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    struct TestRoot {
        id: usize,
        journal: Arc<Journal>,
        fail_render: bool,
        fail_unmount: bool,
    }

    impl RenderRoot for TestRoot {
        fn render(&mut self, props: &AppProps) -> std::result::Result<(), BoxError> {
            if self.fail_render {
                return Err("render exploded".into());
            }
            self.journal.push(format!(
                "render#{} {} {}",
                self.id, props.initial_path, props.theme
            ));
            Ok(())
        }

        fn unmount(&mut self) -> std::result::Result<(), BoxError> {
            self.journal.push(format!("unmount#{}", self.id));
            if self.fail_unmount {
                return Err("framework teardown exploded".into());
            }
            Ok(())
        }
    }

    struct TestRouter {
        journal: Arc<Journal>,
    }

    impl RemoteRouter for TestRouter {
        fn navigate_to(&self, path: &str) {
            self.journal.push(format!("navigate {path}"));
        }

        fn set_app_active(&self, active: bool) {
            self.journal.push(format!("active {active}"));
        }

        fn reset(&self) {
            self.journal.push("reset");
        }
    }

    struct Fixture {
        document: Document,
        journal: Arc<Journal>,
        bootstrap: AppBootstrap,
    }

    fn fixture_with(fail_render: bool, fail_unmount: bool) -> Fixture {
        let document = Document::new();
        let journal = Arc::new(Journal::default());
        let roots = Arc::new(AtomicUsize::new(0));
        let root_journal = journal.clone();
        let bootstrap = AppBootstrap::builder(
            AppBootstrapConfig::new("Blog", "blog"),
            document.clone(),
            move |_el: &Element| {
                Ok(Box::new(TestRoot {
                    id: roots.fetch_add(1, Ordering::SeqCst),
                    journal: root_journal.clone(),
                    fail_render,
                    fail_unmount,
                }) as Box<dyn RenderRoot>)
            },
        )
        .router(Arc::new(TestRouter {
            journal: journal.clone(),
        }))
        .build();
        Fixture {
            document,
            journal,
            bootstrap,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(false, false)
    }

    #[test]
    fn mount_renders_and_claims_identity() {
        let fx = fixture();
        let el = fx.document.create_element("div");

        let handle = fx
            .bootstrap
            .mount(&el, MountOptions::new().initial_path("/posts/7").theme(Theme::Dark))
            .unwrap();

        assert_eq!(handle.state(), MountState::Active);
        assert_eq!(fx.journal.take(), vec!["render#0 /posts/7 dark"]);
        assert_eq!(fx.document.service_owner().as_deref(), Some("blog"));
        assert_eq!(fx.document.head_observer_count(), 1);
    }

    #[test]
    fn mount_defaults_to_root_path_and_light_theme() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        fx.bootstrap.mount(&el, MountOptions::new()).unwrap();
        assert_eq!(fx.journal.take(), vec!["render#0 / light"]);
    }

    #[test]
    fn remount_tears_down_previous_instance() {
        let fx = fixture();
        let el = fx.document.create_element("div");

        let first = fx.bootstrap.mount(&el, MountOptions::new()).unwrap();
        let second = fx.bootstrap.mount(&el, MountOptions::new()).unwrap();

        assert_eq!(
            fx.journal.take(),
            vec!["render#0 / light", "unmount#0", "render#1 / light"]
        );
        assert_eq!(fx.bootstrap.mounted_count(), 1);
        assert_eq!(fx.document.head_observer_count(), 1);
        assert_eq!(first.state(), MountState::Unmounted);
        assert_eq!(second.state(), MountState::Active);
    }

    #[test]
    fn stale_handle_cannot_unmount_newer_instance() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        let first = fx.bootstrap.mount(&el, MountOptions::new()).unwrap();
        let _second = fx.bootstrap.mount(&el, MountOptions::new()).unwrap();

        first.unmount();
        assert_eq!(fx.bootstrap.state_of(&el), MountState::Active);
    }

    #[test]
    fn navigation_is_ignored_while_inactive() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        let handle = fx.bootstrap.mount(&el, MountOptions::new()).unwrap();
        fx.journal.take();

        handle.on_deactivated();
        handle.on_parent_navigate("/posts/1");
        handle.on_activated();
        handle.on_parent_navigate("/posts/2");

        assert_eq!(
            fx.journal.take(),
            vec!["active false", "active true", "navigate /posts/2"]
        );
    }

    #[test]
    fn remote_route_changes_reach_host_only_while_active() {
        let document = Document::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let props_slot: Arc<Mutex<Option<AppProps>>> = Arc::new(Mutex::new(None));

        struct CapturingRoot(Arc<Mutex<Option<AppProps>>>);
        impl RenderRoot for CapturingRoot {
            fn render(&mut self, props: &AppProps) -> std::result::Result<(), BoxError> {
                *self.0.lock() = Some(props.clone());
                Ok(())
            }
            fn unmount(&mut self) -> std::result::Result<(), BoxError> {
                Ok(())
            }
        }

        let slot = props_slot.clone();
        let bootstrap = AppBootstrap::builder(
            AppBootstrapConfig::new("Shopping", "shopping"),
            document.clone(),
            move |_el: &Element| Ok(Box::new(CapturingRoot(slot.clone())) as Box<dyn RenderRoot>),
        )
        .build();

        let el = document.create_element("div");
        let sink = seen.clone();
        let handle = bootstrap
            .mount(
                &el,
                MountOptions::new().on_navigate(move |path| sink.lock().push(path.to_string())),
            )
            .unwrap();

        let props = props_slot.lock().clone().unwrap();
        (props.on_navigate)("/cart");
        handle.on_deactivated();
        (props.on_navigate)("/orders");
        handle.on_activated();
        (props.on_navigate)("/checkout");

        assert_eq!(seen.lock().as_slice(), &["/cart", "/checkout"]);
    }

    #[test]
    fn deactivate_and_activate_preserve_instance_state() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        let handle = fx
            .bootstrap
            .mount(&el, MountOptions::new().theme(Theme::Dark))
            .unwrap();
        fx.document.claim_service("shopping");

        handle.on_deactivated();
        assert_eq!(handle.state(), MountState::Inactive);
        handle.on_activated();

        assert_eq!(handle.state(), MountState::Active);
        assert_eq!(fx.bootstrap.theme_of(&el), Some(Theme::Dark));
        assert_eq!(fx.document.service_owner().as_deref(), Some("blog"));
        // No re-render and no teardown happened.
        assert_eq!(
            fx.journal.take(),
            vec!["render#0 / dark", "active false", "active true"]
        );
    }

    #[test]
    fn theme_change_rerenders_once() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        let handle = fx.bootstrap.mount(&el, MountOptions::new()).unwrap();
        fx.journal.take();

        handle.on_theme_change(Theme::Dark);
        handle.on_theme_change(Theme::Dark);

        assert_eq!(fx.journal.take(), vec!["render#0 / dark"]);
        assert_eq!(fx.bootstrap.theme_of(&el), Some(Theme::Dark));
    }

    #[test]
    fn unmount_leaves_clean_slate() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        let handle = fx.bootstrap.mount(&el, MountOptions::new()).unwrap();
        el.set_content("<article>rendered</article>");
        fx.document.append_style(StyleNode::new(".post {}"));
        fx.document.append_style(
            StyleNode::new(".portal {}").with_attribute(STYLE_OWNER_ATTRIBUTE, "portal"),
        );

        handle.unmount();

        assert_eq!(handle.state(), MountState::Unmounted);
        assert_eq!(el.content(), "");
        assert_eq!(fx.document.service_owner(), None);
        assert_eq!(fx.document.head_observer_count(), 0);
        assert_eq!(fx.document.styles().len(), 1);
        assert_eq!(fx.bootstrap.mounted_count(), 0);
        assert!(fx.journal.take().ends_with(&["unmount#0".to_string(), "reset".to_string()]));
    }

    #[test]
    fn unmount_keeps_identity_owned_by_another_remote() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        let handle = fx.bootstrap.mount(&el, MountOptions::new()).unwrap();
        fx.document.claim_service("shopping");

        handle.unmount();
        assert_eq!(fx.document.service_owner().as_deref(), Some("shopping"));
    }

    #[test]
    fn unmount_twice_is_harmless() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        let handle = fx.bootstrap.mount(&el, MountOptions::new()).unwrap();
        handle.unmount();
        handle.unmount();
        assert_eq!(fx.bootstrap.mounted_count(), 0);
    }

    #[test]
    fn mount_after_unmount_round_trips() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        fx.bootstrap.mount(&el, MountOptions::new()).unwrap().unmount();

        let handle = fx
            .bootstrap
            .mount(&el, MountOptions::new().initial_path("/write"))
            .unwrap();
        handle.on_parent_navigate("/posts/3");

        assert_eq!(handle.state(), MountState::Active);
        assert!(fx.journal.take().ends_with(&[
            "render#1 /write light".to_string(),
            "navigate /posts/3".to_string()
        ]));
    }

    #[test]
    fn failed_render_rolls_back() {
        let fx = fixture_with(true, false);
        let el = fx.document.create_element("div");

        let err = fx.bootstrap.mount(&el, MountOptions::new()).unwrap_err();

        assert!(matches!(err, MountError::Render { .. }));
        assert_eq!(fx.bootstrap.state_of(&el), MountState::Unmounted);
        assert_eq!(fx.document.head_observer_count(), 0);
        assert_eq!(fx.document.service_owner(), None);
    }

    #[test]
    fn detached_element_is_rejected() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        fx.document.detach(&el);
        let err = fx.bootstrap.mount(&el, MountOptions::new()).unwrap_err();
        assert!(matches!(err, MountError::MissingElement { .. }));
    }

    #[test]
    #[traced_test]
    fn teardown_errors_are_logged_not_propagated() {
        let fx = fixture_with(false, true);
        let el = fx.document.create_element("div");
        let handle = fx.bootstrap.mount(&el, MountOptions::new()).unwrap();
        el.set_content("stale");

        handle.unmount();

        assert!(logs_contain("framework teardown exploded"));
        assert_eq!(el.content(), "");
        assert_eq!(fx.bootstrap.mounted_count(), 0);
        assert_eq!(fx.document.service_owner(), None);
    }

    #[test]
    #[traced_test]
    fn failing_teardown_hook_does_not_block_later_hooks() {
        let document = Document::new();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        let bootstrap = AppBootstrap::builder(
            AppBootstrapConfig::new("Prism", "prism"),
            document.clone(),
            |_el: &Element| {
                Ok(Box::new(TestRoot {
                    id: 0,
                    journal: Arc::new(Journal::default()),
                    fail_render: false,
                    fail_unmount: false,
                }) as Box<dyn RenderRoot>)
            },
        )
        .teardown("broken", || Err::<(), BoxError>("hook exploded".into()))
        .teardown("counter", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), BoxError>(())
        })
        .build();

        let el = document.create_element("div");
        bootstrap.mount(&el, MountOptions::new()).unwrap().unmount();

        assert!(logs_contain("hook exploded"));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_resources_survive_until_last_instance_unmounts() {
        let fx = fixture();
        let a = fx.document.create_element("div");
        let b = fx.document.create_element("div");
        let first = fx.bootstrap.mount(&a, MountOptions::new()).unwrap();
        let second = fx.bootstrap.mount(&b, MountOptions::new()).unwrap();
        fx.document.append_style(StyleNode::new(".post {}"));

        first.unmount();
        assert_eq!(fx.document.styles().len(), 1);
        assert_eq!(second.state(), MountState::Active);

        second.unmount();
        assert!(fx.document.styles().is_empty());
    }

    #[test]
    fn mount_fn_returns_boxed_lifecycle() {
        let fx = fixture();
        let el = fx.document.create_element("div");
        let mount = fx.bootstrap.mount_fn();

        let lifecycle = mount(&el, MountOptions::new()).unwrap();
        lifecycle.on_deactivated();
        assert_eq!(fx.bootstrap.state_of(&el), MountState::Inactive);
        lifecycle.unmount();
        assert_eq!(fx.bootstrap.state_of(&el), MountState::Unmounted);
    }
}
