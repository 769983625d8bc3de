//! The host shell.
//!
//! Owns the route, decides which remote is visible, and drives remotes
//! through their lifecycle handles. Locks are never held while calling into
//! a remote or awaiting the loader.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use portal_lifecycle::{AppLifecycle, Document, MountOptions, Theme};
use portal_remote_loader::{LoadResult, RemoteDescriptor, RemoteLoader, RemoteRegistry};
use portal_store_bridge::{AuthState, HostStore, PortalActions, PortalStores, ThemeState};
use tracing::{debug, error, info, info_span};

use crate::config::HostConfig;
use crate::error::{HostError, Result};
use crate::keep_alive::{CachedRemote, KeepAlive};
use crate::status::RemoteStatus;

#[derive(Debug, Clone)]
struct Route {
    path: String,
    key: String,
}

struct ShellState {
    /// Bumped on every navigation; loads started under an older value are
    /// discarded when they finish.
    generation: u64,
    route: Option<Route>,
    status: RemoteStatus,
    theme: Theme,
    instances: KeepAlive,
    access_token: Option<String>,
    /// Where to return after a login a remote asked for.
    login_request: Option<String>,
}

struct Inner {
    config: HostConfig,
    registry: RemoteRegistry,
    loader: Arc<RemoteLoader>,
    document: Document,
    auth: HostStore<AuthState>,
    theme: HostStore<ThemeState>,
    state: Mutex<ShellState>,
}

enum Step {
    Forward(Arc<dyn AppLifecycle>),
    Activate(Arc<dyn AppLifecycle>),
    Load { generation: u64 },
}

/// Routes between remotes and keeps hidden ones alive.
#[derive(Clone)]
pub struct HostShell {
    inner: Arc<Inner>,
}

impl HostShell {
    pub fn new(
        config: HostConfig,
        registry: RemoteRegistry,
        loader: Arc<RemoteLoader>,
        document: Document,
    ) -> Self {
        let theme = config.default_theme;
        let state = ShellState {
            generation: 0,
            route: None,
            status: RemoteStatus::Idle,
            theme,
            instances: KeepAlive::new(config.keep_alive_max),
            access_token: None,
            login_request: None,
        };
        Self {
            inner: Arc::new(Inner {
                config,
                registry,
                loader,
                document,
                auth: HostStore::new(AuthState::default()),
                theme: HostStore::new(ThemeState {
                    is_dark: theme == Theme::Dark,
                }),
                state: Mutex::new(state),
            }),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &RemoteRegistry {
        &self.inner.registry
    }

    pub fn loader(&self) -> &Arc<RemoteLoader> {
        &self.inner.loader
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    pub fn auth_store(&self) -> &HostStore<AuthState> {
        &self.inner.auth
    }

    pub fn theme_store(&self) -> &HostStore<ThemeState> {
        &self.inner.theme
    }

    /// Adapters handed to remotes.
    pub fn portal_stores(&self) -> PortalStores {
        PortalStores {
            auth: Arc::new(self.inner.auth.clone()),
            theme: Arc::new(self.inner.theme.clone()),
            actions: Arc::new(ShellActions {
                inner: Arc::downgrade(&self.inner),
            }),
        }
    }

    pub fn status(&self) -> RemoteStatus {
        self.inner.state.lock().status.clone()
    }

    pub fn theme(&self) -> Theme {
        self.inner.state.lock().theme
    }

    /// The full host route, including navigation reported by the remote.
    pub fn current_path(&self) -> Option<String> {
        self.inner.state.lock().route.as_ref().map(|r| r.path.clone())
    }

    pub fn is_mounted(&self, key: &str) -> bool {
        self.inner.state.lock().instances.contains(key)
    }

    pub fn mounted_count(&self) -> usize {
        self.inner.state.lock().instances.len()
    }

    /// Show the remote owning `path`.
    ///
    /// Navigation inside the visible remote is forwarded to it. Switching
    /// remotes hides the previous one and either reactivates the next from
    /// the keep-alive cache or loads and mounts it. Load and mount failures
    /// are reported through the returned status.
    pub async fn navigate(&self, path: &str) -> Result<RemoteStatus> {
        let Some(descriptor) = self.inner.registry.resolve(path).cloned() else {
            self.leave(path);
            return Err(HostError::NoRemoteForRoute {
                path: path.to_string(),
            });
        };
        let sub_path = descriptor
            .relative_path(path)
            .unwrap_or_else(|| "/".to_string());
        let key = descriptor.key.clone();

        let (step, previous) = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            let previous_key = state.route.take().map(|route| route.key);
            state.route = Some(Route {
                path: path.to_string(),
                key: key.clone(),
            });

            let same = previous_key.as_deref() == Some(key.as_str());
            let previous = previous_key
                .filter(|_| !same)
                .and_then(|k| state.instances.handle(&k));

            let step = match state.instances.handle(&key) {
                Some(handle) if same => Step::Forward(handle),
                Some(handle) => {
                    state.instances.touch(&key);
                    Step::Activate(handle)
                }
                None => Step::Load {
                    generation: state.generation,
                },
            };
            state.status = match step {
                Step::Load { .. } => RemoteStatus::Loading { key: key.clone() },
                _ => RemoteStatus::Active { key: key.clone() },
            };
            (step, previous)
        };

        if let Some(previous) = previous {
            previous.on_deactivated();
        }

        match step {
            Step::Forward(handle) => {
                debug!(remote = %key, path = %sub_path, "forwarding navigation");
                handle.on_parent_navigate(&sub_path);
            }
            Step::Activate(handle) => {
                info!(remote = %key, "reactivating kept-alive remote");
                handle.on_activated();
                handle.on_parent_navigate(&sub_path);
            }
            Step::Load { generation } => {
                let result = self.inner.loader.load_remote(&descriptor).await;
                self.finish_load(result, sub_path, generation);
            }
        }
        Ok(self.status())
    }

    fn finish_load(&self, result: LoadResult, sub_path: String, generation: u64) {
        let descriptor = result.descriptor.clone();
        let key = descriptor.key.clone();
        let theme = {
            let state = self.inner.state.lock();
            if state.generation != generation {
                debug!(remote = %key, "discarding load for a stale navigation");
                return;
            }
            // The theme may have changed while the load was in flight.
            state.theme
        };

        let mount = match result.into_result() {
            Ok(mount) => mount,
            Err(error) => {
                self.set_status_if_current(
                    generation,
                    RemoteStatus::Unavailable {
                        key,
                        reason: error.to_string(),
                    },
                );
                return;
            }
        };

        let _span = info_span!("host_mount", remote = %key).entered();
        let element = self.inner.document.create_element("div");
        let options = MountOptions::new()
            .initial_path(sub_path)
            .theme(theme)
            .on_navigate(self.route_reporter(&descriptor));

        let handle: Arc<dyn AppLifecycle> = match mount(&element, options) {
            Ok(handle) => Arc::from(handle),
            Err(error) => {
                error!(remote = %key, %error, "remote failed to mount");
                self.inner.document.detach(&element);
                self.set_status_if_current(
                    generation,
                    RemoteStatus::Unavailable {
                        key,
                        reason: error.to_string(),
                    },
                );
                return;
            }
        };

        let (hide, released, current_theme) = {
            let mut state = self.inner.state.lock();
            let visible = state.route.as_ref().map(|r| r.key.clone());
            if state.generation == generation {
                state.status = RemoteStatus::Active { key: key.clone() };
            }
            let replaced = state.instances.insert(key.clone(), element, handle.clone());
            let mut released: Vec<CachedRemote> = replaced.into_iter().collect();
            released.extend(state.instances.evict(visible.as_deref()));
            (
                visible.as_deref() != Some(key.as_str()),
                released,
                state.theme,
            )
        };

        info!(remote = %key, "remote mounted");
        if current_theme != theme {
            debug!(remote = %key, %current_theme, "theme changed during mount");
            handle.on_theme_change(current_theme);
        }
        if hide {
            handle.on_deactivated();
        }
        for entry in released {
            self.release(entry);
        }
    }

    fn set_status_if_current(&self, generation: u64, status: RemoteStatus) {
        let mut state = self.inner.state.lock();
        if state.generation == generation {
            state.status = status;
        }
    }

    /// Callback through which a remote reports its own route changes.
    fn route_reporter(
        &self,
        descriptor: &RemoteDescriptor,
    ) -> impl Fn(&str) + Send + Sync + 'static {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let key = descriptor.key.clone();
        let base = descriptor.base_path.trim_end_matches('/').to_string();
        move |sub_path: &str| {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let mut state = inner.state.lock();
            if let Some(route) = state.route.as_mut().filter(|r| r.key == key) {
                route.path = join_path(&base, sub_path);
                debug!(remote = %key, path = %route.path, "remote changed route");
            }
        }
    }

    /// Hide the visible remote for a route no remote owns.
    fn leave(&self, path: &str) {
        let previous = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.status = RemoteStatus::Idle;
            state
                .route
                .take()
                .and_then(|route| state.instances.handle(&route.key))
        };
        debug!(path, "route has no remote");
        if let Some(previous) = previous {
            previous.on_deactivated();
        }
    }

    /// Switch theme and tell every mounted remote.
    pub fn set_theme(&self, theme: Theme) {
        let handles = {
            let mut state = self.inner.state.lock();
            state.theme = theme;
            state.instances.handles()
        };
        self.inner.theme.set_state(ThemeState {
            is_dark: theme == Theme::Dark,
        });
        info!(%theme, remotes = handles.len(), "theme changed");
        for handle in handles {
            handle.on_theme_change(theme);
        }
    }

    pub fn toggle_theme(&self) {
        let next = match self.theme() {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.set_theme(next);
    }

    /// Replace the signed-in user and the token remotes call APIs with.
    pub fn sign_in(&self, auth: AuthState, access_token: Option<String>) {
        self.inner.state.lock().access_token = access_token;
        info!(user = %auth.display_name, "signed in");
        self.inner.auth.set_state(auth);
    }

    pub fn logout(&self) {
        let was_signed_in = {
            let mut state = self.inner.state.lock();
            state.login_request = None;
            state.access_token.take().is_some()
        };
        info!(was_signed_in, "signed out");
        self.inner.auth.set_state(AuthState::default());
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.state.lock().access_token.clone()
    }

    /// Record that a login should start, returning to `return_to` or the
    /// current route once it completes.
    pub fn request_login(&self, return_to: Option<&str>) {
        let mut state = self.inner.state.lock();
        let target = return_to
            .map(str::to_string)
            .or_else(|| state.route.as_ref().map(|r| r.path.clone()))
            .unwrap_or_else(|| "/".to_string());
        info!(return_to = %target, "login requested");
        state.login_request = Some(target);
    }

    /// The pending login request, cleared by reading it.
    pub fn take_login_request(&self) -> Option<String> {
        self.inner.state.lock().login_request.take()
    }

    /// Load the current route's remote again after dropping its cached
    /// mount function.
    ///
    /// A remote that is already mounted is not reloaded; the route is simply
    /// forwarded to it.
    pub async fn retry(&self) -> Result<RemoteStatus> {
        let route = self
            .inner
            .state
            .lock()
            .route
            .clone()
            .ok_or(HostError::NothingToRetry)?;
        info!(remote = %route.key, "retrying remote");
        self.inner.loader.clear_cache(Some(&route.key));
        self.navigate(&route.path).await
    }

    /// Unmount every remote. Loads still in flight are discarded.
    pub fn shutdown(&self) {
        let entries = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.route = None;
            state.status = RemoteStatus::Idle;
            state.instances.drain()
        };
        info!(remotes = entries.len(), "shutting down host shell");
        for entry in entries {
            self.release(entry);
        }
    }

    fn release(&self, entry: CachedRemote) {
        info!(remote = %entry.key(), "unmounting remote");
        entry.handle().unmount();
        self.inner.document.detach(entry.element());
    }
}

/// The host end of [`PortalActions`].
///
/// Holds the shell weakly so a remote keeping its stores does not keep the
/// shell alive.
struct ShellActions {
    inner: Weak<Inner>,
}

impl ShellActions {
    fn shell(&self) -> Option<HostShell> {
        self.inner.upgrade().map(|inner| HostShell { inner })
    }
}

impl PortalActions for ShellActions {
    fn toggle_theme(&self) {
        if let Some(shell) = self.shell() {
            shell.toggle_theme();
        }
    }

    fn initialize_theme(&self) {
        if let Some(shell) = self.shell() {
            shell.set_theme(shell.theme());
        }
    }

    fn logout(&self) {
        if let Some(shell) = self.shell() {
            shell.logout();
        }
    }

    fn request_login(&self, return_to: Option<&str>) {
        if let Some(shell) = self.shell() {
            shell.request_login(return_to);
        }
    }

    fn access_token(&self) -> Option<String> {
        self.shell().and_then(|shell| shell.access_token())
    }
}

impl fmt::Debug for HostShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("HostShell")
            .field("environment", &self.inner.registry.environment())
            .field("route", &state.route)
            .field("status", &state.status)
            .field("theme", &state.theme)
            .field("mounted", &state.instances.len())
            .finish()
    }
}

fn join_path(base: &str, sub_path: &str) -> String {
    match sub_path {
        "" | "/" if base.is_empty() => "/".to_string(),
        "" | "/" => base.to_string(),
        _ if sub_path.starts_with('/') || sub_path.starts_with('?') => format!("{base}{sub_path}"),
        _ => format!("{base}/{sub_path}"),
    }
}
