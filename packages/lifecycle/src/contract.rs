//! The mount contract between the host and every remote.
//!
//! Whatever framework a remote uses internally, its exposed mount function
//! has the shape of [`MountFn`] and returns an [`AppLifecycle`] handle.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dom::Element;
use crate::error::MountError;

/// Visual theme passed to remotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark(is_dark: bool) -> Self {
        if is_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Called by a remote when its own route changes.
pub type NavigateCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Options passed to a mount function.
#[derive(Clone, Default)]
pub struct MountOptions {
    /// Route to render first. Defaults to `/`.
    pub initial_path: Option<String>,
    pub on_navigate: Option<NavigateCallback>,
    /// Defaults to [`Theme::Light`].
    pub theme: Option<Theme>,
}

impl MountOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_path(mut self, path: impl Into<String>) -> Self {
        self.initial_path = Some(path.into());
        self
    }

    pub fn on_navigate(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_navigate = Some(Arc::new(callback));
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }
}

impl fmt::Debug for MountOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountOptions")
            .field("initial_path", &self.initial_path)
            .field("on_navigate", &self.on_navigate.is_some())
            .field("theme", &self.theme)
            .finish()
    }
}

/// Lifecycle handle a remote returns from its mount function.
///
/// None of these methods fail: navigation while inactive is a no-op and
/// teardown failures are logged by the remote.
pub trait AppLifecycle: Send + Sync {
    /// The host's route changed.
    fn on_parent_navigate(&self, path: &str);

    /// A keep-alive cached instance became visible again.
    fn on_activated(&self);

    /// The instance was hidden but kept alive.
    fn on_deactivated(&self);

    fn on_theme_change(&self, theme: Theme);

    /// Tear the instance down. Safe to call more than once.
    fn unmount(&self);
}

/// A remote's exposed mount function.
pub type MountFn =
    Arc<dyn Fn(&Element, MountOptions) -> Result<Box<dyn AppLifecycle>, MountError> + Send + Sync>;
