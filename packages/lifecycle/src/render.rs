//! Seams a remote's UI framework plugs into.

use std::fmt;
use std::sync::Arc;

use crate::contract::{NavigateCallback, Theme};
use crate::dom::Element;
use crate::error::BoxError;

/// Properties handed to the remote's root component on every render.
#[derive(Clone)]
pub struct AppProps {
    pub initial_path: String,
    pub theme: Theme,
    /// Reports the remote's own route changes to the host.
    ///
    /// Calls are dropped while the instance is inactive.
    pub on_navigate: NavigateCallback,
}

impl fmt::Debug for AppProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppProps")
            .field("initial_path", &self.initial_path)
            .field("theme", &self.theme)
            .finish()
    }
}

/// A framework rendering root attached to one element.
pub trait RenderRoot: Send {
    fn render(&mut self, props: &AppProps) -> Result<(), BoxError>;

    fn unmount(&mut self) -> Result<(), BoxError>;
}

/// Creates a rendering root for an element.
pub type RootFactory = Arc<dyn Fn(&Element) -> Result<Box<dyn RenderRoot>, BoxError> + Send + Sync>;

/// A remote's internal router.
pub trait RemoteRouter: Send + Sync {
    /// Navigate without remounting.
    fn navigate_to(&self, path: &str);

    /// Suspend or resume background work tied to visibility.
    fn set_app_active(&self, active: bool);

    /// Return to the initial route after unmount.
    fn reset(&self);
}
