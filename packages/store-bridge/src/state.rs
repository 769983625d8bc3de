//! Shared state shapes.
//!
//! These are closed, plain-data contracts. They hold no functions and no
//! handles, so a host and a remote compiled separately agree on them
//! through serialization alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::adapter::{PortalActions, StoreAdapter};

/// A snapshot type that may cross the host/remote boundary.
pub trait SharedState:
    Clone + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Stable name of the state kind on the wire.
    const KIND: &'static str;

    /// Schema version. Bump on any incompatible field change.
    const VERSION: u32;
}

/// Theme snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeState {
    pub is_dark: bool,
}

impl ThemeState {
    pub fn toggled(&self) -> Self {
        Self {
            is_dark: !self.is_dark,
        }
    }
}

impl SharedState for ThemeState {
    const KIND: &'static str = "theme";
    const VERSION: u32 = 1;
}

/// Profile fields of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub uuid: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub picture: Option<String>,
}

/// Authentication snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    pub display_name: String,
    pub is_admin: bool,
    pub is_seller: bool,
    pub roles: Vec<String>,
    /// Service name to membership tier.
    pub memberships: BTreeMap<String, String>,
    pub user: Option<UserProfile>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            display_name: "Guest".to_string(),
            is_admin: false,
            is_seller: false,
            roles: Vec::new(),
            memberships: BTreeMap::new(),
            user: None,
        }
    }
}

impl AuthState {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|r| self.has_role(r.as_ref()))
    }

    /// Whether the user administers `service`.
    ///
    /// Platform admins administer every service. Otherwise a role of the
    /// form `ROLE_<SERVICE>_ADMIN` is required.
    pub fn is_service_admin(&self, service: &str) -> bool {
        if self.has_role("ROLE_SUPER_ADMIN") {
            return true;
        }
        let role = format!("ROLE_{}_ADMIN", service.to_ascii_uppercase());
        self.has_role(&role)
    }
}

impl SharedState for AuthState {
    const KIND: &'static str = "auth";
    const VERSION: u32 = 1;
}

/// The adapters a host hands to every remote it mounts.
#[derive(Clone)]
pub struct PortalStores {
    pub auth: Arc<dyn StoreAdapter<AuthState>>,
    pub theme: Arc<dyn StoreAdapter<ThemeState>>,
    pub actions: Arc<dyn PortalActions>,
}

impl std::fmt::Debug for PortalStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalStores")
            .field("auth", &self.auth.get_state())
            .field("theme", &self.theme.get_state())
            .finish_non_exhaustive()
    }
}
