use portal_lifecycle::Theme;
use serde::Deserialize;

/// Host shell settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostConfig {
    /// Mounted remotes kept alive at once, the active one included.
    pub keep_alive_max: usize,
    /// Theme before the user picks one.
    pub default_theme: Theme,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            keep_alive_max: 10,
            default_theme: Theme::Light,
        }
    }
}
