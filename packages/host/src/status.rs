use std::fmt;

/// What the shell is showing in its remote outlet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RemoteStatus {
    /// No remote route visited yet, or the shell was shut down.
    #[default]
    Idle,
    /// The remote for the current route is being fetched.
    Loading { key: String },
    /// The remote is mounted and visible.
    Active { key: String },
    /// Loading or mounting failed; a fallback is shown.
    Unavailable { key: String, reason: String },
}

impl RemoteStatus {
    /// The remote this status is about.
    pub fn key(&self) -> Option<&str> {
        match self {
            RemoteStatus::Idle => None,
            RemoteStatus::Loading { key }
            | RemoteStatus::Active { key }
            | RemoteStatus::Unavailable { key, .. } => Some(key),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RemoteStatus::Active { .. })
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteStatus::Idle => f.write_str("idle"),
            RemoteStatus::Loading { key } => write!(f, "loading {key}"),
            RemoteStatus::Active { key } => write!(f, "{key} active"),
            RemoteStatus::Unavailable { key, reason } => write!(f, "{key} unavailable: {reason}"),
        }
    }
}
