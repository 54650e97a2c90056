use serde::Serialize;

use crate::models::UserProfile;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
    Error,
}

/// In-memory session. Only the session controller mutates it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    /// Token most recently written or confirmed. Storage stays authoritative.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
    pub status: SessionStatus,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Name to show in the UI.
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(UserProfile::username)
            .unwrap_or("Not logged in")
    }

    /// Back to the state at process start. `loading` tracks operations still
    /// running and is left alone.
    pub fn reset(&mut self) {
        *self = Session {
            loading: self.loading,
            ..Session::default()
        };
    }
}
