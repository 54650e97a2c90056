use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Where the finance API lives and how the transport talks to it.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct ApiConfig {
    /// Absolute base URL. Override with `LEDGERGUARD_API__BASE_URL`.
    pub base_url: String,
    /// Per-request timeout. Absent means requests may run indefinitely.
    pub timeout_ms: Option<u64>,
    /// Token-issuance endpoints. A 401 from these is a login failure,
    /// never a session expiry.
    pub login_endpoints: Vec<String>,
    pub endpoints: IdentityEndpoints,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: None,
            login_endpoints: vec!["/users/login".to_string(), "/users/token".to_string()],
            endpoints: IdentityEndpoints::default(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Paths of the server-owned identity endpoints.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct IdentityEndpoints {
    pub login: String,
    pub register: String,
    pub profile: String,
    pub settings: String,
    pub personalities: String,
}

impl Default for IdentityEndpoints {
    fn default() -> Self {
        Self {
            login: "/users/login".to_string(),
            register: "/users/register".to_string(),
            profile: "/users/me".to_string(),
            settings: "/users/settings".to_string(),
            personalities: "/chat/personalities".to_string(),
        }
    }
}
