use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Assistant-personality preferences layered on top of the session.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct PreferencesConfig {
    pub enabled: bool,
    /// Used when neither local storage nor the server knows a personality.
    pub default_personality_id: i64,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_personality_id: 1,
        }
    }
}
