use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-user settings as served by the settings endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct UserSettings {
    #[serde(default)]
    pub personality_id: Option<i64>,
}

/// An assistant personality the user can pick.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Personality {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
