use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The user object returned by the profile endpoint.
///
/// The client treats it as opaque: it is stored and handed back wholesale.
/// Accessors cover the fields the session itself needs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct UserProfile(pub Map<String, Value>);

impl UserProfile {
    pub fn username(&self) -> Option<&str> {
        self.0.get("username").and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}
