#![allow(dead_code)]

use std::path::Path;

use ledgerguard::config::{config_from_yaml, ConfigV1};
use ledgerguard::startup;
use ledgerguard::state::App;
use mockito::{Matcher, Mock, Server};

pub const PROFILE: &str = r#"{"id":7,"username":"alice","email":"alice@example.com"}"#;

/// Config pointing at `base_url` with an in-memory durable tier.
pub fn memory_config(base_url: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
api:
  base_url: "{base_url}"
storage:
  durable:
    type: memory
logging:
  level: debug
"#
    );
    config_from_yaml(&yaml).expect("Failed to parse test config YAML")
}

/// Config pointing at `base_url` with the durable tier in `path`.
pub fn file_config(base_url: &str, path: &Path) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
api:
  base_url: "{base_url}"
storage:
  durable:
    type: file
    path: "{}"
"#,
        path.display()
    );
    config_from_yaml(&yaml).expect("Failed to parse test config YAML")
}

pub fn build_app(config: ConfigV1) -> App {
    startup::build(config).expect("client should build")
}

pub async fn mock_login(server: &mut Server, token: &str) -> Mock {
    server
        .mock("POST", "/users/login")
        .with_status(200)
        .with_body(format!(r#"{{"access_token":"{}","token_type":"bearer"}}"#, token))
        .create_async()
        .await
}

pub async fn mock_profile(server: &mut Server, token: &str) -> Mock {
    server
        .mock("GET", "/users/me")
        .match_query(Matcher::Any)
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(200)
        .with_body(PROFILE)
        .create_async()
        .await
}

/// Settings and personality endpoints, answered with a fixed choice.
pub async fn mock_preferences(server: &mut Server) -> (Mock, Mock) {
    let settings = server
        .mock("GET", "/users/settings")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"personality_id":2}"#)
        .create_async()
        .await;
    let personalities = server
        .mock("GET", "/chat/personalities")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"id":1,"name":"Warm"},{"id":2,"name":"Frugal"}]"#)
        .create_async()
        .await;
    (settings, personalities)
}
