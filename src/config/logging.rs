use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output format of the tracing subscriber.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// OpenTelemetry-shaped JSON lines.
    Json,
    /// Human-readable, pretty-printed.
    #[default]
    Console,
}

/// LoggingConfig controls how we initialize tracing/logging.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String, // e.g. "info", "debug", "warn"
    pub format: LogFormat,
    pub service_name: String,
    pub service_version: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Console,
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
