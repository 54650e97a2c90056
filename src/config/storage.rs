use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration. Only the durable tier is configurable: the session
/// tier always lives in process memory.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub durable: DurableBackend,
}

/// The durable tier backends. We differentiate them via a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum DurableBackend {
    #[serde(rename = "file")]
    File { path: PathBuf },
    /// Forgets everything on exit. Useful for tests and throwaway sessions.
    #[serde(rename = "memory")]
    Memory,
}

impl Default for DurableBackend {
    fn default() -> Self {
        DurableBackend::File {
            path: PathBuf::from(".ledgerguard/storage.json"),
        }
    }
}
