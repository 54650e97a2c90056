use std::sync::Arc;

use tracing::{info, warn};

use super::{file_tier::FileTier, memory_tier::MemoryTier};
use crate::config::{DurableBackend, StorageConfig};
use crate::errors::StorageError;

/// Durable-tier key holding the bearer token. The session tier uses the same key.
pub const TOKEN_KEY: &str = "token";
/// Durable-tier key set to `"true"` when the user asked to be remembered.
pub const REMEMBER_KEY: &str = "rememberMe";
/// Durable-tier key of the assistant preference. Not part of the auth state.
pub const PERSONALITY_KEY: &str = "personality_id";

/// A string key/value storage tier.
///
/// Mutations must be visible to the next `get` on any handle to the same
/// tier; implementations never buffer writes.
pub trait StorageTier: Send + Sync {
    fn name(&self) -> &str;
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Creates the durable tier described by the StorageConfig.
pub fn create_durable_tier(config: &StorageConfig) -> Arc<dyn StorageTier> {
    match &config.durable {
        DurableBackend::File { path } => {
            info!("Using file-backed durable storage at {}", path.display());
            Arc::new(FileTier::new(path.clone()))
        }
        DurableBackend::Memory => {
            warn!("Durable storage is in-memory; tokens will not survive a restart.");
            Arc::new(MemoryTier::new("durable"))
        }
    }
}

/// The session tier always lives in process memory.
pub fn create_session_tier() -> Arc<dyn StorageTier> {
    Arc::new(MemoryTier::new("session"))
}
