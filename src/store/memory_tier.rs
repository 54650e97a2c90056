use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::StorageTier;
use crate::errors::StorageError;

/// A process-local tier. Used for the session tier, and for the durable
/// tier when nothing should touch the disk.
#[derive(Debug)]
pub struct MemoryTier {
    name: String,
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A panic mid-insert can't leave a HashMap half-written.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl StorageTier for MemoryTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_is_immediate() {
        let tier = MemoryTier::new("session");
        tier.set("token", "abc").unwrap();
        assert_eq!(tier.get("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn remove_missing_key_is_not_an_error() {
        let tier = MemoryTier::new("session");
        assert!(tier.remove("token").is_ok());
        assert_eq!(tier.get("token").unwrap(), None);
    }
}
