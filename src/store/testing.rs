//! Test doubles for storage tiers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{MemoryTier, StorageTier, TokenStore, TOKEN_KEY};
use crate::errors::StorageError;

/// Memory tier that counts how often the token key is removed.
#[derive(Debug)]
pub struct CountingTier {
    inner: MemoryTier,
    token_removals: AtomicUsize,
}

impl CountingTier {
    pub fn new(name: &str) -> Self {
        Self {
            inner: MemoryTier::new(name),
            token_removals: AtomicUsize::new(0),
        }
    }

    pub fn token_removals(&self) -> usize {
        self.token_removals.load(Ordering::SeqCst)
    }
}

impl StorageTier for CountingTier {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if key == TOKEN_KEY {
            self.token_removals.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.remove(key)
    }
}

/// A token store over two in-memory tiers, returned with handles to both.
pub fn memory_store() -> (Arc<TokenStore>, Arc<MemoryTier>, Arc<MemoryTier>) {
    let durable = Arc::new(MemoryTier::new("durable"));
    let session = Arc::new(MemoryTier::new("session"));
    let store = Arc::new(TokenStore::new(durable.clone(), session.clone()));
    (store, durable, session)
}
