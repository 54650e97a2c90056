pub mod base;
pub mod file_tier;
pub mod memory_tier;
pub mod token_store;

// Re-export the primary storage items so code outside can do
// "use crate::store::{TokenStore, StorageTier};"
pub use base::{
    create_durable_tier, create_session_tier, StorageTier, PERSONALITY_KEY, REMEMBER_KEY,
    TOKEN_KEY,
};
pub use file_tier::FileTier;
pub use memory_tier::MemoryTier;
pub use token_store::TokenStore;

#[cfg(test)]
pub(crate) mod testing;
