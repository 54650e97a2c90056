//! Library exports for ledgerguard, shared between the binary and tests.

pub mod config;
pub mod errors;
pub mod guard;
pub mod models;
pub mod session;
pub mod startup;
pub mod state;
pub mod store;
pub mod transport;
pub mod utils;
