// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod api;
pub mod config;
pub mod logging;
pub mod preferences;
pub mod routes;
pub mod storage;

pub use api::*;
pub use config::*;
pub use logging::*;
pub use preferences::*;
pub use routes::*;
pub use storage::*;
