//! Outbound HTTP with the stored bearer token attached.

pub mod client;
pub mod navigator;
pub mod recovery;

pub use client::{ApiRequest, ApiResponse, AuthenticatedTransport, RequestBody, CACHE_BUST_PARAM};
pub use navigator::{Location, Navigator};
pub use recovery::{RecoveryGate, RecoveryPermit};

/// Told when the transport wipes the stored token after a 401, so in-memory
/// session state can follow. Called without any transport lock held.
pub trait SessionExpiry: Send + Sync {
    fn session_expired(&self);
}
