//! In-memory session state and the controller that drives it.

pub mod controller;
pub mod preferences;
pub mod state;

pub use controller::{SessionController, LOGIN_FAILED, NO_RESPONSE};
pub use preferences::Preferences;
pub use state::{Session, SessionStatus};
