//! Route-transition checks against the session.

pub mod guard;
pub mod routes;

pub use guard::{GuardDecision, NavigationGuard, SessionAuthority};
pub use routes::{Route, RouteTable, RouteTransition};
