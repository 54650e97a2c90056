//! The assembled client.
//!
//! One `App` is one "tab": its own session tier and session controller, with
//! the durable tier shared with every other process pointed at the same file.

use std::sync::Arc;

use tracing::debug;

use crate::config::ConfigV1;
use crate::guard::{GuardDecision, NavigationGuard, RouteTable};
use crate::session::SessionController;
use crate::store::TokenStore;
use crate::transport::{AuthenticatedTransport, Location, Navigator};

pub struct App {
    pub config: Arc<ConfigV1>,
    pub tokens: Arc<TokenStore>,
    pub transport: Arc<AuthenticatedTransport>,
    pub session: Arc<SessionController>,
    pub guard: NavigationGuard,
    pub routes: RouteTable,
    pub location: Arc<Location>,
}

impl App {
    /// Attempt to move to `to` and apply the guard's verdict to the location.
    pub async fn navigate(&self, to: &str) -> GuardDecision {
        let transition = self.routes.transition(&self.location.current(), to);
        debug!(
            from = transition.from.as_str(),
            to = transition.to.as_str(),
            requires_auth = transition.requires_auth,
            "evaluating navigation"
        );
        let decision = self.guard.evaluate(&transition).await;
        match &decision {
            GuardDecision::Allow => self.location.redirect(&transition.to),
            GuardDecision::Redirect(target) => self.location.redirect(target),
        }
        decision
    }
}
