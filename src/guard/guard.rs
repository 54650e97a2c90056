use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::routes::RouteTransition;
use crate::config::RoutesConfig;
use crate::errors::SessionError;
use crate::models::UserProfile;
use crate::utils::redirect::{login_redirect, path_of};

/// What the guard needs to know about the session.
#[async_trait]
pub trait SessionAuthority: Send + Sync {
    fn is_authenticated(&self) -> bool;
    /// Whether either storage tier holds a token. Never touches the network.
    fn has_persisted_token(&self) -> bool;
    /// Rebuild the session from storage and validate it.
    async fn recover(&self) -> Result<Option<UserProfile>, SessionError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

pub struct NavigationGuard {
    authority: Arc<dyn SessionAuthority>,
    login_path: String,
    register_path: String,
    landing_path: String,
}

impl NavigationGuard {
    pub fn new(authority: Arc<dyn SessionAuthority>, routes: &RoutesConfig) -> Self {
        Self {
            authority,
            login_path: routes.login_path.clone(),
            register_path: routes.register_path.clone(),
            landing_path: routes.landing_path.clone(),
        }
    }

    pub async fn evaluate(&self, transition: &RouteTransition) -> GuardDecision {
        if !transition.requires_auth {
            let to = path_of(&transition.to);
            let is_entry = to == self.login_path || to == self.register_path;
            if is_entry && self.authority.is_authenticated() {
                debug!(to = to, "already logged in, skipping entry page");
                return GuardDecision::Redirect(self.landing_path.clone());
            }
            return GuardDecision::Allow;
        }

        if self.authority.is_authenticated() {
            return GuardDecision::Allow;
        }

        if !self.authority.has_persisted_token() {
            info!(
                event_name = "guard.redirect",
                event_domain = "guard",
                url_path = transition.to.as_str(),
                "no stored token, sending to login"
            );
            return self.to_login(transition);
        }

        match self.authority.recover().await {
            Ok(Some(_)) => {
                info!(
                    event_name = "guard.recovered",
                    event_domain = "guard",
                    url_path = transition.to.as_str(),
                    "session restored from storage"
                );
                GuardDecision::Allow
            }
            Ok(None) => self.to_login(transition),
            Err(e) => {
                warn!(
                    event_name = "guard.recovery_failed",
                    event_domain = "guard",
                    error = %e,
                    "session recovery failed"
                );
                self.to_login(transition)
            }
        }
    }

    fn to_login(&self, transition: &RouteTransition) -> GuardDecision {
        GuardDecision::Redirect(login_redirect(&self.login_path, &transition.to))
    }
}
