//! The dual-tier token store.
//!
//! A bearer token may live in the durable tier (survives restarts), the
//! session tier (lives as long as the process), or both. This is the only
//! place that knows how the two are kept in step.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{StorageTier, REMEMBER_KEY, TOKEN_KEY};

#[derive(Clone)]
pub struct TokenStore {
    durable: Arc<dyn StorageTier>,
    session: Arc<dyn StorageTier>,
}

impl TokenStore {
    pub fn new(durable: Arc<dyn StorageTier>, session: Arc<dyn StorageTier>) -> Self {
        Self { durable, session }
    }

    /// The durable tier, for preferences that share it.
    pub fn durable(&self) -> &Arc<dyn StorageTier> {
        &self.durable
    }

    pub fn session(&self) -> &Arc<dyn StorageTier> {
        &self.session
    }

    /// Session-tier token if present, else durable-tier token.
    pub fn read(&self) -> Option<String> {
        self.session_token().or_else(|| self.durable_token())
    }

    pub fn has_token(&self) -> bool {
        self.read().is_some()
    }

    pub fn is_remembered(&self) -> bool {
        get(&*self.durable, REMEMBER_KEY).as_deref() == Some("true")
    }

    /// Persist a freshly issued token.
    ///
    /// With `remember` the token goes to both tiers and the marker is set.
    /// Without it only the session tier holds it and any durable copy is removed.
    pub fn write(&self, token: &str, remember: bool) {
        debug!(remember, "writing token");
        if remember {
            set(&*self.durable, TOKEN_KEY, token);
            set(&*self.durable, REMEMBER_KEY, "true");
        } else {
            remove(&*self.durable, TOKEN_KEY);
            remove(&*self.durable, REMEMBER_KEY);
        }
        set(&*self.session, TOKEN_KEY, token);
    }

    /// Fill gaps between the tiers. Never replaces a populated session token.
    ///
    /// - session empty, durable set: durable → session
    /// - durable empty, session set, remember marker set: session → durable
    pub fn reconcile(&self) {
        match (self.session_token(), self.durable_token()) {
            (None, Some(durable)) => {
                debug!("restoring session token from durable storage");
                set(&*self.session, TOKEN_KEY, &durable);
            }
            (Some(session), None) if self.is_remembered() => {
                debug!("restoring durable token from session storage");
                set(&*self.durable, TOKEN_KEY, &session);
            }
            _ => {}
        }
    }

    /// Remove the token and the remember marker from both tiers.
    pub fn clear(&self) {
        debug!("clearing tokens from all tiers");
        remove(&*self.durable, TOKEN_KEY);
        remove(&*self.durable, REMEMBER_KEY);
        remove(&*self.session, TOKEN_KEY);
    }

    fn session_token(&self) -> Option<String> {
        get(&*self.session, TOKEN_KEY).filter(|t| !t.is_empty())
    }

    fn durable_token(&self) -> Option<String> {
        get(&*self.durable, TOKEN_KEY).filter(|t| !t.is_empty())
    }
}

// Tier failures degrade to "absent"; a broken tier must not take the session down.

fn get(tier: &dyn StorageTier, key: &str) -> Option<String> {
    tier.get(key).unwrap_or_else(|e| {
        warn!(tier = tier.name(), key, error = %e, "storage read failed");
        None
    })
}

fn set(tier: &dyn StorageTier, key: &str, value: &str) {
    if let Err(e) = tier.set(key, value) {
        warn!(tier = tier.name(), key, error = %e, "storage write failed");
    }
}

fn remove(tier: &dyn StorageTier, key: &str) {
    if let Err(e) = tier.remove(key) {
        warn!(tier = tier.name(), key, error = %e, "storage remove failed");
    }
}
