//! Assistant-personality preferences.
//!
//! Layered on top of the session: nothing here affects whether the user is
//! authenticated, and the chosen personality outlives logout.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::config::{IdentityEndpoints, PreferencesConfig};
use crate::errors::StorageError;
use crate::models::{Personality, UserSettings};
use crate::store::{StorageTier, PERSONALITY_KEY};
use crate::transport::AuthenticatedTransport;

#[derive(Debug, Default)]
struct PreferenceState {
    current_id: Option<i64>,
    personalities: Vec<Personality>,
}

pub struct Preferences {
    transport: Arc<AuthenticatedTransport>,
    durable: Arc<dyn StorageTier>,
    settings_path: String,
    personalities_path: String,
    default_id: i64,
    state: Mutex<PreferenceState>,
}

impl Preferences {
    pub fn new(
        transport: Arc<AuthenticatedTransport>,
        endpoints: &IdentityEndpoints,
        config: &PreferencesConfig,
    ) -> Self {
        let durable = transport.tokens().durable().clone();
        Self {
            transport,
            durable,
            settings_path: endpoints.settings.clone(),
            personalities_path: endpoints.personalities.clone(),
            default_id: config.default_personality_id,
            state: Mutex::new(PreferenceState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PreferenceState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn current_personality_id(&self) -> Option<i64> {
        self.state().current_id
    }

    pub fn personalities(&self) -> Vec<Personality> {
        self.state().personalities.clone()
    }

    /// The selected personality, else the first known one.
    pub fn current_personality(&self) -> Option<Personality> {
        let state = self.state();
        state
            .personalities
            .iter()
            .find(|p| Some(p.id) == state.current_id)
            .or_else(|| state.personalities.first())
            .cloned()
    }

    /// Resolve the selected personality: local storage first, then the
    /// server, then the configured default. Never fails.
    pub async fn load_settings(&self) {
        if let Some(id) = self.stored_id() {
            debug!(personality_id = id, "personality read from local storage");
            self.state().current_id = Some(id);
            return;
        }

        let id = match self
            .transport
            .get_json::<UserSettings>(&self.settings_path)
            .await
        {
            Ok(UserSettings {
                personality_id: Some(id),
            }) => id,
            Ok(_) => self.default_id,
            Err(e) => {
                warn!(error = %e, "failed to fetch user settings, using default personality");
                self.default_id
            }
        };
        self.select(id);
    }

    /// Reload the personality list. An empty answer keeps the current list;
    /// a failure empties it.
    pub async fn refresh_personalities(&self) {
        match self
            .transport
            .get_json::<Vec<Personality>>(&self.personalities_path)
            .await
        {
            Ok(list) if !list.is_empty() => {
                debug!(count = list.len(), "personalities loaded");
                self.state().personalities = list;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "failed to fetch personalities");
                self.state().personalities.clear();
            }
        }
    }

    /// Settings are kept client-side; the server does not persist them.
    pub fn update_settings(&self, settings: &UserSettings) -> Result<(), StorageError> {
        if let Some(id) = settings.personality_id {
            self.state().current_id = Some(id);
            self.durable.set(PERSONALITY_KEY, &id.to_string())?;
            info!(personality_id = id, "personality saved");
        }
        Ok(())
    }

    /// Drop the list on logout, keep the selection.
    pub fn forget_personalities(&self) {
        self.state().personalities.clear();
    }

    fn stored_id(&self) -> Option<i64> {
        match self.durable.get(PERSONALITY_KEY) {
            Ok(value) => value.and_then(|v| v.trim().parse().ok()),
            Err(e) => {
                warn!(error = %e, "failed to read stored personality");
                None
            }
        }
    }

    fn select(&self, id: i64) {
        self.state().current_id = Some(id);
        if let Err(e) = self.durable.set(PERSONALITY_KEY, &id.to_string()) {
            warn!(error = %e, "failed to persist personality");
        }
    }
}
