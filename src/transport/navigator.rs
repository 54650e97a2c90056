use std::sync::{Mutex, MutexGuard};

use tracing::info;

/// The client's current location and the ability to move it.
///
/// Stands in for the browser location: the transport redirects through it
/// and the navigation driver pushes allowed destinations onto it.
pub trait Navigator: Send + Sync {
    /// Full current location (path plus query).
    fn current(&self) -> String;
    /// Move to `location`.
    fn redirect(&self, location: &str);
}

/// In-memory location with a history of every visited location.
#[derive(Debug)]
pub struct Location {
    history: Mutex<Vec<String>>,
}

impl Location {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![initial.into()]),
        }
    }

    fn history_guard(&self) -> MutexGuard<'_, Vec<String>> {
        match self.history.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Every location visited so far, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history_guard().clone()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for Location {
    fn current(&self) -> String {
        self.history_guard()
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }

    fn redirect(&self, location: &str) {
        info!(location, "navigating");
        self.history_guard().push(location.to_string());
    }
}
