use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct WindowState {
    window_started_at: Instant,
    suppressed: u64,
}

/// Per-key rate limiter for noisy log lines.
#[derive(Debug)]
pub struct LogThrottle {
    interval: Duration,
    windows: Mutex<HashMap<&'static str, WindowState>>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `Some(suppressed_count)` when a log for `key` should be emitted,
    /// otherwise `None` and the event is counted against the active window.
    pub fn should_emit(&self, key: &'static str) -> Option<u64> {
        let mut map = match self.windows.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();

        match map.get_mut(key) {
            Some(state) if now.duration_since(state.window_started_at) >= self.interval => {
                let suppressed = state.suppressed;
                state.window_started_at = now;
                state.suppressed = 0;
                Some(suppressed)
            }
            Some(state) => {
                state.suppressed += 1;
                None
            }
            None => {
                map.insert(
                    key,
                    WindowState {
                        window_started_at: now,
                        suppressed: 0,
                    },
                );
                Some(0)
            }
        }
    }
}
