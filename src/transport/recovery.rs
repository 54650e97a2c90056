//! Single-flight guard for the redirect-on-401 recovery.
//!
//! There is no refresh endpoint, so "recovery" means wiping the stored token
//! and sending the user to the login page. Only one caller may do that at a
//! time; the others wait for it to finish and then fail with their own error.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct RecoveryGate {
    in_flight: AtomicBool,
    settled: Notify,
}

/// Held by the one caller allowed to run the recovery. Dropping it settles
/// the gate and releases everyone waiting in [`RecoveryGate::wait_settled`].
#[derive(Debug)]
pub struct RecoveryPermit<'a> {
    gate: &'a RecoveryGate,
}

impl RecoveryGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the recovery. `None` while another caller holds it.
    pub fn try_begin(&self) -> Option<RecoveryPermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RecoveryPermit { gate: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Resolves once no recovery is running.
    pub async fn wait_settled(&self) {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            // Register before checking, so a settle in between isn't missed.
            notified.as_mut().enable();
            if !self.is_in_flight() {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for RecoveryPermit<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::Release);
        self.gate.settled.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn only_one_permit_at_a_time() {
        let gate = RecoveryGate::new();
        let permit = gate.try_begin();
        assert!(permit.is_some());
        assert!(gate.try_begin().is_none());
        drop(permit);
        assert!(!gate.is_in_flight());
        assert!(gate.try_begin().is_some());
    }

    #[tokio::test]
    async fn waiters_are_released_when_the_permit_drops() {
        let gate = Arc::new(RecoveryGate::new());
        let permit_gate = gate.clone();

        let holder = tokio::spawn(async move {
            let permit = permit_gate.try_begin().expect("first claim wins");
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(permit);
        });

        while !gate.is_in_flight() {
            tokio::task::yield_now().await;
        }
        tokio::time::timeout(Duration::from_secs(1), gate.wait_settled())
            .await
            .expect("waiter should be released");
        assert!(!gate.is_in_flight());
        holder.await.unwrap();
    }

    #[tokio::test]
    async fn wait_settled_returns_immediately_when_idle() {
        let gate = RecoveryGate::new();
        tokio::time::timeout(Duration::from_millis(50), gate.wait_settled())
            .await
            .expect("idle gate should not block");
    }
}
