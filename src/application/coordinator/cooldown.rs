//! Per-key cooldown gate (rate limiting).

use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

/// Rejects a key until `interval` has passed since it was last admitted.
///
/// The gate never fails: it only answers yes or no, and records the
/// admission time when it answers yes.
#[derive(Debug)]
pub struct CooldownGate {
    interval: Duration,
    last_request: DashMap<String, Instant>,
}

impl CooldownGate {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: DashMap::new(),
        }
    }

    /// Admit `key` if its cooldown has elapsed, stamping the admission.
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        match self.last_request.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
            Entry::Occupied(mut slot) => {
                if now.saturating_duration_since(*slot.get()) < self.interval {
                    trace!(key, "Cooldown active, request refused");
                    return false;
                }
                slot.insert(now);
                true
            }
        }
    }

    /// Time left before `key` is admitted again, `None` if it would be now.
    #[must_use]
    pub fn retry_after(&self, key: &str) -> Option<Duration> {
        let last = *self.last_request.get(key)?;
        let elapsed = Instant::now().saturating_duration_since(last);
        self.interval.checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    /// Forget keys whose cooldown has elapsed.
    pub fn gc(&self) {
        let now = Instant::now();
        let interval = self.interval;
        self.last_request
            .retain(|_, last| now.saturating_duration_since(*last) < interval);
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.last_request.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_request.is_empty()
    }

    /// Forget every key.
    pub fn clear(&self) {
        self.last_request.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn second_acquire_within_cooldown_is_refused() {
        let gate = CooldownGate::new(Duration::from_secs(2));

        assert!(gate.try_acquire("region:a"));
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(!gate.try_acquire("region:a"));

        tokio::time::advance(Duration::from_millis(1600)).await;
        assert!(gate.try_acquire("region:a"));
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let gate = CooldownGate::new(Duration::from_secs(2));
        assert!(gate.try_acquire("a"));
        assert!(gate.try_acquire("b"));
        assert!(!gate.try_acquire("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_counts_down() {
        let gate = CooldownGate::new(Duration::from_secs(2));
        assert_eq!(gate.retry_after("a"), None);

        gate.try_acquire("a");
        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(gate.retry_after("a"), Some(Duration::from_millis(1500)));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(gate.retry_after("a"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn gc_drops_elapsed_keys() {
        let gate = CooldownGate::new(Duration::from_secs(2));
        gate.try_acquire("a");
        tokio::time::advance(Duration::from_secs(3)).await;
        gate.try_acquire("b");

        gate.gc();
        assert_eq!(gate.len(), 1);
    }
}
