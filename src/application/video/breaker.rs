//! Per-resource circuit breaker for the video endpoint.
//!
//! Converts a retry storm against a flaky endpoint into a bounded number of
//! attempts followed by a cooldown. There is no timer: an open circuit is
//! closed lazily by the next access after the cooldown window.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

/// Runtime configuration for [`CircuitBreaker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip the circuit.
    pub max_failures: u32,
    /// How long an open circuit blocks attempts after the last failure.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

/// Circuit state for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Attempts allowed; counts consecutive failures so far.
    Closed { failures: u32 },
    /// Attempts blocked until the cooldown after the last failure elapses.
    Open { failures: u32, last_failure_at: Instant },
}

/// Answer to [`CircuitBreaker::check_can_proceed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerCheck {
    pub can_proceed: bool,
    /// Remaining cooldown when `can_proceed` is false.
    pub retry_after: Option<Duration>,
}

impl BreakerCheck {
    const PROCEED: Self = Self {
        can_proceed: true,
        retry_after: None,
    };
}

#[derive(Debug, Clone, Copy)]
struct BreakerRecord {
    failures: u32,
    last_failure_at: Instant,
    blocked: bool,
}

/// Failure counters keyed by resource id, created lazily on first failure.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    records: Mutex<HashMap<String, BreakerRecord>>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Whether an attempt for `id` may proceed.
    ///
    /// An open circuit whose cooldown has elapsed is reset to closed with a
    /// zero failure count.
    pub fn check_can_proceed(&self, id: &str) -> BreakerCheck {
        let now = Instant::now();
        let mut records = self.records.lock();
        let Some(record) = records.get(id).copied() else {
            return BreakerCheck::PROCEED;
        };
        if !record.blocked {
            return BreakerCheck::PROCEED;
        }

        let elapsed = now.saturating_duration_since(record.last_failure_at);
        if elapsed > self.config.cooldown {
            records.remove(id);
            info!(resource = id, "Circuit breaker cooldown elapsed, closing");
            return BreakerCheck::PROCEED;
        }

        BreakerCheck {
            can_proceed: false,
            retry_after: Some(self.config.cooldown - elapsed),
        }
    }

    /// Record the outcome of an attempt for `id`.
    ///
    /// Success clears all state; failure counts toward tripping the circuit.
    pub fn record_result(&self, id: &str, success: bool) {
        let mut records = self.records.lock();
        if success {
            records.remove(id);
            return;
        }

        let now = Instant::now();
        let record = records.entry(id.to_string()).or_insert(BreakerRecord {
            failures: 0,
            last_failure_at: now,
            blocked: false,
        });
        record.failures += 1;
        record.last_failure_at = now;
        if !record.blocked && record.failures >= self.config.max_failures {
            record.blocked = true;
            warn!(
                resource = id,
                failures = record.failures,
                cooldown_secs = self.config.cooldown.as_secs(),
                "Circuit breaker tripped"
            );
        }
    }

    /// Current state for `id`, without applying the lazy cooldown reset.
    #[must_use]
    pub fn state(&self, id: &str) -> CircuitState {
        match self.records.lock().get(id) {
            None => CircuitState::Closed { failures: 0 },
            Some(r) if r.blocked => CircuitState::Open {
                failures: r.failures,
                last_failure_at: r.last_failure_at,
            },
            Some(r) => CircuitState::Closed {
                failures: r.failures,
            },
        }
    }

    /// Number of resources with recorded failures.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.records.lock().len()
    }

    /// Forget every resource.
    pub fn reset(&self) {
        self.records.lock().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;

    #[tokio::test(start_paused = true)]
    async fn three_failures_trip_then_cooldown_closes() {
        let breaker = CircuitBreaker::default();

        for _ in 0..3 {
            assert!(breaker.check_can_proceed("7").can_proceed);
            breaker.record_result("7", false);
        }
        assert!(matches!(breaker.state("7"), CircuitState::Open { failures: 3, .. }));

        let check = breaker.check_can_proceed("7");
        assert!(!check.can_proceed);
        assert_eq!(check.retry_after, Some(Duration::from_secs(30)));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(
            breaker.check_can_proceed("7").retry_after,
            Some(Duration::from_secs(20))
        );

        tokio::time::advance(Duration::from_secs(21)).await;
        assert!(breaker.check_can_proceed("7").can_proceed);
        assert_eq!(breaker.state("7"), CircuitState::Closed { failures: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn resources_are_tracked_independently() {
        let breaker = CircuitBreaker::new(testkit::config::hair_trigger_breaker());
        breaker.record_result("1", false);

        assert!(!breaker.check_can_proceed("1").can_proceed);
        assert!(breaker.check_can_proceed("2").can_proceed);
        assert_eq!(breaker.tracked(), 1);

        tokio::time::advance(Duration::from_millis(1_001)).await;
        assert!(breaker.check_can_proceed("1").can_proceed);
        assert_eq!(breaker.tracked(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_failure_count() {
        let breaker = CircuitBreaker::default();
        breaker.record_result("1", false);
        breaker.record_result("1", false);
        breaker.record_result("1", true);
        breaker.record_result("1", false);

        assert_eq!(breaker.state("1"), CircuitState::Closed { failures: 1 });
        assert!(breaker.check_can_proceed("1").can_proceed);
    }

    #[tokio::test(start_paused = true)]
    async fn resources_are_isolated() {
        let breaker = CircuitBreaker::default();
        for _ in 0..3 {
            breaker.record_result("a", false);
        }
        assert!(!breaker.check_can_proceed("a").can_proceed);
        assert!(breaker.check_can_proceed("b").can_proceed);
        assert_eq!(breaker.tracked(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_while_open_extends_cooldown() {
        let breaker = CircuitBreaker::default();
        for _ in 0..3 {
            breaker.record_result("a", false);
        }
        tokio::time::advance(Duration::from_secs(20)).await;
        breaker.record_result("a", false);
        tokio::time::advance(Duration::from_secs(20)).await;

        assert!(!breaker.check_can_proceed("a").can_proceed);
    }
}
