//! Request coordination: rate limiting, deduplication and debouncing.
//!
//! [`RequestCoordinator`] bundles the three disciplines every network path
//! follows:
//!
//! - [`CooldownGate`] - per-key cooldown; callers must not issue I/O when
//!   [`RequestCoordinator::try_acquire`] says no
//! - [`InFlight`] - at most one request in flight per key, shared result
//! - [`Debouncer`] - bursts of UI events coalesced into one action

pub mod cooldown;
pub mod debounce;
pub mod in_flight;

pub use cooldown::CooldownGate;
pub use debounce::{DebounceState, DebounceTicket, Debouncer};
pub use in_flight::{Admission, InFlight, SharedRequest};

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinError;

/// Runtime configuration for [`RequestCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Minimum time between two admitted requests for the same key.
    pub cooldown: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(2),
        }
    }
}

/// Shared gatekeeper for network requests producing `Result<T, E>`.
pub struct RequestCoordinator<T, E> {
    cooldown: CooldownGate,
    in_flight: InFlight<T, E>,
    debouncer: Debouncer,
}

impl<T, E> RequestCoordinator<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<JoinError> + 'static,
{
    #[must_use]
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            cooldown: CooldownGate::new(config.cooldown),
            in_flight: InFlight::new(),
            debouncer: Debouncer::new(),
        }
    }

    /// Rate-limit gate. Admits `key` and records the admission, or refuses.
    pub fn try_acquire(&self, key: &str) -> bool {
        self.cooldown.try_acquire(key)
    }

    /// Remaining cooldown for `key`.
    #[must_use]
    pub fn retry_after(&self, key: &str) -> Option<Duration> {
        self.cooldown.retry_after(key)
    }

    /// Run `work` unless a request for `key` is already in flight, in which
    /// case the caller joins it. Errors reach every joined caller.
    pub fn run_deduplicated<F, Fut>(&self, key: &str, work: F) -> SharedRequest<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.in_flight.run(key, work)
    }

    /// Join the request in flight for `key`, or start `work` if the cooldown
    /// admits `key`.
    ///
    /// The in-flight check, the cooldown stamp and the insert happen as one
    /// step: a caller refused by the cooldown has not missed a request that
    /// another caller is just starting.
    pub fn acquire_or_join<F, Fut>(&self, key: &str, work: F) -> Admission<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.in_flight
            .run_admitted(key, || self.cooldown.try_acquire(key), work)
    }

    /// Coalesce same-key calls into one `action` after `delay` of quiet.
    pub fn debounce<F, Fut>(&self, key: &str, delay: Duration, action: F) -> DebounceTicket
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.debouncer.schedule(key, delay, action)
    }

    /// Cancel the pending debounced action for `key`.
    pub fn cancel_debounce(&self, key: &str) -> bool {
        self.debouncer.cancel(key)
    }

    /// Number of requests in flight.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of debounced actions waiting to fire.
    #[must_use]
    pub fn pending_debounces(&self) -> usize {
        self.debouncer.pending()
    }

    /// Number of keys the cooldown gate remembers.
    #[must_use]
    pub fn cooldown_keys(&self) -> usize {
        self.cooldown.len()
    }

    /// Drop cooldown records whose interval has elapsed.
    pub fn gc(&self) {
        self.cooldown.gc();
    }

    /// Cancel pending debounces, abort in-flight requests and forget
    /// cooldowns.
    pub fn dispose(&self) {
        self.debouncer.cancel_all();
        self.in_flight.abort_all();
        self.cooldown.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[tokio::test(start_paused = true)]
    async fn try_acquire_true_false_true_across_cooldown() {
        let coordinator: RequestCoordinator<u32, FetchError> =
            RequestCoordinator::new(CoordinatorConfig::default());

        assert!(coordinator.try_acquire("region:1"));
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(!coordinator.try_acquire("region:1"));
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(coordinator.try_acquire("region:1"));
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_resets_everything() {
        let coordinator: RequestCoordinator<u32, FetchError> =
            RequestCoordinator::new(CoordinatorConfig::default());

        coordinator.try_acquire("k");
        let pending = coordinator.run_deduplicated("k", || async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(1)
        });
        coordinator.debounce("k", Duration::from_millis(100), || async {});

        coordinator.dispose();

        assert!(coordinator.try_acquire("k"));
        assert_eq!(coordinator.in_flight_count(), 0);
        assert_eq!(coordinator.pending_debounces(), 0);
        assert!(pending.await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cooling_key_joins_in_flight_request_instead_of_refusing() {
        let coordinator: RequestCoordinator<u32, FetchError> =
            RequestCoordinator::new(CoordinatorConfig::default());
        let slow = || async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(9)
        };

        let first = coordinator.acquire_or_join("k", slow);
        let second = coordinator.acquire_or_join("k", slow);
        let (Admission::Started(a), Admission::Joined(b)) = (first, second) else {
            panic!("expected one start and one join");
        };
        assert_eq!(tokio::join!(a, b), (Ok(9), Ok(9)));

        // Settled but still cooling down.
        assert!(matches!(
            coordinator.acquire_or_join("k", slow),
            Admission::Refused
        ));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(matches!(
            coordinator.acquire_or_join("k", slow),
            Admission::Started(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn gc_forgets_cooled_down_keys() {
        let coordinator: RequestCoordinator<u32, FetchError> =
            RequestCoordinator::new(CoordinatorConfig::default());
        coordinator.try_acquire("a");
        coordinator.try_acquire("b");
        tokio::time::advance(Duration::from_secs(3)).await;
        coordinator.try_acquire("c");

        coordinator.gc();
        assert_eq!(coordinator.cooldown_keys(), 1);
    }
}
