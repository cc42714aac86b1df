//! At-most-one in-flight request per key.
//!
//! The first caller for a key spawns the work; later callers for the same key
//! receive a clone of the same shared future and observe the same result.
//! The work runs on its own task, so it settles (and frees its key) even if
//! every caller stops waiting.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinError};
use tracing::trace;

/// Future shared by every caller joined on one request.
pub type SharedRequest<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct Pending<T, E> {
    id: u64,
    request: SharedRequest<T, E>,
    abort: AbortHandle,
}

/// How a caller got hold of a request.
pub enum Admission<T, E> {
    /// Another caller's request was already in flight.
    Joined(SharedRequest<T, E>),
    /// This caller started the request.
    Started(SharedRequest<T, E>),
    /// Nothing in flight, and the admission check said no.
    Refused,
}

type PendingMap<T, E> = Arc<Mutex<HashMap<String, Pending<T, E>>>>;

/// Registry of in-flight requests keyed by request key.
pub struct InFlight<T, E> {
    pending: PendingMap<T, E>,
    next_id: AtomicU64,
}

impl<T, E> InFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<JoinError> + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Join the request for `key`, starting `work` only if none is in flight.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run<F, Fut>(&self, key: &str, work: F) -> SharedRequest<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let mut pending = self.pending.lock();
        if let Some(existing) = pending.get(key) {
            trace!(key, "Joining in-flight request");
            return existing.request.clone();
        }
        self.start(&mut pending, key, work)
    }

    /// Like [`InFlight::run`], but a new request starts only if `admit`
    /// agrees. A request already in flight is joined without asking.
    ///
    /// `admit` runs under the registry lock, so no other caller can start or
    /// miss a request for `key` between the decision and the insert.
    pub fn run_admitted<A, F, Fut>(&self, key: &str, admit: A, work: F) -> Admission<T, E>
    where
        A: FnOnce() -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let mut pending = self.pending.lock();
        if let Some(existing) = pending.get(key) {
            trace!(key, "Joining in-flight request");
            return Admission::Joined(existing.request.clone());
        }
        if !admit() {
            return Admission::Refused;
        }
        Admission::Started(self.start(&mut pending, key, work))
    }

    fn start<F, Fut>(
        &self,
        pending: &mut HashMap<String, Pending<T, E>>,
        key: &str,
        work: F,
    ) -> SharedRequest<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.pending);
        let owned_key = key.to_string();
        let work = work();
        // The caller holds the registry lock until the entry is inserted
        // below, so the task cannot remove its key before it exists.
        let handle = tokio::spawn(async move {
            let result = work.await;
            let mut pending = registry.lock();
            if pending.get(&owned_key).is_some_and(|p| p.id == id) {
                pending.remove(&owned_key);
            }
            result
        });
        let abort = handle.abort_handle();
        let request = async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(E::from(err)),
            }
        }
        .boxed()
        .shared();

        pending.insert(
            key.to_string(),
            Pending {
                id,
                request: request.clone(),
                abort,
            },
        );
        request
    }

    /// Whether a request for `key` is in flight.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.pending.lock().contains_key(key)
    }

    /// Number of in-flight requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every in-flight request. Joined callers observe an aborted error.
    pub fn abort_all(&self) {
        let drained: Vec<_> = self.pending.lock().drain().collect();
        for (key, pending) in drained {
            trace!(key = %key, "Aborting in-flight request");
            pending.abort.abort();
        }
    }
}

impl<T, E> Default for InFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<JoinError> + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use crate::error::FetchError;

    fn counted(
        calls: &Arc<AtomicUsize>,
        result: Result<u32, FetchError>,
    ) -> impl Future<Output = Result<u32, FetchError>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            result
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_execution() {
        let in_flight: InFlight<u32, FetchError> = InFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let a = in_flight.run("k", || counted(&calls, Ok(7)));
        let b = in_flight.run("k", || counted(&calls, Ok(8)));
        assert!(in_flight.contains("k"));

        let (a, b) = tokio::join!(a, b);
        assert_eq!(a, Ok(7));
        assert_eq!(b, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(in_flight.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_reaches_every_caller_and_frees_key() {
        let in_flight: InFlight<u32, FetchError> = InFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let a = in_flight.run("k", || counted(&calls, Err(FetchError::Timeout)));
        let b = in_flight.run("k", || counted(&calls, Ok(1)));
        let (a, b) = tokio::join!(a, b);
        assert_eq!(a, Err(FetchError::Timeout));
        assert_eq!(b, Err(FetchError::Timeout));

        let c = in_flight.run("k", || counted(&calls, Ok(2))).await;
        assert_eq!(c, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn key_is_released_even_when_nobody_awaits() {
        let in_flight: InFlight<u32, FetchError> = InFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        drop(in_flight.run("k", || counted(&calls, Ok(1))));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(in_flight.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_all_fails_joined_callers() {
        let in_flight: InFlight<u32, FetchError> = InFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let a = in_flight.run("k", || counted(&calls, Ok(1)));
        in_flight.abort_all();

        assert!(matches!(a.await, Err(FetchError::Aborted(_))));
        assert!(in_flight.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn refused_admission_still_joins_running_request() {
        let in_flight: InFlight<u32, FetchError> = InFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let started = in_flight.run_admitted("k", || true, || counted(&calls, Ok(3)));
        let joined = in_flight.run_admitted("k", || false, || counted(&calls, Ok(4)));
        let (Admission::Started(a), Admission::Joined(b)) = (started, joined) else {
            panic!("expected the second caller to join the first");
        };
        assert_eq!(tokio::join!(a, b), (Ok(3), Ok(3)));

        let refused = in_flight.run_admitted("k", || false, || counted(&calls, Ok(5)));
        assert!(matches!(refused, Admission::Refused));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(in_flight.is_empty());
    }
}
