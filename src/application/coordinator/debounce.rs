//! Keyed debouncing with cancellable scheduled tasks.
//!
//! Each call schedules an action after a quiet period. A later call with the
//! same key cancels the earlier one outright: a cancelled action never
//! starts, and a fired action always runs to completion.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::trace;

/// Lifecycle of one scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// Waiting for the quiet period to elapse.
    Scheduled,
    /// Superseded or cancelled before firing.
    Cancelled,
    /// The action started.
    Fired,
}

/// Handle to one scheduled action.
#[derive(Debug, Clone)]
pub struct DebounceTicket {
    key: String,
    state: Arc<Mutex<DebounceState>>,
}

impl DebounceTicket {
    /// Debounce key this ticket was scheduled under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current state of the scheduled action.
    #[must_use]
    pub fn state(&self) -> DebounceState {
        *self.state.lock()
    }
}

struct Slot {
    generation: u64,
    state: Arc<Mutex<DebounceState>>,
    abort: AbortHandle,
}

impl Slot {
    fn cancel(self) {
        let mut state = self.state.lock();
        if *state == DebounceState::Scheduled {
            *state = DebounceState::Cancelled;
            self.abort.abort();
        }
    }
}

/// Coalesces bursts of same-key calls into one delayed action.
#[derive(Default)]
pub struct Debouncer {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    next_generation: AtomicU64,
}

impl Debouncer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` after `delay`, cancelling any pending action for
    /// `key`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F, Fut>(&self, key: &str, delay: Duration, action: F) -> DebounceTicket
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let state = Arc::new(Mutex::new(DebounceState::Scheduled));
        let slots = Arc::clone(&self.slots);
        let task_state = Arc::clone(&state);
        let owned_key = key.to_string();

        let mut guard = self.slots.lock();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slots = slots.lock();
                match slots.get(&owned_key) {
                    Some(slot) if slot.generation == generation => {
                        slots.remove(&owned_key);
                    }
                    _ => return,
                }
                let mut state = task_state.lock();
                if *state != DebounceState::Scheduled {
                    return;
                }
                *state = DebounceState::Fired;
            }
            trace!(key = %owned_key, "Debounced action fired");
            action().await;
        });

        let slot = Slot {
            generation,
            state: Arc::clone(&state),
            abort: handle.abort_handle(),
        };
        if let Some(previous) = guard.insert(key.to_string(), slot) {
            trace!(key, "Debounce restarted");
            previous.cancel();
        }

        DebounceTicket {
            key: key.to_string(),
            state,
        }
    }

    /// Cancel the pending action for `key`. Returns false if none was pending.
    pub fn cancel(&self, key: &str) -> bool {
        let slot = self.slots.lock().remove(key);
        slot.map(Slot::cancel).is_some()
    }

    /// Cancel every pending action.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.slots.lock().drain().map(|(_, slot)| slot).collect();
        drained.into_iter().for_each(Slot::cancel);
    }

    /// Number of actions still waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.slots.lock().len()
    }
}
