//! Viewport session states and load outcomes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{GeoBounds, Property};
use crate::error::FetchError;

/// Properties fetched for one region, shared between cache and views.
pub type PropertySet = Arc<Vec<Property>>;

/// Where the data of a `Ready` state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Cache,
    Network,
}

/// State of one viewport session.
///
/// `Idle → Loading → Ready | Error`, and back to `Idle` on the next
/// significant bounds change. A cache hit goes straight from `Idle` to
/// `Ready`.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportState {
    Idle,
    Loading {
        bounds: GeoBounds,
    },
    Ready {
        bounds: GeoBounds,
        properties: PropertySet,
        origin: DataOrigin,
    },
    Error {
        bounds: GeoBounds,
        error: FetchError,
        /// Last successfully loaded properties, kept on screen.
        last_good: Option<PropertySet>,
    },
}

impl ViewportState {
    /// Short state name for logs and CLI output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading { .. } => "loading",
            Self::Ready { .. } => "ready",
            Self::Error { .. } => "error",
        }
    }
}

/// Result of asking the loader for the properties visible in some bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportOutcome {
    /// Bounds within epsilon of the ready viewport; nothing was done.
    Unchanged { properties: Option<PropertySet> },
    /// Fresh data for the requested bounds.
    Ready {
        properties: PropertySet,
        origin: DataOrigin,
    },
    /// The cooldown gate refused a fetch; keep showing the fallback.
    RateLimited {
        retry_after: Option<Duration>,
        fallback: Option<PropertySet>,
    },
    /// Newer bounds were requested while this load was in flight. The
    /// result was cached but not applied.
    Superseded,
    /// Transient fetch failure; keep showing the fallback.
    Failed {
        error: FetchError,
        fallback: Option<PropertySet>,
    },
}

impl ViewportOutcome {
    /// Properties the map should show after this outcome, if any.
    #[must_use]
    pub fn properties(&self) -> Option<&PropertySet> {
        match self {
            Self::Unchanged { properties } => properties.as_ref(),
            Self::Ready { properties, .. } => Some(properties),
            Self::RateLimited { fallback, .. } | Self::Failed { fallback, .. } => fallback.as_ref(),
            Self::Superseded => None,
        }
    }

    /// Whether this outcome went to the network.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Ready {
                origin: DataOrigin::Network,
                ..
            }
        )
    }
}

/// Snapshot of loader counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportStats {
    pub unchanged: u64,
    pub cache_hits: u64,
    pub fetches: u64,
    pub prefetches: u64,
    pub rate_limited: u64,
    pub superseded: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
pub(super) struct Counters {
    pub unchanged: AtomicU64,
    pub cache_hits: AtomicU64,
    pub fetches: AtomicU64,
    pub prefetches: AtomicU64,
    pub rate_limited: AtomicU64,
    pub superseded: AtomicU64,
    pub failures: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ViewportStats {
        ViewportStats {
            unchanged: self.unchanged.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            prefetches: self.prefetches.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
