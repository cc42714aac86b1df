//! TTL cache of resolved video URLs, positive and negative.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::domain::{ResolveFailure, VideoId};

/// What a probe established about a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedOutcome {
    /// The video exists.
    Available { fallback: bool },
    /// The server confirmed there is no video.
    Missing,
    /// A transient failure, remembered briefly so it is retried soon.
    Failed(ResolveFailure),
}

/// A cached resolution for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUrlCacheEntry {
    pub id: VideoId,
    pub url: Url,
    pub outcome: CachedOutcome,
    pub fetched_at: Instant,
    ttl: Duration,
}

impl VideoUrlCacheEntry {
    /// Whether the entry records an existing video.
    #[must_use]
    pub const fn exists(&self) -> bool {
        matches!(self.outcome, CachedOutcome::Available { .. })
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }
}

/// Resolved URLs keyed by video id.
///
/// Positive and "missing" results live for the full TTL; transient failures
/// live for half of it.
#[derive(Debug)]
pub struct VideoUrlCache {
    ttl: Duration,
    entries: Mutex<HashMap<VideoId, VideoUrlCacheEntry>>,
}

impl VideoUrlCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh entry for `id`. Expired entries are dropped on lookup.
    #[must_use]
    pub fn get(&self, id: VideoId) -> Option<VideoUrlCacheEntry> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(&id) {
            Some(entry) if entry.is_fresh(now) => Some(entry.clone()),
            Some(_) => {
                entries.remove(&id);
                None
            }
            None => None,
        }
    }

    /// Remember a probe outcome for `id`.
    pub fn insert(&self, id: VideoId, url: Url, outcome: CachedOutcome) {
        let ttl = match outcome {
            CachedOutcome::Failed(_) => self.ttl / 2,
            _ => self.ttl,
        };
        let entry = VideoUrlCacheEntry {
            id,
            url,
            outcome,
            fetched_at: Instant::now(),
            ttl,
        };
        self.entries.lock().insert(id, entry);
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    /// Forget `id`.
    pub fn invalidate(&self, id: VideoId) {
        self.entries.lock().remove(&id);
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
