//! Region cache for viewport property sets.
//!
//! Entries are keyed by the bounds they were fetched for. A lookup hits when
//! a fresh entry's bounds approximately contain the requested bounds. Stale
//! entries stay in place (and count against capacity) until eviction reuses
//! their slot; they simply stop answering lookups.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::domain::{GeoBounds, Property, DEFAULT_EPSILON_DEG};

/// Runtime configuration for [`RegionCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegionCacheConfig {
    /// Age after which an entry no longer answers lookups.
    pub ttl: Duration,
    /// Maximum number of entries kept.
    pub max_entries: usize,
    /// Entries whose center is farther than this from the viewport center
    /// are dropped by [`RegionCache::evict_distant`] (degrees).
    pub cleanup_distance_deg: f64,
    /// Edge tolerance for matching bounds (degrees).
    pub epsilon_deg: f64,
}

impl Default for RegionCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 10,
            cleanup_distance_deg: 0.5,
            epsilon_deg: DEFAULT_EPSILON_DEG,
        }
    }
}

/// A property set fetched for one region.
#[derive(Debug, Clone)]
pub struct RegionCacheEntry {
    pub bounds: GeoBounds,
    pub properties: Arc<Vec<Property>>,
    pub fetched_at: Instant,
    seq: u64,
}

impl RegionCacheEntry {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) <= ttl
    }
}

#[derive(Debug, Default)]
struct Entries {
    items: Vec<RegionCacheEntry>,
    next_seq: u64,
}

/// In-memory store of fetched property sets keyed by region.
#[derive(Debug)]
pub struct RegionCache {
    config: RegionCacheConfig,
    entries: Mutex<Entries>,
}

impl RegionCache {
    #[must_use]
    pub fn new(config: RegionCacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &RegionCacheConfig {
        &self.config
    }

    /// Freshest live entry whose bounds cover `bounds`, if any.
    #[must_use]
    pub fn get(&self, bounds: &GeoBounds) -> Option<RegionCacheEntry> {
        let now = Instant::now();
        let entries = self.entries.lock();
        let hit = entries
            .items
            .iter()
            .filter(|e| e.is_fresh(self.config.ttl, now))
            .filter(|e| e.bounds.approx_contains(bounds, self.config.epsilon_deg))
            .max_by_key(|e| (e.fetched_at, e.seq))
            .cloned();
        match &hit {
            Some(entry) => trace!(bounds = %bounds, cached = %entry.bounds, "Region cache hit"),
            None => trace!(bounds = %bounds, "Region cache miss"),
        }
        hit
    }

    /// Store the properties fetched for `bounds`, replacing the entry for the
    /// same region if one exists.
    pub fn put(&self, bounds: GeoBounds, properties: Arc<Vec<Property>>) {
        let mut entries = self.entries.lock();
        let seq = entries.next_seq;
        entries.next_seq += 1;
        let entry = RegionCacheEntry {
            bounds,
            properties,
            fetched_at: Instant::now(),
            seq,
        };
        let epsilon = self.config.epsilon_deg;
        match entries
            .items
            .iter_mut()
            .find(|e| e.bounds.approx_eq(&bounds, epsilon))
        {
            Some(existing) => *existing = entry,
            None => entries.items.push(entry),
        }
        debug!(
            bounds = %bounds,
            entries = entries.items.len(),
            "Region cached"
        );
    }

    /// Drop entries whose center is far from the center of `current`.
    ///
    /// Returns the number of entries removed.
    pub fn evict_distant(&self, current: &GeoBounds) -> usize {
        let limit = self.config.cleanup_distance_deg;
        let mut entries = self.entries.lock();
        let before = entries.items.len();
        entries
            .items
            .retain(|e| e.bounds.center_distance(current) <= limit);
        let removed = before - entries.items.len();
        if removed > 0 {
            debug!(removed, remaining = entries.items.len(), "Evicted distant regions");
        }
        removed
    }

    /// Enforce the entry limit, removing least-recently-fetched entries first.
    ///
    /// Returns the number of entries removed.
    pub fn evict_oldest_if_over_capacity(&self) -> usize {
        let mut entries = self.entries.lock();
        let excess = entries.items.len().saturating_sub(self.config.max_entries);
        if excess == 0 {
            return 0;
        }
        entries.items.sort_by_key(|e| (e.fetched_at, e.seq));
        entries.items.drain(..excess);
        debug!(
            removed = excess,
            remaining = entries.items.len(),
            "Evicted oldest regions over capacity"
        );
        excess
    }

    /// Number of stored entries, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds of every stored entry, oldest first.
    #[must_use]
    pub fn regions(&self) -> Vec<GeoBounds> {
        let entries = self.entries.lock();
        let mut items: Vec<_> = entries.items.iter().collect();
        items.sort_by_key(|e| (e.fetched_at, e.seq));
        items.into_iter().map(|e| e.bounds).collect()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.lock().items.clear();
    }
}

impl Default for RegionCache {
    fn default() -> Self {
        Self::new(RegionCacheConfig::default())
    }
}
