//! Viewport loading, region cache and request coordination settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::cache::RegionCacheConfig;
use crate::application::coordinator::CoordinatorConfig;
use crate::application::viewport::ViewportConfig;
use crate::domain::DEFAULT_EPSILON_DEG;

/// `[viewport]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewportAppConfig {
    /// Edge tolerance below which bounds count as unchanged (degrees).
    #[serde(default = "default_epsilon_deg")]
    pub epsilon_deg: f64,
    /// Quiet period before a pan is acted on (milliseconds).
    #[serde(default = "default_bounds_debounce_ms")]
    pub bounds_debounce_ms: u64,
    /// Quiet period before a zoom is acted on (milliseconds).
    #[serde(default = "default_zoom_debounce_ms")]
    pub zoom_debounce_ms: u64,
    /// Prefetch a wider region after each network load.
    #[serde(default = "default_prefetch")]
    pub prefetch: bool,
    /// Size of the prefetched region relative to the viewport.
    #[serde(default = "default_prefetch_factor")]
    pub prefetch_factor: f64,
}

fn default_epsilon_deg() -> f64 {
    DEFAULT_EPSILON_DEG
}

fn default_bounds_debounce_ms() -> u64 {
    500
}

fn default_zoom_debounce_ms() -> u64 {
    300
}

fn default_prefetch() -> bool {
    true
}

fn default_prefetch_factor() -> f64 {
    1.5
}

impl Default for ViewportAppConfig {
    fn default() -> Self {
        Self {
            epsilon_deg: default_epsilon_deg(),
            bounds_debounce_ms: default_bounds_debounce_ms(),
            zoom_debounce_ms: default_zoom_debounce_ms(),
            prefetch: default_prefetch(),
            prefetch_factor: default_prefetch_factor(),
        }
    }
}

impl ViewportAppConfig {
    /// Loader configuration, with paging taken from the API section.
    #[must_use]
    pub fn runtime(&self, page_size: u32, max_pages: u32) -> ViewportConfig {
        ViewportConfig {
            epsilon_deg: self.epsilon_deg,
            bounds_debounce: Duration::from_millis(self.bounds_debounce_ms),
            zoom_debounce: Duration::from_millis(self.zoom_debounce_ms),
            page_size,
            max_pages,
            prefetch: self.prefetch,
            prefetch_factor: self.prefetch_factor,
        }
    }
}

/// `[region_cache]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegionCacheAppConfig {
    /// Seconds a fetched region stays fresh.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Regions kept before the oldest is evicted.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Regions whose center is farther than this from the viewport are
    /// evicted (degrees).
    #[serde(default = "default_cleanup_distance_deg")]
    pub cleanup_distance_deg: f64,
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_max_entries() -> usize {
    10
}

fn default_cleanup_distance_deg() -> f64 {
    0.5
}

impl Default for RegionCacheAppConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            cleanup_distance_deg: default_cleanup_distance_deg(),
        }
    }
}

impl RegionCacheAppConfig {
    #[must_use]
    pub fn runtime(&self, epsilon_deg: f64) -> RegionCacheConfig {
        RegionCacheConfig {
            ttl: Duration::from_secs(self.ttl_secs),
            max_entries: self.max_entries,
            cleanup_distance_deg: self.cleanup_distance_deg,
            epsilon_deg,
        }
    }
}

/// `[coordinator]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoordinatorAppConfig {
    /// Minimum time between two requests for the same key (milliseconds).
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

fn default_cooldown_ms() -> u64 {
    2_000
}

impl Default for CoordinatorAppConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl CoordinatorAppConfig {
    #[must_use]
    pub fn runtime(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}
