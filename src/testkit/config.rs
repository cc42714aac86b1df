//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use std::time::Duration;

use crate::application::cache::RegionCacheConfig;
use crate::application::video::CircuitBreakerConfig;
use crate::application::viewport::ViewportConfig;
use crate::infrastructure::config::settings::Config;

/// Default configuration with prefetch disabled, so source call counts only
/// reflect viewport loads.
pub fn without_prefetch() -> Config {
    let mut config = Config::default();
    config.viewport.prefetch = false;
    config
}

/// Viewport loader config with prefetch disabled.
pub fn viewport() -> ViewportConfig {
    ViewportConfig {
        prefetch: false,
        ..ViewportConfig::default()
    }
}

/// Region cache holding at most `max_entries` regions.
pub fn region_cache(max_entries: usize) -> RegionCacheConfig {
    RegionCacheConfig {
        max_entries,
        ..RegionCacheConfig::default()
    }
}

/// Breaker that trips on the first failure and cools down in one second.
pub fn hair_trigger_breaker() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        max_failures: 1,
        cooldown: Duration::from_secs(1),
    }
}
