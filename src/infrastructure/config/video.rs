//! Video endpoint and circuit breaker settings.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::video::CircuitBreakerConfig;

/// `[video]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoAppConfig {
    /// Base URL of the video endpoint. Falls back to `api.base_url`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Path of a video stream; `{id}` is replaced by the resource id.
    #[serde(default = "default_path_template")]
    pub path_template: String,
    /// Upper bound on one existence probe (milliseconds).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Seconds a resolved URL stays cached. Failures stay half as long.
    #[serde(default = "default_url_cache_ttl_secs")]
    pub url_cache_ttl_secs: u64,
    /// Extra headers sent with every probe.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Bearer token for the video endpoint.
    ///
    /// Loaded from `PROPVIEW_VIDEO_TOKEN`, never from the config file.
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_path_template() -> String {
    "/videos/{id}/stream".into()
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

fn default_url_cache_ttl_secs() -> u64 {
    300
}

impl Default for VideoAppConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            path_template: default_path_template(),
            probe_timeout_ms: default_probe_timeout_ms(),
            url_cache_ttl_secs: default_url_cache_ttl_secs(),
            headers: BTreeMap::new(),
            token: None,
        }
    }
}

impl VideoAppConfig {
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    #[must_use]
    pub fn url_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.url_cache_ttl_secs)
    }
}

/// `[circuit_breaker]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CircuitBreakerAppConfig {
    /// Consecutive failures that open the circuit for a video.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    /// Seconds an open circuit blocks probes.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

fn default_max_failures() -> u32 {
    3
}

fn default_cooldown_secs() -> u64 {
    30
}

impl Default for CircuitBreakerAppConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl CircuitBreakerAppConfig {
    #[must_use]
    pub fn runtime(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            max_failures: self.max_failures,
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }
}
