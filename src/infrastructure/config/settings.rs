//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file, every section optional, with
//! environment variable overrides for the backend URL and the video token.
//!
//! # Example
//!
//! ```no_run
//! use propview::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use super::api::ApiConfig;
use super::logging::LoggingConfig;
use super::video::{CircuitBreakerAppConfig, VideoAppConfig};
use super::viewport::{CoordinatorAppConfig, RegionCacheAppConfig, ViewportAppConfig};
use crate::application::video::VideoResolverConfig;
use crate::error::{ConfigError, Result};

/// Overrides `api.base_url`.
pub const BASE_URL_ENV: &str = "PROPVIEW_BASE_URL";
/// Bearer token attached to video probes.
pub const VIDEO_TOKEN_ENV: &str = "PROPVIEW_VIDEO_TOKEN";

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. An empty document yields the defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Property backend connection.
    #[serde(default)]
    pub api: ApiConfig,

    /// Viewport change handling and prefetch.
    #[serde(default)]
    pub viewport: ViewportAppConfig,

    /// Region cache freshness and size.
    #[serde(default)]
    pub region_cache: RegionCacheAppConfig,

    /// Per-key request cooldown shared by all network paths.
    #[serde(default)]
    pub coordinator: CoordinatorAppConfig,

    /// Video endpoint.
    #[serde(default)]
    pub video: VideoAppConfig,

    /// Per-video circuit breaker.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerAppConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Applies environment overrides before validating.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = base_url;
        }
        if let Some(token) = lookup(VIDEO_TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            self.video.token = Some(token);
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] or [`ConfigError::InvalidValue`]
    /// for the first offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "base_url" }.into());
        }
        parse_url("base_url", &self.api.base_url)?;
        if !self.api.viewport_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "viewport_path",
                reason: "must start with '/'".to_string(),
            }
            .into());
        }
        if self.api.timeout_ms == 0 || self.api.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "timeouts must be greater than 0".to_string(),
            }
            .into());
        }
        if self.api.page_size == 0 || self.api.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: "page_size and max_pages must be greater than 0".to_string(),
            }
            .into());
        }

        let viewport = &self.viewport;
        if !(viewport.epsilon_deg.is_finite() && viewport.epsilon_deg > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "epsilon_deg",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if viewport.bounds_debounce_ms == 0 || viewport.zoom_debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "debounce_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !(viewport.prefetch_factor.is_finite() && viewport.prefetch_factor >= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "prefetch_factor",
                reason: "must be >= 1.0".to_string(),
            }
            .into());
        }

        let cache = &self.region_cache;
        if cache.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ttl_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if cache.max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_entries",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !(cache.cleanup_distance_deg.is_finite() && cache.cleanup_distance_deg > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "cleanup_distance_deg",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.coordinator.cooldown_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cooldown_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if let Some(base_url) = &self.video.base_url {
            parse_url("video.base_url", base_url)?;
        }
        if !self.video.path_template.contains("{id}") {
            return Err(ConfigError::InvalidValue {
                field: "path_template",
                reason: "must contain the {id} placeholder".to_string(),
            }
            .into());
        }
        if self.video.probe_timeout_ms == 0 || self.video.url_cache_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "video",
                reason: "probe_timeout_ms and url_cache_ttl_secs must be greater than 0"
                    .to_string(),
            }
            .into());
        }

        if self.circuit_breaker.max_failures == 0 || self.circuit_breaker.cooldown_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "circuit_breaker",
                reason: "max_failures and cooldown_secs must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Base URL of the video endpoint, falling back to the backend URL.
    #[must_use]
    pub fn video_base_url(&self) -> &str {
        self.video.base_url.as_deref().unwrap_or(&self.api.base_url)
    }

    /// Resolver configuration derived from the `[video]` section.
    ///
    /// # Errors
    ///
    /// Returns an error if the video base URL does not parse.
    pub fn video_resolver(&self) -> Result<VideoResolverConfig> {
        Ok(VideoResolverConfig {
            base_url: Url::parse(self.video_base_url())?,
            path_template: self.video.path_template.clone(),
            probe_timeout: self.video.probe_timeout(),
        })
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|err| {
        ConfigError::InvalidValue {
            field,
            reason: err.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn parse(content: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_overrides(|_| None);
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.api.page_size, 100);
        assert_eq!(config.region_cache.max_entries, 10);
        assert_eq!(config.coordinator.cooldown_ms, 2_000);
        assert_eq!(config.circuit_breaker.max_failures, 3);
        assert_eq!(config.video.path_template, "/videos/{id}/stream");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn video_base_url_falls_back_to_api() {
        let config = parse("[api]\nbase_url = \"https://api.example.com\"\n").unwrap();
        assert_eq!(config.video_base_url(), "https://api.example.com");

        let config = parse(
            "[api]\nbase_url = \"https://api.example.com\"\n\
             [video]\nbase_url = \"https://cdn.example.com\"\n",
        )
        .unwrap();
        assert_eq!(config.video_base_url(), "https://cdn.example.com");
    }

    #[test]
    fn overrides_replace_base_url_and_set_token() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            BASE_URL_ENV => Some("https://staging.example.com".into()),
            VIDEO_TOKEN_ENV => Some("secret".into()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "https://staging.example.com");
        assert_eq!(config.video.token.as_deref(), Some("secret"));
    }

    #[test]
    fn blank_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some("  ".into()));
        assert_eq!(config.api.base_url, ApiConfig::default().base_url);
        assert!(config.video.token.is_none());
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let err = parse("[video]\npath_template = \"/videos/stream\"\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "path_template",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_capacity_and_bad_factor() {
        assert!(parse("[region_cache]\nmax_entries = 0\n").is_err());
        assert!(parse("[viewport]\nprefetch_factor = 0.5\n").is_err());
        assert!(parse("[viewport]\nepsilon_deg = 0.0\n").is_err());
        assert!(parse("[coordinator]\ncooldown_ms = 0\n").is_err());
    }

    #[test]
    fn rejects_unparsable_base_url() {
        let err = parse("[api]\nbase_url = \"not a url\"\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "base_url",
                ..
            })
        ));
    }

    #[test]
    fn token_is_never_serialized() {
        let mut config = Config::default();
        config.video.token = Some("secret".into());
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn resolver_config_uses_video_section() {
        let config = parse("[video]\nprobe_timeout_ms = 1500\n").unwrap();
        let resolver = config.video_resolver().unwrap();
        assert_eq!(resolver.probe_timeout.as_millis(), 1500);
        assert_eq!(resolver.path_template, "/videos/{id}/stream");
    }
}
