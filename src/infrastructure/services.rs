//! Composition root shared by every map view and player in the process.
//!
//! One [`Services`] owns the region cache, the circuit breaker, the video
//! URL cache and both request coordinators. Viewport sessions created from
//! it share those, so two map views never double the request budget.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::http::{HttpPropertySource, HttpVideoProbe};
use crate::application::cache::RegionCache;
use crate::application::coordinator::RequestCoordinator;
use crate::application::video::{CircuitBreaker, VideoCoordinator, VideoResolver, VideoUrlCache};
use crate::application::viewport::{ViewportConfig, ViewportCoordinator, ViewportLoader};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{PropertySource, VideoProbe};

/// Shared caches, breaker and coordinators plus the backend adapters.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Services {
    viewport_config: ViewportConfig,
    source: Arc<dyn PropertySource>,
    region_cache: Arc<RegionCache>,
    viewport_coordinator: Arc<ViewportCoordinator>,
    video_coordinator: Arc<VideoCoordinator>,
    breaker: Arc<CircuitBreaker>,
    url_cache: Arc<VideoUrlCache>,
    resolver: Arc<VideoResolver>,
}

impl Services {
    /// Wire services around the given backend collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the video base URL does not parse.
    pub fn create(
        config: &Config,
        source: Arc<dyn PropertySource>,
        probe: Arc<dyn VideoProbe>,
    ) -> Result<Self> {
        let viewport_config = config
            .viewport
            .runtime(config.api.page_size, config.api.max_pages);
        let region_cache = Arc::new(RegionCache::new(
            config.region_cache.runtime(viewport_config.epsilon_deg),
        ));
        let viewport_coordinator = Arc::new(RequestCoordinator::new(config.coordinator.runtime()));
        let video_coordinator = Arc::new(RequestCoordinator::new(config.coordinator.runtime()));
        let breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker.runtime()));
        let url_cache = Arc::new(VideoUrlCache::new(config.video.url_cache_ttl()));
        let resolver = Arc::new(VideoResolver::new(
            config.video_resolver()?,
            probe,
            Arc::clone(&breaker),
            Arc::clone(&url_cache),
            Arc::clone(&video_coordinator),
        ));

        Ok(Self {
            viewport_config,
            source,
            region_cache,
            viewport_coordinator,
            video_coordinator,
            breaker,
            url_cache,
            resolver,
        })
    }

    /// Wire services over the HTTP adapters described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint URL or a probe header is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = Arc::new(HttpPropertySource::from_config(&config.api)?);
        let probe = Arc::new(HttpVideoProbe::from_config(&config.video)?);
        info!(
            endpoint = %source.endpoint(),
            video_base = config.video_base_url(),
            "Services wired over HTTP"
        );
        Self::create(config, source, probe)
    }

    /// New viewport session sharing this process's cache and rate limits.
    #[must_use]
    pub fn viewport_loader(&self) -> ViewportLoader {
        ViewportLoader::new(
            self.viewport_config.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.region_cache),
            Arc::clone(&self.viewport_coordinator),
        )
    }

    #[must_use]
    pub fn video_resolver(&self) -> Arc<VideoResolver> {
        Arc::clone(&self.resolver)
    }

    #[must_use]
    pub fn region_cache(&self) -> &RegionCache {
        &self.region_cache
    }

    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    #[must_use]
    pub fn url_cache(&self) -> &VideoUrlCache {
        &self.url_cache
    }

    /// Cancel pending work and forget all cached state.
    ///
    /// Pending debounces are cancelled and in-flight requests aborted; their
    /// results are never applied.
    pub fn dispose(&self) {
        self.viewport_coordinator.dispose();
        self.video_coordinator.dispose();
        self.region_cache.clear();
        self.url_cache.clear();
        self.breaker.reset();
        info!("Services disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;
    use crate::testkit::domain::{cdmx_bounds, properties};
    use crate::testkit::probe::ScriptedProbe;
    use crate::testkit::source::ScriptedPropertySource;

    fn services(source: Arc<ScriptedPropertySource>) -> Services {
        let config = testkit::config::without_prefetch();
        Services::create(&config, source, Arc::new(ScriptedProbe::new())).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn viewport_sessions_share_cache() {
        let source = Arc::new(ScriptedPropertySource::new().respond(Ok(properties(3))));
        let services = services(Arc::clone(&source));

        let first = services.viewport_loader();
        let second = services.viewport_loader();
        first.load(cdmx_bounds()).await.unwrap();
        let outcome = second.load(cdmx_bounds()).await.unwrap();

        assert_eq!(outcome.properties().unwrap().len(), 3);
        assert_eq!(second.stats().cache_hits, 1);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_clears_shared_state() {
        let source = Arc::new(ScriptedPropertySource::new().respond(Ok(properties(3))));
        let services = services(source);

        services.viewport_loader().load(cdmx_bounds()).await.unwrap();
        services.breaker().record_result("7", false);
        services.dispose();

        assert!(services.region_cache().is_empty());
        assert_eq!(services.breaker().tracked(), 0);
    }
}
