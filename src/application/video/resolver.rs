//! Video URL resolution with circuit breaking, caching and probe dedup.
//!
//! ```text
//! resolve(id)
//!   ├─ invalid id ─────────────────────► InvalidId (no I/O)
//!   ├─ circuit open ───────────────────► CircuitOpen { retry_after }
//!   ├─ fresh cache entry ──────────────► cached outcome
//!   ├─ probe in flight ────────────────► join it
//!   ├─ cooldown active ────────────────► RateLimited { Local }
//!   └─ probe (with timeout)
//!        2xx  → breaker ok,   cache,          exists = true
//!        404  → breaker ok,   cache,          exists = false
//!        429  → breaker fail, no cache,       RateLimited { Server }
//!        5xx  → breaker fail, cache ttl / 2,  Upstream
//!        timeout / network → breaker fail, cache ttl / 2
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinError;
use tracing::{debug, info, warn};
use url::Url;

use super::breaker::CircuitBreaker;
use super::url_cache::{CachedOutcome, VideoUrlCache, VideoUrlCacheEntry};
use crate::application::coordinator::{Admission, RequestCoordinator};
use crate::domain::{RateLimitSource, ResolveFailure, VideoId, VideoResolution};
use crate::error::ProbeError;
use crate::port::{ProbeResponse, VideoProbe};

/// Coordinator type used for video probes.
pub type VideoCoordinator = RequestCoordinator<VideoResolution, ResolveFailure>;

/// Runtime configuration for [`VideoResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoResolverConfig {
    /// Base URL of the video endpoint.
    pub base_url: Url,
    /// Path appended to the base URL; `{id}` is replaced by the resource id.
    pub path_template: String,
    /// Upper bound on a single existence probe.
    pub probe_timeout: Duration,
}

impl From<JoinError> for ResolveFailure {
    fn from(err: JoinError) -> Self {
        Self::Network {
            reason: format!("probe task aborted: {err}"),
        }
    }
}

/// Hands the player a checked URL for a video resource.
pub struct VideoResolver {
    config: VideoResolverConfig,
    probe: Arc<dyn VideoProbe>,
    breaker: Arc<CircuitBreaker>,
    cache: Arc<VideoUrlCache>,
    coordinator: Arc<VideoCoordinator>,
}

impl VideoResolver {
    #[must_use]
    pub fn new(
        config: VideoResolverConfig,
        probe: Arc<dyn VideoProbe>,
        breaker: Arc<CircuitBreaker>,
        cache: Arc<VideoUrlCache>,
        coordinator: Arc<VideoCoordinator>,
    ) -> Self {
        Self {
            config,
            probe,
            breaker,
            cache,
            coordinator,
        }
    }

    /// Streaming URL for `id`, without any check.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL and template do not form
    /// a valid URL.
    pub fn url_for(&self, id: VideoId) -> Result<Url, url::ParseError> {
        let path = self.config.path_template.replace("{id}", &id.to_string());
        let base = self.config.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
    }

    /// Resolve the video for a resource id coming from the UI.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveFailure`] for every condition in which the player
    /// should not load the video now. A confirmed missing video is not a
    /// failure: it resolves with `exists == false`.
    pub async fn resolve(&self, resource_id: &str) -> Result<VideoResolution, ResolveFailure> {
        let id = VideoId::parse(resource_id).map_err(|_| ResolveFailure::InvalidId {
            input: resource_id.to_string(),
        })?;

        let check = self.breaker.check_can_proceed(&id.to_string());
        if !check.can_proceed {
            let failure = ResolveFailure::CircuitOpen {
                retry_after: check.retry_after.unwrap_or_default(),
            };
            debug!(
                video = %id,
                retry_after_secs = failure.retry_after_secs().unwrap_or_default(),
                "Circuit open, not probing"
            );
            return Err(failure);
        }

        self.cache.purge_expired();
        if let Some(entry) = self.cache.get(id) {
            debug!(video = %id, "Video URL cache hit");
            return from_cache(entry);
        }

        let url = self.url_for(id).map_err(|_| ResolveFailure::InvalidId {
            input: resource_id.to_string(),
        })?;
        let task = ProbeTask {
            id,
            url,
            timeout: self.config.probe_timeout,
            probe: Arc::clone(&self.probe),
            breaker: Arc::clone(&self.breaker),
            cache: Arc::clone(&self.cache),
        };
        let key = id.request_key();
        self.coordinator.gc();
        match self.coordinator.acquire_or_join(&key, move || task.run()) {
            Admission::Joined(request) | Admission::Started(request) => request.await,
            Admission::Refused => {
                let retry_after = self.coordinator.retry_after(&key);
                debug!(video = %id, "Probe cooldown active");
                Err(ResolveFailure::RateLimited {
                    origin: RateLimitSource::Local,
                    retry_after,
                })
            }
        }
    }

    /// Drop the cached resolution for `id`, forcing the next call to probe.
    pub fn invalidate(&self, id: VideoId) {
        self.cache.invalidate(id);
    }

    /// Circuit breaker shared with other resolvers.
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

fn from_cache(entry: VideoUrlCacheEntry) -> Result<VideoResolution, ResolveFailure> {
    let resolution = |exists, fallback| VideoResolution {
        id: entry.id,
        url: entry.url.clone(),
        exists,
        fallback,
        cached: true,
    };
    match &entry.outcome {
        CachedOutcome::Available { fallback } => Ok(resolution(true, *fallback)),
        CachedOutcome::Missing => Ok(resolution(false, false)),
        CachedOutcome::Failed(failure) => Err(failure.clone()),
    }
}

/// One probe, owning everything it needs to run detached from the caller.
struct ProbeTask {
    id: VideoId,
    url: Url,
    timeout: Duration,
    probe: Arc<dyn VideoProbe>,
    breaker: Arc<CircuitBreaker>,
    cache: Arc<VideoUrlCache>,
}

impl ProbeTask {
    async fn run(self) -> Result<VideoResolution, ResolveFailure> {
        let result = match tokio::time::timeout(self.timeout, self.probe.probe(&self.url)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout),
        };
        match result {
            Ok(response) => self.interpret(response),
            Err(err) => {
                let failure = match err {
                    ProbeError::Timeout => ResolveFailure::Timeout,
                    ProbeError::Network(reason) | ProbeError::Aborted(reason) => {
                        ResolveFailure::Network { reason }
                    }
                };
                warn!(video = %self.id, error = %failure, "Video probe failed");
                Err(self.fail_and_cache(failure))
            }
        }
    }

    fn interpret(&self, response: ProbeResponse) -> Result<VideoResolution, ResolveFailure> {
        let key = self.id.to_string();
        match response.status {
            200..=299 => {
                self.breaker.record_result(&key, true);
                self.cache.insert(
                    self.id,
                    self.url.clone(),
                    CachedOutcome::Available {
                        fallback: response.fallback,
                    },
                );
                info!(video = %self.id, fallback = response.fallback, "Video available");
                Ok(self.resolution(true, response.fallback))
            }
            404 => {
                self.breaker.record_result(&key, true);
                self.cache
                    .insert(self.id, self.url.clone(), CachedOutcome::Missing);
                debug!(video = %self.id, "Video not found");
                Ok(self.resolution(false, false))
            }
            429 => {
                self.breaker.record_result(&key, false);
                warn!(video = %self.id, "Video endpoint rate limited the probe");
                Err(ResolveFailure::RateLimited {
                    origin: RateLimitSource::Server,
                    retry_after: None,
                })
            }
            status => {
                warn!(video = %self.id, status, "Video probe returned error status");
                Err(self.fail_and_cache(ResolveFailure::Upstream { status }))
            }
        }
    }

    fn fail_and_cache(&self, failure: ResolveFailure) -> ResolveFailure {
        self.breaker.record_result(&self.id.to_string(), false);
        self.cache.insert(
            self.id,
            self.url.clone(),
            CachedOutcome::Failed(failure.clone()),
        );
        failure
    }

    fn resolution(&self, exists: bool, fallback: bool) -> VideoResolution {
        VideoResolution {
            id: self.id,
            url: self.url.clone(),
            exists,
            fallback,
            cached: false,
        }
    }
}
