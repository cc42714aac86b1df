//! Viewport loader: which properties are visible in these bounds, now.
//!
//! Decides between the region cache and a backend fetch, routes fetches
//! through the shared [`RequestCoordinator`], and applies results only when
//! they belong to the latest requested bounds.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::state::{
    Counters, DataOrigin, PropertySet, ViewportOutcome, ViewportState, ViewportStats,
};
use crate::application::cache::RegionCache;
use crate::application::coordinator::{
    Admission, DebounceTicket, RequestCoordinator, SharedRequest,
};
use crate::domain::{merge_for_display, GeoBounds, Property, DEFAULT_EPSILON_DEG};
use crate::error::{FetchError, Result};
use crate::port::{PropertySource, ViewportQuery};

/// Coordinator type used for viewport fetches.
pub type ViewportCoordinator = RequestCoordinator<PropertySet, FetchError>;

const BOUNDS_DEBOUNCE_KEY: &str = "viewport:bounds";
const ZOOM_DEBOUNCE_KEY: &str = "viewport:zoom";

/// Runtime configuration for [`ViewportLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    /// Bounds closer than this on every edge do not trigger a reload.
    pub epsilon_deg: f64,
    /// Quiet period before a bounds change is acted on.
    pub bounds_debounce: Duration,
    /// Quiet period before a zoom change is acted on.
    pub zoom_debounce: Duration,
    /// Properties requested per backend page.
    pub page_size: u32,
    /// Pages fetched at most per region.
    pub max_pages: u32,
    /// Prefetch a wider region after each network load.
    pub prefetch: bool,
    /// Scale of the prefetched region relative to the viewport.
    pub prefetch_factor: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            epsilon_deg: DEFAULT_EPSILON_DEG,
            bounds_debounce: Duration::from_millis(500),
            zoom_debounce: Duration::from_millis(300),
            page_size: 100,
            max_pages: 5,
            prefetch: true,
            prefetch_factor: 1.5,
        }
    }
}

#[derive(Default)]
struct Session {
    last_bounds: Option<GeoBounds>,
    generation: u64,
    last_good: Option<PropertySet>,
    /// Request behind the current `Loading` state.
    loading: Option<SharedRequest<PropertySet, FetchError>>,
}

enum LoadStart {
    /// Bounds within epsilon of a load still running: wait for it.
    Join {
        generation: u64,
        bounds: GeoBounds,
        request: SharedRequest<PropertySet, FetchError>,
    },
    Fresh {
        generation: u64,
    },
}

struct LoaderInner {
    config: ViewportConfig,
    source: Arc<dyn PropertySource>,
    cache: Arc<RegionCache>,
    coordinator: Arc<ViewportCoordinator>,
    session: Mutex<Session>,
    state: watch::Sender<ViewportState>,
    counters: Counters,
}

/// Viewport session over shared cache and coordinator.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct ViewportLoader {
    inner: Arc<LoaderInner>,
}

impl ViewportLoader {
    #[must_use]
    pub fn new(
        config: ViewportConfig,
        source: Arc<dyn PropertySource>,
        cache: Arc<RegionCache>,
        coordinator: Arc<ViewportCoordinator>,
    ) -> Self {
        let (state, _) = watch::channel(ViewportState::Idle);
        Self {
            inner: Arc::new(LoaderInner {
                config,
                source,
                cache,
                coordinator,
                session: Mutex::new(Session::default()),
                state,
                counters: Counters::default(),
            }),
        }
    }

    /// Properties visible in `bounds`.
    ///
    /// Serves the region cache when it can (cache hits do not consume the
    /// rate limit), otherwise fetches through the coordinator. Transient
    /// failures and rate limiting come back as outcomes carrying the last
    /// good property set.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid bounds or a malformed backend response.
    pub async fn load(&self, bounds: GeoBounds) -> Result<ViewportOutcome> {
        bounds.validate()?;
        let inner = &self.inner;
        let epsilon = inner.config.epsilon_deg;

        let start = {
            let mut session = inner.session.lock();
            let unchanged = session
                .last_bounds
                .filter(|last| last.approx_eq(&bounds, epsilon));
            match (unchanged, session.loading.clone()) {
                (Some(loading_bounds), Some(request)) => {
                    Counters::bump(&inner.counters.unchanged);
                    debug!(bounds = %bounds, "Bounds unchanged while loading, joining running fetch");
                    LoadStart::Join {
                        generation: session.generation,
                        bounds: loading_bounds,
                        request,
                    }
                }
                (Some(_), None) if matches!(*inner.state.borrow(), ViewportState::Ready { .. }) => {
                    Counters::bump(&inner.counters.unchanged);
                    return Ok(ViewportOutcome::Unchanged {
                        properties: session.last_good.clone(),
                    });
                }
                _ => {
                    session.last_bounds = Some(bounds);
                    session.generation += 1;
                    session.loading = None;
                    inner.state.send_replace(ViewportState::Idle);
                    LoadStart::Fresh {
                        generation: session.generation,
                    }
                }
            }
        };

        let (generation, bounds, request, joined) = match start {
            LoadStart::Join {
                generation,
                bounds,
                request,
            } => (generation, bounds, request, true),
            LoadStart::Fresh { generation } => {
                if let Some(entry) = inner.cache.get(&bounds) {
                    Counters::bump(&inner.counters.cache_hits);
                    debug!(bounds = %bounds, count = entry.properties.len(), "Viewport served from cache");
                    return Ok(self.apply_ready(
                        generation,
                        bounds,
                        entry.properties,
                        DataOrigin::Cache,
                    ));
                }

                let key = bounds.region_key(epsilon);
                let job = self.region_fetch(bounds);
                let request = match inner
                    .coordinator
                    .acquire_or_join(key.as_str(), move || job.run())
                {
                    Admission::Joined(request) => {
                        debug!(bounds = %bounds, "Joining in-flight viewport fetch");
                        request
                    }
                    Admission::Started(request) => {
                        Counters::bump(&inner.counters.fetches);
                        request
                    }
                    Admission::Refused => {
                        Counters::bump(&inner.counters.rate_limited);
                        let retry_after = inner.coordinator.retry_after(key.as_str());
                        warn!(bounds = %bounds, "Viewport fetch rate limited, serving last known data");
                        return Ok(ViewportOutcome::RateLimited {
                            retry_after,
                            fallback: inner.session.lock().last_good.clone(),
                        });
                    }
                };

                let mut session = inner.session.lock();
                if session.generation == generation {
                    session.loading = Some(request.clone());
                    inner.state.send_replace(ViewportState::Loading { bounds });
                }
                drop(session);
                (generation, bounds, request, false)
            }
        };

        let result = request.await;
        let mut session = inner.session.lock();
        if session.generation != generation {
            Counters::bump(&inner.counters.superseded);
            debug!(bounds = %bounds, "Discarding result for superseded bounds");
            return Ok(ViewportOutcome::Superseded);
        }
        session.loading = None;

        match result {
            Ok(properties) => {
                drop(session);
                let outcome = self.apply_ready(generation, bounds, properties, DataOrigin::Network);
                if inner.config.prefetch && !joined && !matches!(outcome, ViewportOutcome::Superseded)
                {
                    self.prefetch_around(bounds);
                }
                Ok(outcome)
            }
            Err(err) => {
                Counters::bump(&inner.counters.failures);
                let fallback = session.last_good.clone();
                inner.state.send_replace(ViewportState::Error {
                    bounds,
                    error: err.clone(),
                    last_good: fallback.clone(),
                });
                drop(session);
                if err.is_transient() {
                    warn!(bounds = %bounds, error = %err, "Viewport fetch failed, keeping last known data");
                    Ok(ViewportOutcome::Failed {
                        error: err,
                        fallback,
                    })
                } else {
                    error!(bounds = %bounds, error = %err, "Viewport fetch returned unusable data");
                    Err(err.into())
                }
            }
        }
    }

    /// Debounced reaction to the map reporting new bounds.
    pub fn on_bounds_changed(&self, bounds: GeoBounds) -> DebounceTicket {
        let loader = self.clone();
        self.inner.coordinator.debounce(
            BOUNDS_DEBOUNCE_KEY,
            self.inner.config.bounds_debounce,
            move || async move {
                if let Err(err) = loader.load(bounds).await {
                    error!(error = %err, "Debounced viewport load failed");
                }
            },
        )
    }

    /// Debounced reaction to a zoom change. Distant regions are evicted
    /// before loading.
    pub fn on_zoom_changed(&self, bounds: GeoBounds) -> DebounceTicket {
        let loader = self.clone();
        self.inner.coordinator.debounce(
            ZOOM_DEBOUNCE_KEY,
            self.inner.config.zoom_debounce,
            move || async move {
                loader.inner.cache.evict_distant(&bounds);
                if let Err(err) = loader.load(bounds).await {
                    error!(error = %err, "Debounced zoom load failed");
                }
            },
        )
    }

    /// Watch state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewportState> {
        self.inner.state.subscribe()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ViewportState {
        self.inner.state.borrow().clone()
    }

    /// Last successfully loaded property set.
    #[must_use]
    pub fn visible(&self) -> Option<PropertySet> {
        self.inner.session.lock().last_good.clone()
    }

    /// Visible properties ready for markers: displayable and unique by id.
    #[must_use]
    pub fn markers(&self) -> Vec<Property> {
        self.visible()
            .map(|set| merge_for_display(set.iter()))
            .unwrap_or_default()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> ViewportStats {
        self.inner.counters.snapshot()
    }

    /// Forget the session: bounds, last good data and state.
    pub fn reset(&self) {
        let mut session = self.inner.session.lock();
        *session = Session {
            generation: session.generation + 1,
            ..Session::default()
        };
        self.inner.state.send_replace(ViewportState::Idle);
    }

    fn apply_ready(
        &self,
        generation: u64,
        bounds: GeoBounds,
        properties: PropertySet,
        origin: DataOrigin,
    ) -> ViewportOutcome {
        let inner = &self.inner;
        {
            let mut session = inner.session.lock();
            if session.generation != generation {
                Counters::bump(&inner.counters.superseded);
                return ViewportOutcome::Superseded;
            }
            session.last_good = Some(Arc::clone(&properties));
            inner.state.send_replace(ViewportState::Ready {
                bounds,
                properties: Arc::clone(&properties),
                origin,
            });
        }
        inner.cache.evict_distant(&bounds);
        inner.cache.evict_oldest_if_over_capacity();
        inner.coordinator.gc();
        ViewportOutcome::Ready { properties, origin }
    }

    fn region_fetch(&self, bounds: GeoBounds) -> RegionFetch {
        RegionFetch {
            source: Arc::clone(&self.inner.source),
            cache: Arc::clone(&self.inner.cache),
            bounds,
            page_size: self.inner.config.page_size,
            max_pages: self.inner.config.max_pages,
        }
    }

    /// Fetch a wider region in the background so short pans hit the cache.
    fn prefetch_around(&self, bounds: GeoBounds) {
        let inner = &self.inner;
        let epsilon = inner.config.epsilon_deg;
        let wider = bounds.expanded(inner.config.prefetch_factor);
        if wider.approx_eq(&bounds, epsilon) || inner.cache.get(&wider).is_some() {
            return;
        }
        let key = wider.region_key(epsilon);
        let job = self.region_fetch(wider);
        // The fetch runs detached and stores into the cache on success.
        if let Admission::Started(_) = inner
            .coordinator
            .acquire_or_join(key.as_str(), move || job.run())
        {
            Counters::bump(&inner.counters.prefetches);
            debug!(bounds = %wider, "Prefetching surrounding region");
        }
    }
}

/// Paged fetch of one region, owning everything it needs to run detached.
struct RegionFetch {
    source: Arc<dyn PropertySource>,
    cache: Arc<RegionCache>,
    bounds: GeoBounds,
    page_size: u32,
    max_pages: u32,
}

impl RegionFetch {
    async fn run(self) -> std::result::Result<PropertySet, FetchError> {
        let bounds = self.bounds;
        let mut properties = Vec::new();
        for page in 0..self.max_pages.max(1) {
            let query = ViewportQuery {
                bounds,
                page,
                limit: self.page_size,
            };
            let batch = self.source.fetch_page(&query).await.map_err(|err| {
                debug!(bounds = %bounds, page, error = %err, "Viewport page fetch failed");
                err
            })?;
            // Judged on raw rows: dropped listings do not end the paging.
            let last_page = batch.is_last(self.page_size);
            properties.extend(batch.properties);
            if last_page {
                break;
            }
        }

        let properties = Arc::new(properties);
        self.cache.put(bounds, Arc::clone(&properties));
        info!(bounds = %bounds, count = properties.len(), "Fetched viewport properties");
        Ok(properties)
    }
}
