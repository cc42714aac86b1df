//! Video delivery resilience: circuit breaker, URL cache and resolver.

pub mod breaker;
pub mod resolver;
pub mod url_cache;

pub use breaker::{BreakerCheck, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use resolver::{VideoCoordinator, VideoResolver, VideoResolverConfig};
pub use url_cache::{CachedOutcome, VideoUrlCache, VideoUrlCacheEntry};
