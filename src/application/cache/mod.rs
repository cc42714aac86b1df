//! Application-level caches.

pub mod region;

pub use region::{RegionCache, RegionCacheConfig, RegionCacheEntry};
