//! I/O-free domain types for the map explorer.
//!
//! - [`bounds`] - Viewport rectangles and the region keys derived from them
//! - [`property`] - Property listings as the map sees them
//! - [`video`] - Video resource ids and resolution outcomes
//! - [`error`] - Validation errors for the types above

pub mod bounds;
pub mod error;
pub mod property;
pub mod video;

pub use bounds::{GeoBounds, RegionKey, DEFAULT_EPSILON_DEG};
pub use error::DomainError;
pub use property::{merge_for_display, Property, PropertyId};
pub use video::{FailureKind, RateLimitSource, ResolveFailure, VideoId, VideoResolution};
