//! Viewport loading: cache-or-fetch decisions for the visible map region.

pub mod loader;
pub mod state;

pub use loader::{ViewportConfig, ViewportCoordinator, ViewportLoader};
pub use state::{DataOrigin, PropertySet, ViewportOutcome, ViewportState, ViewportStats};
