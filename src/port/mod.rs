//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!   MapView ──► ViewportLoader ──► PropertySource ──► property backend
//!   Player  ──► VideoResolver  ──► VideoProbe     ──► video endpoint
//! ```
//!
//! # Available Ports
//!
//! - [`PropertySource`] - Properties inside a viewport rectangle
//! - [`VideoProbe`] - Lightweight existence check of a video URL

pub mod outbound;

pub use outbound::property::{PropertySource, ViewportPage, ViewportQuery};
pub use outbound::video::{ProbeResponse, VideoProbe};
