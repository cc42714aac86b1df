//! Propview - viewport-based property loading and resilient video
//! resolution for a real-estate map explorer.
//!
//! The map asks "which properties are in these bounds?" on every pan and
//! zoom; the player asks "is there a video for this property?" on every
//! card. Both questions hit rate-limited backends, so every network path
//! goes through the same discipline: cache first, one request per key in
//! flight, a per-key cooldown, and debounced UI events.
//!
//! # Architecture
//!
//! Hexagonal layout:
//!
//! - [`domain`] - Bounds, listings and video outcomes; no I/O
//! - [`port`] - Traits for the property backend and the video endpoint
//! - [`application`] - Region cache, request coordinator, viewport loader,
//!   circuit breaker and video resolver
//! - [`adapter`] - HTTP implementations of the ports and the CLI
//! - [`infrastructure`] - Configuration, logging and the composition root
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use propview::domain::GeoBounds;
//! use propview::infrastructure::config::settings::Config;
//! use propview::infrastructure::services::Services;
//!
//! # async fn demo() -> propview::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let services = Services::from_config(&config)?;
//! let loader = services.viewport_loader();
//! let outcome = loader
//!     .load(GeoBounds::try_new(19.45, 19.40, -99.10, -99.20)?)
//!     .await?;
//! println!("{} properties", outcome.properties().map_or(0, |p| p.len()));
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
