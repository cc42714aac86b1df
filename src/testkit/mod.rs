//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`source`] - Scripted [`PropertySource`](crate::port::PropertySource)
//!   that counts calls and records requested pages.
//! - [`probe`] - Scripted [`VideoProbe`](crate::port::VideoProbe) with
//!   optional latency.
//! - [`domain`] - Builders for bounds and listings.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod domain;
pub mod probe;
pub mod source;
