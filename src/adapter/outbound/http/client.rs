//! Shared `reqwest` client construction.

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

/// Build an HTTP client with request and connect timeouts.
///
/// Falls back to a default client if the builder fails (for instance when
/// the TLS backend cannot initialize).
#[must_use]
pub fn build_client(timeout: Duration, connect_timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .user_agent(concat!("propview/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|err| {
            warn!(error = %err, "Failed to build HTTP client, using defaults");
            Client::new()
        })
}
