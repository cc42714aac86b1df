//! Property backend API configuration.

use serde::{Deserialize, Serialize};

/// Connection settings for the property backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the backend. Overridden by `PROPVIEW_BASE_URL`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the viewport listing endpoint.
    #[serde(default = "default_viewport_path")]
    pub viewport_path: String,
    /// Whole-request timeout (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// TCP connect timeout (milliseconds).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Properties requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Maximum pages fetched for one viewport.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}

fn default_viewport_path() -> String {
    "/properties/viewport".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    5
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            viewport_path: default_viewport_path(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}
