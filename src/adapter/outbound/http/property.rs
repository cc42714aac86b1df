//! [`PropertySource`] over the backend's viewport endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::client::build_client;
use super::dto::{PropertyDto, ViewportResponse};
use crate::domain::Property;
use crate::error::{FetchError, Result};
use crate::infrastructure::config::api::ApiConfig;
use crate::port::{PropertySource, ViewportPage, ViewportQuery};

/// `GET {base_url}{viewport_path}?north=..&south=..&east=..&west=..&page=..&limit=..`
pub struct HttpPropertySource {
    http: Client,
    endpoint: Url,
}

impl HttpPropertySource {
    #[must_use]
    pub fn new(http: Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// Build from the `[api]` section.
    ///
    /// # Errors
    ///
    /// Returns an error if base URL and viewport path do not form a URL.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let base = config.base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}{}", config.viewport_path))?;
        let http = build_client(
            Duration::from_millis(config.timeout_ms),
            Duration::from_millis(config.connect_timeout_ms),
        );
        Ok(Self::new(http, endpoint))
    }

    /// Endpoint queried for viewports.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PropertySource for HttpPropertySource {
    async fn fetch_page(
        &self,
        query: &ViewportQuery,
    ) -> std::result::Result<ViewportPage, FetchError> {
        let bounds = query.bounds;
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("north", bounds.north.to_string()),
                ("south", bounds.south.to_string()),
                ("east", bounds.east.to_string()),
                ("west", bounds.west.to_string()),
                ("page", query.page.to_string()),
                ("limit", query.limit.to_string()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        if let Some(err) = status_error(response.status()) {
            if matches!(err, FetchError::RateLimited) {
                warn!(bounds = %bounds, "Property backend rate limited the request");
            }
            return Err(err);
        }

        let body = response.text().await.map_err(transport_error)?;
        let page = decode_page(&body)?;
        debug!(
            bounds = %bounds,
            page = query.page,
            rows = page.rows,
            count = page.properties.len(),
            "Decoded viewport page"
        );
        Ok(page)
    }
}

/// Error for a non-success status, `None` when the body should be read.
fn status_error(status: StatusCode) -> Option<FetchError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Some(FetchError::RateLimited)
    } else if !status.is_success() {
        Some(FetchError::Status(status.as_u16()))
    } else {
        None
    }
}

fn decode_page(body: &str) -> std::result::Result<ViewportPage, FetchError> {
    let decoded: ViewportResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    let rows = decoded.into_listings();
    let count = rows.len();
    let properties: Vec<Property> = rows
        .into_iter()
        .filter_map(PropertyDto::into_domain)
        .collect();
    Ok(ViewportPage {
        properties,
        rows: count,
    })
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_decode() {
        FetchError::Malformed(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        let config = ApiConfig {
            base_url: "https://api.example.com/".into(),
            ..ApiConfig::default()
        };
        let source = HttpPropertySource::from_config(&config).unwrap();
        assert_eq!(
            source.endpoint().as_str(),
            "https://api.example.com/properties/viewport"
        );
    }

    #[test]
    fn rate_limit_and_error_statuses_map_to_fetch_errors() {
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS),
            Some(FetchError::RateLimited)
        );
        assert_eq!(
            status_error(StatusCode::SERVICE_UNAVAILABLE),
            Some(FetchError::Status(503))
        );
        assert_eq!(
            status_error(StatusCode::NOT_FOUND),
            Some(FetchError::Status(404))
        );
        assert_eq!(status_error(StatusCode::OK), None);
    }

    #[test]
    fn undecodable_body_is_malformed() {
        assert!(matches!(
            decode_page(r#"{"error": "boom"}"#),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(decode_page("<html>"), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn page_counts_rows_dropped_while_decoding() {
        let page = decode_page(
            r#"[{"id": 1, "lat": 19.4, "lng": -99.1},
                {"lat": 19.5, "lng": -99.2},
                {"id": "c", "lat": 19.6, "lng": -99.3}]"#,
        )
        .unwrap();
        assert_eq!(page.properties.len(), 2);
        assert_eq!(page.rows, 3);
        assert!(!page.is_last(3));
        assert!(page.is_last(4));
    }
}
