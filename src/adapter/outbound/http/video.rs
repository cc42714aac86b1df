//! [`VideoProbe`] issuing `HEAD` requests.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::trace;
use url::Url;

use super::client::build_client;
use super::interceptor::{BearerToken, HeaderInterceptor, ProbeInterceptor};
use crate::error::{ProbeError, Result};
use crate::infrastructure::config::video::VideoAppConfig;
use crate::port::{ProbeResponse, VideoProbe};

/// Header set by the video endpoint when it serves a substitute video.
pub const FALLBACK_HEADER: &str = "x-video-fallback";

/// Existence check of a video URL with a `HEAD` request.
pub struct HttpVideoProbe {
    http: Client,
    interceptors: Vec<Arc<dyn ProbeInterceptor>>,
}

impl HttpVideoProbe {
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self {
            http,
            interceptors: Vec::new(),
        }
    }

    /// Build from the `[video]` section: configured headers first, then the
    /// bearer token if one was provided.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured header is invalid.
    pub fn from_config(config: &VideoAppConfig) -> Result<Self> {
        let timeout = config.probe_timeout();
        let mut probe = Self::new(build_client(timeout, timeout));
        let headers = HeaderInterceptor::from_map(&config.headers)?;
        if !headers.is_empty() {
            probe = probe.with_interceptor(Arc::new(headers));
        }
        if let Some(token) = &config.token {
            probe = probe.with_interceptor(Arc::new(BearerToken::new(token.clone())));
        }
        Ok(probe)
    }

    /// Append an interceptor.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn ProbeInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    fn request(&self, url: &Url) -> reqwest::RequestBuilder {
        self.interceptors
            .iter()
            .fold(self.http.head(url.clone()), |req, i| i.intercept(req))
    }
}

#[async_trait]
impl VideoProbe for HttpVideoProbe {
    async fn probe(&self, url: &Url) -> std::result::Result<ProbeResponse, ProbeError> {
        let response = self.request(url).send().await.map_err(|err| {
            if err.is_timeout() {
                ProbeError::Timeout
            } else {
                ProbeError::Network(err.to_string())
            }
        })?;
        let status = response.status().as_u16();
        let fallback = is_fallback(response.headers());
        trace!(url = %url, status, fallback, "Video probe answered");
        Ok(ProbeResponse { status, fallback })
    }
}

/// Whether the fallback header carries a truthy value (`1` or `true`).
#[must_use]
pub fn is_fallback(headers: &HeaderMap) -> bool {
    headers
        .get(FALLBACK_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
