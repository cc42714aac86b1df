//! Request decoration for video probes.
//!
//! Interceptors are composed per probe instance; nothing is installed
//! globally, so two probes in one process can carry different credentials.

use std::collections::BTreeMap;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::RequestBuilder;

use crate::error::{ConfigError, Result};

/// Applied to every outgoing probe request, in registration order.
pub trait ProbeInterceptor: Send + Sync {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder;
}

/// Adds a fixed set of headers.
#[derive(Debug, Clone, Default)]
pub struct HeaderInterceptor {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderInterceptor {
    /// Build from configured name/value pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a name or value is not a
    /// valid HTTP header.
    pub fn from_map(headers: &BTreeMap<String, String>) -> Result<Self> {
        let headers = headers
            .iter()
            .map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    ConfigError::InvalidValue {
                        field: "video.headers",
                        reason: format!("{name}: {e}"),
                    }
                })?;
                let value =
                    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidValue {
                        field: "video.headers",
                        reason: format!("{}: {e}", name.as_str()),
                    })?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { headers })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl ProbeInterceptor for HeaderInterceptor {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        self.headers
            .iter()
            .fold(request, |req, (name, value)| req.header(name, value))
    }
}

/// Adds `Authorization: Bearer <token>`.
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

impl ProbeInterceptor for BearerToken {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(interceptor: &dyn ProbeInterceptor) -> reqwest::Request {
        let client = reqwest::Client::new();
        interceptor
            .intercept(client.head("https://cdn.example.com/videos/1/stream"))
            .build()
            .unwrap()
    }

    #[test]
    fn header_interceptor_sets_configured_headers() {
        let mut map = BTreeMap::new();
        map.insert("x-client".to_string(), "map-explorer".to_string());
        let interceptor = HeaderInterceptor::from_map(&map).unwrap();

        let request = apply(&interceptor);
        assert_eq!(request.headers()["x-client"], "map-explorer");
    }

    #[test]
    fn invalid_header_name_is_a_config_error() {
        let mut map = BTreeMap::new();
        map.insert("bad header".to_string(), "v".to_string());
        assert!(HeaderInterceptor::from_map(&map).is_err());
    }

    #[test]
    fn bearer_token_sets_authorization() {
        let request = apply(&BearerToken::new("abc"));
        assert_eq!(request.headers()["authorization"], "Bearer abc");
    }

    #[test]
    fn bearer_token_debug_hides_secret() {
        assert!(!format!("{:?}", BearerToken::new("abc")).contains("abc"));
    }
}
