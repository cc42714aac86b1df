use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failure of a viewport fetch against the property backend.
///
/// Clonable so that every caller joined on a deduplicated request observes
/// the same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by server")]
    RateLimited,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request task aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// Transient failures are worth retrying on the next viewport change.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::Malformed(_))
    }
}

impl From<tokio::task::JoinError> for FetchError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Aborted(err.to_string())
    }
}

/// Transport failure of a video existence probe.
///
/// HTTP statuses are not errors here; they come back in the probe response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("probe timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("probe task aborted: {0}")]
    Aborted(String),
}

impl From<tokio::task::JoinError> for ProbeError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Aborted(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_is_not_transient() {
        assert!(!FetchError::Malformed("bad".into()).is_transient());
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::Status(503).is_transient());
    }

    #[test]
    fn fetch_error_converts_into_crate_error() {
        let err: Error = FetchError::RateLimited.into();
        assert_eq!(err.to_string(), "rate limited by server");
    }
}
