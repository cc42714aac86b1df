//! Video resource ids and resolution outcomes.
//!
//! A resolution either hands the player a URL ([`VideoResolution`], which
//! also covers the expected "no video" case) or explains why it cannot
//! ([`ResolveFailure`]). Expected conditions never surface as crate errors.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::error::DomainError;

/// Positive integer id of a video resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VideoId(u64);

impl VideoId {
    /// Parse a resource id coming from the UI.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidVideoId`] unless the input is a
    /// positive integer.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        match input.trim().parse::<u64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(DomainError::InvalidVideoId {
                input: input.to_string(),
            }),
        }
    }

    /// Get the numeric value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Key used for rate limiting and deduplication of probes.
    #[must_use]
    pub fn request_key(&self) -> String {
        format!("video:{}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Successful resolution: a URL the player may load, or a confirmed absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoResolution {
    pub id: VideoId,
    pub url: Url,
    /// False when the server confirmed there is no video (404).
    pub exists: bool,
    /// The server substitutes a fallback video for the requested one.
    pub fallback: bool,
    /// Served from the URL cache without probing.
    pub cached: bool,
}

impl VideoResolution {
    /// [`FailureKind::NotFound`] for a confirmed absence, `None` otherwise.
    ///
    /// Absence is an expected outcome: the UI shows "not available" instead
    /// of an error.
    #[must_use]
    pub fn absence(&self) -> Option<FailureKind> {
        (!self.exists).then_some(FailureKind::NotFound)
    }
}

/// Where a rate limit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitSource {
    /// The local per-key cooldown gate refused the probe.
    Local,
    /// The video endpoint answered 429.
    Server,
}

/// Error taxonomy shared by the map and video paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ClientError,
    RateLimited,
    Timeout,
    NetworkError,
    NotFound,
    CircuitOpen,
}

/// Why a video could not be resolved right now.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    #[error("invalid video id '{input}'")]
    InvalidId { input: String },

    #[error("rate limited ({origin:?}), retry in {}s", opt_ceil_secs(.retry_after))]
    RateLimited {
        origin: RateLimitSource,
        retry_after: Option<Duration>,
    },

    #[error("video probe timed out")]
    Timeout,

    #[error("video endpoint unreachable: {reason}")]
    Network { reason: String },

    #[error("video endpoint returned status {status}")]
    Upstream { status: u16 },

    #[error("video temporarily unavailable, retry in {}s", ceil_secs(.retry_after))]
    CircuitOpen { retry_after: Duration },
}

fn ceil_secs(duration: &Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

fn opt_ceil_secs(duration: &Option<Duration>) -> u64 {
    duration.as_ref().map_or(0, ceil_secs)
}

impl ResolveFailure {
    /// Taxonomy bucket of this failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidId { .. } => FailureKind::ClientError,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Timeout => FailureKind::Timeout,
            Self::Network { .. } | Self::Upstream { .. } => FailureKind::NetworkError,
            Self::CircuitOpen { .. } => FailureKind::CircuitOpen,
        }
    }

    /// How long the caller should wait before trying again, if known.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            Self::CircuitOpen { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Whole seconds to show in a countdown, rounded up.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after().as_ref().map(ceil_secs)
    }

    /// Client errors are never worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidId { .. })
    }
}
