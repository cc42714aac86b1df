//! Video endpoint port.

use async_trait::async_trait;
use url::Url;

use crate::error::ProbeError;

/// Answer of the video endpoint to an existence probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code.
    pub status: u16,
    /// The endpoint announced it serves a substitute video.
    pub fallback: bool,
}

impl ProbeResponse {
    /// Plain response without fallback substitution.
    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self {
            status,
            fallback: false,
        }
    }
}

/// Lightweight existence check (HEAD-style) against a video URL.
///
/// Transport failures are errors; any HTTP status, including 404 and 429,
/// is a successful probe carrying that status.
#[async_trait]
pub trait VideoProbe: Send + Sync {
    async fn probe(&self, url: &Url) -> Result<ProbeResponse, ProbeError>;
}
