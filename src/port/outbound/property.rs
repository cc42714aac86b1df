//! Property backend port.

use async_trait::async_trait;

use crate::domain::{GeoBounds, Property};
use crate::error::FetchError;

/// One page of a viewport query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportQuery {
    pub bounds: GeoBounds,
    /// Zero-based page index.
    pub page: u32,
    pub limit: u32,
}

/// One decoded page of a viewport query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportPage {
    pub properties: Vec<Property>,
    /// Rows the backend sent, including rows dropped while decoding.
    pub rows: usize,
}

impl ViewportPage {
    /// Whether the backend returned fewer rows than `limit`.
    #[must_use]
    pub fn is_last(&self, limit: u32) -> bool {
        self.rows < limit as usize
    }
}

impl From<Vec<Property>> for ViewportPage {
    fn from(properties: Vec<Property>) -> Self {
        Self {
            rows: properties.len(),
            properties,
        }
    }
}

/// Source of properties located inside a viewport.
///
/// Implementations must be idempotent: the loader retries and deduplicates
/// freely. Coordinates that fail to parse are returned as `None` rather
/// than failing the page.
#[async_trait]
pub trait PropertySource: Send + Sync {
    /// Fetch one page of properties inside `query.bounds`.
    async fn fetch_page(&self, query: &ViewportQuery) -> Result<ViewportPage, FetchError>;
}
