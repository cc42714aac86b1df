//! Geographic viewport bounds.
//!
//! [`GeoBounds`] is the rectangle currently visible on the map. Two bounds
//! describe "the same region" when every edge differs by less than an
//! epsilon (0.01 degrees by default), which absorbs sub-pixel pan jitter.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Edge tolerance under which two bounds count as the same region.
pub const DEFAULT_EPSILON_DEG: f64 = 0.01;

/// Rectangular lat/lng region, in degrees.
///
/// Invariant: `north > south` and `east > west`. Regions crossing the
/// antimeridian are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    /// Create validated bounds.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidBounds`] if an edge is not finite, lies
    /// outside the valid latitude/longitude range, or the edges are inverted.
    pub fn try_new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, DomainError> {
        let bounds = Self {
            north,
            south,
            east,
            west,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check the invariants of bounds built through the public fields.
    ///
    /// # Errors
    ///
    /// Same conditions as [`GeoBounds::try_new`].
    pub fn validate(&self) -> Result<(), DomainError> {
        let edges = [self.north, self.south, self.east, self.west];
        if edges.iter().any(|edge| !edge.is_finite()) {
            return Err(invalid("edges must be finite numbers"));
        }
        if !(-90.0..=90.0).contains(&self.north) || !(-90.0..=90.0).contains(&self.south) {
            return Err(invalid("latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.east) || !(-180.0..=180.0).contains(&self.west) {
            return Err(invalid("longitude must be within [-180, 180]"));
        }
        if self.north <= self.south {
            return Err(invalid("north must be greater than south"));
        }
        if self.east <= self.west {
            return Err(invalid("east must be greater than west"));
        }
        Ok(())
    }

    /// Center point as `(lat, lng)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// True when every edge differs from `other` by less than `epsilon`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.north - other.north).abs() < epsilon
            && (self.south - other.south).abs() < epsilon
            && (self.east - other.east).abs() < epsilon
            && (self.west - other.west).abs() < epsilon
    }

    /// True when `other` lies inside these bounds widened by `epsilon`.
    #[must_use]
    pub fn approx_contains(&self, other: &Self, epsilon: f64) -> bool {
        other.north <= self.north + epsilon
            && other.south >= self.south - epsilon
            && other.east <= self.east + epsilon
            && other.west >= self.west - epsilon
    }

    /// True when the point lies inside the bounds (edges inclusive).
    #[must_use]
    pub fn contains_point(&self, lat: f64, lng: f64) -> bool {
        lat <= self.north && lat >= self.south && lng <= self.east && lng >= self.west
    }

    /// Planar distance between the two centers, in degrees.
    #[must_use]
    pub fn center_distance(&self, other: &Self) -> f64 {
        let (lat_a, lng_a) = self.center();
        let (lat_b, lng_b) = other.center();
        (lat_a - lat_b).hypot(lng_a - lng_b)
    }

    /// Bounds scaled around the same center, clamped to the valid range.
    ///
    /// A `factor` of 1.0 returns the same rectangle.
    #[must_use]
    pub fn expanded(&self, factor: f64) -> Self {
        let (lat, lng) = self.center();
        let half_lat = (self.north - self.south) / 2.0 * factor;
        let half_lng = (self.east - self.west) / 2.0 * factor;
        Self {
            north: (lat + half_lat).min(90.0),
            south: (lat - half_lat).max(-90.0),
            east: (lng + half_lng).min(180.0),
            west: (lng - half_lng).max(-180.0),
        }
    }

    /// Normalized key for caching, deduplication and rate limiting.
    ///
    /// Edges are snapped to a grid of `epsilon` degrees, so jittered bounds
    /// usually share a key.
    #[must_use]
    pub fn region_key(&self, epsilon: f64) -> RegionKey {
        let snap = |edge: f64| (edge / epsilon).round() as i64;
        RegionKey(format!(
            "region:{}:{}:{}:{}",
            snap(self.north),
            snap(self.south),
            snap(self.east),
            snap(self.west)
        ))
    }
}

fn invalid(reason: &str) -> DomainError {
    DomainError::InvalidBounds {
        reason: reason.to_string(),
    }
}

impl fmt::Display for GeoBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[N {:.4}, S {:.4}, E {:.4}, W {:.4}]",
            self.north, self.south, self.east, self.west
        )
    }
}

/// Region identifier derived from bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionKey(String);

impl RegionKey {
    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
