//! Property listings as consumed by the map.
//!
//! Only the subset of listing fields the map needs is modelled. Coordinates
//! are kept as received (possibly missing) so that a single listing with bad
//! geodata never fails a whole viewport; [`Property::coordinates`] decides
//! whether it can be displayed.

use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Property identifier - newtype for type safety.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(String);

impl PropertyId {
    /// Create a new `PropertyId`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PropertyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A listing returned by the viewport endpoint. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub price: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
}

impl Property {
    /// Create a listing with coordinates and no display fields.
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: PropertyId::new(id),
            lat: Some(lat),
            lng: Some(lng),
            price: None,
            kind: String::new(),
            title: None,
            address: None,
            image_url: None,
        }
    }

    /// Set the asking price.
    #[must_use]
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the property type (house, apartment, land...).
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the listing title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Coordinates as `(lat, lng)` when both are finite and within range.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let (lat, lng) = (self.lat?, self.lng?);
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some((lat, lng))
    }

    /// Whether the listing can be placed on the map.
    #[must_use]
    pub fn is_displayable(&self) -> bool {
        self.coordinates().is_some()
    }
}

/// Merge listings from several regions into the list handed to the map.
///
/// Drops listings without displayable coordinates and de-duplicates by id,
/// keeping the first occurrence. Regions overlap, so the same listing often
/// arrives more than once.
pub fn merge_for_display<'a, I>(properties: I) -> Vec<Property>
where
    I: IntoIterator<Item = &'a Property>,
{
    let mut seen = HashSet::new();
    properties
        .into_iter()
        .filter(|p| p.is_displayable())
        .filter(|p| seen.insert(p.id.clone()))
        .cloned()
        .collect()
}
