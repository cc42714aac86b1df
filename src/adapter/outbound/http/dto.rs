//! Wire format of the viewport endpoint.
//!
//! The backend answers either a bare JSON array or `{"data": [...]}`.
//! Coordinates and prices come as numbers or numeric strings depending on
//! the listing source, so every such field is decoded leniently.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Property, PropertyId};

/// Body of a viewport response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ViewportResponse {
    List(Vec<PropertyDto>),
    Wrapped { data: Vec<PropertyDto> },
}

impl ViewportResponse {
    #[must_use]
    pub fn into_listings(self) -> Vec<PropertyDto> {
        match self {
            Self::List(items) | Self::Wrapped { data: items } => items,
        }
    }
}

/// One listing as sent by the backend.
#[derive(Debug, Deserialize)]
pub struct PropertyDto {
    #[serde(default)]
    pub id: Value,
    #[serde(default, alias = "latitude")]
    pub lat: Value,
    #[serde(default, alias = "longitude")]
    pub lng: Value,
    #[serde(default)]
    pub price: Value,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
}

impl PropertyDto {
    /// Convert to a domain listing. Listings without an id are dropped;
    /// unreadable coordinates become `None`.
    #[must_use]
    pub fn into_domain(self) -> Option<Property> {
        let id = match self.id {
            Value::String(id) if !id.trim().is_empty() => id,
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(Property {
            id: PropertyId::new(id),
            lat: lenient_f64(&self.lat),
            lng: lenient_f64(&self.lng),
            price: lenient_decimal(&self.price),
            kind: self.kind.unwrap_or_default(),
            title: self.title,
            address: self.address,
            image_url: self.image_url,
        })
    }
}

fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn lenient_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
