//! Builders for domain primitives used across tests.

use crate::domain::{GeoBounds, Property};

/// Half-width of the boxes built by [`bounds_at`], in degrees.
const HALF_SPAN_DEG: f64 = 0.025;

/// A downtown Mexico City viewport.
pub fn cdmx_bounds() -> GeoBounds {
    GeoBounds {
        north: 19.45,
        south: 19.40,
        east: -99.10,
        west: -99.20,
    }
}

/// A small viewport centered on `(lat, lng)`.
pub fn bounds_at(lat: f64, lng: f64) -> GeoBounds {
    GeoBounds {
        north: lat + HALF_SPAN_DEG,
        south: lat - HALF_SPAN_DEG,
        east: lng + HALF_SPAN_DEG,
        west: lng - HALF_SPAN_DEG,
    }
}

/// `n` listings named `p0`, `p1`, ..., spread inside [`cdmx_bounds`].
pub fn properties(n: usize) -> Vec<Property> {
    (0..n)
        .map(|i| {
            let step = (i % 40) as f64 * 0.001;
            Property::new(format!("p{i}"), 19.41 + step, -99.19 + step).with_kind("house")
        })
        .collect()
}
