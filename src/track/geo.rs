use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Coordinates closer to 0,0 than this (in degrees) are treated as a null fix.
pub const ZERO_FIX_EPSILON_DEG: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns the position only if it is a usable fix: finite, in range, and
    /// not the degenerate 0,0 a receiver reports before it has locked.
    pub fn checked(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        let (lat, lon) = (lat?, lon?);
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        if lat.abs() < ZERO_FIX_EPSILON_DEG && lon.abs() < ZERO_FIX_EPSILON_DEG {
            return None;
        }
        Some(Self { lat, lon })
    }

    pub fn distance_m(&self, other: &LatLon) -> f64 {
        haversine_distance_m(self.lat, self.lon, other.lat, other.lon)
    }
}

pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Sum of the great-circle legs between consecutive positions, in meters.
pub fn path_length_m<'a>(positions: impl IntoIterator<Item = &'a LatLon>) -> f64 {
    positions
        .into_iter()
        .tuple_windows()
        .map(|(a, b)| a.distance_m(b))
        .sum()
}
