use super::geo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, String> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(format!(
                "Invalid latitude: {} (must be between -90 and 90)",
                lat
            ));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(format!(
                "Invalid longitude: {} (must be between -180 and 180)",
                lng
            ));
        }
        Ok(Coordinates { lat, lng })
    }

    /// Build from a GeoJSON-ordered `[lng, lat]` pair
    pub fn from_lng_lat(point: [f64; 2]) -> Result<Self, String> {
        Self::new(point[1], point[0])
    }

    /// GeoJSON-ordered `[lng, lat]` pair
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// Great-circle distance in kilometers
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        geo::haversine_km(self, other)
    }

    /// Great-circle distance in meters
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        geo::haversine_km(self, other) * 1000.0
    }

    /// Initial bearing towards `other`, degrees in [0, 360)
    pub fn bearing_to(&self, other: &Coordinates) -> f64 {
        geo::bearing(self, other)
    }

    /// Integer grid key at the given decimal precision, usable in hash sets
    pub fn grid_key(&self, decimal_places: u32) -> (i64, i64) {
        let multiplier = 10_f64.powi(decimal_places as i32);
        (
            (self.lat * multiplier).round() as i64,
            (self.lng * multiplier).round() as i64,
        )
    }
}
