//! Spherical geometry primitives shared by discovery, metrics and validation.
//!
//! All functions are pure and deterministic.

use crate::constants::{EARTH_RADIUS_KM, METERS_PER_DEGREE};
use crate::models::Coordinates;

/// Great-circle distance in kilometers (haversine, mean Earth radius).
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial great-circle bearing from `a` to `b`, degrees in [0, 360), 0 = north.
pub fn bearing(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Change of heading at `b` when travelling a -> b -> c, degrees in [0, 180].
pub fn turn_angle(a: &Coordinates, b: &Coordinates, c: &Coordinates) -> f64 {
    angular_difference(bearing(a, b), bearing(b, c))
}

/// Absolute difference between two compass bearings, folded to [0, 180].
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 360.0;
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Wrap any angle in degrees into [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Local equirectangular projection centered on an origin.
///
/// Longitudes are scaled by cos(origin latitude); adequate for the few
/// kilometres a running loop spans.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    origin: Coordinates,
    lng_scale: f64,
}

impl LocalProjection {
    pub fn new(origin: Coordinates) -> Self {
        LocalProjection {
            origin,
            lng_scale: origin.lat.to_radians().cos(),
        }
    }

    /// Planar (x east, y north) offset from the origin in meters.
    pub fn project(&self, point: &Coordinates) -> (f64, f64) {
        let x = (point.lng - self.origin.lng) * self.lng_scale * METERS_PER_DEGREE;
        let y = (point.lat - self.origin.lat) * METERS_PER_DEGREE;
        (x, y)
    }

    /// Longitude/latitude extent (degrees) of a square cell with the given edge in meters.
    pub fn cell_size_deg(&self, cell_m: f64) -> (f64, f64) {
        let lat_deg = cell_m / METERS_PER_DEGREE;
        let lng_deg = if self.lng_scale.abs() < 1e-6 {
            lat_deg
        } else {
            lat_deg / self.lng_scale
        };
        (lng_deg, lat_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = c(54.597, -5.930);
        assert!(bearing(&origin, &c(54.607, -5.930)).abs() < 1e-6);
        assert!((bearing(&origin, &c(54.597, -5.920)) - 90.0).abs() < 0.1);
        assert!((bearing(&origin, &c(54.587, -5.930)) - 180.0).abs() < 1e-6);
        assert!((bearing(&origin, &c(54.597, -5.940)) - 270.0).abs() < 0.1);
    }

    #[test]
    fn bearing_always_in_range() {
        let points = [
            c(0.0, 0.0),
            c(54.597, -5.930),
            c(-33.9, 151.2),
            c(89.9, 179.9),
            c(-89.9, -179.9),
            c(10.0, -0.000001),
        ];
        for a in &points {
            for b in &points {
                let brg = bearing(a, b);
                assert!((0.0..360.0).contains(&brg), "bearing {} out of range", brg);
            }
        }
    }

    #[test]
    fn haversine_zero_for_same_point() {
        let p = c(54.597, -5.930);
        assert_eq!(haversine_km(&p, &p), 0.0);
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_km(&c(0.0, 0.0), &c(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.05, "got {}", d);
    }

    #[test]
    fn turn_angle_straight_and_reverse() {
        let a = c(54.590, -5.930);
        let b = c(54.597, -5.930);
        let ahead = c(54.604, -5.930);
        assert!(turn_angle(&a, &b, &ahead) < 1e-6);
        assert!((turn_angle(&a, &b, &a) - 180.0).abs() < 1e-6);

        let right = c(54.597, -5.920);
        let angle = turn_angle(&a, &b, &right);
        assert!((angle - 90.0).abs() < 0.5, "got {}", angle);
    }

    #[test]
    fn turn_angle_in_range() {
        let pts = [c(1.0, 1.0), c(1.001, 1.0), c(1.0005, 0.999), c(0.999, 1.002)];
        for a in &pts {
            for b in &pts {
                for d in &pts {
                    let t = turn_angle(a, b, d);
                    assert!((0.0..=180.0).contains(&t));
                }
            }
        }
    }

    #[test]
    fn angular_difference_wraps() {
        assert_eq!(angular_difference(350.0, 10.0), 20.0);
        assert_eq!(angular_difference(10.0, 350.0), 20.0);
        assert_eq!(angular_difference(0.0, 180.0), 180.0);
    }

    #[test]
    fn projection_scales_longitude() {
        let proj = LocalProjection::new(c(60.0, 10.0));
        let (x, y) = proj.project(&c(60.0, 11.0));
        assert!(y.abs() < 1e-9);
        assert!((x - METERS_PER_DEGREE * 0.5).abs() < 1.0, "got {}", x);
    }
}
