//! Geographic primitives: a `Coordinate` newtype and the great-circle distance
//! formula used for bus curvature and company proximity.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair, in degrees.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}, {}", self.latitude, self.longitude))
    }
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_to(&self, other: &Self) -> f64 {
        let lhs_lat = self.latitude.to_radians();
        let rhs_lat = other.latitude.to_radians();
        let lon_diff = (self.longitude - other.longitude).to_radians().abs();
        (lhs_lat.sin() * rhs_lat.sin() + lhs_lat.cos() * rhs_lat.cos() * lon_diff.cos())
            .acos()
            * EARTH_RADIUS_METERS
    }
}

#[test]
fn same_point_has_zero_distance() {
    let a = Coordinate::new(55.611_87, 37.208_29);
    assert!(a.distance_to(&a).abs() < 1e-6);
}

#[test]
fn distance_is_symmetric() {
    let a = Coordinate::new(0.0, 0.0);
    let b = Coordinate::new(0.0, 1.0);
    assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-9);
}

#[test]
fn one_degree_longitude_at_equator_is_about_111_km() {
    let a = Coordinate::new(0.0, 0.0);
    let b = Coordinate::new(0.0, 1.0);
    let d = a.distance_to(&b);
    assert!((d - 111_194.9).abs() < 10.0, "got {d}");
}
