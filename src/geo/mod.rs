//! Great-circle helpers over [`Coordinate`].
//!
//! None of these validate their input. Coordinates outside the lat/lng ranges
//! produce a finite but meaningless result; callers check
//! [`Coordinate::is_valid`] upstream.

use crate::models::listing::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Haversine distance in kilometres. Symmetric and zero for identical points.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    // Rounding can push this a hair above 1.0 for antipodal points.
    let haversine = (sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng).min(1.0);
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Initial bearing from `a` towards `b`, clockwise from north, in [0, 360).
pub fn bearing_deg(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();

    y.atan2(x).to_degrees().rem_euclid(360.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: &Coordinate) -> bool {
        let lat_ok = point.lat >= self.min_lat && point.lat <= self.max_lat;
        let lng_ok = if self.min_lng <= self.max_lng {
            point.lng >= self.min_lng && point.lng <= self.max_lng
        } else {
            // Box wraps across the antimeridian.
            point.lng >= self.min_lng || point.lng <= self.max_lng
        };
        lat_ok && lng_ok
    }
}

/// Box that contains every point within `radius_km` of `center`.
///
/// It is a superset of the circle, so users must still check the distance.
pub fn bounding_box(center: &Coordinate, radius_km: f64) -> BoundingBox {
    let angular = (radius_km.max(0.0) / EARTH_RADIUS_KM).to_degrees();

    let min_lat = center.lat - angular;
    let max_lat = center.lat + angular;

    if min_lat <= -90.0 || max_lat >= 90.0 {
        return BoundingBox {
            min_lat: min_lat.max(-90.0),
            max_lat: max_lat.min(90.0),
            min_lng: -180.0,
            max_lng: 180.0,
        };
    }

    let lng_span = (angular.to_radians().sin() / center.lat.to_radians().cos())
        .clamp(-1.0, 1.0)
        .asin()
        .to_degrees();

    if lng_span >= 180.0 {
        return BoundingBox {
            min_lat,
            max_lat,
            min_lng: -180.0,
            max_lng: 180.0,
        };
    }

    BoundingBox {
        min_lat,
        max_lat,
        min_lng: wrap_lng(center.lng - lng_span),
        max_lng: wrap_lng(center.lng + lng_span),
    }
}

fn wrap_lng(lng: f64) -> f64 {
    if lng < -180.0 {
        lng + 360.0
    } else if lng > 180.0 {
        lng - 360.0
    } else {
        lng
    }
}
