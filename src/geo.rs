//! Geometry helpers: randomized search origins, great-circle distance,
//! distance formatting and map links

use crate::types::{Candidate, Coordinates, Location};
use rand::Rng;
use std::f64::consts::PI;

/// Meters per degree of latitude (WGS84 approximation)
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Mean earth radius used by the haversine formula
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Pick a point uniformly over the disk of `radius_meters` around `center`.
///
/// `r = radius * sqrt(U1)` keeps the density uniform per unit area rather than
/// clustering near the center.
pub fn sample_point<R: Rng + ?Sized>(center: &Location, radius_meters: f64, rng: &mut R) -> Location {
    let u1: f64 = rng.random();
    let u2: f64 = rng.random();

    let r = radius_meters * u1.sqrt();
    let theta = 2.0 * PI * u2;

    let d_lat = (r * theta.cos()) / METERS_PER_DEGREE_LAT;
    let d_lng = (r * theta.sin()) / (METERS_PER_DEGREE_LAT * (center.lat * PI / 180.0).cos());

    Location::new(center.lat + d_lat, center.lng + d_lng)
}

/// Great-circle distance in meters
pub fn haversine_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Meters below 1 km, otherwise kilometers with one decimal
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round() as i64)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

/// Link that opens the place in Google Maps
pub fn maps_url(candidate: &Candidate) -> String {
    let query = match candidate.coordinates {
        Some(c) => format!("{},{}", c.lat, c.lng),
        None => urlencoding::encode(&candidate.name).into_owned(),
    };
    format!(
        "https://www.google.com/maps/search/?api=1&query={}&query_place_id={}",
        query,
        urlencoding::encode(&candidate.id)
    )
}
