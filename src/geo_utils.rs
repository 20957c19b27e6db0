//! Geographic and numeric helpers shared by the ingest pipeline.
//!
//! - **Haversine Distance**: great-circle distance between two points (km)
//! - **Track Length**: total distance along a point sequence
//! - **Elevation Gain**: sum of positive elevation deltas
//! - **Rounding**: fixed-decimal rounding used for reported values

use crate::GeoPoint;

/// Mean Earth radius used for all distance calculations, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometres.
///
/// # Example
/// ```
/// use endurance_lab::geo_utils::haversine_km;
///
/// // London to Paris is roughly 344 km
/// let d = haversine_km(51.5074, -0.1278, 48.8566, 2.3522);
/// assert!((d - 343.5).abs() < 5.0);
/// ```
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Haversine distance between two track points in kilometres.
#[inline]
pub fn point_distance_km(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    haversine_km(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

/// Total distance along a track in kilometres (0 for fewer than 2 points).
pub fn track_length_km(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| point_distance_km(&w[0], &w[1]))
        .sum()
}

/// Sum of positive elevation deltas between consecutive points.
///
/// Descents are ignored rather than subtracted.
pub fn elevation_gain_m(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| w[1].elevation - w[0].elevation)
        .filter(|delta| *delta > 0.0)
        .sum()
}

/// Round to a fixed number of decimal places.
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if decimals == 0 {
        return value.round();
    }
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}
