//! Great-circle distance.

use geo::{Distance, HaversineMeasure, Point};

/// Mean Earth radius used by the Haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine great-circle distance between two points, in meters.
///
/// Inputs are degrees. Pure and infallible: the caller is responsible for
/// passing finite, in-range coordinates.
///
/// # Examples
///
/// ```
/// use attendance_engine::validation::distance_meters;
///
/// assert_eq!(distance_meters(9.0, 38.7, 9.0, 38.7), 0.0);
///
/// // 0.0005 degrees of latitude is roughly 55.6 meters
/// let d = distance_meters(9.0, 38.7, 9.0005, 38.7);
/// assert!((d - 55.6).abs() < 0.1);
/// ```
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    // evaluate in a canonical point order so d(a, b) and d(b, a) are bit-identical
    let ((lat1, lon1), (lat2, lon2)) = if (lat1, lon1) <= (lat2, lon2) {
        ((lat1, lon1), (lat2, lon2))
    } else {
        ((lat2, lon2), (lat1, lon1))
    };

    let d = HaversineMeasure::new(EARTH_RADIUS_METERS)
        .distance(Point::new(lon1, lat1), Point::new(lon2, lat2));
    // rounding can push the haversine term a hair above 1 for antipodal points
    if d.is_nan() && [lat1, lon1, lat2, lon2].iter().all(|v| v.is_finite()) {
        return std::f64::consts::PI * EARTH_RADIUS_METERS;
    }
    d
}
