//! Haversine great-circle distance.

use crate::model::Coordinate;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
///
/// Both coordinates must be valid; callers filter out unknown positions first.
#[must_use]
pub fn distance_km(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (to.longitude - from.longitude).to_radians();

    let half_chord = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push h a hair outside [0, 1] for antipodal points
    let half_chord = half_chord.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * half_chord.sqrt().atan2((1.0 - half_chord).sqrt())
}
