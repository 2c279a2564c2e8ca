use crate::spot::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Walking pace of roughly 5 km/h.
pub const WALKING_MINUTES_PER_KM: f64 = 12.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Walking time in whole minutes, rounded to nearest.
pub fn walking_minutes(distance_km: f64) -> u32 {
    (distance_km * WALKING_MINUTES_PER_KM).round().max(0.0) as u32
}
