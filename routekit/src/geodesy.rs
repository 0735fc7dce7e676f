//! Great-circle primitives.

use crate::point::TrackPoint;

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometres (haversine).
///
/// # Examples
///
/// ```
/// use routekit::geodesy::great_circle_distance_km;
///
/// assert_eq!(great_circle_distance_km(22.3, 114.1, 22.3, 114.1), 0.0);
/// let d = great_circle_distance_km(0.0, 0.0, 0.0, 1.0);
/// assert!((d - 111.19).abs() < 0.01);
/// ```
pub fn great_circle_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Find the point closest to `(lat, lon)`.
///
/// Ties resolve to the first point encountered. Returns `None` for an empty slice.
pub fn nearest_point(points: &[TrackPoint], lat: f64, lon: f64) -> Option<(usize, &TrackPoint)> {
    let mut best: Option<(usize, &TrackPoint, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = great_circle_distance_km(lat, lon, p.lat, p.lon);
        match best {
            Some((_, _, best_d)) if d >= best_d => {}
            _ => best = Some((i, p, d)),
        }
    }
    best.map(|(i, p, _)| (i, p))
}

/// Find the point whose cumulative distance is closest to `target_km`.
///
/// Used for positions picked on an elevation chart. Ties resolve to the first point.
pub fn nearest_point_by_distance(points: &[TrackPoint], target_km: f64) -> Option<(usize, &TrackPoint)> {
    let mut best: Option<(usize, &TrackPoint, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let delta = (p.distance - target_km).abs();
        match best {
            Some((_, _, best_delta)) if delta >= best_delta => {}
            _ => best = Some((i, p, delta)),
        }
    }
    best.map(|(i, p, _)| (i, p))
}
