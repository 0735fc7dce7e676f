//! Route edits.
//!
//! Every operation borrows the current [`Route`] and returns a new one; a
//! rejected edit returns an error and leaves the input untouched.

use crate::error::{Result, RouteError};
use crate::geodesy::nearest_point_by_distance;
use crate::point::{TrackPoint, Waypoint, WaypointLabel, DEFAULT_CUSTOM_NAME};
use crate::route::{snap, Anchor, Route};

/// Two cumulative distances closer than this (km) are considered equal.
pub const DISTANCE_TOLERANCE_KM: f64 = 0.001;

/// Reverse the direction of travel.
///
/// Distance, gain and loss are recomputed from the reversed points, so gain
/// and loss come out of the new direction rather than being swapped.
pub fn reverse(route: &Route) -> Result<Route> {
    let mut points = route.points().to_vec();
    points.reverse();
    let anchors: Vec<Anchor> = route.anchors().collect();
    Route::assemble(points, anchors.into_iter().rev())
}

/// Delete the waypoint at `index`.
///
/// Deleting a regular or custom waypoint leaves the points untouched.
/// Deleting the start (or end) marker cuts the route at the next (or previous)
/// waypoint, which then becomes the new start (or end).
///
/// # Errors
///
/// - [`RouteError::WaypointIndex`] for an unknown index
/// - [`RouteError::WaypointFloor`] when the route has only its two markers
pub fn delete_waypoint(route: &Route, index: usize) -> Result<Route> {
    let target = route.waypoint(index)?;

    if target.is_start {
        delete_start(route)
    } else if target.is_end {
        delete_end(route)
    } else {
        let remaining: Vec<Waypoint> = route
            .waypoints()
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(_, w)| w.clone())
            .collect();
        Ok(route.with_waypoints(remaining))
    }
}

fn delete_start(route: &Route) -> Result<Route> {
    let wps = route.waypoints();
    if wps.len() <= 2 {
        return Err(RouteError::WaypointFloor { which: "start" });
    }
    let cut = point_at_distance(route.points(), wps[1].distance);
    tracing::debug!(cut, promoted = %wps[1].name, "Deleting start waypoint");
    keep_range(route, cut, route.points().len() - 1, Some(1))
}

fn delete_end(route: &Route) -> Result<Route> {
    let wps = route.waypoints();
    if wps.len() <= 2 {
        return Err(RouteError::WaypointFloor { which: "end" });
    }
    let promoted = wps.len() - 2;
    let cut = point_at_distance(route.points(), wps[promoted].distance);
    tracing::debug!(cut, promoted = %wps[promoted].name, "Deleting end waypoint");
    keep_range(route, 0, cut, Some(promoted))
}

/// Drop every point before `index`; the point at `index` becomes the start.
pub fn truncate_from_start(route: &Route, index: usize) -> Result<Route> {
    check_point_index(route, index)?;
    keep_range(route, index, route.points().len() - 1, None)
}

/// Drop every point after `index`; the point at `index` becomes the end.
pub fn truncate_from_end(route: &Route, index: usize) -> Result<Route> {
    check_point_index(route, index)?;
    keep_range(route, 0, index, None)
}

/// Insert a custom waypoint on the point nearest to a coordinate.
///
/// The new waypoint has an empty name; duplicates are allowed.
pub fn add_waypoint_at(route: &Route, lat: f64, lon: f64) -> Result<Route> {
    let wp = snap(route.points(), lat, lon, WaypointLabel::custom()).ok_or(RouteError::EmptyTrack)?;
    Ok(insert(route, wp))
}

/// Insert a custom waypoint on the point whose cumulative distance is
/// nearest to `distance_km`.
pub fn add_waypoint_at_distance(route: &Route, distance_km: f64) -> Result<Route> {
    let (_, point) = nearest_point_by_distance(route.points(), distance_km).ok_or(RouteError::EmptyTrack)?;
    Ok(insert(route, Waypoint::from_point(point, WaypointLabel::custom())))
}

/// Rename a waypoint. A blank name becomes [`DEFAULT_CUSTOM_NAME`].
///
/// Nothing but the name changes.
pub fn rename_waypoint(route: &Route, index: usize, name: &str) -> Result<Route> {
    route.waypoint(index)?;

    let name = name.trim();
    let name = if name.is_empty() { DEFAULT_CUSTOM_NAME } else { name };

    let mut renamed = route.clone();
    renamed.waypoints_mut()[index].name = name.to_string();
    Ok(renamed)
}

fn insert(route: &Route, wp: Waypoint) -> Route {
    let mut waypoints = route.waypoints().to_vec();
    waypoints.push(wp);
    route.with_waypoints(waypoints)
}

fn check_point_index(route: &Route, index: usize) -> Result<()> {
    let len = route.points().len();
    if index >= len {
        return Err(RouteError::PointIndex { index, len });
    }
    Ok(())
}

/// Index of the first point at `distance` (within tolerance), falling back to
/// the nearest one.
fn point_at_distance(points: &[TrackPoint], distance: f64) -> usize {
    points
        .iter()
        .position(|p| (p.distance - distance).abs() < DISTANCE_TOLERANCE_KM)
        .or_else(|| nearest_point_by_distance(points, distance).map(|(i, _)| i))
        .unwrap_or(0)
}

/// Rebuild the route from `points[first..=last]`.
///
/// Waypoints whose distance, shifted by the new origin, still falls inside
/// the kept span survive and are re-snapped; `skip` names a waypoint index to
/// drop regardless (the one promoted to a marker).
fn keep_range(route: &Route, first: usize, last: usize, skip: Option<usize>) -> Result<Route> {
    let points = route.points();
    let offset = points[first].distance;
    let span = points[last].distance - offset;

    let anchors: Vec<Anchor> = route
        .waypoints()
        .iter()
        .enumerate()
        .filter(|&(i, w)| {
            let shifted = w.distance - offset;
            Some(i) != skip
                && !w.is_boundary()
                && shifted >= -DISTANCE_TOLERANCE_KM
                && shifted <= span + DISTANCE_TOLERANCE_KM
        })
        .map(|(_, w)| Anchor::from(w))
        .collect();

    Route::assemble(points[first..=last].to_vec(), anchors)
}
