//! Route construction.
//!
//! A [`Route`] is never edited in place. Every change goes back through
//! [`process_route`] (or its internal sibling used by the mutator), which
//! recomputes cumulative metrics, snaps waypoints onto the points and
//! re-establishes the start/end markers.

use crate::error::{Result, RouteError};
use crate::geodesy::{great_circle_distance_km, nearest_point};
use crate::point::{RawWaypoint, TrackPoint, Waypoint, WaypointLabel, END_NAME, START_NAME};

/// A processed route with cumulative metrics and snapped waypoints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    points: Vec<TrackPoint>,
    waypoints: Vec<Waypoint>,
    total_distance: f64,
    total_gain: f64,
    total_loss: f64,
}

/// A waypoint position with its identity, waiting to be snapped.
#[derive(Debug, Clone)]
pub(crate) struct Anchor {
    pub lat: f64,
    pub lon: f64,
    pub label: WaypointLabel,
}

impl From<&RawWaypoint> for Anchor {
    fn from(raw: &RawWaypoint) -> Self {
        Anchor {
            lat: raw.lat,
            lon: raw.lon,
            label: WaypointLabel::named(raw.name.clone()),
        }
    }
}

impl From<&Waypoint> for Anchor {
    fn from(wp: &Waypoint) -> Self {
        Anchor {
            lat: wp.lat,
            lon: wp.lon,
            label: wp.label(),
        }
    }
}

/// Recompute cumulative distance, gain and loss in place.
pub fn accumulate(points: &mut [TrackPoint]) {
    let Some(first) = points.first_mut() else {
        return;
    };
    first.distance = 0.0;
    first.gain = 0.0;
    first.loss = 0.0;

    for i in 1..points.len() {
        let prev = points[i - 1];
        let cur = &mut points[i];
        let step = great_circle_distance_km(prev.lat, prev.lon, cur.lat, cur.lon);
        let climb = cur.ele - prev.ele;

        cur.distance = prev.distance + step;
        cur.gain = prev.gain + climb.max(0.0);
        cur.loss = prev.loss + (-climb).max(0.0);
    }
}

/// Snap a position onto the nearest route point and attach a label.
pub fn snap(points: &[TrackPoint], lat: f64, lon: f64, label: WaypointLabel) -> Option<Waypoint> {
    nearest_point(points, lat, lon).map(|(_, p)| Waypoint::from_point(p, label))
}

/// Put exactly one start marker on the first point and one end marker on
/// the last point.
///
/// Waypoints previously flagged as start or end are discarded and replaced
/// by fresh `Start`/`End` markers. The result is stably sorted by distance
/// and the flags are reassigned by position.
pub fn enforce_start_end(points: &[TrackPoint], waypoints: Vec<Waypoint>) -> Vec<Waypoint> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(waypoints.len() + 2);
    out.push(Waypoint::from_point(first, WaypointLabel::named(START_NAME)));
    out.extend(waypoints.into_iter().filter(|w| !w.is_boundary()));
    out.push(Waypoint::from_point(last, WaypointLabel::named(END_NAME)));

    out.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let n = out.len();
    for (i, wp) in out.iter_mut().enumerate() {
        wp.is_start = i == 0;
        wp.is_end = i == n - 1;
    }
    out
}

/// Build a route from resolved points and the file's waypoints.
///
/// Each raw waypoint is snapped to its nearest point and keeps its name.
/// Start and end markers are always (re)created.
///
/// # Errors
///
/// [`RouteError::EmptyTrack`] when `points` is empty.
pub fn process_route(points: Vec<TrackPoint>, raw_waypoints: &[RawWaypoint]) -> Result<Route> {
    Route::assemble(points, raw_waypoints.iter().map(Anchor::from))
}

impl Route {
    /// Accumulate metrics, snap every anchor and enforce start/end markers.
    pub(crate) fn assemble(
        mut points: Vec<TrackPoint>,
        anchors: impl IntoIterator<Item = Anchor>,
    ) -> Result<Route> {
        if points.is_empty() {
            return Err(RouteError::EmptyTrack);
        }
        accumulate(&mut points);

        let snapped: Vec<Waypoint> = anchors
            .into_iter()
            .filter_map(|a| snap(&points, a.lat, a.lon, a.label))
            .collect();
        let waypoints = enforce_start_end(&points, snapped);

        let last = points[points.len() - 1];
        Ok(Route {
            total_distance: last.distance,
            total_gain: last.gain,
            total_loss: last.loss,
            points,
            waypoints,
        })
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Total length in kilometres.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Total ascent in metres.
    pub fn total_gain(&self) -> f64 {
        self.total_gain
    }

    /// Total descent in metres.
    pub fn total_loss(&self) -> f64 {
        self.total_loss
    }

    pub fn waypoint(&self, index: usize) -> Result<&Waypoint> {
        self.waypoints.get(index).ok_or(RouteError::WaypointIndex {
            index,
            len: self.waypoints.len(),
        })
    }

    /// Non-boundary waypoints as file-level waypoints.
    pub fn raw_waypoints(&self) -> Vec<RawWaypoint> {
        self.waypoints
            .iter()
            .filter(|w| !w.is_boundary())
            .map(Waypoint::to_raw)
            .collect()
    }

    /// Lowest and highest elevation along the route.
    pub fn elevation_range(&self) -> (f64, f64) {
        self.points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.ele), hi.max(p.ele))
            })
    }

    pub(crate) fn anchors(&self) -> impl Iterator<Item = Anchor> + '_ {
        self.waypoints.iter().map(Anchor::from)
    }

    /// Same points, new waypoint set. The waypoints must already be snapped
    /// onto this route; only start/end enforcement runs.
    pub(crate) fn with_waypoints(&self, waypoints: Vec<Waypoint>) -> Route {
        Route {
            waypoints: enforce_start_end(&self.points, waypoints),
            ..self.clone()
        }
    }

    pub(crate) fn waypoints_mut(&mut self) -> &mut [Waypoint] {
        &mut self.waypoints
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_three_point_route() {
        let points = vec![
            TrackPoint::new(0.0, 0.0, 0.0),
            TrackPoint::new(0.0, 0.01, 10.0),
            TrackPoint::new(0.0, 0.02, 5.0),
        ];
        let route = process_route(points, &[]).unwrap();

        let step = great_circle_distance_km(0.0, 0.0, 0.0, 0.01);
        assert!((route.total_distance() - 2.0 * step).abs() < 1e-9);
        assert_eq!(route.total_gain(), 10.0);
        assert_eq!(route.total_loss(), 5.0);

        let wps = route.waypoints();
        assert_eq!(wps.len(), 2);
        assert_eq!(wps[0].name, START_NAME);
        assert_eq!(wps[1].name, END_NAME);
        assert_eq!(wps[1].distance, route.total_distance());
        assert_consistent(&route);
    }

    #[test]
    fn test_empty_track_rejected() {
        assert!(matches!(process_route(Vec::new(), &[]), Err(RouteError::EmptyTrack)));
    }

    #[test]
    fn test_single_point_route() {
        let route = process_route(vec![TrackPoint::new(1.0, 1.0, 50.0)], &[]).unwrap();
        assert_eq!(route.total_distance(), 0.0);
        assert_eq!(route.waypoints().len(), 2);
        assert_consistent(&route);
    }

    #[test]
    fn test_waypoints_snap_and_sort() {
        // listed out of order and slightly off the line
        let raw = vec![
            RawWaypoint::new(0.0004, 0.031, "Bridge"),
            RawWaypoint::new(-0.0002, 0.009, "Spring"),
        ];
        let route = process_route(equator_points(&[0.0, 5.0, 10.0, 15.0, 20.0]), &raw).unwrap();

        let names: Vec<&str> = route.waypoints().iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec![START_NAME, "Spring", "Bridge", END_NAME]);

        let spring = &route.waypoints()[1];
        assert_eq!(spring.lon, 0.01);
        assert_eq!(spring.lat, 0.0);
        assert_eq!(spring.ele, 5.0);
        assert!(!spring.is_custom);
        assert_consistent(&route);
    }

    #[test]
    fn test_enforcement_replaces_flagged_markers() {
        let points = equator_points(&[0.0, 0.0, 0.0]);
        let route = process_route(points.clone(), &[]).unwrap();

        // feed the markers back in: they must not be duplicated
        let again = enforce_start_end(&points, route.waypoints().to_vec());
        assert_eq!(again.len(), 2);
    }

    #[test]
    fn test_waypoint_at_first_point_keeps_start_first() {
        let route = equator_route(&[0.0, 1.0, 2.0], &[(0.0, "Trailhead")]);
        let wps = route.waypoints();
        assert_eq!(wps.len(), 3);
        assert_eq!(wps[0].name, START_NAME);
        assert!(wps[0].is_start);
        assert_eq!(wps[1].name, "Trailhead");
        assert!(!wps[1].is_start);
    }

    #[test]
    fn test_accumulate_gain_and_loss() {
        let mut points = equator_points(&[100.0, 120.0, 110.0, 130.0]);
        accumulate(&mut points);
        assert_eq!(points[3].gain, 40.0);
        assert_eq!(points[3].loss, 10.0);
        assert_eq!(points[2].gain, 20.0);
    }

    #[test]
    fn test_raw_waypoints_skip_markers() {
        let route = equator_route(&[0.0, 1.0, 2.0], &[(0.01, "Hut")]);
        let raw = route.raw_waypoints();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].name, "Hut");
    }

    #[test]
    fn test_elevation_range() {
        let route = equator_route(&[30.0, 10.0, 80.0], &[]);
        assert_eq!(route.elevation_range(), (10.0, 80.0));
    }

    #[test]
    fn test_waypoint_index() {
        let route = equator_route(&[0.0, 1.0], &[]);
        assert!(route.waypoint(1).is_ok());
        assert!(matches!(
            route.waypoint(2),
            Err(RouteError::WaypointIndex { index: 2, len: 2 })
        ));
    }
}
