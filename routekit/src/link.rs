//! Joining two loaded tracks into one route.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RouteError};
use crate::point::{RawWaypoint, TrackPoint};
use crate::route::{process_route, Route};
use crate::session::LoadedTrack;

/// Which end of a track takes part in a link.
///
/// A track linked by its `End` is traversed backwards, so its last recorded
/// point becomes its first point in the joined route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrackEnd {
    #[default]
    Start,
    End,
}

impl fmt::Display for TrackEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackEnd::Start => write!(f, "start"),
            TrackEnd::End => write!(f, "end"),
        }
    }
}

impl FromStr for TrackEnd {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(TrackEnd::Start),
            "end" => Ok(TrackEnd::End),
            other => Err(format!("Unknown track end '{}': expected 'start' or 'end'", other)),
        }
    }
}

fn oriented(points: &[TrackPoint], end: TrackEnd) -> Vec<TrackPoint> {
    let mut points = points.to_vec();
    if end == TrackEnd::End {
        points.reverse();
    }
    points
}

/// Join `a` and `b` into a new route.
///
/// Points are concatenated as-is (no smoothing at the seam); both tracks'
/// file waypoints are carried over and re-snapped.
///
/// # Errors
///
/// [`RouteError::SameTrack`] when `a` and `b` are the same track.
pub fn link_tracks(a: &LoadedTrack, end_a: TrackEnd, b: &LoadedTrack, end_b: TrackEnd) -> Result<Route> {
    if std::ptr::eq(a, b) {
        return Err(RouteError::SameTrack);
    }

    let mut points = oriented(a.route.points(), end_a);
    points.extend(oriented(b.route.points(), end_b));

    let waypoints: Vec<RawWaypoint> = a
        .raw_waypoints
        .iter()
        .chain(b.raw_waypoints.iter())
        .cloned()
        .collect();

    tracing::info!(
        first = %a.name,
        first_end = %end_a,
        second = %b.name,
        second_end = %end_b,
        points = points.len(),
        "Linking tracks"
    );

    process_route(points, &waypoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::test_support::equator_points;

    fn track(name: &str, lat: f64, elevations: &[f64], waypoint: Option<&str>) -> LoadedTrack {
        let points: Vec<TrackPoint> = equator_points(elevations)
            .into_iter()
            .map(|mut p| {
                p.lat = lat;
                p
            })
            .collect();
        let raw: Vec<RawWaypoint> = waypoint
            .map(|n| vec![RawWaypoint::new(lat, 0.01, n)])
            .unwrap_or_default();
        let route = process_route(points, &raw).unwrap();
        LoadedTrack::new(name, raw, route)
    }

    #[test]
    fn test_link_end_to_start() {
        let t1 = track("one", 0.0, &[1.0, 2.0, 3.0], Some("Bench"));
        let t2 = track("two", 0.05, &[10.0, 20.0], Some("Gate"));

        let route = link_tracks(&t1, TrackEnd::End, &t2, TrackEnd::Start).unwrap();

        assert_eq!(route.points().len(), 5);
        let last_of_t1 = t1.route.points()[2];
        assert_eq!(route.points()[0].lat, last_of_t1.lat);
        assert_eq!(route.points()[0].lon, last_of_t1.lon);
        assert_eq!(route.points()[3].ele, 10.0);

        let names: Vec<&str> = route.waypoints().iter().map(|w| w.name.as_str()).collect();
        assert!(names.contains(&"Bench"));
        assert!(names.contains(&"Gate"));
        assert_eq!(route.waypoints().iter().filter(|w| w.is_start).count(), 1);
    }

    #[test]
    fn test_link_both_forward() {
        let t1 = track("one", 0.0, &[1.0, 2.0], None);
        let t2 = track("two", 0.0, &[3.0, 4.0], None);
        let route = link_tracks(&t1, TrackEnd::Start, &t2, TrackEnd::Start).unwrap();
        let ele: Vec<f64> = route.points().iter().map(|p| p.ele).collect();
        assert_eq!(ele, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_link_second_reversed() {
        let t1 = track("one", 0.0, &[1.0, 2.0], None);
        let t2 = track("two", 0.0, &[3.0, 4.0], None);
        let route = link_tracks(&t1, TrackEnd::Start, &t2, TrackEnd::End).unwrap();
        let ele: Vec<f64> = route.points().iter().map(|p| p.ele).collect();
        assert_eq!(ele, vec![1.0, 2.0, 4.0, 3.0]);
    }

    #[test]
    fn test_link_self_rejected() {
        let t1 = track("one", 0.0, &[1.0, 2.0], None);
        assert!(matches!(
            link_tracks(&t1, TrackEnd::Start, &t1, TrackEnd::End),
            Err(RouteError::SameTrack)
        ));
    }

    #[test]
    fn test_track_end_parse() {
        assert_eq!("END".parse::<TrackEnd>().unwrap(), TrackEnd::End);
        assert_eq!("start".parse::<TrackEnd>().unwrap(), TrackEnd::Start);
        assert!("middle".parse::<TrackEnd>().is_err());
    }
}
