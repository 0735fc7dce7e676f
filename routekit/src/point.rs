//! Point and waypoint types.
//!
//! Elevation is nullable only on [`GeoPoint`], the representation produced by
//! the GPX reader and filled in by the elevation resolver. [`TrackPoint`]
//! always carries an elevation, so a route can never be built from points
//! that were not resolved.

use crate::error::{Result, RouteError};

/// Label used when a waypoint is renamed to a blank string.
pub const DEFAULT_CUSTOM_NAME: &str = "Custom waypoint";

/// Name of the synthesized first waypoint.
pub const START_NAME: &str = "Start";

/// Name of the synthesized last waypoint.
pub const END_NAME: &str = "End";

/// A recorded position whose elevation may still be unknown.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64, ele: Option<f64>) -> Self {
        Self { lat, lon, ele }
    }
}

/// A route point with cumulative metrics from the first point of its route.
///
/// `distance` is in kilometres, `ele`, `gain` and `loss` in metres. The
/// cumulative fields are only ever written by [`crate::route::accumulate`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: f64,
    pub distance: f64,
    pub gain: f64,
    pub loss: f64,
}

impl TrackPoint {
    /// A point with zeroed cumulative fields.
    pub fn new(lat: f64, lon: f64, ele: f64) -> Self {
        Self {
            lat,
            lon,
            ele,
            distance: 0.0,
            gain: 0.0,
            loss: 0.0,
        }
    }

    /// Convert resolved points, failing on the first point without elevation.
    pub fn from_resolved(points: &[GeoPoint]) -> Result<Vec<TrackPoint>> {
        points
            .iter()
            .enumerate()
            .map(|(index, p)| {
                p.ele
                    .map(|ele| TrackPoint::new(p.lat, p.lon, ele))
                    .ok_or(RouteError::MissingElevation { index })
            })
            .collect()
    }
}

impl From<TrackPoint> for GeoPoint {
    fn from(p: TrackPoint) -> Self {
        GeoPoint::new(p.lat, p.lon, Some(p.ele))
    }
}

/// A waypoint as read from the source file, before snapping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawWaypoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
    pub name: String,
}

impl RawWaypoint {
    pub fn new(lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self {
            lat,
            lon,
            ele: None,
            name: name.into(),
        }
    }
}

/// The waypoint-specific half of a [`Waypoint`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaypointLabel {
    pub name: String,
    pub is_start: bool,
    pub is_end: bool,
    pub is_custom: bool,
}

impl WaypointLabel {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn custom() -> Self {
        Self {
            is_custom: true,
            ..Default::default()
        }
    }
}

/// A named point of interest snapped onto a route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: f64,
    pub distance: f64,
    pub gain: f64,
    pub loss: f64,
    pub name: String,
    pub is_start: bool,
    pub is_end: bool,
    pub is_custom: bool,
}

impl Waypoint {
    /// Merge a route point with a label.
    ///
    /// Geometry (`lat`, `lon`, `ele`, `distance`, `gain`, `loss`) always comes
    /// from the point; identity (`name` and the three flags) always comes from
    /// the label.
    pub fn from_point(point: &TrackPoint, label: WaypointLabel) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
            ele: point.ele,
            distance: point.distance,
            gain: point.gain,
            loss: point.loss,
            name: label.name,
            is_start: label.is_start,
            is_end: label.is_end,
            is_custom: label.is_custom,
        }
    }

    /// The identity half of this waypoint.
    pub fn label(&self) -> WaypointLabel {
        WaypointLabel {
            name: self.name.clone(),
            is_start: self.is_start,
            is_end: self.is_end,
            is_custom: self.is_custom,
        }
    }

    /// Whether this waypoint is the synthesized start or end marker.
    pub fn is_boundary(&self) -> bool {
        self.is_start || self.is_end
    }

    /// Convert back to a file-level waypoint (used when linking and exporting).
    pub fn to_raw(&self) -> RawWaypoint {
        RawWaypoint {
            lat: self.lat,
            lon: self.lon,
            ele: Some(self.ele),
            name: self.name.clone(),
        }
    }
}
