//! Loaded tracks and the route being edited.

use std::collections::BTreeMap;

use crate::elevation::{ElevationReport, ElevationResolver};
use crate::error::{Result, RouteError};
use crate::link::{link_tracks, TrackEnd};
use crate::mutate;
use crate::point::{RawWaypoint, TrackPoint};
use crate::route::{process_route, Route};

/// A track as loaded from a file: its name, its file waypoints and the
/// route built from it.
#[derive(Debug, Clone)]
pub struct LoadedTrack {
    pub name: String,
    pub raw_waypoints: Vec<RawWaypoint>,
    pub route: Route,
    /// How the elevations were obtained, if the track went through a resolver.
    pub elevation: Option<ElevationReport>,
}

impl LoadedTrack {
    pub fn new(name: impl Into<String>, raw_waypoints: Vec<RawWaypoint>, route: Route) -> Self {
        Self {
            name: name.into(),
            raw_waypoints,
            route,
            elevation: None,
        }
    }

    pub fn with_report(mut self, report: ElevationReport) -> Self {
        self.elevation = Some(report);
        self
    }
}

/// Parse GPX data, resolve missing elevations and build the route.
///
/// Blocks until elevation resolution has finished.
pub fn load_track(name: &str, data: &[u8], resolver: &ElevationResolver) -> Result<LoadedTrack> {
    let parsed = crate::gpx::read_gpx(data)?;
    let mut points = parsed.points;
    let raw_waypoints = parsed.waypoints;

    let report = resolver.resolve(&mut points);

    let route = process_route(TrackPoint::from_resolved(&points)?, &raw_waypoints)?;
    tracing::info!(
        track = name,
        points = route.points().len(),
        waypoints = route.waypoints().len(),
        distance_km = route.total_distance(),
        elevation = %report.origin,
        "Track loaded"
    );

    Ok(LoadedTrack::new(name, raw_waypoints, route).with_report(report))
}

/// Loaded tracks keyed by a stable id.
#[derive(Debug, Default)]
pub struct TrackLibrary {
    tracks: BTreeMap<u64, LoadedTrack>,
    next_id: u64,
}

impl TrackLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a track and return its id. Ids are never reused.
    pub fn add(&mut self, track: LoadedTrack) -> u64 {
        self.next_id += 1;
        self.tracks.insert(self.next_id, track);
        self.next_id
    }

    pub fn get(&self, id: u64) -> Result<&LoadedTrack> {
        self.tracks.get(&id).ok_or(RouteError::UnknownTrack { id })
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &LoadedTrack)> {
        self.tracks.iter().map(|(&id, t)| (id, t))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Link two library tracks.
    pub fn link(&self, a: u64, end_a: TrackEnd, b: u64, end_b: TrackEnd) -> Result<Route> {
        if a == b {
            return Err(RouteError::SameTrack);
        }
        link_tracks(self.get(a)?, end_a, self.get(b)?, end_b)
    }
}

/// The route being edited, a copy of it as loaded, and the selected waypoint.
///
/// Every edit is all-or-nothing: when an operation fails the session is left
/// exactly as it was.
#[derive(Debug, Default)]
pub struct EditSession {
    current: Option<Route>,
    original: Option<Route>,
    active_waypoint: Option<usize>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `route` the active route and remember it for [`EditSession::reset`].
    pub fn load(&mut self, route: Route) {
        self.original = Some(route.clone());
        self.current = Some(route);
        self.active_waypoint = None;
    }

    pub fn current(&self) -> Result<&Route> {
        self.current.as_ref().ok_or(RouteError::NoActiveRoute)
    }

    pub fn original(&self) -> Option<&Route> {
        self.original.as_ref()
    }

    pub fn active_waypoint(&self) -> Option<usize> {
        self.active_waypoint
    }

    pub fn has_route(&self) -> bool {
        self.current.is_some()
    }

    /// Select a waypoint (e.g. for highlighting). `None` clears the selection.
    pub fn select_waypoint(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(i) = index {
            self.current()?.waypoint(i)?;
        }
        self.active_waypoint = index;
        Ok(())
    }

    /// Go back to the route as it was loaded.
    pub fn reset(&mut self) -> Result<&Route> {
        let original = self.original.clone().ok_or(RouteError::NoActiveRoute)?;
        self.active_waypoint = None;
        Ok(self.current.insert(original))
    }

    pub fn reverse(&mut self) -> Result<&Route> {
        self.apply(mutate::reverse)
    }

    pub fn delete_waypoint(&mut self, index: usize) -> Result<&Route> {
        self.apply(|r| mutate::delete_waypoint(r, index))
    }

    pub fn truncate_from_start(&mut self, index: usize) -> Result<&Route> {
        self.apply(|r| mutate::truncate_from_start(r, index))
    }

    pub fn truncate_from_end(&mut self, index: usize) -> Result<&Route> {
        self.apply(|r| mutate::truncate_from_end(r, index))
    }

    pub fn add_waypoint_at(&mut self, lat: f64, lon: f64) -> Result<&Route> {
        self.apply(|r| mutate::add_waypoint_at(r, lat, lon))
    }

    pub fn add_waypoint_at_distance(&mut self, distance_km: f64) -> Result<&Route> {
        self.apply(|r| mutate::add_waypoint_at_distance(r, distance_km))
    }

    /// Renaming keeps the waypoint selection.
    pub fn rename_waypoint(&mut self, index: usize, name: &str) -> Result<&Route> {
        let active = self.active_waypoint;
        self.apply(|r| mutate::rename_waypoint(r, index, name))?;
        self.active_waypoint = active;
        self.current()
    }

    fn apply(&mut self, edit: impl FnOnce(&Route) -> Result<Route>) -> Result<&Route> {
        let next = edit(self.current()?)?;
        self.active_waypoint = None;
        Ok(self.current.insert(next))
    }
}
