use anyhow::{Context, Result};
use routekit::gpx::gpx_bytes;
use routekit::{EditSession, LoadedTrack, TrackEnd};
use std::path::{Path, PathBuf};

use super::Options;

/// Where to put a new waypoint.
pub enum Position {
    Coordinate { lat: f64, lon: f64 },
    /// Kilometres from the start.
    Distance(f64),
}

fn open(opts: &Options, input: &Path) -> Result<(LoadedTrack, EditSession)> {
    let resolver = opts.resolver()?;
    let track = super::load(input, &resolver)?;
    let mut session = EditSession::new();
    session.load(track.route.clone());
    Ok((track, session))
}

fn save(track: &LoadedTrack, session: &EditSession, output: Option<PathBuf>) -> Result<()> {
    let route = session.current()?;
    tracing::info!(
        points = route.points().len(),
        waypoints = route.waypoints().len(),
        distance_km = route.total_distance(),
        "Route edited"
    );
    let bytes = gpx_bytes(route, &track.name).context("Failed to write GPX")?;
    super::write_output(&bytes, output.as_deref())
}

pub fn reverse(opts: &Options, input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let (track, mut session) = open(opts, &input)?;
    session.reverse()?;
    save(&track, &session, output)
}

pub fn truncate(opts: &Options, input: PathBuf, from: TrackEnd, index: usize, output: Option<PathBuf>) -> Result<()> {
    let (track, mut session) = open(opts, &input)?;
    match from {
        TrackEnd::Start => session.truncate_from_start(index)?,
        TrackEnd::End => session.truncate_from_end(index)?,
    };
    save(&track, &session, output)
}

pub fn add_waypoint(opts: &Options, input: PathBuf, at: Position, name: &str, output: Option<PathBuf>) -> Result<()> {
    let (track, mut session) = open(opts, &input)?;
    let route = match at {
        Position::Coordinate { lat, lon } => session.add_waypoint_at(lat, lon)?,
        Position::Distance(km) => session.add_waypoint_at_distance(km)?,
    };

    // Waypoints read from a file are never custom, so this is the new one.
    let index = route
        .waypoints()
        .iter()
        .position(|w| w.is_custom)
        .context("Inserted waypoint not found")?;
    session.rename_waypoint(index, name)?;

    save(&track, &session, output)
}

pub fn delete_waypoint(opts: &Options, input: PathBuf, index: usize, output: Option<PathBuf>) -> Result<()> {
    let (track, mut session) = open(opts, &input)?;
    session.delete_waypoint(index)?;
    save(&track, &session, output)
}

pub fn rename_waypoint(
    opts: &Options,
    input: PathBuf,
    index: usize,
    name: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let (track, mut session) = open(opts, &input)?;
    session.rename_waypoint(index, name)?;
    save(&track, &session, output)
}
