use anyhow::{Context, Result};
use clap::ValueEnum;
use routekit::export::csv_bytes;
use routekit::geojson::route_to_geojson;
use routekit::gpx::gpx_bytes;
use routekit::Pace;
use std::path::PathBuf;

use super::Options;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Format {
    /// Waypoint table with distances, elevation and time estimates
    Csv,
    /// Track and waypoints
    Gpx,
    /// FeatureCollection with the track line and waypoint points
    Geojson,
}

pub fn run(opts: &Options, input: PathBuf, format: Format, output: Option<PathBuf>, pace: Pace) -> Result<()> {
    let resolver = opts.resolver()?;
    let track = super::load(&input, &resolver)?;

    let bytes = match format {
        Format::Csv => csv_bytes(&track.route, &pace).context("Failed to write CSV")?,
        Format::Gpx => gpx_bytes(&track.route, &track.name).context("Failed to write GPX")?,
        Format::Geojson => route_to_geojson(&track.route, &track.name).to_string().into_bytes(),
    };

    super::write_output(&bytes, output.as_deref())
}
