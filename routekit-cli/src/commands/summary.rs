use anyhow::Result;
use routekit::export::{format_hours, waypoint_table, WaypointRow};
use routekit::{ElevationReport, Pace};
use serde::Serialize;
use std::path::PathBuf;

use super::Options;

#[derive(Serialize)]
struct SummaryResponse {
    name: String,
    points: usize,
    total_distance_km: f64,
    total_gain_m: f64,
    total_loss_m: f64,
    min_elevation_m: f64,
    max_elevation_m: f64,
    total_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    elevation: Option<ElevationReport>,
    waypoints: Vec<WaypointRow>,
}

pub fn run(opts: &Options, input: PathBuf, pace: Pace, json: bool) -> Result<()> {
    let resolver = opts.resolver()?;
    let track = super::load(&input, &resolver)?;
    let route = &track.route;

    let rows = waypoint_table(route, &pace);
    let total_hours = rows.last().map(|r| r.total_hours).unwrap_or(0.0);
    let (min_ele, max_ele) = route.elevation_range();

    if json {
        let response = SummaryResponse {
            name: track.name.clone(),
            points: route.points().len(),
            total_distance_km: route.total_distance(),
            total_gain_m: route.total_gain(),
            total_loss_m: route.total_loss(),
            min_elevation_m: min_ele,
            max_elevation_m: max_ele,
            total_time: format_hours(total_hours),
            elevation: track.elevation.clone(),
            waypoints: rows,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("Track: {}", track.name);
    println!("Points: {}", route.points().len());
    if let Some(report) = &track.elevation {
        let note = if report.degraded { " (degraded)" } else { "" };
        println!("Elevation: {}{}", report.origin, note);
    }
    println!();
    println!("Distance: {:.2} km", route.total_distance());
    println!("Ascent: {:.0} m", route.total_gain());
    println!("Descent: {:.0} m", route.total_loss());
    println!("Elevation range: {:.0} m to {:.0} m", min_ele, max_ele);
    println!("Estimated time: {}", format_hours(total_hours));
    println!();

    println!(
        "{:>3}  {:<24} {:>9} {:>7} {:>7} {:>7} {:>7}",
        "#", "WAYPOINT", "KM", "ELE", "GAIN", "LOSS", "TIME"
    );
    println!("{}", "-".repeat(72));
    for (i, row) in rows.iter().enumerate() {
        println!(
            "{:>3}  {:<24} {:>9.2} {:>7.0} {:>7.0} {:>7.0} {:>7}",
            i,
            row.name,
            row.distance_km,
            row.elevation_m,
            row.gain_m,
            row.loss_m,
            format_hours(row.total_hours)
        );
    }

    Ok(())
}
