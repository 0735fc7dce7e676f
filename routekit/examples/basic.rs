//! Load a GPX file and print its waypoint table.
//!
//! Run with: cargo run --example basic -- /path/to/track.gpx
//!
//! Tiles are read from `ROUTEKIT_TILE_DIR` when set.

use routekit::export::{format_hours, waypoint_table};
use routekit::{load_track, ElevationResolver, Pace, RouteError};
use std::env;

fn main() -> Result<(), RouteError> {
    let path = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/track.gpx");
        std::process::exit(1);
    });

    let mut config = ElevationResolver::builder().offline(true);
    if let Ok(dir) = env::var("ROUTEKIT_TILE_DIR") {
        config = config.tile_dir(dir);
    }
    let resolver = config.build()?;

    let data = std::fs::read(&path)?;
    let track = load_track(&path, &data, &resolver)?;
    let route = &track.route;

    if let Some(report) = &track.elevation {
        println!("Elevation source: {}", report.origin);
    }
    println!(
        "{:.2} km, +{:.0} m / -{:.0} m, {} points",
        route.total_distance(),
        route.total_gain(),
        route.total_loss(),
        route.points().len()
    );
    println!("{:-<60}", "");

    for row in waypoint_table(route, &Pace::default()) {
        println!(
            "{:<20} {:>8.2} km {:>6.0} m  {}",
            row.name,
            row.distance_km,
            row.elevation_m,
            format_hours(row.total_hours)
        );
    }

    Ok(())
}
