//! # routekit - GPX route pipeline
//!
//! Load a GPX track, fill in missing elevations, compute cumulative distance,
//! ascent and descent, and edit the result as a route with named waypoints.
//!
//! ## Features
//!
//! - **Elevation chain**: local SRTM `.hgt` tiles first, then public
//!   elevation APIs (`remote` feature), then a flat profile as last resort
//! - **Sampling**: at most 100 points are looked up; the rest are
//!   interpolated
//! - **Edits**: reverse, truncate, insert/rename/delete waypoints, link two
//!   tracks; every edit rebuilds the route from scratch
//! - **Exports**: CSV waypoint table with time estimates, GPX, GeoJSON
//!   (`geojson` feature)
//!
//! ## Quick Start
//!
//! ```ignore
//! use routekit::{load_track, ElevationResolver, EditSession};
//!
//! let resolver = ElevationResolver::builder()
//!     .tile_dir("/data/srtm")
//!     .build()?;
//!
//! let data = std::fs::read("hike.gpx")?;
//! let track = load_track("hike", &data, &resolver)?;
//! println!("{:.1} km, +{:.0} m", track.route.total_distance(), track.route.total_gain());
//!
//! let mut session = EditSession::new();
//! session.load(track.route);
//! session.reverse()?;
//! session.add_waypoint_at(22.35, 114.15)?;
//! ```
//!
//! ## Tile Format
//!
//! - **SRTM1**: 3601×3601 samples, 1 arc-second (~30m) resolution
//! - **SRTM3**: 1201×1201 samples, 3 arc-second (~90m) resolution
//!
//! Samples are 16-bit big-endian signed integers in metres; -32768 marks void.

pub mod elevation;
pub mod error;
pub mod export;
pub mod filename;
pub mod geodesy;
pub mod gpx;
pub mod link;
pub mod mutate;
pub mod point;
pub mod route;
pub mod session;
pub mod tile;
pub mod tiles;

#[cfg(feature = "remote")]
pub mod remote;

#[cfg(feature = "geojson")]
pub mod geojson;

// Re-export main types at crate root for convenience
pub use elevation::{
    ElevationOrigin, ElevationReport, ElevationResolver, ElevationSource, ResolverConfig, SourceAttempt,
    Threshold, TileSource,
};
pub use error::{Result, RouteError};
pub use export::Pace;
pub use link::{link_tracks, TrackEnd};
pub use point::{GeoPoint, RawWaypoint, TrackPoint, Waypoint, WaypointLabel};
pub use route::{process_route, Route};
pub use session::{load_track, EditSession, LoadedTrack, TrackLibrary};
pub use tile::{ElevationTile, TileResolution, VOID_VALUE};
pub use tiles::{CacheStats, TileStore};
