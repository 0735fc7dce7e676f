//! Error types for the routekit library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, resolving or editing a route.
#[derive(Error, Debug)]
pub enum RouteError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tile file size doesn't match SRTM1 or SRTM3 format.
    #[error("Invalid tile size: {size} bytes (expected 25934402 for SRTM1 or 2884802 for SRTM3)")]
    InvalidTileSize { size: usize },

    /// Coordinates are outside the raster tile coverage.
    #[error("Coordinates out of bounds: lat={lat}, lon={lon} (valid: lat ±60°, lon ±180°)")]
    OutOfBounds { lat: f64, lon: f64 },

    /// The requested raster tile is not present in the tile directory.
    #[error("Elevation tile not found: {path}")]
    TileNotFound { path: PathBuf },

    /// The GPX document could not be parsed or written.
    #[error("GPX error: {0}")]
    Gpx(String),

    /// The GPX document contains no `<trkpt>` elements.
    #[error("No track points found in GPX data")]
    NoTrackPoints,

    /// A route needs at least one point.
    #[error("Cannot build a route from an empty track")]
    EmptyTrack,

    /// A point still lacks elevation when a route is being built.
    #[error("Point {index} has no elevation")]
    MissingElevation { index: usize },

    /// Waypoint index does not exist in the current route.
    #[error("Waypoint index {index} out of range (route has {len} waypoints)")]
    WaypointIndex { index: usize, len: usize },

    /// Point index does not exist in the current route.
    #[error("Point index {index} out of range (route has {len} points)")]
    PointIndex { index: usize, len: usize },

    /// Start or end waypoint deletion would leave fewer than two waypoints.
    #[error("Cannot delete the {which} waypoint: a route needs at least a start and an end")]
    WaypointFloor { which: &'static str },

    /// A track cannot be linked with itself.
    #[error("Cannot link a track with itself")]
    SameTrack,

    /// An edit was requested while no route is loaded.
    #[error("No active route")]
    NoActiveRoute,

    /// Track id is not known to the library.
    #[error("Unknown track id: {id}")]
    UnknownTrack { id: u64 },

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP client error from a remote elevation provider.
    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RouteError {
    /// Whether the error was caused by bad input or a rejected edit rather than
    /// by the environment (IO, network).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RouteError::Gpx(_)
                | RouteError::NoTrackPoints
                | RouteError::EmptyTrack
                | RouteError::WaypointIndex { .. }
                | RouteError::PointIndex { .. }
                | RouteError::WaypointFloor { .. }
                | RouteError::SameTrack
                | RouteError::NoActiveRoute
                | RouteError::UnknownTrack { .. }
        )
    }
}

/// Result type alias using [`RouteError`].
pub type Result<T> = std::result::Result<T, RouteError>;
