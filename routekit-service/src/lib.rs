//! Routekit Service Library
//!
//! HTTP handlers, shared state and router for the route editing service.
//! This library is used by both the routekit-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use routekit::{EditSession, ElevationResolver, Pace, TrackLibrary};
use tokio::sync::Mutex;

/// Everything the edit endpoints touch, guarded by one lock.
#[derive(Debug, Default)]
pub struct Workspace {
    pub library: TrackLibrary,
    pub session: EditSession,
    /// Display name of the route in the session.
    pub route_name: Option<String>,
}

/// Application state shared across handlers.
pub struct AppState {
    /// Elevation chain used for uploads. With remote sources enabled it must
    /// be built and dropped outside the tokio runtime.
    pub resolver: Arc<ElevationResolver>,
    pub workspace: Mutex<Workspace>,
    /// Held for the whole resolution of an upload so tracks resolve one at a time.
    pub upload_lock: Mutex<()>,
    /// Default pace for CSV exports.
    pub pace: Pace,
}

impl AppState {
    pub fn new(resolver: ElevationResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
            workspace: Mutex::new(Workspace::default()),
            upload_lock: Mutex::new(()),
            pace: Pace::default(),
        }
    }
}

/// All API routes, without documentation or middleware.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tracks", get(handlers::list_tracks).post(handlers::upload_track))
        .route("/tracks/:id/activate", post(handlers::activate_track))
        .route("/link", post(handlers::link))
        .route("/route", get(handlers::get_route))
        .route("/route/reverse", post(handlers::reverse))
        .route("/route/reset", post(handlers::reset))
        .route("/route/truncate", post(handlers::truncate))
        .route("/route/waypoints", post(handlers::add_waypoint))
        .route(
            "/route/waypoints/:index",
            put(handlers::rename_waypoint).delete(handlers::delete_waypoint),
        )
        .route("/route/export/csv", get(handlers::export_csv))
        .route("/route/export/gpx", get(handlers::export_gpx))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    AddWaypointRequest, ApiError, ErrorResponse, ExportQuery, HealthResponse, LinkRequest, RenameRequest,
    RouteResponse, StatsResponse, TrackSummary, TruncateRequest, UploadQuery,
};
