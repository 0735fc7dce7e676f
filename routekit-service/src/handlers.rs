//! HTTP request handlers for the route service.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use routekit::export::csv_bytes;
use routekit::gpx::gpx_bytes;
use routekit::{
    load_track, ElevationReport, Pace, Route, RouteError, TrackEnd, TrackPoint, Waypoint,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::{AppState, Workspace};

/// Error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Error returned by every fallible handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl From<RouteError> for ApiError {
    fn from(e: RouteError) -> Self {
        let status = match &e {
            RouteError::UnknownTrack { .. } => StatusCode::NOT_FOUND,
            RouteError::NoActiveRoute => StatusCode::CONFLICT,
            e if e.is_user_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Track processing aborted: {}", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.message, "Request rejected");
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Query parameters for uploads.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Display name of the track. Defaults to the GPX track name.
    pub name: Option<String>,
}

/// A track held in the library.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackSummary {
    pub id: u64,
    pub name: String,
    pub points: usize,
    pub waypoints: usize,
    pub total_distance_km: f64,
    pub total_gain_m: f64,
    pub total_loss_m: f64,
    /// How missing elevations were filled.
    #[schema(value_type = Object)]
    pub elevation: Option<ElevationReport>,
}

/// The route being edited.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RouteResponse {
    pub name: String,
    pub total_distance_km: f64,
    pub total_gain_m: f64,
    pub total_loss_m: f64,
    /// Points with cumulative `distance`, `gain` and `loss`.
    #[schema(value_type = Vec<Object>)]
    pub points: Vec<TrackPoint>,
    /// Waypoints sorted by distance; the first is the start, the last the end.
    #[schema(value_type = Vec<Object>)]
    pub waypoints: Vec<Waypoint>,
    pub active_waypoint: Option<usize>,
}

impl RouteResponse {
    fn new(workspace: &Workspace, route: &Route) -> Self {
        Self {
            name: workspace.route_name.clone().unwrap_or_default(),
            total_distance_km: route.total_distance(),
            total_gain_m: route.total_gain(),
            total_loss_m: route.total_loss(),
            points: route.points().to_vec(),
            waypoints: route.waypoints().to_vec(),
            active_waypoint: workspace.session.active_waypoint(),
        }
    }
}

/// Link two library tracks into the active route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LinkRequest {
    pub first: u64,
    /// `start` keeps the first track's direction, `end` reverses it.
    #[schema(value_type = String, example = "end")]
    pub first_end: TrackEnd,
    pub second: u64,
    #[schema(value_type = String, example = "start")]
    pub second_end: TrackEnd,
}

/// Cut the route at a point index.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TruncateRequest {
    /// `start` drops points before `index`, `end` drops points after it.
    #[schema(value_type = String, example = "start")]
    pub from: TrackEnd,
    pub index: usize,
}

/// A new custom waypoint, by coordinate or by distance along the route.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AddWaypointRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Kilometres from the start; used when no coordinate is given.
    pub distance_km: Option<f64>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenameRequest {
    pub name: String,
}

/// Pace for the time columns of the CSV export.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Flat walking speed, km/h (default 5).
    pub flat_kmh: Option<f64>,
    /// Ascent rate, m/h (default 600).
    pub climb_rate: Option<f64>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Service statistics.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub tracks: usize,
    pub has_route: bool,
    /// Elevation sources in priority order.
    pub sources: Vec<String>,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

fn summary(id: u64, track: &routekit::LoadedTrack) -> TrackSummary {
    TrackSummary {
        id,
        name: track.name.clone(),
        points: track.route.points().len(),
        waypoints: track.route.waypoints().len(),
        total_distance_km: track.route.total_distance(),
        total_gain_m: track.route.total_gain(),
        total_loss_m: track.route.total_loss(),
        elevation: track.elevation.clone(),
    }
}

/// Upload a GPX track.
///
/// Missing elevations are resolved before the response is sent. The first
/// uploaded track becomes the active route.
#[utoipa::path(
    post,
    path = "/tracks",
    params(UploadQuery),
    request_body(content = String, content_type = "application/gpx+xml", description = "GPX document"),
    responses(
        (status = 201, description = "Track loaded", body = TrackSummary),
        (status = 400, description = "Invalid GPX or no track points", body = ErrorResponse)
    ),
    tag = "tracks"
)]
pub async fn upload_track(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<TrackSummary>)> {
    let _upload = state.upload_lock.lock().await;

    let resolver = Arc::clone(&state.resolver);
    let track = tokio::task::spawn_blocking(move || {
        let name = match query.name {
            Some(name) => name,
            None => routekit::gpx::read_gpx(&body[..])
                .ok()
                .and_then(|parsed| parsed.name)
                .unwrap_or_else(|| "track".to_string()),
        };
        load_track(&name, &body, &resolver)
    })
    .await??;

    let mut ws = state.workspace.lock().await;
    let response = {
        let name = track.name.clone();
        let route = track.route.clone();
        let id = ws.library.add(track);
        if !ws.session.has_route() {
            ws.session.load(route);
            ws.route_name = Some(name);
        }
        summary(id, ws.library.get(id)?)
    };

    tracing::info!(id = response.id, name = %response.name, points = response.points, "Track uploaded");
    Ok((StatusCode::CREATED, Json(response)))
}

/// List uploaded tracks.
#[utoipa::path(
    get,
    path = "/tracks",
    responses((status = 200, description = "Loaded tracks", body = Vec<TrackSummary>)),
    tag = "tracks"
)]
pub async fn list_tracks(State(state): State<Arc<AppState>>) -> Json<Vec<TrackSummary>> {
    let ws = state.workspace.lock().await;
    Json(ws.library.iter().map(|(id, t)| summary(id, t)).collect())
}

/// Make a library track the active route, discarding unsaved edits.
#[utoipa::path(
    post,
    path = "/tracks/{id}/activate",
    params(("id" = u64, Path, description = "Track id")),
    responses(
        (status = 200, description = "Route activated", body = RouteResponse),
        (status = 404, description = "Unknown track", body = ErrorResponse)
    ),
    tag = "tracks"
)]
pub async fn activate_track(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<RouteResponse>> {
    let mut ws = state.workspace.lock().await;
    let track = ws.library.get(id)?;
    let (name, route) = (track.name.clone(), track.route.clone());

    ws.session.load(route);
    ws.route_name = Some(name);
    route_response(&ws)
}

/// Link two tracks; the result becomes the active route.
#[utoipa::path(
    post,
    path = "/link",
    request_body = LinkRequest,
    responses(
        (status = 200, description = "Linked route", body = RouteResponse),
        (status = 400, description = "Same track on both sides", body = ErrorResponse),
        (status = 404, description = "Unknown track", body = ErrorResponse)
    ),
    tag = "tracks"
)]
pub async fn link(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LinkRequest>,
) -> ApiResult<Json<RouteResponse>> {
    let mut ws = state.workspace.lock().await;
    let route = ws.library.link(req.first, req.first_end, req.second, req.second_end)?;
    let name = format!(
        "{} + {}",
        ws.library.get(req.first)?.name,
        ws.library.get(req.second)?.name
    );

    ws.session.load(route);
    ws.route_name = Some(name);
    route_response(&ws)
}

fn route_response(ws: &Workspace) -> ApiResult<Json<RouteResponse>> {
    Ok(Json(RouteResponse::new(ws, ws.session.current()?)))
}

/// The active route.
#[utoipa::path(
    get,
    path = "/route",
    responses(
        (status = 200, description = "Active route", body = RouteResponse),
        (status = 409, description = "No active route", body = ErrorResponse)
    ),
    tag = "route"
)]
pub async fn get_route(State(state): State<Arc<AppState>>) -> ApiResult<Json<RouteResponse>> {
    let ws = state.workspace.lock().await;
    route_response(&ws)
}

/// Reverse the direction of travel.
#[utoipa::path(
    post,
    path = "/route/reverse",
    responses(
        (status = 200, description = "Reversed route", body = RouteResponse),
        (status = 409, description = "No active route", body = ErrorResponse)
    ),
    tag = "route"
)]
pub async fn reverse(State(state): State<Arc<AppState>>) -> ApiResult<Json<RouteResponse>> {
    let mut ws = state.workspace.lock().await;
    ws.session.reverse()?;
    route_response(&ws)
}

/// Restore the route as it was loaded.
#[utoipa::path(
    post,
    path = "/route/reset",
    responses(
        (status = 200, description = "Original route", body = RouteResponse),
        (status = 409, description = "No active route", body = ErrorResponse)
    ),
    tag = "route"
)]
pub async fn reset(State(state): State<Arc<AppState>>) -> ApiResult<Json<RouteResponse>> {
    let mut ws = state.workspace.lock().await;
    ws.session.reset()?;
    route_response(&ws)
}

/// Cut the route at a point index.
#[utoipa::path(
    post,
    path = "/route/truncate",
    request_body = TruncateRequest,
    responses(
        (status = 200, description = "Truncated route", body = RouteResponse),
        (status = 400, description = "Index out of range", body = ErrorResponse),
        (status = 409, description = "No active route", body = ErrorResponse)
    ),
    tag = "route"
)]
pub async fn truncate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TruncateRequest>,
) -> ApiResult<Json<RouteResponse>> {
    let mut ws = state.workspace.lock().await;
    match req.from {
        TrackEnd::Start => ws.session.truncate_from_start(req.index)?,
        TrackEnd::End => ws.session.truncate_from_end(req.index)?,
    };
    route_response(&ws)
}

/// Add a custom waypoint.
#[utoipa::path(
    post,
    path = "/route/waypoints",
    request_body = AddWaypointRequest,
    responses(
        (status = 200, description = "Route with the new waypoint", body = RouteResponse),
        (status = 400, description = "Neither coordinate nor distance given", body = ErrorResponse),
        (status = 409, description = "No active route", body = ErrorResponse)
    ),
    tag = "waypoints"
)]
pub async fn add_waypoint(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddWaypointRequest>,
) -> ApiResult<Json<RouteResponse>> {
    let mut ws = state.workspace.lock().await;

    let before: Vec<Waypoint> = ws.session.current()?.waypoints().to_vec();
    let route = match (req.lat, req.lon, req.distance_km) {
        (Some(lat), Some(lon), _) => ws.session.add_waypoint_at(lat, lon)?,
        (_, _, Some(km)) => ws.session.add_waypoint_at_distance(km)?,
        _ => {
            return Err(ApiError {
                status: StatusCode::BAD_REQUEST,
                message: "Provide lat and lon, or distance_km".to_string(),
            })
        }
    };

    // The inserted waypoint is the first custom one not present before.
    let index = route
        .waypoints()
        .iter()
        .enumerate()
        .position(|(i, w)| w.is_custom && before.get(i) != Some(w));

    if let (Some(index), Some(name)) = (index, req.name.as_deref()) {
        ws.session.rename_waypoint(index, name)?;
    }
    ws.session.select_waypoint(index)?;
    route_response(&ws)
}

/// Rename a waypoint. A blank name becomes "Custom waypoint".
#[utoipa::path(
    put,
    path = "/route/waypoints/{index}",
    params(("index" = usize, Path, description = "Waypoint index")),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Renamed", body = RouteResponse),
        (status = 400, description = "Index out of range", body = ErrorResponse),
        (status = 409, description = "No active route", body = ErrorResponse)
    ),
    tag = "waypoints"
)]
pub async fn rename_waypoint(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<RouteResponse>> {
    let mut ws = state.workspace.lock().await;
    ws.session.rename_waypoint(index, &req.name)?;
    route_response(&ws)
}

/// Delete a waypoint. Deleting the start or end cuts the route at the
/// neighbouring waypoint.
#[utoipa::path(
    delete,
    path = "/route/waypoints/{index}",
    params(("index" = usize, Path, description = "Waypoint index")),
    responses(
        (status = 200, description = "Waypoint deleted", body = RouteResponse),
        (status = 400, description = "Index out of range or only start and end left", body = ErrorResponse),
        (status = 409, description = "No active route", body = ErrorResponse)
    ),
    tag = "waypoints"
)]
pub async fn delete_waypoint(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> ApiResult<Json<RouteResponse>> {
    let mut ws = state.workspace.lock().await;
    ws.session.delete_waypoint(index)?;
    route_response(&ws)
}

fn attachment(content_type: &'static str, filename: String, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

fn file_stem(ws: &Workspace) -> String {
    ws.route_name
        .as_deref()
        .unwrap_or("route")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Waypoint table as CSV.
#[utoipa::path(
    get,
    path = "/route/export/csv",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV waypoint table", content_type = "text/csv", body = String),
        (status = 409, description = "No active route", body = ErrorResponse)
    ),
    tag = "export"
)]
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let pace = Pace {
        flat_kmh: query.flat_kmh.unwrap_or(state.pace.flat_kmh),
        climb_m_per_h: query.climb_rate.unwrap_or(state.pace.climb_m_per_h),
    };
    let ws = state.workspace.lock().await;
    let body = csv_bytes(ws.session.current()?, &pace)?;
    Ok(attachment("text/csv", format!("{}.csv", file_stem(&ws)), body))
}

/// Route as GPX.
#[utoipa::path(
    get,
    path = "/route/export/gpx",
    responses(
        (status = 200, description = "GPX document", content_type = "application/gpx+xml", body = String),
        (status = 409, description = "No active route", body = ErrorResponse)
    ),
    tag = "export"
)]
pub async fn export_gpx(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let ws = state.workspace.lock().await;
    let name = ws.route_name.clone().unwrap_or_else(|| "route".to_string());
    let body = gpx_bytes(ws.session.current()?, &name)?;
    Ok(attachment("application/gpx+xml", format!("{}.gpx", file_stem(&ws)), body))
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Library, session and tile cache statistics.
#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, description = "Service statistics", body = StatsResponse)),
    tag = "system"
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.resolver.tile_stats().unwrap_or_default();
    let ws = state.workspace.lock().await;

    Json(StatsResponse {
        tracks: ws.library.len(),
        has_route: ws.session.has_route(),
        sources: state.resolver.source_names().into_iter().map(String::from).collect(),
        cache_hits: stats.hit_count,
        cache_misses: stats.miss_count,
        hit_rate: stats.hit_rate(),
    })
}
