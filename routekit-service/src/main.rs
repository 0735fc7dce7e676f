//! Routekit Service - HTTP service for GPX route editing.
//!
//! Holds a library of uploaded tracks and one route under edit.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ROUTEKIT_TILE_DIR` | Directory containing .hgt tiles | None |
//! | `ROUTEKIT_CACHE_SIZE` | Maximum tiles in cache | 100 |
//! | `ROUTEKIT_OFFLINE` | Skip the web elevation services | false |
//! | `ROUTEKIT_OPEN_ELEVATION_URL` | Open-Elevation lookup URL | public API |
//! | `ROUTEKIT_OPENTOPODATA_URL` | OpenTopoData dataset URL | public API |
//! | `ROUTEKIT_OPEN_METEO_URL` | Open-Meteo elevation URL | public API |
//! | `ROUTEKIT_PORT` | HTTP server port | 8080 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `POST /tracks` - Upload a GPX track, `GET /tracks` - list tracks
//! - `POST /tracks/{id}/activate`, `POST /link` - choose the route to edit
//! - `GET /route` and the `/route/...` edit endpoints
//! - `GET /route/export/csv`, `GET /route/export/gpx`
//! - `GET /health`, `GET /stats`
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use routekit::ResolverConfig;
use routekit_service::{app, handlers, AppState};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation for the route service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Routekit Service",
        version = "0.1.0",
        description = "Load GPX tracks, edit the active route and export it.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::upload_track,
        handlers::list_tracks,
        handlers::activate_track,
        handlers::link,
        handlers::get_route,
        handlers::reverse,
        handlers::reset,
        handlers::truncate,
        handlers::add_waypoint,
        handlers::rename_waypoint,
        handlers::delete_waypoint,
        handlers::export_csv,
        handlers::export_gpx,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::TrackSummary,
            handlers::RouteResponse,
            handlers::LinkRequest,
            handlers::TruncateRequest,
            handlers::AddWaypointRequest,
            handlers::RenameRequest,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "tracks", description = "Track upload and linking"),
        (name = "route", description = "Active route edits"),
        (name = "waypoints", description = "Waypoint edits"),
        (name = "export", description = "CSV and GPX downloads"),
        (name = "system", description = "System and health endpoints")
    )
)]
struct ApiDoc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routekit_service=info,routekit=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("ROUTEKIT_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let config = ResolverConfig::from_env();
    if config.configured_tile_dir().is_none() {
        tracing::warn!("ROUTEKIT_TILE_DIR not set, local tiles disabled");
    }
    let offline = config.is_offline();

    // The remote sources own blocking HTTP clients, which must be created and
    // dropped outside the async runtime.
    let resolver = config.build()?;

    tracing::info!(
        sources = ?resolver.source_names(),
        offline,
        port,
        "Starting routekit service"
    );

    let state = Arc::new(AppState::new(resolver));

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let served = runtime.block_on(serve(Arc::clone(&state), port));
    drop(runtime);

    served
}

async fn serve(state: Arc<AppState>, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let router = app(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
