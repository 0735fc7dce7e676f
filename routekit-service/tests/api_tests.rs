//! Integration tests for the HTTP API.

use axum::http::StatusCode;
use axum_test::TestServer;
use routekit::ResolverConfig;
use routekit_service::{app, AppState};
use serde_json::{json, Value};
use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;

/// File size for SRTM3 (1201 × 1201 × 2 bytes)
const SRTM3_SIZE: usize = 1201 * 1201 * 2;

const RIDGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <wpt lat="35.51" lon="138.5"><name>Hut</name></wpt>
  <trk>
    <name>Ridge</name>
    <trkseg>
      <trkpt lat="35.50" lon="138.5"><ele>100</ele></trkpt>
      <trkpt lat="35.51" lon="138.5"><ele>150</ele></trkpt>
      <trkpt lat="35.52" lon="138.5"><ele>120</ele></trkpt>
      <trkpt lat="35.53" lon="138.5"><ele>180</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

const VALLEY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Valley</name>
    <trkseg>
      <trkpt lat="35.53" lon="138.51"><ele>180</ele></trkpt>
      <trkpt lat="35.53" lon="138.52"><ele>160</ele></trkpt>
      <trkpt lat="35.53" lon="138.53"><ele>140</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

const NO_ELEVATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Bare</name>
    <trkseg>
      <trkpt lat="35.50" lon="138.5"></trkpt>
      <trkpt lat="35.51" lon="138.5"></trkpt>
      <trkpt lat="35.52" lon="138.5"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

/// Create a test SRTM3 file with the same elevation everywhere.
fn create_test_tile(dir: &std::path::Path, filename: &str, elevation: i16) {
    let data: Vec<u8> = elevation
        .to_be_bytes()
        .iter()
        .copied()
        .cycle()
        .take(SRTM3_SIZE)
        .collect();

    let mut file = File::create(dir.join(filename)).unwrap();
    file.write_all(&data).unwrap();
}

/// A server whose resolver only reads tiles from `temp_dir`.
fn create_test_server(temp_dir: &TempDir) -> TestServer {
    let resolver = ResolverConfig::new()
        .tile_dir(temp_dir.path())
        .cache_size(10)
        .offline(true)
        .build()
        .unwrap();

    TestServer::new(app(Arc::new(AppState::new(resolver)))).unwrap()
}

async fn upload(server: &TestServer, gpx: &str) -> Value {
    let response = server.post("/tracks").text(gpx).await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

fn waypoint_names(route: &Value) -> Vec<String> {
    route["waypoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn test_route_requires_upload() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    server.get("/route").await.assert_status(StatusCode::CONFLICT);
    server.post("/route/reverse").await.assert_status(StatusCode::CONFLICT);
    server.get("/route/export/csv").await.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_upload_activates_first_track() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let track = upload(&server, RIDGE).await;
    assert_eq!(track["id"], 1);
    assert_eq!(track["name"], "Ridge");
    assert_eq!(track["points"], 4);
    assert_eq!(track["waypoints"], 3);
    assert_eq!(track["elevation"]["origin"]["kind"], "file");

    let response = server.get("/route").await;
    response.assert_status_ok();
    let route: Value = response.json();
    assert_eq!(route["name"], "Ridge");
    assert_eq!(route["total_gain_m"], 110.0);
    assert_eq!(route["total_loss_m"], 30.0);
    assert_eq!(waypoint_names(&route), vec!["Start", "Hut", "End"]);
    assert!(route["waypoints"][0]["is_start"].as_bool().unwrap());
    assert!(route["waypoints"][2]["is_end"].as_bool().unwrap());

    // A second upload goes to the library without replacing the route
    let second = upload(&server, VALLEY).await;
    assert_eq!(second["id"], 2);
    let route: Value = server.get("/route").await.json();
    assert_eq!(route["name"], "Ridge");

    let tracks: Value = server.get("/tracks").await.json();
    assert_eq!(tracks.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_upload_name_override() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server
        .post("/tracks")
        .add_query_param("name", "Saturday")
        .text(RIDGE)
        .await;
    response.assert_status(StatusCode::CREATED);
    let json: Value = response.json();
    assert_eq!(json["name"], "Saturday");
}

#[tokio::test]
async fn test_upload_resolves_from_tiles() {
    let temp_dir = TempDir::new().unwrap();
    create_test_tile(temp_dir.path(), "N35E138.hgt", 250);
    let server = create_test_server(&temp_dir);

    let track = upload(&server, NO_ELEVATION).await;
    assert_eq!(track["elevation"]["origin"]["kind"], "source");
    assert_eq!(track["elevation"]["origin"]["name"], "tiles");
    assert_eq!(track["elevation"]["degraded"], false);

    let route: Value = server.get("/route").await.json();
    for point in route["points"].as_array().unwrap() {
        assert!((point["ele"].as_f64().unwrap() - 250.0).abs() < 1e-6);
    }
}

#[tokio::test]
async fn test_upload_flat_fallback() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let track = upload(&server, NO_ELEVATION).await;
    assert_eq!(track["elevation"]["origin"]["kind"], "flat");
    assert_eq!(track["elevation"]["degraded"], true);
    assert_eq!(track["total_gain_m"], 0.0);
}

#[tokio::test]
async fn test_upload_rejects_bad_gpx() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.post("/tracks").text("not a gpx file").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert!(json["error"].as_str().is_some());

    let waypoints_only = r#"<?xml version="1.0"?>
<gpx version="1.1" creator="test"><wpt lat="1" lon="2"><name>Lonely</name></wpt></gpx>"#;
    server
        .post("/tracks")
        .text(waypoints_only)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let tracks: Value = server.get("/tracks").await.json();
    assert!(tracks.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reverse_and_reset() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);
    upload(&server, RIDGE).await;

    let response = server.post("/route/reverse").await;
    response.assert_status_ok();
    let route: Value = response.json();
    assert_eq!(route["points"][0]["lat"], 35.53);
    assert_eq!(route["total_gain_m"], 30.0);
    assert_eq!(route["total_loss_m"], 110.0);
    assert_eq!(waypoint_names(&route), vec!["Start", "Hut", "End"]);

    let route: Value = server.post("/route/reset").await.json();
    assert_eq!(route["points"][0]["lat"], 35.5);
    assert_eq!(route["total_gain_m"], 110.0);
}

#[tokio::test]
async fn test_truncate() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);
    upload(&server, RIDGE).await;

    let response = server
        .post("/route/truncate")
        .json(&json!({"from": "start", "index": 1}))
        .await;
    response.assert_status_ok();
    let route: Value = response.json();
    assert_eq!(route["points"].as_array().unwrap().len(), 3);
    assert_eq!(route["points"][0]["distance"], 0.0);

    let response = server
        .post("/route/truncate")
        .json(&json!({"from": "end", "index": 10}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // The failed edit left the route alone
    let route: Value = server.get("/route").await.json();
    assert_eq!(route["points"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_add_and_rename_waypoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);
    upload(&server, RIDGE).await;

    let response = server
        .post("/route/waypoints")
        .json(&json!({"lat": 35.52, "lon": 138.5, "name": "Viewpoint"}))
        .await;
    response.assert_status_ok();
    let route: Value = response.json();
    assert_eq!(waypoint_names(&route), vec!["Start", "Hut", "Viewpoint", "End"]);
    assert_eq!(route["active_waypoint"], 2);
    assert!(route["waypoints"][2]["is_custom"].as_bool().unwrap());

    let route: Value = server
        .put("/route/waypoints/2")
        .json(&json!({"name": "   "}))
        .await
        .json();
    assert_eq!(route["waypoints"][2]["name"], "Custom waypoint");
    assert_eq!(route["active_waypoint"], 2);

    server
        .put("/route/waypoints/9")
        .json(&json!({"name": "Nowhere"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/route/waypoints")
        .json(&json!({"name": "Nowhere"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_waypoint_by_distance() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);
    upload(&server, RIDGE).await;

    let route: Value = server
        .post("/route/waypoints")
        .json(&json!({"distance_km": 10.0}))
        .await
        .json();

    // Past the end snaps to the last point
    let names = waypoint_names(&route);
    assert_eq!(names.len(), 4);
    assert_eq!(names.last().unwrap(), "End");
}

#[tokio::test]
async fn test_delete_waypoints() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);
    upload(&server, RIDGE).await;

    let response = server.delete("/route/waypoints/0").await;
    response.assert_status_ok();
    let route: Value = response.json();
    assert_eq!(waypoint_names(&route), vec!["Start", "End"]);
    assert_eq!(route["points"].as_array().unwrap().len(), 3);
    assert_eq!(route["points"][0]["lat"], 35.51);

    // Only start and end remain
    let response = server.delete("/route/waypoints/1").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    server.delete("/route/waypoints/5").await.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_link_tracks() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);
    upload(&server, RIDGE).await;
    upload(&server, VALLEY).await;

    let response = server
        .post("/link")
        .json(&json!({"first": 1, "first_end": "start", "second": 2, "second_end": "start"}))
        .await;
    response.assert_status_ok();
    let route: Value = response.json();
    assert_eq!(route["name"], "Ridge + Valley");
    assert_eq!(route["points"].as_array().unwrap().len(), 7);
    assert_eq!(waypoint_names(&route), vec!["Start", "Hut", "End"]);

    server
        .post("/link")
        .json(&json!({"first": 1, "first_end": "end", "second": 1, "second_end": "start"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/link")
        .json(&json!({"first": 1, "first_end": "end", "second": 99, "second_end": "start"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_activate_track() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);
    upload(&server, RIDGE).await;
    upload(&server, VALLEY).await;

    let response = server.post("/tracks/2/activate").await;
    response.assert_status_ok();
    let route: Value = response.json();
    assert_eq!(route["name"], "Valley");
    assert_eq!(route["points"].as_array().unwrap().len(), 3);

    server
        .post("/tracks/7/activate")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_csv() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);
    upload(&server, RIDGE).await;

    let response = server.get("/route/export/csv").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/csv");
    let csv = response.text();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "name,lat,lon,segment_km,elevation_m,distance_km,gain_m,loss_m,segment_time,total_time"
    );
    assert_eq!(lines.count(), 3);

    let response = server
        .get("/route/export/csv")
        .add_query_param("flat_kmh", 4.0)
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_export_gpx_reloads() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);
    upload(&server, RIDGE).await;

    let response = server.get("/route/export/gpx").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/gpx+xml");
    let gpx = response.text();
    assert!(gpx.contains("Hut"));

    // The export loads back as the same route
    let track = upload(&server, &gpx).await;
    assert_eq!(track["points"], 4);
    assert_eq!(track["waypoints"], 3);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    create_test_tile(temp_dir.path(), "N35E138.hgt", 250);
    let server = create_test_server(&temp_dir);

    let json: Value = server.get("/stats").await.json();
    assert_eq!(json["tracks"], 0);
    assert_eq!(json["has_route"], false);
    assert_eq!(json["sources"], json!(["tiles"]));
    assert_eq!(json["cache_misses"], 0);

    upload(&server, NO_ELEVATION).await;

    let json: Value = server.get("/stats").await.json();
    assert_eq!(json["tracks"], 1);
    assert_eq!(json["has_route"], true);
    assert_eq!(json["cache_misses"], 1);
}

/// Remote sources hold blocking HTTP clients: build and drop them outside the
/// runtime, serve from inside it.
#[test]
fn test_online_resolver_serves_from_runtime() {
    let resolver = ResolverConfig::new().offline(false).build().unwrap();
    assert_eq!(
        resolver.source_names(),
        vec!["open-elevation", "opentopodata", "open-meteo"]
    );
    let state = Arc::new(AppState::new(resolver));

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let server = TestServer::new(app(Arc::clone(&state))).unwrap();
        let json: Value = server.get("/stats").await.json();
        assert_eq!(json["sources"].as_array().unwrap().len(), 3);
        assert_eq!(json["has_route"], false);
    });
    drop(runtime);

    assert_eq!(Arc::strong_count(&state), 1);
}
