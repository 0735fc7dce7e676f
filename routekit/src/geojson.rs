//! GeoJSON export.
//!
//! Enable the `geojson` feature to use this module. A route becomes a
//! `FeatureCollection` holding one `LineString` with `[lon, lat, ele]`
//! coordinates and one `Point` per waypoint.
//!
//! # Example
//!
//! ```ignore
//! use routekit::geojson::route_to_geojson;
//!
//! let collection = route_to_geojson(&route, "Morning loop");
//! std::fs::write("route.geojson", collection.to_string())?;
//! ```

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoJsonValue};
use serde_json::json;

use crate::point::Waypoint;
use crate::route::Route;

fn feature(value: GeoJsonValue, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn waypoint_properties(wp: &Waypoint) -> JsonObject {
    let mut props = JsonObject::new();
    props.insert("name".into(), json!(wp.name));
    props.insert("distance_km".into(), json!(wp.distance));
    props.insert("gain_m".into(), json!(wp.gain));
    props.insert("loss_m".into(), json!(wp.loss));
    props.insert("is_start".into(), json!(wp.is_start));
    props.insert("is_end".into(), json!(wp.is_end));
    props.insert("is_custom".into(), json!(wp.is_custom));
    props
}

/// Convert a route into a feature collection.
///
/// The first feature is the track line, carrying the route name and totals
/// as properties; waypoint features follow in route order.
pub fn route_to_geojson(route: &Route, name: &str) -> FeatureCollection {
    let line: Vec<Vec<f64>> = route.points().iter().map(|p| vec![p.lon, p.lat, p.ele]).collect();

    let mut props = JsonObject::new();
    props.insert("name".into(), json!(name));
    props.insert("total_distance_km".into(), json!(route.total_distance()));
    props.insert("total_gain_m".into(), json!(route.total_gain()));
    props.insert("total_loss_m".into(), json!(route.total_loss()));

    let mut features = Vec::with_capacity(route.waypoints().len() + 1);
    features.push(feature(GeoJsonValue::LineString(line), props));
    features.extend(route.waypoints().iter().map(|wp| {
        feature(
            GeoJsonValue::Point(vec![wp.lon, wp.lat, wp.ele]),
            waypoint_properties(wp),
        )
    }));

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
