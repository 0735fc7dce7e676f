//! GPX reading and writing.
//!
//! Only the parts a route needs are read: every `<trkpt>` of every track
//! segment, in document order, and every top-level `<wpt>`.

use std::io::{BufReader, Read, Write};
use std::path::Path;

use ::gpx::{Gpx, GpxVersion, Track, TrackSegment};

use crate::error::{Result, RouteError};
use crate::point::{GeoPoint, RawWaypoint};
use crate::route::Route;

/// Contents of a GPX document relevant to routing.
#[derive(Debug, Clone)]
pub struct GpxTrack {
    /// Name of the first named track, if any.
    pub name: Option<String>,
    /// Track points; `ele` is `None` where the file has no `<ele>`.
    pub points: Vec<GeoPoint>,
    pub waypoints: Vec<RawWaypoint>,
}

/// Parse a GPX document.
///
/// # Errors
///
/// - [`RouteError::Gpx`] for malformed documents
/// - [`RouteError::NoTrackPoints`] when the document has no track points
pub fn read_gpx<R: Read>(reader: R) -> Result<GpxTrack> {
    let doc = ::gpx::read(BufReader::new(reader)).map_err(|e| RouteError::Gpx(e.to_string()))?;

    let points: Vec<GeoPoint> = doc
        .tracks
        .iter()
        .flat_map(|t| t.segments.iter())
        .flat_map(|s| s.points.iter())
        .map(|p| {
            let pos = p.point();
            GeoPoint::new(pos.y(), pos.x(), p.elevation)
        })
        .collect();

    if points.is_empty() {
        return Err(RouteError::NoTrackPoints);
    }

    let waypoints = doc
        .waypoints
        .iter()
        .map(|w| {
            let pos = w.point();
            RawWaypoint {
                lat: pos.y(),
                lon: pos.x(),
                ele: w.elevation,
                name: w.name.clone().unwrap_or_default(),
            }
        })
        .collect();

    let name = doc.tracks.iter().find_map(|t| t.name.clone());

    tracing::debug!(
        tracks = doc.tracks.len(),
        points = points.len(),
        missing_elevation = points.iter().filter(|p| p.ele.is_none()).count(),
        "Parsed GPX"
    );

    Ok(GpxTrack { name, points, waypoints })
}

/// Parse a GPX file from disk.
pub fn read_gpx_file<P: AsRef<Path>>(path: P) -> Result<GpxTrack> {
    read_gpx(std::fs::File::open(path)?)
}

fn gpx_waypoint(lat: f64, lon: f64, ele: Option<f64>) -> ::gpx::Waypoint {
    let mut wp = ::gpx::Waypoint::new(geo_types::Point::new(lon, lat));
    wp.elevation = ele;
    wp
}

/// Write a route as a GPX 1.1 document with one track and its waypoints.
///
/// The start and end markers are not written; they are recreated whenever
/// the file is loaded again.
pub fn write_gpx<W: Write>(route: &Route, name: &str, writer: W) -> Result<()> {
    let mut segment = TrackSegment::new();
    segment.points = route
        .points()
        .iter()
        .map(|p| gpx_waypoint(p.lat, p.lon, Some(p.ele)))
        .collect();

    let mut track = Track::new();
    track.name = Some(name.to_string());
    track.segments.push(segment);

    let waypoints = route
        .waypoints()
        .iter()
        .filter(|w| !w.is_boundary())
        .map(|w| {
            let mut wp = gpx_waypoint(w.lat, w.lon, Some(w.ele));
            wp.name = Some(w.name.clone());
            wp
        })
        .collect();

    let doc = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(concat!("routekit ", env!("CARGO_PKG_VERSION")).to_string()),
        waypoints,
        tracks: vec![track],
        ..Default::default()
    };

    ::gpx::write(&doc, writer).map_err(|e| RouteError::Gpx(e.to_string()))
}

/// [`write_gpx`] into a byte buffer.
pub fn gpx_bytes(route: &Route, name: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_gpx(route, name, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::TrackPoint;
    use crate::route::process_route;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <wpt lat="22.31" lon="114.11"><ele>120</ele><name>Pavilion</name></wpt>
  <wpt lat="22.32" lon="114.12"></wpt>
  <trk>
    <name>Morning loop</name>
    <trkseg>
      <trkpt lat="22.30" lon="114.10"><ele>100</ele></trkpt>
      <trkpt lat="22.31" lon="114.11"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="22.32" lon="114.12"><ele>140</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_read_points_and_waypoints() {
        let parsed = read_gpx(SAMPLE.as_bytes()).unwrap();

        assert_eq!(parsed.name.as_deref(), Some("Morning loop"));
        assert_eq!(parsed.points.len(), 3);
        assert_eq!(parsed.points[0].lat, 22.30);
        assert_eq!(parsed.points[0].lon, 114.10);
        assert_eq!(parsed.points[0].ele, Some(100.0));
        assert_eq!(parsed.points[1].ele, None);

        assert_eq!(parsed.waypoints.len(), 2);
        assert_eq!(parsed.waypoints[0].name, "Pavilion");
        assert_eq!(parsed.waypoints[0].ele, Some(120.0));
        assert_eq!(parsed.waypoints[1].name, "");
    }

    #[test]
    fn test_no_track_points() {
        let doc = r#"<?xml version="1.0"?>
<gpx version="1.1" creator="test"><wpt lat="1" lon="2"><name>Lonely</name></wpt></gpx>"#;
        assert!(matches!(read_gpx(doc.as_bytes()), Err(RouteError::NoTrackPoints)));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(read_gpx("not xml at all".as_bytes()), Err(RouteError::Gpx(_))));
    }

    #[test]
    fn test_write_then_read() {
        let points = vec![
            TrackPoint::new(0.0, 0.0, 10.0),
            TrackPoint::new(0.0, 0.01, 20.0),
            TrackPoint::new(0.0, 0.02, 15.0),
        ];
        let route = process_route(points, &[RawWaypoint::new(0.0, 0.01, "Cairn")]).unwrap();

        let bytes = gpx_bytes(&route, "Ridge").unwrap();
        let parsed = read_gpx(bytes.as_slice()).unwrap();

        assert_eq!(parsed.name.as_deref(), Some("Ridge"));
        assert_eq!(parsed.points.len(), 3);
        assert_eq!(parsed.points[2].ele, Some(15.0));
        // markers are regenerated on load, only the named waypoint is stored
        assert_eq!(parsed.waypoints.len(), 1);
        assert_eq!(parsed.waypoints[0].name, "Cairn");
    }
}
