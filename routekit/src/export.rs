//! Waypoint table export.

use std::io::Write;

use crate::error::Result;
use crate::route::Route;

/// Walking pace used for time estimates (Naismith's rule by default).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pace {
    /// Speed on the flat, km/h.
    pub flat_kmh: f64,
    /// Ascent rate, metres per hour.
    pub climb_m_per_h: f64,
}

impl Default for Pace {
    fn default() -> Self {
        Self {
            flat_kmh: 5.0,
            climb_m_per_h: 600.0,
        }
    }
}

impl Pace {
    /// Hours needed for `distance_km` with `gain_m` of ascent.
    pub fn hours(&self, distance_km: f64, gain_m: f64) -> f64 {
        let flat = if self.flat_kmh > 0.0 { distance_km / self.flat_kmh } else { 0.0 };
        let climb = if self.climb_m_per_h > 0.0 { gain_m / self.climb_m_per_h } else { 0.0 };
        flat + climb
    }
}

/// Format hours as `H:MM`.
///
/// ```
/// use routekit::export::format_hours;
///
/// assert_eq!(format_hours(1.5), "1:30");
/// assert_eq!(format_hours(0.0), "0:00");
/// assert_eq!(format_hours(12.99), "12:59");
/// ```
pub fn format_hours(hours: f64) -> String {
    let minutes = (hours.max(0.0) * 60.0).round() as u64;
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// One line of the waypoint table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaypointRow {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Distance from the previous waypoint, km.
    pub segment_km: f64,
    pub elevation_m: f64,
    pub distance_km: f64,
    pub gain_m: f64,
    pub loss_m: f64,
    pub segment_hours: f64,
    pub total_hours: f64,
}

pub const CSV_HEADER: [&str; 10] = [
    "name",
    "lat",
    "lon",
    "segment_km",
    "elevation_m",
    "distance_km",
    "gain_m",
    "loss_m",
    "segment_time",
    "total_time",
];

/// Per-waypoint table with segment and cumulative figures.
pub fn waypoint_table(route: &Route, pace: &Pace) -> Vec<WaypointRow> {
    let mut rows = Vec::with_capacity(route.waypoints().len());
    let mut total_hours = 0.0;
    let mut prev: Option<(f64, f64)> = None;

    for wp in route.waypoints() {
        let (segment_km, segment_gain) = match prev {
            Some((distance, gain)) => (wp.distance - distance, wp.gain - gain),
            None => (0.0, 0.0),
        };
        let segment_hours = pace.hours(segment_km, segment_gain);
        total_hours += segment_hours;
        prev = Some((wp.distance, wp.gain));

        rows.push(WaypointRow {
            name: wp.name.clone(),
            lat: wp.lat,
            lon: wp.lon,
            segment_km,
            elevation_m: wp.ele,
            distance_km: wp.distance,
            gain_m: wp.gain,
            loss_m: wp.loss,
            segment_hours,
            total_hours,
        });
    }
    rows
}

/// Write the waypoint table as CSV.
pub fn write_csv<W: Write>(route: &Route, pace: &Pace, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(CSV_HEADER)?;

    for row in waypoint_table(route, pace) {
        out.write_record([
            row.name,
            format!("{:.6}", row.lat),
            format!("{:.6}", row.lon),
            format!("{:.2}", row.segment_km),
            format!("{:.0}", row.elevation_m),
            format!("{:.2}", row.distance_km),
            format!("{:.0}", row.gain_m),
            format!("{:.0}", row.loss_m),
            format_hours(row.segment_hours),
            format_hours(row.total_hours),
        ])?;
    }

    out.flush()?;
    Ok(())
}

/// [`write_csv`] into a byte buffer.
pub fn csv_bytes(route: &Route, pace: &Pace) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(route, pace, &mut buf)?;
    Ok(buf)
}
