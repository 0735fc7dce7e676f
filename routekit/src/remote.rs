//! Public elevation APIs as chain steps.
//!
//! Only available with the `remote` feature. Every request carries its own
//! timeout and requests are paced with a fixed sleep between calls, so the
//! public services' rate limits are respected. A failed or timed-out request
//! counts as zero points filled; errors are logged and never propagated.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::elevation::{every_nth, ElevationSource, Threshold};
use crate::error::Result;
use crate::point::GeoPoint;

pub const DEFAULT_OPEN_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1/lookup";
pub const DEFAULT_OPENTOPODATA_URL: &str = "https://api.opentopodata.org/v1/srtm90m";
pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/elevation";

/// Endpoints of the three remote providers.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub open_elevation_url: String,
    pub opentopodata_url: String,
    pub open_meteo_url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            open_elevation_url: DEFAULT_OPEN_ELEVATION_URL.to_string(),
            opentopodata_url: DEFAULT_OPENTOPODATA_URL.to_string(),
            open_meteo_url: DEFAULT_OPEN_METEO_URL.to_string(),
        }
    }
}

impl RemoteConfig {
    /// Defaults overridden by `ROUTEKIT_OPEN_ELEVATION_URL`,
    /// `ROUTEKIT_OPENTOPODATA_URL` and `ROUTEKIT_OPEN_METEO_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ROUTEKIT_OPEN_ELEVATION_URL") {
            config.open_elevation_url = url;
        }
        if let Ok(url) = std::env::var("ROUTEKIT_OPENTOPODATA_URL") {
            config.opentopodata_url = url;
        }
        if let Ok(url) = std::env::var("ROUTEKIT_OPEN_METEO_URL") {
            config.open_meteo_url = url;
        }
        config
    }
}

/// Providers answer −32768 or absurd negatives for cells without data.
fn plausible(elevation: f64) -> Option<f64> {
    (elevation.is_finite() && elevation > -1000.0).then_some(elevation)
}

#[derive(Debug, Serialize)]
struct Location {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct LookupRequest {
    locations: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    elevation: Option<f64>,
}

/// `{"results": [{"elevation": ...}, ...]}`, shared by Open-Elevation and OpenTopoData.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct MeteoResponse {
    elevation: Vec<f64>,
}

/// Batch POST lookups against an Open-Elevation compatible endpoint.
pub struct OpenElevationSource {
    client: Client,
    url: String,
    batch_size: usize,
    attempts: u32,
    timeout: Duration,
    pacing: Duration,
}

impl OpenElevationSource {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            url: url.to_string(),
            batch_size: 20,
            attempts: 2,
            timeout: Duration::from_secs(30),
            pacing: Duration::from_millis(600),
        })
    }

    /// Set the pause between consecutive requests.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn fetch(&self, coords: &[(f64, f64)]) -> Result<Vec<Option<f64>>> {
        let body = LookupRequest {
            locations: coords
                .iter()
                .map(|&(latitude, longitude)| Location { latitude, longitude })
                .collect(),
        };
        let response: LookupResponse = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(response
            .results
            .into_iter()
            .map(|r| r.elevation.and_then(plausible))
            .collect())
    }
}

impl ElevationSource for OpenElevationSource {
    fn name(&self) -> &str {
        "open-elevation"
    }

    fn attempt(&self, points: &mut [GeoPoint], indices: &[usize]) -> usize {
        let mut filled = 0;

        for (n, batch) in indices.chunks(self.batch_size).enumerate() {
            if n > 0 {
                std::thread::sleep(self.pacing);
            }
            let coords: Vec<(f64, f64)> = batch.iter().map(|&i| (points[i].lat, points[i].lon)).collect();

            for attempt in 1..=self.attempts {
                match self.fetch(&coords) {
                    Ok(values) => {
                        for (&i, value) in batch.iter().zip(values) {
                            if let Some(ele) = value {
                                points[i].ele = Some(ele);
                                filled += 1;
                            }
                        }
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(batch = n, attempt, error = %e, "Open-Elevation request failed");
                        if attempt < self.attempts {
                            std::thread::sleep(self.pacing);
                        }
                    }
                }
            }
        }

        filled
    }

    fn threshold(&self) -> Threshold {
        Threshold::fraction(0.2).or_capped(10.0, 0.15)
    }
}

/// Per-point GET lookups against an OpenTopoData compatible endpoint.
pub struct OpenTopoDataSource {
    client: Client,
    url: String,
    timeout: Duration,
    pacing: Duration,
}

impl OpenTopoDataSource {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            url: url.to_string(),
            timeout: Duration::from_secs(10),
            pacing: Duration::from_millis(200),
        })
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    fn fetch(&self, lat: f64, lon: f64) -> Result<Option<f64>> {
        let response: LookupResponse = self
            .client
            .get(&self.url)
            .query(&[("locations", format!("{:.6},{:.6}", lat, lon))])
            .timeout(self.timeout)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(response
            .results
            .first()
            .and_then(|r| r.elevation)
            .and_then(plausible))
    }
}

impl ElevationSource for OpenTopoDataSource {
    fn name(&self) -> &str {
        "opentopodata"
    }

    fn select(&self, sample: &[usize]) -> Vec<usize> {
        every_nth(sample, 2)
    }

    fn attempt(&self, points: &mut [GeoPoint], indices: &[usize]) -> usize {
        fill_one_by_one(points, indices, self.pacing, self.name(), |lat, lon| {
            self.fetch(lat, lon)
        })
    }

    fn threshold(&self) -> Threshold {
        Threshold::fraction(0.3)
    }
}

/// Per-point GET lookups against the Open-Meteo elevation endpoint.
pub struct OpenMeteoSource {
    client: Client,
    url: String,
    timeout: Duration,
    pacing: Duration,
}

impl OpenMeteoSource {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            url: url.to_string(),
            timeout: Duration::from_secs(15),
            pacing: Duration::from_millis(500),
        })
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    fn fetch(&self, lat: f64, lon: f64) -> Result<Option<f64>> {
        let response: MeteoResponse = self
            .client
            .get(&self.url)
            .query(&[("latitude", lat), ("longitude", lon)])
            .timeout(self.timeout)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(response.elevation.first().copied().and_then(plausible))
    }
}

impl ElevationSource for OpenMeteoSource {
    fn name(&self) -> &str {
        "open-meteo"
    }

    /// Every third point of OpenTopoData's selection.
    fn select(&self, sample: &[usize]) -> Vec<usize> {
        every_nth(&every_nth(sample, 2), 3)
    }

    fn attempt(&self, points: &mut [GeoPoint], indices: &[usize]) -> usize {
        fill_one_by_one(points, indices, self.pacing, self.name(), |lat, lon| {
            self.fetch(lat, lon)
        })
    }

    fn threshold(&self) -> Threshold {
        Threshold::capped(10.0, 0.2)
    }
}

fn fill_one_by_one(
    points: &mut [GeoPoint],
    indices: &[usize],
    pacing: Duration,
    source: &str,
    fetch: impl Fn(f64, f64) -> Result<Option<f64>>,
) -> usize {
    let mut filled = 0;
    for (n, &i) in indices.iter().enumerate() {
        if n > 0 {
            std::thread::sleep(pacing);
        }
        match fetch(points[i].lat, points[i].lon) {
            Ok(Some(ele)) => {
                points[i].ele = Some(ele);
                filled += 1;
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(source, index = i, error = %e, "Elevation lookup failed"),
        }
    }
    filled
}
