//! Elevation resolution.
//!
//! Tracks recorded without barometric or DEM data carry no `<ele>`. The
//! [`ElevationResolver`] fills them in by walking an ordered chain of
//! [`ElevationSource`]s over an evenly spread sample of at most
//! [`MAX_SAMPLES`] points. The first source whose [`Threshold`] is met ends
//! the chain; the remaining points are then linearly interpolated from their
//! resolved neighbours. When no source succeeds every missing elevation is set
//! to zero and the report is flagged as degraded.
//!
//! The default chain, in priority order:
//!
//! | Source | Queries | Success when |
//! |--------|---------|--------------|
//! | local raster tiles | whole sample | ≥ 80% |
//! | Open-Elevation (POST, batches of 20) | whole sample | ≥ 20%, or ≥ min(10, 15%) |
//! | OpenTopoData (GET per point) | every 2nd sample | ≥ 30% |
//! | Open-Meteo (GET per point) | every 3rd of those | ≥ min(10, 20%) |
//!
//! All sources run sequentially; a network source never starts a request
//! before the previous one has answered or timed out.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::point::GeoPoint;
use crate::tiles::{CacheStats, TileStore};

#[cfg(feature = "remote")]
use crate::remote::{OpenElevationSource, OpenMeteoSource, OpenTopoDataSource, RemoteConfig};

/// Upper bound on the number of points sent to elevation sources.
pub const MAX_SAMPLES: usize = 100;

/// Default number of tiles kept in memory.
pub const DEFAULT_CACHE_SIZE: u64 = 100;

/// When a source's result is good enough to stop the chain.
///
/// `resolved` counts the source's selected points that have an elevation
/// after the attempt; `queried` is the size of that selection. The threshold
/// is met when any configured rule holds, and never with zero resolved points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    /// `resolved >= fraction * queried`
    pub fraction: Option<f64>,
    /// `(cap, fraction)`: `resolved >= min(cap, fraction * queried)`
    pub capped: Option<(f64, f64)>,
}

impl Threshold {
    pub const fn fraction(fraction: f64) -> Self {
        Self {
            fraction: Some(fraction),
            capped: None,
        }
    }

    pub const fn capped(cap: f64, fraction: f64) -> Self {
        Self {
            fraction: None,
            capped: Some((cap, fraction)),
        }
    }

    /// Add a capped floor as an alternative rule.
    pub const fn or_capped(self, cap: f64, fraction: f64) -> Self {
        Self {
            fraction: self.fraction,
            capped: Some((cap, fraction)),
        }
    }

    pub fn is_met(&self, resolved: usize, queried: usize) -> bool {
        if resolved == 0 || queried == 0 {
            return false;
        }
        let resolved = resolved as f64;
        let queried = queried as f64;

        let by_fraction = self.fraction.is_some_and(|f| resolved >= f * queried);
        let by_floor = self
            .capped
            .is_some_and(|(cap, f)| resolved >= cap.min(f * queried));
        by_fraction || by_floor
    }
}

/// One step of the elevation chain.
pub trait ElevationSource: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Indices of the shared sample this source looks at.
    fn select(&self, sample: &[usize]) -> Vec<usize> {
        sample.to_vec()
    }

    /// Fill elevations for `indices` (all currently `None`) and return how
    /// many were filled. Failures are absorbed: a source that cannot answer
    /// returns 0.
    fn attempt(&self, points: &mut [GeoPoint], indices: &[usize]) -> usize;

    fn threshold(&self) -> Threshold;

    fn is_satisfied(&self, resolved: usize, queried: usize) -> bool {
        self.threshold().is_met(resolved, queried)
    }
}

/// Take every `n`th entry of a sample, starting with the first.
pub fn every_nth(sample: &[usize], n: usize) -> Vec<usize> {
    sample.iter().copied().step_by(n.max(1)).collect()
}

/// Indices of an even subsample of `len` points.
///
/// The stride is `ceil(len / MAX_SAMPLES)` and the last point is always part of
/// the sample. If appending it would exceed [`MAX_SAMPLES`] it replaces the
/// final strided index instead.
pub fn sample_indices(len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let stride = len.div_ceil(MAX_SAMPLES);
    let mut indices: Vec<usize> = (0..len).step_by(stride).collect();

    let last = len - 1;
    if indices.last() != Some(&last) {
        if indices.len() >= MAX_SAMPLES {
            indices.pop();
        }
        indices.push(last);
    }
    indices
}

/// Fill every missing elevation by linear interpolation (by index) between
/// the nearest resolved neighbours.
///
/// A gap touching only one resolved side copies that side's value; a
/// sequence with nothing resolved becomes all zeros.
pub fn interpolate_missing(points: &mut [GeoPoint]) {
    let known: Vec<usize> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.ele.map(|_| i))
        .collect();

    let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
        for p in points.iter_mut() {
            p.ele = Some(0.0);
        }
        return;
    };

    let head = points[first].ele;
    for p in &mut points[..first] {
        p.ele = head;
    }
    let tail = points[last].ele;
    for p in &mut points[last + 1..] {
        p.ele = tail;
    }

    for pair in known.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next - prev < 2 {
            continue;
        }
        let (Some(a), Some(b)) = (points[prev].ele, points[next].ele) else {
            continue;
        };
        let span = (next - prev) as f64;
        for i in prev + 1..next {
            let t = (i - prev) as f64 / span;
            points[i].ele = Some(a + (b - a) * t);
        }
    }
}

/// Which step of the chain produced the final elevations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case", tag = "kind", content = "name"))]
pub enum ElevationOrigin {
    /// Every point already had an elevation.
    File,
    /// The named source met its threshold.
    Source(String),
    /// No source met its threshold; partial answers were interpolated, zero where none.
    Flat,
}

impl fmt::Display for ElevationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElevationOrigin::File => write!(f, "file"),
            ElevationOrigin::Source(name) => write!(f, "{}", name),
            ElevationOrigin::Flat => write!(f, "flat profile"),
        }
    }
}

/// Outcome of one source in the chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceAttempt {
    pub source: String,
    /// Points the source was asked for.
    pub queried: usize,
    /// Points it filled.
    pub filled: usize,
    /// Selected points that have an elevation afterwards.
    pub resolved: usize,
    pub satisfied: bool,
}

/// Summary of a resolution run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElevationReport {
    pub origin: ElevationOrigin,
    /// Set when the flat-profile fallback was applied.
    pub degraded: bool,
    /// Size of the sample sent down the chain.
    pub sampled: usize,
    pub attempts: Vec<SourceAttempt>,
}

impl ElevationReport {
    fn from_file() -> Self {
        Self {
            origin: ElevationOrigin::File,
            degraded: false,
            sampled: 0,
            attempts: Vec::new(),
        }
    }
}

/// Raster tile lookup as a chain step.
pub struct TileSource {
    store: Arc<TileStore>,
}

impl TileSource {
    pub fn new(store: Arc<TileStore>) -> Self {
        Self { store }
    }
}

impl ElevationSource for TileSource {
    fn name(&self) -> &str {
        "tiles"
    }

    fn attempt(&self, points: &mut [GeoPoint], indices: &[usize]) -> usize {
        let coords: Vec<(f64, f64)> = indices.iter().map(|&i| (points[i].lat, points[i].lon)).collect();
        let values = self.store.elevations(&coords);

        let mut filled = 0;
        for (&i, value) in indices.iter().zip(values) {
            if value.is_some() {
                points[i].ele = value;
                filled += 1;
            }
        }
        filled
    }

    fn threshold(&self) -> Threshold {
        Threshold::fraction(0.8)
    }
}

/// Ordered elevation chain.
pub struct ElevationResolver {
    sources: Vec<Box<dyn ElevationSource>>,
    tiles: Option<Arc<TileStore>>,
}

impl ElevationResolver {
    /// A resolver over an explicit chain, tried in order.
    pub fn new(sources: Vec<Box<dyn ElevationSource>>) -> Self {
        Self { sources, tiles: None }
    }

    pub fn builder() -> ResolverConfig {
        ResolverConfig::new()
    }

    /// Names of the configured sources in priority order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Tile cache counters, if a tile source is configured.
    pub fn tile_stats(&self) -> Option<CacheStats> {
        self.tiles.as_ref().map(|t| t.cache_stats())
    }

    /// Populate every missing elevation in `points`.
    ///
    /// Never fails: after this call every point has `Some` elevation.
    pub fn resolve(&self, points: &mut [GeoPoint]) -> ElevationReport {
        if points.iter().all(|p| p.ele.is_some()) {
            return ElevationReport::from_file();
        }

        let sample = sample_indices(points.len());
        let mut attempts = Vec::with_capacity(self.sources.len());
        let mut origin = None;

        for source in &self.sources {
            let selected = source.select(&sample);
            let pending: Vec<usize> = selected
                .iter()
                .copied()
                .filter(|&i| points[i].ele.is_none())
                .collect();

            let filled = if pending.is_empty() {
                0
            } else {
                source.attempt(points, &pending)
            };
            let resolved = selected.iter().filter(|&&i| points[i].ele.is_some()).count();
            let satisfied = source.is_satisfied(resolved, selected.len());

            tracing::info!(
                source = source.name(),
                queried = pending.len(),
                filled,
                resolved,
                selected = selected.len(),
                satisfied,
                "Elevation source attempted"
            );

            attempts.push(SourceAttempt {
                source: source.name().to_string(),
                queried: pending.len(),
                filled,
                resolved,
                satisfied,
            });

            if satisfied {
                origin = Some(source.name().to_string());
                break;
            }
        }

        match origin {
            Some(name) => {
                interpolate_missing(points);
                ElevationReport {
                    origin: ElevationOrigin::Source(name),
                    degraded: false,
                    sampled: sample.len(),
                    attempts,
                }
            }
            None => {
                // Partial answers still shape the profile; with none at all it is zero.
                interpolate_missing(points);
                tracing::warn!(
                    points = points.len(),
                    sources = self.sources.len(),
                    "No elevation source succeeded, using a flat profile"
                );
                ElevationReport {
                    origin: ElevationOrigin::Flat,
                    degraded: true,
                    sampled: sample.len(),
                    attempts,
                }
            }
        }
    }
}

/// Configuration and builder for the default elevation chain.
///
/// # Example
///
/// ```ignore
/// use routekit::ElevationResolver;
///
/// let resolver = ElevationResolver::builder()
///     .tile_dir("/data/srtm")
///     .cache_size(50)
///     .offline(true)
///     .build()?;
/// ```
pub struct ResolverConfig {
    tile_dir: Option<PathBuf>,
    cache_size: u64,
    offline: bool,
    #[cfg(feature = "remote")]
    remote: RemoteConfig,
    extra: Vec<Box<dyn ElevationSource>>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self {
            tile_dir: None,
            cache_size: DEFAULT_CACHE_SIZE,
            offline: false,
            #[cfg(feature = "remote")]
            remote: RemoteConfig::default(),
            extra: Vec::new(),
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ROUTEKIT_TILE_DIR` | Directory containing `.hgt` tiles | none (no tile source) |
    /// | `ROUTEKIT_CACHE_SIZE` | Maximum tiles in memory | 100 |
    /// | `ROUTEKIT_OFFLINE` | `true`/`1` disables remote providers | false |
    /// | `ROUTEKIT_OPEN_ELEVATION_URL` | Batch POST endpoint* | public Open-Elevation |
    /// | `ROUTEKIT_OPENTOPODATA_URL` | Query-string endpoint* | public OpenTopoData |
    /// | `ROUTEKIT_OPEN_METEO_URL` | Single-point endpoint* | public Open-Meteo |
    ///
    /// *Only used when the `remote` feature is enabled.
    pub fn from_env() -> Self {
        let mut builder = Self::new();

        if let Ok(dir) = std::env::var("ROUTEKIT_TILE_DIR") {
            builder.tile_dir = Some(PathBuf::from(dir));
        }
        if let Some(size) = std::env::var("ROUTEKIT_CACHE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            builder.cache_size = size;
        }
        if let Ok(offline) = std::env::var("ROUTEKIT_OFFLINE") {
            builder.offline = offline.eq_ignore_ascii_case("true") || offline == "1";
        }

        #[cfg(feature = "remote")]
        {
            builder.remote = RemoteConfig::from_env();
        }

        builder
    }

    pub fn tile_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.tile_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = size;
        self
    }

    /// Skip every network source.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    #[cfg(feature = "remote")]
    pub fn remote(mut self, config: RemoteConfig) -> Self {
        self.remote = config;
        self
    }

    /// Append a custom source after the built-in ones.
    pub fn source(mut self, source: Box<dyn ElevationSource>) -> Self {
        self.extra.push(source);
        self
    }

    pub fn configured_tile_dir(&self) -> Option<&Path> {
        self.tile_dir.as_deref()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Build the resolver.
    ///
    /// # Errors
    ///
    /// Fails only when an HTTP client for the remote sources cannot be created.
    pub fn build(self) -> crate::Result<ElevationResolver> {
        let mut sources: Vec<Box<dyn ElevationSource>> = Vec::new();

        let tiles = self
            .tile_dir
            .map(|dir| Arc::new(TileStore::new(dir, self.cache_size)));
        if let Some(store) = &tiles {
            sources.push(Box::new(TileSource::new(Arc::clone(store))));
        }

        #[cfg(feature = "remote")]
        if !self.offline {
            sources.push(Box::new(OpenElevationSource::new(&self.remote.open_elevation_url)?));
            sources.push(Box::new(OpenTopoDataSource::new(&self.remote.opentopodata_url)?));
            sources.push(Box::new(OpenMeteoSource::new(&self.remote.open_meteo_url)?));
        }

        sources.extend(self.extra);

        Ok(ElevationResolver { sources, tiles })
    }
}
