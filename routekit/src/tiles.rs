//! On-demand tile store with an in-memory cache.
//!
//! [`TileStore`] maps a coordinate to its 1° × 1° tile, opens the tile from
//! the data directory the first time it is needed and keeps it cached. A tile
//! that is absent from disk is remembered as absent, so a track crossing an
//! uncovered cell costs one filesystem probe, not one per point. Tiles shipped
//! as `N22E114.hgt.zip` are extracted next to the archive on first use.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use crate::error::{Result, RouteError};
use crate::filename::{in_tile_coverage, key_to_filename, tile_key, TileKey};
use crate::tile::ElevationTile;

/// Cache usage counters.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache (including remembered misses).
    pub hit_count: u64,
    /// Lookups that had to touch the filesystem.
    pub miss_count: u64,
}

impl CacheStats {
    /// Fraction of lookups served from cache, 0.0 when nothing was requested.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Elevation tiles loaded lazily from a directory.
pub struct TileStore {
    data_dir: PathBuf,
    /// `None` records a tile known to be missing.
    cache: Cache<TileKey, Option<Arc<ElevationTile>>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl TileStore {
    /// Create a store reading tiles from `data_dir`, caching up to `cache_size` cells.
    pub fn new<P: AsRef<Path>>(data_dir: P, cache_size: u64) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            cache: Cache::builder().max_capacity(cache_size).build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Elevations for many coordinates, one result per input.
    ///
    /// Coordinates are grouped per tile so each tile is looked up once.
    /// Anything that fails for a coordinate (missing tile, void data,
    /// out-of-coverage, unreadable tile) yields `None` for it.
    pub fn elevations(&self, coords: &[(f64, f64)]) -> Vec<Option<f64>> {
        let mut results = vec![None; coords.len()];

        let mut groups: HashMap<TileKey, Vec<usize>> = HashMap::new();
        for (i, &(lat, lon)) in coords.iter().enumerate() {
            if in_tile_coverage(lat, lon) {
                groups.entry(tile_key(lat, lon)).or_default().push(i);
            }
        }

        for (key, indices) in groups {
            let tile = match self.tile(key) {
                Ok(Some(tile)) => tile,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(tile = %key_to_filename(key), error = %e, "Unreadable elevation tile");
                    continue;
                }
            };
            for i in indices {
                let (lat, lon) = coords[i];
                results[i] = tile.elevation_bilinear(lat, lon).ok().flatten();
            }
        }

        results
    }

    /// Fetch a tile from cache or disk. `Ok(None)` means the tile does not exist.
    fn tile(&self, key: TileKey) -> Result<Option<Arc<ElevationTile>>> {
        if let Some(entry) = self.cache.get(&key) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(entry);
        }
        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let entry = match self.open_tile(key) {
            Ok(tile) => Some(Arc::new(tile)),
            Err(RouteError::TileNotFound { path }) => {
                tracing::debug!(path = %path.display(), "Elevation tile not available");
                None
            }
            Err(e) => return Err(e),
        };
        self.cache.insert(key, entry.clone());
        Ok(entry)
    }

    fn open_tile(&self, key: TileKey) -> Result<ElevationTile> {
        let filename = key_to_filename(key);
        let path = self.data_dir.join(&filename);

        if !path.exists() {
            let zip_path = self.data_dir.join(format!("{}.zip", filename));
            if !zip_path.exists() {
                return Err(RouteError::TileNotFound { path });
            }
            self.extract_from_zip(&zip_path, &filename)?;
        }

        ElevationTile::open(&path, key)
    }

    /// Extract the `.hgt` member of a local archive into the data directory.
    fn extract_from_zip(&self, zip_path: &Path, filename: &str) -> Result<()> {
        let invalid = |e: zip::result::ZipError| {
            RouteError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        };

        let file = std::fs::File::open(zip_path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(invalid)?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(invalid)?;
            if entry.name().to_lowercase().ends_with(".hgt") {
                let mut out = std::fs::File::create(self.data_dir.join(filename))?;
                std::io::copy(&mut entry, &mut out)?;
                return Ok(());
            }
        }

        Err(RouteError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("No .hgt file found in {}", zip_path.display()),
        )))
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
