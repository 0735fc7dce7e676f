//! Raster elevation tiles.
//!
//! A tile is an SRTM `.hgt` grid: square, big-endian `i16` samples stored row
//! by row from the north edge, with −32768 marking void cells. The grid size
//! is detected from the file length.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Result, RouteError};
use crate::filename::TileKey;

/// File size for SRTM1 (1 arc-second): 3601 × 3601 × 2 bytes
const SRTM1_SIZE: usize = 3601 * 3601 * 2;

/// File size for SRTM3 (3 arc-second): 1201 × 1201 × 2 bytes
const SRTM3_SIZE: usize = 1201 * 1201 * 2;

const SRTM1_SAMPLES: usize = 3601;
const SRTM3_SAMPLES: usize = 1201;

/// Sample value marking a cell without data.
pub const VOID_VALUE: i16 = -32768;

/// Grid resolution of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileResolution {
    /// 1 arc-second (~30m)
    Srtm1,
    /// 3 arc-second (~90m)
    Srtm3,
}

impl TileResolution {
    /// Samples per row/column.
    pub fn samples(&self) -> usize {
        match self {
            TileResolution::Srtm1 => SRTM1_SAMPLES,
            TileResolution::Srtm3 => SRTM3_SAMPLES,
        }
    }
}

/// A memory-mapped elevation tile.
pub struct ElevationTile {
    data: Mmap,
    samples: usize,
    resolution: TileResolution,
    key: TileKey,
}

impl ElevationTile {
    /// Map a tile file covering the cell `key`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened or its size is neither SRTM1 nor SRTM3.
    pub fn open<P: AsRef<Path>>(path: P, key: TileKey) -> Result<Self> {
        let file = File::open(&path)?;

        // SAFETY: the file is opened read-only and the mapping never escapes
        // this struct; tiles are not rewritten while the store holds them.
        let data = unsafe { Mmap::map(&file)? };

        let (samples, resolution) = match data.len() {
            SRTM1_SIZE => (SRTM1_SAMPLES, TileResolution::Srtm1),
            SRTM3_SIZE => (SRTM3_SAMPLES, TileResolution::Srtm3),
            size => return Err(RouteError::InvalidTileSize { size }),
        };

        Ok(Self {
            data,
            samples,
            resolution,
            key,
        })
    }

    /// Bilinear interpolation of the four samples surrounding the coordinate.
    ///
    /// Returns `None` if any of the four samples is void.
    pub fn elevation_bilinear(&self, lat: f64, lon: f64) -> Result<Option<f64>> {
        let (row, col) = self.grid_position(lat, lon)?;

        let max = self.samples - 1;
        let r0 = (row.floor() as usize).min(max);
        let c0 = (col.floor() as usize).min(max);
        let r1 = (r0 + 1).min(max);
        let c1 = (c0 + 1).min(max);
        let dr = row - r0 as f64;
        let dc = col - c0 as f64;

        let corners = [
            self.sample(r0, c0),
            self.sample(r0, c1),
            self.sample(r1, c0),
            self.sample(r1, c1),
        ];
        if corners.contains(&VOID_VALUE) {
            return Ok(None);
        }
        let [nw, ne, sw, se] = corners.map(f64::from);

        let north = nw * (1.0 - dc) + ne * dc;
        let south = sw * (1.0 - dc) + se * dc;
        Ok(Some(north * (1.0 - dr) + south * dr))
    }

    /// Fractional (row, col) of a coordinate; row 0 is the north edge.
    fn grid_position(&self, lat: f64, lon: f64) -> Result<(f64, f64)> {
        let lat_frac = lat - self.key.0 as f64;
        let lon_frac = lon - self.key.1 as f64;

        if !(0.0..=1.0).contains(&lat_frac) || !(0.0..=1.0).contains(&lon_frac) {
            return Err(RouteError::OutOfBounds { lat, lon });
        }

        let span = (self.samples - 1) as f64;
        Ok(((1.0 - lat_frac) * span, lon_frac * span))
    }

    fn sample(&self, row: usize, col: usize) -> i16 {
        let row = row.min(self.samples - 1);
        let col = col.min(self.samples - 1);
        let offset = (row * self.samples + col) * 2;
        i16::from_be_bytes([self.data[offset], self.data[offset + 1]])
    }

    pub fn resolution(&self) -> TileResolution {
        self.resolution
    }

    pub fn key(&self) -> TileKey {
        self.key
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use std::path::Path;

    pub const SRTM3_SAMPLES: usize = 1201;
    pub const SRTM3_SIZE: usize = SRTM3_SAMPLES * SRTM3_SAMPLES * 2;

    /// Build SRTM3 tile bytes where every sample is produced by `f(row, col)`.
    pub fn srtm3_bytes(f: impl Fn(usize, usize) -> i16) -> Vec<u8> {
        let mut data = vec![0u8; SRTM3_SIZE];
        for row in 0..SRTM3_SAMPLES {
            for col in 0..SRTM3_SAMPLES {
                let offset = (row * SRTM3_SAMPLES + col) * 2;
                data[offset..offset + 2].copy_from_slice(&f(row, col).to_be_bytes());
            }
        }
        data
    }

    pub fn write_tile(dir: &Path, filename: &str, f: impl Fn(usize, usize) -> i16) {
        let mut file = std::fs::File::create(dir.join(filename)).unwrap();
        file.write_all(&srtm3_bytes(f)).unwrap();
    }
}
