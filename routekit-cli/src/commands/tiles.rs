use anyhow::{Context, Result};
use routekit::filename::{filename_to_key, TileKey};
use routekit::{ElevationTile, TileResolution};
use std::fs;
use std::path::PathBuf;

pub fn run(tile_dir: Option<PathBuf>) -> Result<()> {
    let dir = tile_dir.context("No tile directory. Use --tile-dir or set ROUTEKIT_TILE_DIR")?;

    if !dir.exists() {
        anyhow::bail!("Tile directory does not exist: {}", dir.display());
    }

    // .hgt tiles and their zipped form
    let mut tiles: Vec<_> = fs::read_dir(&dir)
        .context("Failed to read tile directory")?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            name.ends_with(".hgt") || name.ends_with(".hgt.zip")
        })
        .collect();

    if tiles.is_empty() {
        println!("No .hgt tiles found in: {}", dir.display());
        return Ok(());
    }

    tiles.sort_by_key(|e| e.file_name());

    let mut srtm1_count = 0;
    let mut srtm3_count = 0;
    let mut other_count = 0;
    let mut total_size: u64 = 0;

    println!("{:<16} {:>8} {:>28}", "TILE", "TYPE", "COVERAGE");
    println!("{}", "-".repeat(54));

    for entry in &tiles {
        let filename = entry.file_name().to_string_lossy().into_owned();
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        total_size += size;

        let key = filename_to_key(&filename);
        let kind = if filename.to_lowercase().ends_with(".zip") {
            other_count += 1;
            "zip"
        } else {
            match key.map(|k| ElevationTile::open(entry.path(), k).map(|t| t.resolution())) {
                Some(Ok(TileResolution::Srtm1)) => {
                    srtm1_count += 1;
                    "SRTM1"
                }
                Some(Ok(TileResolution::Srtm3)) => {
                    srtm3_count += 1;
                    "SRTM3"
                }
                _ => {
                    other_count += 1;
                    "???"
                }
            }
        };

        let coverage = key.map(coverage).unwrap_or_else(|| "Unknown".to_string());
        println!("{:<16} {:>8} {:>28}", filename, kind, coverage);
    }

    println!();
    println!("Summary:");
    println!("  Total tiles: {}", tiles.len());
    if srtm1_count > 0 {
        println!("  SRTM1 (30m): {}", srtm1_count);
    }
    if srtm3_count > 0 {
        println!("  SRTM3 (90m): {}", srtm3_count);
    }
    if other_count > 0 {
        println!("  Zipped or unreadable: {}", other_count);
    }
    println!("  Total size: {}", format_size(total_size));
    println!("  Tile directory: {}", dir.display());

    Ok(())
}

fn coverage((lat, lon): TileKey) -> String {
    let ns = |v: i32| if v >= 0 { 'N' } else { 'S' };
    let ew = |v: i32| if v >= 0 { 'E' } else { 'W' };
    format!(
        "{}{:02} to {}{:02}, {}{:03} to {}{:03}",
        ns(lat),
        lat.unsigned_abs(),
        ns(lat + 1),
        (lat + 1).unsigned_abs(),
        ew(lon),
        lon.unsigned_abs(),
        ew(lon + 1),
        (lon + 1).unsigned_abs()
    )
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
