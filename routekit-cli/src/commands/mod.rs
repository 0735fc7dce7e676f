pub mod edit;
pub mod export;
pub mod link;
pub mod summary;
pub mod tiles;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use routekit::{load_track, ElevationResolver, LoadedTrack, Pace, ResolverConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global options shared by every subcommand.
pub struct Options {
    pub tile_dir: Option<PathBuf>,
    pub cache_size: u64,
    pub offline: bool,
}

impl Options {
    /// Resolver from the `ROUTEKIT_*` environment, overridden by flags.
    pub fn resolver(&self) -> Result<ElevationResolver> {
        let mut config = ResolverConfig::from_env()
            .cache_size(self.cache_size)
            .offline(self.offline);
        if let Some(dir) = &self.tile_dir {
            config = config.tile_dir(dir);
        }
        if config.configured_tile_dir().is_none() && config.is_offline() {
            tracing::warn!("No tile directory and offline: elevations missing from the file will be flat");
        }
        config.build().context("Failed to create elevation resolver")
    }
}

pub fn pace(flat_kmh: f64, climb_rate: f64) -> Pace {
    Pace {
        flat_kmh,
        climb_m_per_h: climb_rate,
    }
}

/// Display name of a track file: its stem.
pub fn track_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "route".to_string())
}

/// Read, resolve and process a GPX file, with a spinner while elevations load.
pub fn load(path: &Path, resolver: &ElevationResolver) -> Result<LoadedTrack> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    spinner.set_message(format!("Loading {}", path.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let track = load_track(&track_name(path), &data, resolver);
    spinner.finish_and_clear();

    track.with_context(|| format!("Failed to load {}", path.display()))
}

/// Write to a file, or stdout when no path is given.
pub fn write_output(bytes: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
