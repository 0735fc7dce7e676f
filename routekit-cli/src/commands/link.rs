use anyhow::{Context, Result};
use routekit::gpx::gpx_bytes;
use routekit::{RouteError, TrackEnd, TrackLibrary};
use std::fs;
use std::path::{Path, PathBuf};

use super::Options;

pub fn run(
    opts: &Options,
    first: PathBuf,
    first_end: TrackEnd,
    second: PathBuf,
    second_end: TrackEnd,
    output: Option<PathBuf>,
) -> Result<()> {
    if same_file(&first, &second) {
        return Err(RouteError::SameTrack.into());
    }

    let resolver = opts.resolver()?;

    // Resolved one after the other, never concurrently.
    let mut library = TrackLibrary::new();
    let a = library.add(super::load(&first, &resolver)?);
    let b = library.add(super::load(&second, &resolver)?);

    let route = library.link(a, first_end, b, second_end)?;
    let name = format!("{} + {}", library.get(a)?.name, library.get(b)?.name);

    eprintln!(
        "Linked {} points, {:.2} km, +{:.0} m / -{:.0} m",
        route.points().len(),
        route.total_distance(),
        route.total_gain(),
        route.total_loss()
    );

    let bytes = gpx_bytes(&route, &name).context("Failed to write GPX")?;
    super::write_output(&bytes, output.as_deref())
}

/// Both paths name the same file, however they are spelled.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn offline() -> Options {
        Options {
            tile_dir: None,
            cache_size: 10,
            offline: true,
        }
    }

    #[test]
    fn test_same_file_through_different_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ridge.gpx");
        fs::write(&path, "<gpx/>").unwrap();
        let other = dir.path().join("valley.gpx");
        fs::write(&other, "<gpx/>").unwrap();

        assert!(same_file(&path, &dir.path().join(".").join("ridge.gpx")));
        assert!(!same_file(&path, &other));
    }

    #[test]
    fn test_link_file_to_itself() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ridge.gpx");
        fs::write(&path, "<gpx/>").unwrap();

        let err = run(
            &offline(),
            path.clone(),
            TrackEnd::End,
            dir.path().join(".").join("ridge.gpx"),
            TrackEnd::Start,
            None,
        )
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<RouteError>(), Some(RouteError::SameTrack)));
    }
}
