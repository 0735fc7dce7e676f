//! Raster tile naming.
//!
//! Elevation tiles cover 1° × 1° cells and are named after the south-west
//! corner of the cell: `{N|S}{2-digit lat}{E|W}{3-digit lon}.hgt`, for example
//! `N22E114.hgt` for the cell containing Hong Kong.

/// Extension of raw raster tiles.
pub const TILE_EXTENSION: &str = "hgt";

/// Integer south-west corner of a 1° × 1° tile, `(lat, lon)`.
pub type TileKey = (i32, i32);

/// Tile containing the given coordinate.
///
/// # Examples
///
/// ```
/// use routekit::filename::tile_key;
///
/// assert_eq!(tile_key(22.3, 114.2), (22, 114));
/// assert_eq!(tile_key(-0.5, -0.5), (-1, -1));
/// ```
pub fn tile_key(lat: f64, lon: f64) -> TileKey {
    (lat.floor() as i32, lon.floor() as i32)
}

/// Filename of the tile with the given south-west corner.
///
/// ```
/// use routekit::filename::key_to_filename;
///
/// assert_eq!(key_to_filename((22, 114)), "N22E114.hgt");
/// assert_eq!(key_to_filename((-13, -78)), "S13W078.hgt");
/// ```
pub fn key_to_filename(key: TileKey) -> String {
    let (lat, lon) = key;
    let ns = if lat >= 0 { 'N' } else { 'S' };
    let ew = if lon >= 0 { 'E' } else { 'W' };
    format!(
        "{}{:02}{}{:03}.{}",
        ns,
        lat.unsigned_abs(),
        ew,
        lon.unsigned_abs(),
        TILE_EXTENSION
    )
}

/// Filename of the tile containing the given coordinate.
pub fn tile_filename(lat: f64, lon: f64) -> String {
    key_to_filename(tile_key(lat, lon))
}

/// Parse a tile filename (with or without directory and extension) back into
/// its key. Returns `None` for anything that is not a tile name.
///
/// ```
/// use routekit::filename::filename_to_key;
///
/// assert_eq!(filename_to_key("N22E114.hgt"), Some((22, 114)));
/// assert_eq!(filename_to_key("/tiles/S12W077.hgt.zip"), Some((-12, -77)));
/// assert_eq!(filename_to_key("route.gpx"), None);
/// ```
pub fn filename_to_key(filename: &str) -> Option<TileKey> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = name.split('.').next().unwrap_or(name);

    if stem.len() != 7 || !stem.is_ascii() {
        return None;
    }

    let lat_sign = match stem.as_bytes()[0].to_ascii_uppercase() {
        b'N' => 1,
        b'S' => -1,
        _ => return None,
    };
    let lon_sign = match stem.as_bytes()[3].to_ascii_uppercase() {
        b'E' => 1,
        b'W' => -1,
        _ => return None,
    };
    let lat: i32 = stem[1..3].parse().ok()?;
    let lon: i32 = stem[4..7].parse().ok()?;

    Some((lat * lat_sign, lon * lon_sign))
}

/// Whether a coordinate lies inside the latitude band covered by SRTM tiles.
pub fn in_tile_coverage(lat: f64, lon: f64) -> bool {
    (-60.0..=60.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}
