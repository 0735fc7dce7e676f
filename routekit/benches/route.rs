use std::io::Write;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use routekit::elevation::{interpolate_missing, sample_indices};
use routekit::{mutate, process_route, ElevationResolver, GeoPoint, RawWaypoint, TrackPoint};
use tempfile::TempDir;

const SRTM3_SAMPLES: usize = 1201;
const SRTM3_SIZE: usize = SRTM3_SAMPLES * SRTM3_SAMPLES * 2;

/// Create a synthetic SRTM3 tile with a simple elevation gradient.
fn create_tile(dir: &std::path::Path, filename: &str) {
    let mut data = vec![0u8; SRTM3_SIZE];
    for row in 0..SRTM3_SAMPLES {
        for col in 0..SRTM3_SAMPLES {
            let elev = ((row + col) % 4000) as i16;
            let offset = (row * SRTM3_SAMPLES + col) * 2;
            data[offset..offset + 2].copy_from_slice(&elev.to_be_bytes());
        }
    }
    let mut file = std::fs::File::create(dir.join(filename)).unwrap();
    file.write_all(&data).unwrap();
}

/// A wiggly track inside N35E138.
fn track(n: usize) -> Vec<TrackPoint> {
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            let ele = 500.0 + 300.0 * (t * 40.0).sin();
            TrackPoint::new(35.1 + t * 0.8, 138.1 + t * 0.8, ele)
        })
        .collect()
}

fn waypoints() -> Vec<RawWaypoint> {
    (1..20)
        .map(|i| {
            let t = i as f64 / 20.0;
            RawWaypoint::new(35.1 + t * 0.8, 138.1 + t * 0.8, format!("WP{}", i))
        })
        .collect()
}

fn bench_process_route(c: &mut Criterion) {
    let points = track(10_000);
    let raw = waypoints();

    c.bench_function("process_route_10k_20wpt", |b| {
        b.iter(|| black_box(process_route(black_box(points.clone()), &raw).unwrap()));
    });
}

fn bench_reverse(c: &mut Criterion) {
    let route = process_route(track(10_000), &waypoints()).unwrap();

    c.bench_function("reverse_10k", |b| {
        b.iter(|| black_box(mutate::reverse(black_box(&route)).unwrap()));
    });
}

fn bench_interpolate(c: &mut Criterion) {
    let n = 10_000;
    let sample = sample_indices(n);
    let points: Vec<GeoPoint> = (0..n)
        .map(|i| {
            let ele = sample.binary_search(&i).ok().map(|_| i as f64);
            GeoPoint::new(0.0, 0.0, ele)
        })
        .collect();

    c.bench_function("interpolate_10k_from_100", |b| {
        b.iter(|| {
            let mut pts = points.clone();
            interpolate_missing(black_box(&mut pts));
            black_box(pts)
        });
    });
}

fn bench_resolve_tiles(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path(), "N35E138.hgt");
    let resolver = ElevationResolver::builder()
        .tile_dir(tmp.path())
        .offline(true)
        .build()
        .unwrap();
    let points: Vec<GeoPoint> = track(10_000)
        .into_iter()
        .map(|p| GeoPoint::new(p.lat, p.lon, None))
        .collect();

    c.bench_function("resolve_10k_tiles_cached", |b| {
        b.iter(|| {
            let mut pts = points.clone();
            black_box(resolver.resolve(black_box(&mut pts)))
        });
    });
}

criterion_group!(
    benches,
    bench_process_route,
    bench_reverse,
    bench_interpolate,
    bench_resolve_tiles,
);
criterion_main!(benches);
