use criterion::{criterion_group, criterion_main, Criterion};
use hsi_core::nalgebra::Point3;
use hsi_core::{Bounds, CrsDefinition, Frame, NeighborCutoff, PointCloud};
use hsi_ortho::{build_index_map, footprint_mask, Footprint, RTreeIndex, SpatialIndex};

/// A gently curving 400 x 300 swath at roughly 0.5 m spacing.
fn swath() -> PointCloud {
    PointCloud::from_fn(Frame::Projected, 400, 300, |line, sample| {
        let along = line as f64 * 0.5;
        let across = sample as f64 * 0.5;
        Point3::new(across + 0.0005 * along * along, along, 0.0)
    })
}

fn index_map(c: &mut Criterion) {
    let _ = pretty_env_logger::try_init_timed();
    let cloud = swath();
    let points = cloud.horizontal_flat();
    c.bench_function("rtree_build", |b| b.iter(|| RTreeIndex::build(&points)));

    let index = RTreeIndex::build(&points);
    let footprint = Footprint::from_cloud(&cloud, CrsDefinition::Wkt(String::new())).unwrap();
    let bounds: Bounds = footprint.bounds();
    c.bench_function("index_map_unbounded", |b| {
        b.iter(|| build_index_map(&index, &bounds, 400, 400, NeighborCutoff::Unbounded))
    });
    c.bench_function("index_map_enforced", |b| {
        b.iter(|| build_index_map(&index, &bounds, 400, 400, NeighborCutoff::Enforced(1.0)))
    });
}

fn mask(c: &mut Criterion) {
    let cloud = swath();
    let footprint = Footprint::from_cloud(&cloud, CrsDefinition::Wkt(String::new())).unwrap();
    let grid = hsi_core::RasterGrid::from_bounds(
        footprint.bounds(),
        0.5,
        footprint.crs().clone(),
        -9999.0,
    )
    .unwrap();
    c.bench_function("footprint_mask", |b| {
        b.iter(|| footprint_mask(&footprint, &grid))
    });
}

criterion_group!(
    name = ortho;
    config = Criterion::default().sample_size(10);
    targets = index_map, mask
);
criterion_main!(ortho);
