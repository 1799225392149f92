use crate::SpatialIndex;
use hsi_core::ndarray::Array1;
use hsi_core::{Bounds, IndexMap, NeighborCutoff, Result};
use log::*;
use rayon::prelude::*;

/// Finds the nearest source point for every node of a `width` x `height` lattice over `bounds`.
///
/// The lattice spans the bounds edge to edge: X runs from `xmin` to `xmax` over `width` nodes and
/// Y from `ymin` to `ymax` over `height` nodes, so the first scan row is the southern edge. The
/// returned [`IndexMap`] is in that scan order.
pub fn build_index_map<I>(
    index: &I,
    bounds: &Bounds,
    width: usize,
    height: usize,
    cutoff: NeighborCutoff,
) -> Result<IndexMap>
where
    I: SpatialIndex + Sync,
{
    let xs = Array1::linspace(bounds.xmin, bounds.xmax, width);
    let ys = Array1::linspace(bounds.ymin, bounds.ymax, height);

    let entries: Vec<Option<usize>> = (0..width * height)
        .into_par_iter()
        .map(|cell| {
            let query = [xs[cell % width], ys[cell / width]];
            let neighbor = match cutoff {
                NeighborCutoff::Unbounded => index.nearest(query),
                NeighborCutoff::Enforced(radius) => index.nearest_within(query, radius),
            };
            neighbor.map(|neighbor| neighbor.index)
        })
        .collect();

    let map = IndexMap::new(width, height, entries)?;
    debug!(
        "index map {} x {}: {} of {} cells matched",
        width,
        height,
        map.matched(),
        width * height
    );
    Ok(map)
}
