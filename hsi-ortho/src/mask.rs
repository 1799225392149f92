use crate::Footprint;
use hsi_core::ndarray::Array2;
use hsi_core::RasterGrid;
use rayon::prelude::*;

/// Marks the cells of `grid` whose center lies inside `footprint`.
///
/// Rows follow the raster convention (row 0 is north). This is a scanline fast path for
/// [`Footprint::contains`]: every row is rasterized from the sorted crossings of the ring with the
/// horizontal line through its cell centers.
pub fn footprint_mask(footprint: &Footprint, grid: &RasterGrid) -> Array2<bool> {
    let rows: Vec<Vec<f64>> = (0..grid.height)
        .into_par_iter()
        .map(|row| {
            let y = grid.cell_center(0, row).y;
            let mut crossings: Vec<f64> = footprint.crossings(y).collect();
            crossings.sort_by(f64::total_cmp);
            crossings
        })
        .collect();

    Array2::from_shape_fn((grid.height, grid.width), |(row, col)| {
        let crossings = &rows[row];
        let x = grid.cell_center(col, row).x;
        let left = crossings.partition_point(|&crossing| crossing <= x);
        // An odd number of crossings to the right means the center is enclosed.
        (crossings.len() - left) % 2 == 1
    })
}
