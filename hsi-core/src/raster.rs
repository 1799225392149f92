use crate::{Error, RasterGrid, Result};
use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

/// A gridded array carrying the metadata a raster writer needs.
///
/// Data is stored pixel-interleaved as `(rows, cols, bands)`. Use
/// [`Raster::to_band_sequential`] for writers that expect one plane per band.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    grid: RasterGrid,
    data: Array3<f32>,
}

impl Raster {
    pub fn new(grid: RasterGrid, data: Array3<f32>) -> Result<Self> {
        let (rows, cols, _) = data.dim();
        if (rows, cols) != (grid.height, grid.width) {
            return Err(Error::Geometry(format!(
                "a {} x {} array does not fit a {} x {} grid",
                cols, rows, grid.width, grid.height
            )));
        }
        Ok(Self { grid, data })
    }

    /// A raster with every cell of every band set to the grid's nodata value.
    pub fn nodata(grid: RasterGrid, bands: usize) -> Self {
        let data = Array3::from_elem((grid.height, grid.width, bands), grid.nodata as f32);
        Self { grid, data }
    }

    pub fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    pub fn bands(&self) -> usize {
        self.data.dim().2
    }

    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    pub fn band(&self, band: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(2), band)
    }

    pub fn get(&self, row: usize, col: usize, band: usize) -> f32 {
        self.data[(row, col, band)]
    }

    pub fn is_nodata(&self, value: f32) -> bool {
        value == self.grid.nodata as f32
    }

    /// `(bands, rows, cols)` copy of the data, the layout of band-sequential writers.
    pub fn to_band_sequential(&self) -> Array3<f32> {
        self.data.view().permuted_axes([2, 0, 1]).to_owned()
    }

    pub fn into_parts(self) -> (RasterGrid, Array3<f32>) {
        (self.grid, self.data)
    }
}

/// Point sampling of terrain height.
pub trait HeightSampler {
    /// Height at world position `(x, y)`, or `None` where the terrain model has no data.
    fn height_at(&self, x: f64, y: f64) -> Option<f64>;
}

/// Samples band 0 of the pixel containing the position.
impl HeightSampler for Raster {
    fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        let (col, row) = self.grid.transform.world_to_pixel(x, y);
        if !(col >= 0.0 && row >= 0.0) {
            return None;
        }
        let (col, row) = (col.floor() as usize, row.floor() as usize);
        if col >= self.grid.width || row >= self.grid.height {
            return None;
        }
        let value = self.data[(row, col, 0)];
        (!self.is_nodata(value) && value.is_finite()).then(|| f64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bounds, CrsDefinition, Epsg};

    fn dem() -> Raster {
        let grid = RasterGrid::from_bounds(
            Bounds::new(0.0, 0.0, 4.0, 2.0),
            1.0,
            CrsDefinition::Epsg(Epsg(25832)),
            -9999.0,
        )
        .unwrap();
        let data = Array3::from_shape_fn((2, 4, 1), |(row, col, _)| {
            if (row, col) == (1, 3) {
                -9999.0
            } else {
                (10 * row + col) as f32
            }
        });
        Raster::new(grid, data).unwrap()
    }

    #[test]
    fn samples_containing_pixel() {
        let dem = dem();
        // Row 0 is the northern row, y in [1, 2).
        assert_eq!(dem.height_at(2.5, 1.5), Some(2.0));
        assert_eq!(dem.height_at(0.1, 0.1), Some(10.0));
    }

    #[test]
    fn outside_or_nodata_has_no_height() {
        let dem = dem();
        assert_eq!(dem.height_at(-0.5, 1.0), None);
        assert_eq!(dem.height_at(4.5, 1.0), None);
        assert_eq!(dem.height_at(3.5, 0.5), None);
    }

    #[test]
    fn band_sequential_layout() {
        let grid = dem().grid().clone();
        let data = Array3::from_shape_fn((2, 4, 3), |(row, col, band)| {
            (100 * band + 10 * row + col) as f32
        });
        let raster = Raster::new(grid, data).unwrap();
        let bsq = raster.to_band_sequential();
        assert_eq!(bsq.dim(), (3, 2, 4));
        assert_eq!(bsq[(2, 1, 3)], 213.0);
    }
}
