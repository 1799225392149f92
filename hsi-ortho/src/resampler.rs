use crate::{build_index_map, footprint_mask, rgb_bands, Footprint, RTreeIndex, SpatialIndex};
use core::marker::PhantomData;
use hsi_core::ndarray::{Array2, Array3};
use hsi_core::{
    Datacube, Error, Frame, IndexMap, PointCloud, Raster, RasterGrid, ResamplingMethod, Result,
    RunConfig,
};
use log::*;
use rayon::prelude::*;

/// Below this share of filled footprint cells the mosaic is reported as sparse.
pub const SPARSE_COVERAGE: f64 = 0.5;

/// How much of the grid received data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub cells: usize,
    /// Cells whose center lies inside the footprint.
    pub inside: usize,
    /// Cells inside the footprint that received a source pixel.
    pub filled: usize,
}

impl Coverage {
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Share of the cells inside the footprint that received a source pixel.
    pub fn fill_ratio(&self) -> f64 {
        if self.inside == 0 {
            0.0
        } else {
            self.filled as f64 / self.inside as f64
        }
    }

    pub fn is_sparse(&self) -> bool {
        self.fill_ratio() < SPARSE_COVERAGE
    }
}

/// Everything the resampler produced for one transect.
#[derive(Debug, Clone)]
pub struct OrthoMosaic {
    pub grid: RasterGrid,
    /// Datacube bands used for the red, green and blue channels.
    pub rgb_bands: [usize; 3],
    /// Nearest source pixel per cell, in scan order (ascending Y).
    pub index_map: IndexMap,
    /// Footprint containment per cell, row 0 north.
    pub mask: Array2<bool>,
    pub composite: Raster,
    /// Every band of the datacube on the grid, unless the run is composite only.
    pub cube: Option<Raster>,
    pub coverage: Coverage,
}

/// Nearest-neighbor orthorectification onto a north-up grid.
///
/// The spatial index is a type parameter so the numerical core can be exercised with any
/// [`SpatialIndex`]; [`RTreeIndex`] is the default.
#[derive(Debug, Clone, Copy)]
pub struct OrthoResampler<'a, I = RTreeIndex> {
    config: &'a RunConfig,
    _index: PhantomData<fn() -> I>,
}

impl<'a> OrthoResampler<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self::with_index(config)
    }
}

impl<'a, I> OrthoResampler<'a, I>
where
    I: SpatialIndex + Sync,
{
    pub fn with_index(config: &'a RunConfig) -> Self {
        Self {
            config,
            _index: PhantomData,
        }
    }

    /// The grid covering the bounds of `footprint` at the configured resolution.
    pub fn grid(&self, footprint: &Footprint) -> Result<RasterGrid> {
        RasterGrid::from_bounds(
            footprint.bounds(),
            self.config.resolution,
            footprint.crs().clone(),
            self.config.nodata,
        )
    }

    /// Resamples `cube` onto the grid of `footprint`, using the horizontal positions of `cloud`.
    ///
    /// `cloud` must be the projected (or local) cloud the footprint was built from, with one
    /// point per datacube pixel. A grid on which no cell could be filled is not an error: the
    /// rasters come back entirely nodata and a warning is logged.
    pub fn resample(
        &self,
        cloud: &PointCloud,
        cube: &Datacube,
        footprint: &Footprint,
    ) -> Result<OrthoMosaic> {
        match self.config.resampling {
            ResamplingMethod::Nearest => {}
        }
        if cloud.frame() == Frame::Geocentric {
            return Err(Error::Geometry(
                "resampling needs a projected or local point cloud".into(),
            ));
        }
        if (cloud.lines(), cloud.samples()) != (cube.lines(), cube.samples()) {
            return Err(Error::Geometry(format!(
                "point cloud is {} x {} but the datacube is {} x {}",
                cloud.lines(),
                cloud.samples(),
                cube.lines(),
                cube.samples()
            )));
        }

        let grid = self.grid(footprint)?;
        let rgb_bands = rgb_bands(cube.wavelengths(), self.config.rgb_wavelengths)?;
        info!(
            "resampling {} x {} pixels onto a {} x {} grid, bands {:?}",
            cloud.lines(),
            cloud.samples(),
            grid.width,
            grid.height,
            rgb_bands
        );

        let index = I::build(&cloud.horizontal_flat());
        let index_map = build_index_map(
            &index,
            &footprint.bounds(),
            grid.width,
            grid.height,
            self.config.neighbor_cutoff,
        )?;
        let mask = footprint_mask(footprint, &grid);

        let composite = gather(&grid, &index_map, &mask, cube, &rgb_bands)?;
        let full_cube = if self.config.composite_only {
            None
        } else {
            let all_bands: Vec<usize> = (0..cube.bands()).collect();
            Some(gather(&grid, &index_map, &mask, cube, &all_bands)?)
        };

        let coverage = coverage(&index_map, &mask);
        if coverage.is_empty() {
            warn!(
                "no source pixel landed on any of the {} cells inside the footprint, the mosaic is empty",
                coverage.inside
            );
        } else if coverage.is_sparse() {
            warn!(
                "only {} of the {} cells inside the footprint received a source pixel",
                coverage.filled, coverage.inside
            );
        } else {
            debug!("{} of {} cells filled", coverage.filled, coverage.cells);
        }

        Ok(OrthoMosaic {
            grid,
            rgb_bands,
            index_map,
            mask,
            composite,
            cube: full_cube,
            coverage,
        })
    }
}

/// Copies `bands` of the nearest source pixel into every cell inside the footprint.
///
/// The index map is read through [`IndexMap::at_pixel`], which flips its ascending-Y scan rows
/// into north-up raster rows. Cells outside the mask keep the nodata value even when a neighbor
/// was found for them.
fn gather(
    grid: &RasterGrid,
    index_map: &IndexMap,
    mask: &Array2<bool>,
    cube: &Datacube,
    bands: &[usize],
) -> Result<Raster> {
    let channels = bands.len();
    let mut data = vec![grid.nodata as f32; grid.len() * channels];
    if channels > 0 && grid.width > 0 {
        data.par_chunks_mut(grid.width * channels)
            .enumerate()
            .for_each(|(row, pixels)| {
                for (col, pixel) in pixels.chunks_mut(channels).enumerate() {
                    if !mask[(row, col)] {
                        continue;
                    }
                    if let Some(flat) = index_map.at_pixel(row, col) {
                        let spectrum = cube.spectrum(flat);
                        for (value, &band) in pixel.iter_mut().zip(bands) {
                            *value = spectrum[band];
                        }
                    }
                }
            });
    }
    let data = Array3::from_shape_vec((grid.height, grid.width, channels), data)
        .map_err(|e| Error::Geometry(e.to_string()))?;
    Raster::new(grid.clone(), data)
}

fn coverage(index_map: &IndexMap, mask: &Array2<bool>) -> Coverage {
    let (height, width) = mask.dim();
    let mut coverage = Coverage {
        cells: width * height,
        inside: 0,
        filled: 0,
    };
    for ((row, col), &inside) in mask.indexed_iter() {
        if inside {
            coverage.inside += 1;
            if index_map.at_pixel(row, col).is_some() {
                coverage.filled += 1;
            }
        }
    }
    coverage
}
