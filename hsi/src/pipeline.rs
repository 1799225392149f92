use hsi_coreg::{
    CalibrationSet, Coregistration, CoregistrationEngine, FeatureMatcher, ImageEnhancer,
    InversePixelMapper,
};
use hsi_core::{CrsTransform, Datacube, Error, PointCloud, Raster, RasterGrid, Result, RunConfig};
use hsi_frames::FrameConverter;
use hsi_ortho::{EnviHeader, Footprint, OrthoMosaic, OrthoResampler};
use log::*;

/// One push-broom transect as it comes out of the photogrammetry step.
#[derive(Debug, Clone)]
pub struct Transect {
    /// Names every product of the transect.
    pub id: String,
    /// One position per datacube pixel, in the storage frame of the run.
    pub cloud: PointCloud,
    pub cube: Datacube,
}

/// Rasters that have to be brought onto the mosaic grid before coregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarpSource {
    ReferenceOrthophoto,
    Dem,
}

/// Interpolation used when warping a source onto the mosaic grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarpResampling {
    Nearest,
    Cubic,
}

/// Reprojects a source raster onto the exact shape, transform and coordinate system of `grid`.
///
/// An implementation that cannot open its source must fail with [`Error::MissingArtifact`],
/// naming the file and the stage that produces it.
pub trait Warp {
    fn warp(
        &self,
        transect: &str,
        source: WarpSource,
        grid: &RasterGrid,
        resampling: WarpResampling,
    ) -> Result<Raster>;
}

/// Persists the products of a transect.
pub trait ProductSink {
    fn write_footprint(&mut self, transect: &str, footprint: &Footprint) -> Result<()>;

    fn write_composite(&mut self, transect: &str, composite: &Raster) -> Result<()>;

    /// `cube` should be written band-sequential, see [`Raster::to_band_sequential`].
    fn write_cube(&mut self, transect: &str, cube: &Raster, header: &EnviHeader) -> Result<()>;
}

/// Products of the calibration stage.
#[derive(Debug, Clone)]
pub struct Calibration {
    pub coregistration: Coregistration,
    pub set: CalibrationSet,
}

/// Everything a transect produced.
#[derive(Debug)]
pub struct TransectOutcome {
    pub footprint: Footprint,
    pub mosaic: OrthoMosaic,
    /// Calibration input, or the [`Error::Matching`] that stopped the calibration stage.
    /// The orthorectification products above are valid either way.
    pub calibration: Result<Calibration>,
}

/// Runs one transect from point cloud to calibration input.
pub struct Pipeline<'a, C, W, E, M> {
    config: &'a RunConfig,
    crs: C,
    warp: W,
    enhancer: E,
    matcher: M,
    reference_resampling: WarpResampling,
    dem_resampling: WarpResampling,
}

impl<'a, C, W, E, M> Pipeline<'a, C, W, E, M>
where
    C: CrsTransform,
    W: Warp,
    E: ImageEnhancer,
    M: FeatureMatcher,
{
    /// Both warped sources are resampled with [`WarpResampling::Cubic`] unless changed with
    /// [`Pipeline::resampling`].
    pub fn new(config: &'a RunConfig, crs: C, warp: W, enhancer: E, matcher: M) -> Self {
        Self {
            config,
            crs,
            warp,
            enhancer,
            matcher,
            reference_resampling: WarpResampling::Cubic,
            dem_resampling: WarpResampling::Cubic,
        }
    }

    #[must_use]
    pub fn resampling(mut self, source: WarpSource, resampling: WarpResampling) -> Self {
        match source {
            WarpSource::ReferenceOrthophoto => self.reference_resampling = resampling,
            WarpSource::Dem => self.dem_resampling = resampling,
        }
        self
    }

    /// Orthorectifies `transect`, writes its products to `sink` and derives calibration input.
    ///
    /// Any failure before the products are written aborts the transect. A
    /// [`Error::Matching`] during calibration is kept in the outcome instead, since the written
    /// products remain valid; every other calibration failure is returned.
    pub fn run<S>(&self, transect: &Transect, sink: &mut S) -> Result<TransectOutcome>
    where
        S: ProductSink,
    {
        let id = transect.id.as_str();
        info!("transect {}: orthorectifying", id);
        let converter = FrameConverter::new(&self.config.crs, &self.crs);
        let projected = converter.to_projected(&transect.cloud)?;
        let footprint = Footprint::from_cloud(&projected, self.config.crs.output_crs())?;
        sink.write_footprint(id, &footprint)?;

        let mosaic =
            OrthoResampler::new(self.config).resample(&projected, &transect.cube, &footprint)?;
        sink.write_composite(id, &mosaic.composite)?;
        if let Some(cube) = &mosaic.cube {
            let header = EnviHeader::for_cube(
                cube,
                transect.cube.wavelengths(),
                self.config.radiometric_unit.as_str(),
            );
            sink.write_cube(id, cube, &header)?;
        }

        info!("transect {}: coregistering", id);
        let calibration = match self.calibrate(transect, &mosaic, &converter) {
            Err(e) if e.is_calibration_only() => {
                warn!("transect {}: no calibration input: {}", id, e);
                Err(e)
            }
            Err(e) => return Err(e),
            Ok(calibration) => Ok(calibration),
        };
        Ok(TransectOutcome {
            footprint,
            mosaic,
            calibration,
        })
    }

    fn calibrate(
        &self,
        transect: &Transect,
        mosaic: &OrthoMosaic,
        converter: &FrameConverter<'_, &C>,
    ) -> Result<Calibration> {
        let warp = |source: WarpSource, resampling: WarpResampling| {
            self.warp.warp(&transect.id, source, &mosaic.grid, resampling)
        };
        let reference = warp(WarpSource::ReferenceOrthophoto, self.reference_resampling)?;
        let dem = warp(WarpSource::Dem, self.dem_resampling)?;

        let coregistration = CoregistrationEngine::new(self.config, &self.enhancer, &self.matcher)
            .coregister(&mosaic.composite, &reference, &dem)?;
        let set = InversePixelMapper::new(*converter, &dem).map(
            &coregistration.correspondences,
            &mosaic.index_map,
            &mosaic.grid,
            transect.cube.samples(),
        )?;
        if set.mappings.is_empty() {
            return Err(Error::Matching(format!(
                "all {} correspondences fell outside the mosaic or the DEM",
                set.rejected
            )));
        }
        Ok(Calibration {
            coregistration,
            set,
        })
    }
}
