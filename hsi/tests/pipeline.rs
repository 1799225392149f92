use approx::assert_relative_eq;
use hsi::coreg::image::GrayImage;
use hsi::coreg::{ContrastLimitedLuma, EqualizedLuma, FeatureMatcher, KnnMatch};
use hsi::nalgebra::{Point2, Point3, Vector2, Vector3};
use hsi::ndarray::Array3;
use hsi::ortho::{EnviHeader, Footprint};
use hsi::{
    CrsDefinition, CrsMode, CrsTransform, Datacube, Epsg, Error, Frame, Pipeline, PointCloud,
    ProductSink, Raster, RasterGrid, RawPixel, Result, RunConfig, Transect, Warp, WarpResampling,
    WarpSource,
};

const LINES: usize = 20;
const SAMPLES: usize = 30;
const DEM_HEIGHT: f32 = 42.0;

/// Shifts by a constant, standing in for real geodesy.
struct Shift;

impl CrsTransform for Shift {
    fn transform(&self, source: Epsg, target: Epsg, points: &mut [Point3<f64>]) -> Result<()> {
        let sign = if source < target { 1.0 } else { -1.0 };
        for p in points {
            *p += Vector3::new(10.0, 20.0, 0.0) * sign;
        }
        Ok(())
    }
}

/// Produces rasters on the requested grid, or reports a missing upstream file.
struct FakeWarp {
    missing: bool,
    dem_resampling: WarpResampling,
}

impl FakeWarp {
    fn available() -> Self {
        Self {
            missing: false,
            dem_resampling: WarpResampling::Cubic,
        }
    }

    fn missing() -> Self {
        Self {
            missing: true,
            ..Self::available()
        }
    }
}

impl Warp for FakeWarp {
    fn warp(
        &self,
        transect: &str,
        source: WarpSource,
        grid: &RasterGrid,
        resampling: WarpResampling,
    ) -> Result<Raster> {
        let expected = match source {
            WarpSource::ReferenceOrthophoto => WarpResampling::Cubic,
            WarpSource::Dem => self.dem_resampling,
        };
        assert_eq!(resampling, expected);
        if self.missing {
            return Err(Error::missing_artifact(
                format!("{}_reference.tif", transect),
                "orthophoto export",
                None,
            ));
        }
        let bands = match source {
            WarpSource::ReferenceOrthophoto => 3,
            WarpSource::Dem => 1,
        };
        let data = Array3::from_shape_fn((grid.height, grid.width, bands), |(row, col, _)| {
            match source {
                WarpSource::ReferenceOrthophoto => ((row * 13 + col * 7) % 200) as f32,
                WarpSource::Dem => DEM_HEIGHT,
            }
        });
        Raster::new(grid.clone(), data)
    }
}

struct Canned(Vec<KnnMatch>);

impl FeatureMatcher for Canned {
    fn match_features(&self, mosaic: &GrayImage, reference: &GrayImage) -> Result<Vec<KnnMatch>> {
        assert_eq!(mosaic.dimensions(), reference.dimensions());
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct MemorySink {
    written: Vec<String>,
    header: Option<String>,
}

impl ProductSink for MemorySink {
    fn write_footprint(&mut self, transect: &str, footprint: &Footprint) -> Result<()> {
        assert_eq!(footprint.ring().len(), 2 * (LINES + SAMPLES));
        self.written.push(format!("{}_footprint", transect));
        Ok(())
    }

    fn write_composite(&mut self, transect: &str, composite: &Raster) -> Result<()> {
        assert_eq!(composite.bands(), 3);
        self.written.push(format!("{}_composite", transect));
        Ok(())
    }

    fn write_cube(&mut self, transect: &str, cube: &Raster, header: &EnviHeader) -> Result<()> {
        assert_eq!(cube.to_band_sequential().dim().0, header.bands);
        self.written.push(format!("{}_cube", transect));
        self.header = Some(header.to_string());
        Ok(())
    }
}

fn init() {
    let _ = pretty_env_logger::try_init_timed();
}

/// A straight 20 x 30 swath at 0.5 m spacing, lines advancing north.
fn transect(frame: Frame, origin: Vector3<f64>) -> Transect {
    let cloud = PointCloud::from_fn(frame, LINES, SAMPLES, |line, sample| {
        Point3::new(sample as f64 * 0.5, line as f64 * 0.5, 3.0) + origin
    });
    let radiance = Array3::from_shape_fn((LINES, SAMPLES, 5), |(line, sample, band)| {
        1.0 + band as f32 + ((line + sample) % 7) as f32
    });
    Transect {
        id: "transect_07".into(),
        cloud,
        cube: Datacube::new(radiance, vec![450.0, 500.0, 550.0, 600.0, 650.0]).unwrap(),
    }
}

fn local_config() -> RunConfig {
    RunConfig::new(
        CrsMode::Local {
            wkt: "LOCAL_CS[\"ltp\"]".into(),
        },
        0.5,
    )
    .unwrap()
    .radiometric_unit("mW/cm^2/sr/um")
}

fn good_match() -> KnnMatch {
    KnnMatch {
        mosaic: Point2::new(3.2, 4.6),
        reference: Point2::new(4.0, 5.0),
        best: 10.0,
        second: 40.0,
    }
}

#[test]
fn local_transect_produces_calibration_input() {
    init();
    let config = local_config();
    let pipeline = Pipeline::new(
        &config,
        Shift,
        FakeWarp::available(),
        EqualizedLuma,
        Canned(vec![good_match()]),
    );
    let mut sink = MemorySink::default();
    let outcome = pipeline
        .run(&transect(Frame::Local, Vector3::zeros()), &mut sink)
        .unwrap();

    assert_eq!(
        sink.written,
        ["transect_07_footprint", "transect_07_composite", "transect_07_cube"]
    );
    let header = sink.header.unwrap();
    assert!(header.contains("bands = 5\n"));
    assert!(header.contains("wavelength = {450, 500, 550, 600, 650}\n"));
    assert!(header.contains("unit = mW/cm^2/sr/um\n"));

    let mosaic = &outcome.mosaic;
    assert_eq!((mosaic.grid.width, mosaic.grid.height), (29, 19));
    assert_eq!(mosaic.rgb_bands, [4, 2, 0]);

    let calibration = outcome.calibration.unwrap();
    assert_eq!(calibration.coregistration.correspondences.len(), 1);
    assert_eq!(calibration.set.rejected, 0);
    let mapping = &calibration.set.mappings[0];
    assert_eq!(mapping.candidates[0], RawPixel { line: 15, sample: 3 });
    assert_eq!(
        mapping.candidates[0],
        RawPixel::from_flat(mosaic.index_map.at_pixel(4, 3).unwrap(), SAMPLES)
    );
    assert_relative_eq!(mapping.weights, Vector2::new(0.2, 0.6), epsilon = 1e-12);
    assert_relative_eq!(mapping.world, Point3::new(2.25, 6.75, 42.0), epsilon = 1e-9);
}

#[test]
fn dem_resampling_is_passed_to_the_warp() {
    init();
    let config = local_config();
    let pipeline = Pipeline::new(
        &config,
        Shift,
        FakeWarp {
            dem_resampling: WarpResampling::Nearest,
            ..FakeWarp::available()
        },
        ContrastLimitedLuma::default(),
        Canned(vec![good_match()]),
    )
    .resampling(WarpSource::Dem, WarpResampling::Nearest);
    let mut sink = MemorySink::default();
    let outcome = pipeline
        .run(&transect(Frame::Local, Vector3::zeros()), &mut sink)
        .unwrap();
    let world = outcome.calibration.unwrap().set.mappings[0].world;
    assert_relative_eq!(world.z, 42.0, epsilon = 1e-9);
}

#[test]
fn global_transect_maps_back_into_storage_frame() {
    init();
    let offset = Vector3::new(100.0, 200.0, 0.0);
    let config = RunConfig::new(
        CrsMode::Global {
            geocentric: Epsg(4978),
            projected: Epsg(32633),
            offset,
        },
        0.5,
    )
    .unwrap();
    let pipeline = Pipeline::new(
        &config,
        Shift,
        FakeWarp::available(),
        EqualizedLuma,
        Canned(vec![good_match()]),
    );
    let mut sink = MemorySink::default();
    // Stored coordinates are offset-reduced; the shift moves them by (10, 20) on projection.
    let outcome = pipeline
        .run(&transect(Frame::Geocentric, Vector3::zeros()), &mut sink)
        .unwrap();

    let grid = &outcome.mosaic.grid;
    assert_eq!(grid.crs, CrsDefinition::Epsg(Epsg(32633)));
    assert_eq!(grid.transform.x_origin, 110.0);
    let world = outcome.calibration.unwrap().set.mappings[0].world;
    // Same reference pixel as in the local run, shifted back and reduced by the offset.
    assert_relative_eq!(world, Point3::new(2.25, 6.75, 42.0), epsilon = 1e-9);
}

#[test]
fn matching_failure_keeps_orthorectification_products() {
    init();
    let config = local_config();
    let far = KnnMatch {
        reference: Point2::new(13.0, 4.6),
        ..good_match()
    };
    let ambiguous = KnnMatch {
        second: 11.0,
        ..good_match()
    };
    let pipeline = Pipeline::new(
        &config,
        Shift,
        FakeWarp::available(),
        EqualizedLuma,
        Canned(vec![far, ambiguous]),
    );
    let mut sink = MemorySink::default();
    let outcome = pipeline
        .run(&transect(Frame::Local, Vector3::zeros()), &mut sink)
        .unwrap();

    assert_eq!(sink.written.len(), 3);
    assert!(outcome.mosaic.coverage.filled > 0);
    assert!(matches!(outcome.calibration, Err(Error::Matching(_))));
}

#[test]
fn missing_reference_names_artifact_and_stage() {
    init();
    let config = local_config().composite_only(true);
    let pipeline = Pipeline::new(
        &config,
        Shift,
        FakeWarp::missing(),
        EqualizedLuma,
        Canned(vec![good_match()]),
    );
    let mut sink = MemorySink::default();
    let error = pipeline
        .run(&transect(Frame::Local, Vector3::zeros()), &mut sink)
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "cannot open transect_07_reference.tif; it is produced by the orthophoto export stage"
    );
    // Products written before coregistration stay written; no cube in composite-only runs.
    assert_eq!(sink.written, ["transect_07_footprint", "transect_07_composite"]);
}

#[test]
fn degenerate_transect_is_a_geometry_error() {
    init();
    let config = local_config();
    let pipeline = Pipeline::new(
        &config,
        Shift,
        FakeWarp::available(),
        EqualizedLuma,
        Canned(vec![]),
    );
    let mut single_line = transect(Frame::Local, Vector3::zeros());
    single_line.cloud = PointCloud::from_fn(Frame::Local, 1, SAMPLES, |_, sample| {
        Point3::new(sample as f64, 0.0, 0.0)
    });
    let mut sink = MemorySink::default();
    assert!(matches!(
        pipeline.run(&single_line, &mut sink),
        Err(Error::Geometry(_))
    ));
    assert!(sink.written.is_empty());
}
