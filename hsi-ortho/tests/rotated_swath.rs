use hsi_core::nalgebra::{Point3, Rotation2, Vector2};
use hsi_core::ndarray::Array3;
use hsi_core::{CrsMode, Datacube, Frame, PointCloud, RawPixel, RunConfig};
use hsi_ortho::{Footprint, OrthoResampler, Winding};

const LINES: usize = 60;
const SAMPLES: usize = 40;
const SPACING: f64 = 0.5;

/// A swath flown on a heading 30 degrees east of north.
fn rotated_cloud() -> PointCloud {
    let rotation = Rotation2::new(-30f64.to_radians());
    PointCloud::from_fn(Frame::Local, LINES, SAMPLES, |line, sample| {
        let p = rotation * Vector2::new(sample as f64 * SPACING, line as f64 * SPACING);
        Point3::new(500.0 + p.x, 7000.0 + p.y, 12.0)
    })
}

#[test]
fn rotated_swath_is_resampled_north_up() {
    let _ = pretty_env_logger::try_init_timed();
    let cloud = rotated_cloud();
    let config = RunConfig::new(
        CrsMode::Local {
            wkt: "LOCAL_CS[\"ltp\"]".into(),
        },
        SPACING,
    )
    .unwrap()
    .composite_only(true);
    let footprint = Footprint::from_cloud(&cloud, config.crs.output_crs()).unwrap();
    assert_eq!(footprint.winding(), Winding::Clockwise);

    // Every band holds the flat index of its pixel.
    let radiance = Array3::from_shape_fn((LINES, SAMPLES, 3), |(line, sample, _)| {
        (line * SAMPLES + sample) as f32
    });
    let cube = Datacube::new(radiance, vec![460.0, 550.0, 640.0]).unwrap();
    let mosaic = OrthoResampler::new(&config)
        .resample(&cloud, &cube, &footprint)
        .unwrap();

    let bounds = footprint.bounds();
    assert_eq!(mosaic.grid.transform.y_origin, bounds.ymax);
    assert!(mosaic.coverage.filled > 0);
    assert!(mosaic.coverage.inside < mosaic.coverage.cells);
    assert!(mosaic.cube.is_none());

    for row in 0..mosaic.grid.height {
        for col in 0..mosaic.grid.width {
            let value = mosaic.composite.get(row, col, 0);
            if !mosaic.mask[(row, col)] {
                assert!(mosaic.composite.is_nodata(value));
                continue;
            }
            // The source pixel lies within a cell diagonal of the cell center.
            let pixel = RawPixel::from_flat(value as usize, SAMPLES);
            let source = cloud.horizontal(pixel.line, pixel.sample);
            let center = mosaic.grid.cell_center(col, row);
            let limit = 2.0 * SPACING * 2f64.sqrt();
            assert!(
                (source - center).norm() < limit,
                "cell ({}, {}) took pixel {:?} from {} m away",
                row,
                col,
                pixel,
                (source - center).norm()
            );
        }
    }
}

#[test]
fn resampling_is_deterministic() {
    let cloud = rotated_cloud();
    let config = RunConfig::new(CrsMode::Local { wkt: String::new() }, 0.25).unwrap();
    let footprint = Footprint::from_cloud(&cloud, config.crs.output_crs()).unwrap();
    let cube = Datacube::new(Array3::zeros((LINES, SAMPLES, 1)), vec![550.0]).unwrap();
    let resampler = OrthoResampler::new(&config);
    let first = resampler.resample(&cloud, &cube, &footprint).unwrap();
    let second = resampler.resample(&cloud, &cube, &footprint).unwrap();
    assert_eq!(first.index_map, second.index_map);
}
