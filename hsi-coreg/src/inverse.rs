use hsi_core::nalgebra::{Point3, Vector2};
use hsi_core::{
    CrsTransform, Error, FeatureCorrespondence, HeightSampler, IndexMap, RasterGrid, RawPixel,
    RawPixelMapping, Result,
};
use hsi_frames::FrameConverter;
use log::*;
use rayon::prelude::*;

/// A correspondence with its raw neighbors, weights and map position.
type Resolved = (FeatureCorrespondence, [RawPixel; 4], Vector2<f64>, Point3<f64>);

/// Calibration input produced from one coregistration.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSet {
    pub mappings: Vec<RawPixelMapping>,
    /// Correspondences that could not be traced back, see [`InversePixelMapper::map`].
    pub rejected: usize,
}

/// Traces correspondences from the mosaic back into the raw datacube and into the world.
pub struct InversePixelMapper<'a, T, H> {
    converter: FrameConverter<'a, T>,
    dem: &'a H,
}

impl<'a, T, H> InversePixelMapper<'a, T, H>
where
    T: CrsTransform,
    H: HeightSampler + Sync,
{
    pub fn new(converter: FrameConverter<'a, T>, dem: &'a H) -> Self {
        Self { converter, dem }
    }

    /// Maps every correspondence to its four raw-pixel neighbors and its world position.
    ///
    /// `index_map` and `grid` are those of the mosaic and `samples` is the width of the raw
    /// datacube. A correspondence is dropped, with a warning, when one of its four neighbors falls
    /// outside the grid or on an unmatched cell, or when the DEM has no height under its reference
    /// position. Failures of the coordinate transform are returned as errors.
    pub fn map(
        &self,
        correspondences: &[FeatureCorrespondence],
        index_map: &IndexMap,
        grid: &RasterGrid,
        samples: usize,
    ) -> Result<CalibrationSet> {
        if (index_map.width(), index_map.height()) != (grid.width, grid.height) {
            return Err(Error::GridMismatch {
                raster: "index map",
                reason: format!(
                    "{} x {} cells for a {} x {} grid",
                    index_map.width(),
                    index_map.height(),
                    grid.width,
                    grid.height
                ),
            });
        }
        if samples == 0 {
            return Err(Error::Geometry("the datacube has no samples".into()));
        }

        let dem = self.dem;
        let resolved: Vec<Option<Resolved>> =
            correspondences
                .par_iter()
                .map(|&correspondence| {
                    let (candidates, weights) =
                        match raw_neighbors(&correspondence, index_map, samples) {
                            Some(found) => found,
                            None => {
                                warn!(
                                    "dropping correspondence at mosaic pixel ({:.2}, {:.2}): no raw pixel under it",
                                    correspondence.mosaic.x, correspondence.mosaic.y
                                );
                                return None;
                            }
                        };
                    let world = match reference_position(dem, &correspondence, grid) {
                        Ok(world) => world,
                        Err(e) => {
                            warn!("dropping correspondence: {}", e);
                            return None;
                        }
                    };
                    Some((correspondence, candidates, weights, world))
                })
                .collect();

        let rejected = resolved.iter().filter(|r| r.is_none()).count();
        let resolved: Vec<_> = resolved.into_iter().flatten().collect();
        let worlds: Vec<Point3<f64>> = resolved.iter().map(|&(.., world)| world).collect();
        let stored = self.converter.to_storage(&worlds)?;

        let mappings: Vec<RawPixelMapping> = resolved
            .into_iter()
            .zip(stored)
            .map(
                |((correspondence, candidates, weights, _), world)| RawPixelMapping {
                    correspondence,
                    candidates,
                    weights,
                    world,
                },
            )
            .collect();
        info!(
            "{} correspondences mapped to raw pixels, {} rejected",
            mappings.len(),
            rejected
        );
        Ok(CalibrationSet { mappings, rejected })
    }
}

/// Map position `(x, y, height)` of the reference pixel of `correspondence`.
fn reference_position<H>(
    dem: &H,
    correspondence: &FeatureCorrespondence,
    grid: &RasterGrid,
) -> Result<Point3<f64>>
where
    H: HeightSampler,
{
    let (col, row) = (correspondence.reference.x, correspondence.reference.y);
    let position = grid.transform.pixel_center_to_world(col, row);
    let height = dem
        .height_at(position.x, position.y)
        .ok_or(Error::Sampling {
            x: position.x,
            y: position.y,
        })?;
    Ok(Point3::new(position.x, position.y, height))
}

/// Raw pixels under the four integer neighbors of the mosaic position and the bilinear weights.
///
/// The mosaic position is `(row u, col v)`. Neighbors are visited as `(⌊u⌋, ⌊v⌋)`, `(⌊u⌋, ⌈v⌉)`,
/// `(⌈u⌉, ⌊v⌋)`, `(⌈u⌉, ⌈v⌉)` and looked up in raster orientation (row 0 north).
pub fn raw_neighbors(
    correspondence: &FeatureCorrespondence,
    index_map: &IndexMap,
    samples: usize,
) -> Option<([RawPixel; 4], Vector2<f64>)> {
    let (u, v) = (correspondence.mosaic.y, correspondence.mosaic.x);
    if !(u >= 0.0 && v >= 0.0) {
        return None;
    }
    let (u0, u1, v0, v1) = (u.floor(), u.ceil(), v.floor(), v.ceil());
    let lookup = |row: f64, col: f64| {
        index_map
            .at_pixel(row as usize, col as usize)
            .map(|flat| RawPixel::from_flat(flat, samples))
    };
    let candidates = [
        lookup(u0, v0)?,
        lookup(u0, v1)?,
        lookup(u1, v0)?,
        lookup(u1, v1)?,
    ];
    Some((candidates, Vector2::new(v - v0, u - u0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hsi_core::nalgebra::{Point2, Vector3};
    use hsi_core::ndarray::Array3;
    use hsi_core::{Bounds, CrsDefinition, CrsMode, Epsg, Raster};

    /// Index map of a 4 x 3 grid whose scan cell `i` maps to flat index `100 + i`.
    fn index_map() -> IndexMap {
        IndexMap::new(4, 3, (0..12).map(|i| Some(100 + i)).collect()).unwrap()
    }

    fn grid() -> RasterGrid {
        RasterGrid::from_bounds(
            Bounds::new(1000.0, 2000.0, 1008.0, 2006.0),
            2.0,
            CrsDefinition::Epsg(Epsg(32633)),
            -9999.0,
        )
        .unwrap()
    }

    fn dem(grid: &RasterGrid) -> Raster {
        let data = Array3::from_shape_fn((grid.height, grid.width, 1), |(row, col, _)| {
            (10 * row + col) as f32
        });
        Raster::new(grid.clone(), data).unwrap()
    }

    struct Shift;

    impl CrsTransform for Shift {
        fn transform(&self, _: Epsg, _: Epsg, points: &mut [Point3<f64>]) -> Result<()> {
            for p in points {
                *p += Vector3::new(1.0, 2.0, 3.0);
            }
            Ok(())
        }
    }

    #[test]
    fn neighbors_are_read_north_up() {
        let map = index_map();
        let correspondence =
            FeatureCorrespondence::new(Point2::new(1.25, 0.5), Point2::new(1.0, 1.0));
        let (candidates, weights) = raw_neighbors(&correspondence, &map, 50).unwrap();
        // Raster row 0 is scan row 2, so (row 0, col 1) is scan cell 9.
        assert_eq!(candidates[0], RawPixel::from_flat(109, 50));
        assert_eq!(candidates[1], RawPixel::from_flat(110, 50));
        assert_eq!(candidates[2], RawPixel::from_flat(105, 50));
        assert_eq!(candidates[3], RawPixel::from_flat(106, 50));
        assert_eq!(candidates[0], RawPixel { line: 2, sample: 9 });
        assert_relative_eq!(weights, Vector2::new(0.25, 0.5));
    }

    #[test]
    fn integer_position_repeats_one_pixel() {
        let map = index_map();
        let correspondence =
            FeatureCorrespondence::new(Point2::new(2.0, 1.0), Point2::new(2.0, 1.0));
        let (candidates, weights) = raw_neighbors(&correspondence, &map, 100).unwrap();
        assert!(candidates.iter().all(|c| *c == candidates[0]));
        assert_eq!(weights, Vector2::zeros());
    }

    #[test]
    fn positions_off_the_grid_have_no_neighbors() {
        let map = index_map();
        let beyond = FeatureCorrespondence::new(Point2::new(3.5, 0.0), Point2::origin());
        assert!(raw_neighbors(&beyond, &map, 10).is_none());
        let negative = FeatureCorrespondence::new(Point2::new(-0.5, 0.0), Point2::origin());
        assert!(raw_neighbors(&negative, &map, 10).is_none());
    }

    #[test]
    fn local_world_point_uses_pixel_centers_and_dem() {
        let grid = grid();
        let dem = dem(&grid);
        let mode = CrsMode::Local {
            wkt: "LOCAL_CS[\"ltp\"]".into(),
        };
        let mapper = InversePixelMapper::new(FrameConverter::new(&mode, Shift), &dem);
        let correspondence =
            FeatureCorrespondence::new(Point2::new(1.0, 1.0), Point2::new(2.0, 1.0));
        let set = mapper
            .map(&[correspondence], &index_map(), &grid, 50)
            .unwrap();
        assert_eq!(set.rejected, 0);
        // Column 2, row 1 of a 2 m grid anchored at (1000, 2006).
        assert_relative_eq!(set.mappings[0].world, Point3::new(1005.0, 2003.0, 12.0));
    }

    #[test]
    fn global_world_point_is_stored_with_offset_removed() {
        let grid = grid();
        let dem = dem(&grid);
        let mode = CrsMode::Global {
            geocentric: Epsg(4978),
            projected: Epsg(32633),
            offset: Vector3::new(1000.0, 2000.0, 0.0),
        };
        let mapper = InversePixelMapper::new(FrameConverter::new(&mode, Shift), &dem);
        let correspondence =
            FeatureCorrespondence::new(Point2::new(1.0, 1.0), Point2::new(0.0, 0.0));
        let set = mapper
            .map(&[correspondence], &index_map(), &grid, 50)
            .unwrap();
        assert_relative_eq!(set.mappings[0].world, Point3::new(2.0, 7.0, 3.0));
    }

    #[test]
    fn unmapped_correspondences_are_counted() {
        let grid = grid();
        let mut dem = dem(&grid).into_parts().1;
        dem[(0, 0, 0)] = -9999.0;
        let dem = Raster::new(grid.clone(), dem).unwrap();
        let mode = CrsMode::Local { wkt: String::new() };
        let mapper = InversePixelMapper::new(FrameConverter::new(&mode, Shift), &dem);
        let set = mapper
            .map(
                &[
                    // DEM has no height under the reference pixel.
                    FeatureCorrespondence::new(Point2::new(1.0, 1.0), Point2::new(0.0, 0.0)),
                    // Off the mosaic.
                    FeatureCorrespondence::new(Point2::new(9.0, 1.0), Point2::new(1.0, 1.0)),
                    FeatureCorrespondence::new(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)),
                ],
                &index_map(),
                &grid,
                50,
            )
            .unwrap();
        assert_eq!(set.rejected, 2);
        assert_eq!(set.mappings.len(), 1);
    }
}
