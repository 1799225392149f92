use crate::{CrsDefinition, Error, Result};
use nalgebra::Point2;

/// Axis-aligned extent in map units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Bounds {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Affine pixel to world mapping in GDAL coefficient order.
///
/// ```text
/// x = x_origin + a * col + b * row
/// y = y_origin + d * col + e * row
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub x_origin: f64,
    pub a: f64,
    pub b: f64,
    pub y_origin: f64,
    pub d: f64,
    pub e: f64,
}

impl GeoTransform {
    /// North-up transform stretching `width` x `height` pixels exactly over `bounds`.
    ///
    /// Row 0 lies along `ymax`, so `e` is negative.
    pub fn from_bounds(bounds: &Bounds, width: usize, height: usize) -> Self {
        Self {
            x_origin: bounds.xmin,
            a: bounds.width() / width as f64,
            b: 0.0,
            y_origin: bounds.ymax,
            d: 0.0,
            e: -bounds.height() / height as f64,
        }
    }

    pub fn from_gdal([x_origin, a, b, y_origin, d, e]: [f64; 6]) -> Self {
        Self {
            x_origin,
            a,
            b,
            y_origin,
            d,
            e,
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [self.x_origin, self.a, self.b, self.y_origin, self.d, self.e]
    }

    /// World position of the upper-left corner of a pixel.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> Point2<f64> {
        Point2::new(
            self.x_origin + self.a * col + self.b * row,
            self.y_origin + self.d * col + self.e * row,
        )
    }

    /// World position of a pixel coordinate whose origin is the center of pixel `(0, 0)`.
    ///
    /// Keypoint coordinates use this convention, so half a pixel is added along `a` and `e`.
    pub fn pixel_center_to_world(&self, col: f64, row: f64) -> Point2<f64> {
        let corner = self.pixel_to_world(col, row);
        Point2::new(corner.x + 0.5 * self.a, corner.y + 0.5 * self.e)
    }

    /// Fractional pixel `(col, row)` of a world position. Only valid without rotation terms.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.x_origin) / self.a, (y - self.y_origin) / self.e)
    }
}

/// A regular north-up raster grid in map coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub crs: CrsDefinition,
    pub nodata: f64,
}

impl RasterGrid {
    /// Covers `bounds` with cells of roughly `resolution` map units.
    ///
    /// The cell counts are truncated (`floor(extent / resolution)`), and the transform then
    /// stretches those cells over the full extent, so the actual pixel size can be slightly
    /// larger than `resolution`.
    pub fn from_bounds(
        bounds: Bounds,
        resolution: f64,
        crs: CrsDefinition,
        nodata: f64,
    ) -> Result<Self> {
        let columns = (bounds.width() / resolution).floor();
        let rows = (bounds.height() / resolution).floor();
        if !(columns >= 1.0 && rows >= 1.0) {
            return Err(Error::Geometry(format!(
                "a {} x {} extent at resolution {} gives a {} x {} grid",
                bounds.width(),
                bounds.height(),
                resolution,
                columns,
                rows
            )));
        }
        let (width, height) = (columns as usize, rows as usize);
        Ok(Self {
            width,
            height,
            transform: GeoTransform::from_bounds(&bounds, width, height),
            crs,
            nodata,
        })
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The extent covered by the grid.
    pub fn bounds(&self) -> Bounds {
        let upper_left = self.transform.pixel_to_world(0.0, 0.0);
        let lower_right = self
            .transform
            .pixel_to_world(self.width as f64, self.height as f64);
        Bounds::new(
            upper_left.x.min(lower_right.x),
            upper_left.y.min(lower_right.y),
            upper_left.x.max(lower_right.x),
            upper_left.y.max(lower_right.y),
        )
    }

    /// World position of the center of cell `(col, row)`.
    pub fn cell_center(&self, col: usize, row: usize) -> Point2<f64> {
        self.transform
            .pixel_to_world(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Checks that `other` shares shape, transform and coordinate system with this grid.
    pub fn ensure_same_grid(&self, other: &RasterGrid, raster: &'static str) -> Result<()> {
        let reason = if (self.width, self.height) != (other.width, other.height) {
            format!(
                "shape {} x {} differs from {} x {}",
                other.width, other.height, self.width, self.height
            )
        } else if !transforms_match(&self.transform, &other.transform) {
            format!(
                "transform {:?} differs from {:?}",
                other.transform.to_gdal(),
                self.transform.to_gdal()
            )
        } else if self.crs != other.crs {
            format!("crs {} differs from {}", other.crs, self.crs)
        } else {
            return Ok(());
        };
        Err(Error::GridMismatch { raster, reason })
    }
}

fn transforms_match(a: &GeoTransform, b: &GeoTransform) -> bool {
    let scale = a.a.abs().max(a.e.abs());
    let tolerance = 1e-9 * scale.max(1.0);
    a.to_gdal()
        .iter()
        .zip(b.to_gdal().iter())
        .enumerate()
        .all(|(ix, (x, y))| {
            // Origins are large map coordinates; compare them relative to a pixel.
            let tolerance = if ix == 0 || ix == 3 { 1e-6 * scale } else { tolerance };
            (x - y).abs() <= tolerance
        })
}
