use crate::{Error, Result};
use nalgebra::{Point2, Point3};
use ndarray::{Array3, ArrayView3, Axis};

/// The frame the coordinates of a [`PointCloud`] are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// A local tangent-plane frame. Horizontal and vertical axes are used as they are.
    Local,
    /// Geocentric coordinates with the run offset subtracted.
    Geocentric,
    /// Projected easting, northing and height.
    Projected,
}

/// One 3d position per sensor line and sample of a transect.
///
/// The points are laid out as a `(lines, samples, 3)` array. Flattening it in line-major order
/// gives the flat index used by the [`IndexMap`](crate::IndexMap): `line * samples + sample`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    frame: Frame,
    points: Array3<f64>,
}

impl PointCloud {
    /// Wraps a `(lines, samples, 3)` array of coordinates.
    pub fn new(frame: Frame, points: Array3<f64>) -> Result<Self> {
        if points.dim().2 != 3 {
            return Err(Error::Geometry(format!(
                "point clouds need 3 coordinates per pixel, got {}",
                points.dim().2
            )));
        }
        Ok(Self { frame, points })
    }

    /// Builds a cloud by evaluating `f(line, sample)` for every sensor pixel.
    pub fn from_fn(
        frame: Frame,
        lines: usize,
        samples: usize,
        mut f: impl FnMut(usize, usize) -> Point3<f64>,
    ) -> Self {
        let mut points = Array3::zeros((lines, samples, 3));
        for line in 0..lines {
            for sample in 0..samples {
                let point = f(line, sample);
                points[(line, sample, 0)] = point.x;
                points[(line, sample, 1)] = point.y;
                points[(line, sample, 2)] = point.z;
            }
        }
        Self { frame, points }
    }

    /// Rebuilds a cloud of the given shape from points in line-major order.
    pub fn from_flat(
        frame: Frame,
        lines: usize,
        samples: usize,
        flat: &[Point3<f64>],
    ) -> Result<Self> {
        if flat.len() != lines * samples {
            return Err(Error::Geometry(format!(
                "{} points cannot fill a {} x {} cloud",
                flat.len(),
                lines,
                samples
            )));
        }
        Ok(Self::from_fn(frame, lines, samples, |line, sample| {
            flat[line * samples + sample]
        }))
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn lines(&self) -> usize {
        self.points.dim().0
    }

    pub fn samples(&self) -> usize {
        self.points.dim().1
    }

    pub fn len(&self) -> usize {
        self.lines() * self.samples()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> ArrayView3<'_, f64> {
        self.points.view()
    }

    pub fn get(&self, line: usize, sample: usize) -> Point3<f64> {
        Point3::new(
            self.points[(line, sample, 0)],
            self.points[(line, sample, 1)],
            self.points[(line, sample, 2)],
        )
    }

    /// Horizontal coordinates of a pixel.
    pub fn horizontal(&self, line: usize, sample: usize) -> Point2<f64> {
        Point2::new(self.points[(line, sample, 0)], self.points[(line, sample, 1)])
    }

    /// All points in line-major order.
    pub fn to_flat(&self) -> Vec<Point3<f64>> {
        self.points
            .lanes(Axis(2))
            .into_iter()
            .map(|lane| Point3::new(lane[0], lane[1], lane[2]))
            .collect()
    }

    /// Horizontal coordinates of all points in line-major order.
    pub fn horizontal_flat(&self) -> Vec<[f64; 2]> {
        self.points
            .lanes(Axis(2))
            .into_iter()
            .map(|lane| [lane[0], lane[1]])
            .collect()
    }
}
