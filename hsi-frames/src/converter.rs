use hsi_core::nalgebra::Point3;
use hsi_core::{CrsMode, CrsTransform, Epsg, Error, Frame, PointCloud, Result};
use log::*;

/// Moves points between the storage frame of a run and its projected frame.
///
/// Every conversion returns new points; inputs are never modified.
#[derive(Debug, Clone, Copy)]
pub struct FrameConverter<'a, T> {
    mode: &'a CrsMode,
    crs: T,
}

impl<'a, T> FrameConverter<'a, T>
where
    T: CrsTransform,
{
    pub fn new(mode: &'a CrsMode, crs: T) -> Self {
        Self { mode, crs }
    }

    pub fn mode(&self) -> &CrsMode {
        self.mode
    }

    /// Converts a stored point cloud into the frame the mosaic is built in.
    ///
    /// In local mode this is the identity. In global mode the offset is added back, the points
    /// are transformed from the geocentric to the projected system, and the result keeps the
    /// exact `(lines, samples)` shape of the input.
    pub fn to_projected(&self, cloud: &PointCloud) -> Result<PointCloud> {
        match self.mode {
            CrsMode::Local { .. } => Ok(cloud.clone()),
            CrsMode::Global {
                geocentric,
                projected,
                offset,
            } => {
                if cloud.frame() != Frame::Geocentric {
                    return Err(Error::Crs {
                        source_crs: format!("{:?}", cloud.frame()),
                        target_crs: projected.to_string(),
                        reason: "global runs expect clouds in the geocentric storage frame".into(),
                    });
                }
                let mut points = cloud.to_flat();
                for point in &mut points {
                    *point += *offset;
                }
                debug!(
                    "projecting {} x {} points {} -> {}",
                    cloud.lines(),
                    cloud.samples(),
                    geocentric,
                    projected
                );
                self.crs.transform(*geocentric, *projected, &mut points)?;
                PointCloud::from_flat(Frame::Projected, cloud.lines(), cloud.samples(), &points)
            }
        }
    }

    /// Converts map positions `(x, y, height)` into the storage frame.
    ///
    /// The inverse of [`FrameConverter::to_projected`]: transform to geocentric, then subtract
    /// the run offset, so the result shares the numerical convention of the stored clouds.
    pub fn to_storage(&self, points: &[Point3<f64>]) -> Result<Vec<Point3<f64>>> {
        match self.mode {
            CrsMode::Local { .. } => Ok(points.to_vec()),
            CrsMode::Global {
                geocentric,
                projected,
                offset,
            } => {
                let mut points = points.to_vec();
                self.crs.transform(*projected, *geocentric, &mut points)?;
                for point in &mut points {
                    *point -= *offset;
                }
                Ok(points)
            }
        }
    }

    /// Converts a whole projected cloud back into the storage frame.
    pub fn cloud_to_storage(&self, cloud: &PointCloud) -> Result<PointCloud> {
        let frame = match self.mode {
            CrsMode::Local { .. } => return Ok(cloud.clone()),
            CrsMode::Global { .. } => Frame::Geocentric,
        };
        let points = self.to_storage(&cloud.to_flat())?;
        PointCloud::from_flat(frame, cloud.lines(), cloud.samples(), &points)
    }

    /// Converts stored geocentric positions (such as sensor positions) to a geographic system,
    /// producing `(longitude, latitude, height)` in degrees and meters.
    pub fn to_geodetic(&self, points: &[Point3<f64>], geodetic: Epsg) -> Result<Vec<Point3<f64>>> {
        match self.mode {
            CrsMode::Local { .. } => Err(Error::Configuration(
                "geodetic positions are undefined for a local frame".into(),
            )),
            CrsMode::Global {
                geocentric, offset, ..
            } => {
                let mut points: Vec<_> = points.iter().map(|p| *p + *offset).collect();
                self.crs.transform(*geocentric, geodetic, &mut points)?;
                Ok(points)
            }
        }
    }
}
