use geo::{Area, BoundingRect, Contains, LineString, Point, Polygon};
use hsi_core::nalgebra::Point2;
use hsi_core::{Bounds, CrsDefinition, Error, Frame, PointCloud, Result};

/// Sense of rotation of a footprint ring, as seen in sensor image order.
///
/// The reference frame has its y axis pointing down, the way a transect is displayed with lines
/// running top to bottom. This is the mirror of the usual map convention: a ring reported as
/// [`Winding::Clockwise`] here has a positive shoelace area and is counter-clockwise for
/// [`geo::Winding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
    /// Zero signed area.
    Degenerate,
}

/// The boundary of the imaged swath.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    ring: Vec<Point2<f64>>,
    polygon: Polygon<f64>,
    bounds: Bounds,
    crs: CrsDefinition,
}

impl Footprint {
    /// Walks the swath edges of a projected (or local) cloud.
    ///
    /// The ring is the first line, then the last sample column, then the last line backwards,
    /// then the first sample column backwards. Corner pixels appear twice, so the ring always has
    /// `2 * (lines + samples)` vertices and ends on the vertex it started from.
    pub fn from_cloud(cloud: &PointCloud, crs: CrsDefinition) -> Result<Self> {
        if cloud.frame() == Frame::Geocentric {
            return Err(Error::Geometry(
                "footprints are built from projected or local clouds".into(),
            ));
        }
        let (lines, samples) = (cloud.lines(), cloud.samples());
        if lines < 2 || samples < 2 {
            return Err(Error::Geometry(format!(
                "a {} x {} transect has no area",
                lines, samples
            )));
        }

        let edge_start = (0..samples).map(|sample| cloud.horizontal(0, sample));
        let side_end = (0..lines).map(|line| cloud.horizontal(line, samples - 1));
        let edge_end = (0..samples)
            .rev()
            .map(|sample| cloud.horizontal(lines - 1, sample));
        let side_start = (0..lines).rev().map(|line| cloud.horizontal(line, 0));

        let ring: Vec<Point2<f64>> = edge_start
            .chain(side_end)
            .chain(edge_end)
            .chain(side_start)
            .collect();
        let exterior: LineString<f64> = ring.iter().map(|p| (p.x, p.y)).collect();
        let polygon = Polygon::new(exterior, vec![]);
        let rect = polygon
            .bounding_rect()
            .ok_or_else(|| Error::Geometry("footprint ring has no vertices".into()))?;
        let bounds = Bounds::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
        Ok(Self {
            ring,
            polygon,
            bounds,
            crs,
        })
    }

    pub fn ring(&self) -> &[Point2<f64>] {
        &self.ring
    }

    /// The ring followed by its first vertex again.
    pub fn closed_ring(&self) -> impl Iterator<Item = Point2<f64>> + '_ {
        self.ring.iter().chain(self.ring.first()).copied()
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    pub fn crs(&self) -> &CrsDefinition {
        &self.crs
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Shoelace area, positive when the ring turns counter-clockwise in a y-up frame.
    pub fn signed_area(&self) -> f64 {
        self.polygon.signed_area()
    }

    /// Rotation of the ring in sensor image order, see [`Winding`].
    ///
    /// A swath whose lines advance along +y and whose samples advance along +x is clockwise.
    pub fn winding(&self) -> Winding {
        let area = self.signed_area();
        if area > 0.0 {
            Winding::Clockwise
        } else if area < 0.0 {
            Winding::CounterClockwise
        } else {
            Winding::Degenerate
        }
    }

    /// Whether `point` lies in the interior. Points on the ring itself are outside.
    pub fn contains(&self, point: Point2<f64>) -> bool {
        self.polygon.contains(&Point::new(point.x, point.y))
    }

    /// X coordinates where the horizontal line at `y` crosses the ring.
    ///
    /// A vertex exactly at `y` is counted as lying above the line, so each crossing is counted
    /// once and horizontal edges never cross.
    pub fn crossings(&self, y: f64) -> impl Iterator<Item = f64> + '_ {
        self.polygon.exterior().lines().filter_map(move |line| {
            let (a, b) = (line.start, line.end);
            ((a.y > y) != (b.y > y)).then(|| a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hsi_core::nalgebra::Point3;
    use hsi_core::Epsg;

    /// Lines at y = 0, 1, 2 and samples at x = 0, 1.
    fn strip() -> PointCloud {
        PointCloud::from_fn(Frame::Projected, 3, 2, |line, sample| {
            Point3::new(sample as f64, line as f64, 0.0)
        })
    }

    fn crs() -> CrsDefinition {
        CrsDefinition::Epsg(Epsg(25832))
    }

    #[test]
    fn ring_walks_edges_in_order() {
        let footprint = Footprint::from_cloud(&strip(), crs()).unwrap();
        let expected = [
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (1.0, 2.0),
            (0.0, 2.0),
            (0.0, 2.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]
        .map(|(x, y)| Point2::new(x, y));
        assert_eq!(footprint.ring(), &expected);
        assert_eq!(footprint.ring().len(), 2 * (3 + 2));
    }

    #[test]
    fn ring_is_closed_and_clockwise() {
        let footprint = Footprint::from_cloud(&strip(), crs()).unwrap();
        let closed: Vec<_> = footprint.closed_ring().collect();
        assert_eq!(closed.len(), 11);
        assert_eq!(closed.first(), closed.last());
        assert_relative_eq!(footprint.signed_area(), 2.0);
        assert_eq!(footprint.winding(), Winding::Clockwise);
    }

    #[test]
    fn sensor_clockwise_is_map_counter_clockwise() {
        use geo::Winding as _;

        let footprint = Footprint::from_cloud(&strip(), crs()).unwrap();
        assert!(footprint.polygon().exterior().is_ccw());
        assert_eq!(footprint.winding(), Winding::Clockwise);

        let mirrored = PointCloud::from_fn(Frame::Projected, 3, 2, |line, sample| {
            Point3::new(sample as f64, -(line as f64), 0.0)
        });
        let mirrored = Footprint::from_cloud(&mirrored, crs()).unwrap();
        assert!(mirrored.polygon().exterior().is_cw());
        assert_eq!(mirrored.winding(), Winding::CounterClockwise);
    }

    #[test]
    fn ring_vertices_lie_outside() {
        let footprint = Footprint::from_cloud(&strip(), crs()).unwrap();
        assert!(footprint.contains(Point2::new(0.5, 1.0)));
        assert!(!footprint.contains(Point2::new(0.0, 1.0)));
        assert!(!footprint.contains(Point2::new(1.0, 2.0)));
    }

    #[test]
    fn too_few_lines_or_samples_is_degenerate() {
        let single_line = PointCloud::from_fn(Frame::Projected, 1, 5, |_, sample| {
            Point3::new(sample as f64, 0.0, 0.0)
        });
        assert!(matches!(
            Footprint::from_cloud(&single_line, crs()),
            Err(Error::Geometry(_))
        ));
        let single_sample = PointCloud::from_fn(Frame::Projected, 5, 1, |line, _| {
            Point3::new(0.0, line as f64, 0.0)
        });
        assert!(Footprint::from_cloud(&single_sample, crs()).is_err());
    }

    #[test]
    fn geocentric_clouds_are_rejected() {
        let cloud = PointCloud::from_fn(Frame::Geocentric, 2, 2, |_, _| Point3::origin());
        assert!(Footprint::from_cloud(&cloud, crs()).is_err());
    }

    #[test]
    fn containment_follows_swath_shape() {
        // A swath that bends: lines fan out to the east.
        let cloud = PointCloud::from_fn(Frame::Projected, 4, 3, |line, sample| {
            Point3::new(sample as f64 * (1.0 + line as f64), line as f64 * 2.0, 0.0)
        });
        let footprint = Footprint::from_cloud(&cloud, crs()).unwrap();
        assert!(footprint.contains(Point2::new(0.5, 0.5)));
        assert!(footprint.contains(Point2::new(7.0, 5.9)));
        assert!(!footprint.contains(Point2::new(3.0, 0.5)));
        assert!(!footprint.contains(Point2::new(-0.1, 3.0)));
        assert_eq!(footprint.bounds(), Bounds::new(0.0, 0.0, 8.0, 6.0));
    }
}
