use hsi_core::nalgebra::Point3;
use hsi_core::{CrsTransform, Datum, Epsg, Error, Result};
use log::*;
use proj4rs::proj::Proj;

/// [`CrsTransform`] backed by the pure-Rust `proj4rs` crate.
///
/// Only systems with a known proj string are supported (see [`proj_string`]); anything else is
/// rejected as a configuration error before any point is touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Proj4Transform;

impl Proj4Transform {
    pub fn new() -> Self {
        Self
    }
}

/// Proj string of the geocentric, geographic and UTM systems used for airborne surveys.
pub fn proj_string(epsg: Epsg) -> Option<String> {
    const GRS80_ETRS89: &str = "+ellps=GRS80 +towgs84=0,0,0,0,0,0,0";
    if let Some(utm) = epsg.utm_zone() {
        let datum = match utm.datum {
            Datum::Wgs84 => "+datum=WGS84",
            Datum::Etrs89 => GRS80_ETRS89,
        };
        let south = if utm.south { " +south" } else { "" };
        return Some(format!(
            "+proj=utm +zone={}{} {} +units=m +no_defs",
            utm.zone, south, datum
        ));
    }
    let string = match epsg.code() {
        4326 | 4979 => "+proj=longlat +datum=WGS84 +no_defs".to_owned(),
        4258 | 4937 => format!("+proj=longlat {} +no_defs", GRS80_ETRS89),
        4978 => "+proj=geocent +datum=WGS84 +units=m +no_defs".to_owned(),
        4936 => format!("+proj=geocent {} +units=m +no_defs", GRS80_ETRS89),
        _ => return None,
    };
    Some(string)
}

/// Whether the system takes angles (in degrees at the API boundary).
pub fn is_geographic(epsg: Epsg) -> bool {
    matches!(epsg.code(), 4326 | 4979 | 4258 | 4937)
}

fn projection(epsg: Epsg) -> Result<Proj> {
    let definition = proj_string(epsg).ok_or_else(|| {
        Error::Configuration(format!("{} is not supported by the proj4rs backend", epsg))
    })?;
    Proj::from_proj_string(&definition)
        .map_err(|e| Error::Configuration(format!("invalid projection {}: {:?}", epsg, e)))
}

impl CrsTransform for Proj4Transform {
    fn transform(&self, source: Epsg, target: Epsg, points: &mut [Point3<f64>]) -> Result<()> {
        if source == target {
            return Ok(());
        }
        let source_proj = projection(source)?;
        let target_proj = projection(target)?;
        let (source_degrees, target_degrees) = (is_geographic(source), is_geographic(target));
        trace!("transforming {} points {} -> {}", points.len(), source, target);

        for point in points.iter_mut() {
            let mut coordinates = if source_degrees {
                (point.x.to_radians(), point.y.to_radians(), point.z)
            } else {
                (point.x, point.y, point.z)
            };
            proj4rs::transform::transform(&source_proj, &target_proj, &mut coordinates).map_err(
                |e| Error::Crs {
                    source_crs: source.to_string(),
                    target_crs: target.to_string(),
                    reason: format!("{:?}", e),
                },
            )?;
            let (x, y, z) = coordinates;
            *point = if target_degrees {
                Point3::new(x.to_degrees(), y.to_degrees(), z)
            } else {
                Point3::new(x, y, z)
            };
        }
        Ok(())
    }
}
