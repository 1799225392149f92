use crate::{Error, Result};
use core::fmt;
use core::str::FromStr;
use derive_more::{From, Into};
use nalgebra::Point3;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Numeric identifier of a coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Epsg(pub u32);

impl Epsg {
    pub fn code(self) -> u32 {
        self.0
    }

    /// The UTM zone of a WGS84 or ETRS89 UTM code.
    pub fn utm_zone(self) -> Option<UtmZone> {
        let (zone, south, datum) = match self.0 {
            code @ 32601..=32660 => (code - 32600, false, Datum::Wgs84),
            code @ 32701..=32760 => (code - 32700, true, Datum::Wgs84),
            code @ 25828..=25838 => (code - 25800, false, Datum::Etrs89),
            _ => return None,
        };
        Some(UtmZone { zone, south, datum })
    }

    /// OGC well-known text of the geographic and UTM systems with a known [`Datum`].
    pub fn wkt(self) -> Option<String> {
        if let Some(utm) = self.utm_zone() {
            let hemisphere = if utm.south { 'S' } else { 'N' };
            return Some(format!(
                "PROJCS[\"{} / UTM zone {}{}\",{},PROJECTION[\"Transverse_Mercator\"],\
                 PARAMETER[\"latitude_of_origin\",0],PARAMETER[\"central_meridian\",{}],\
                 PARAMETER[\"scale_factor\",0.9996],PARAMETER[\"false_easting\",500000],\
                 PARAMETER[\"false_northing\",{}],UNIT[\"metre\",1],AUTHORITY[\"EPSG\",\"{}\"]]",
                utm.datum.name(),
                utm.zone,
                hemisphere,
                utm.datum.geogcs(),
                utm.central_meridian(),
                if utm.south { 10_000_000 } else { 0 },
                self.0
            ));
        }
        let datum = match self.0 {
            4326 => Datum::Wgs84,
            4258 => Datum::Etrs89,
            _ => return None,
        };
        let geogcs = datum.geogcs();
        // Close the GEOGCS with its own authority.
        let open = &geogcs[..geogcs.len() - 1];
        Some(format!("{},AUTHORITY[\"EPSG\",\"{}\"]]", open, self.0))
    }
}

/// Geodetic datum of the supported geographic and projected systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datum {
    Wgs84,
    Etrs89,
}

impl Datum {
    pub fn name(self) -> &'static str {
        match self {
            Self::Wgs84 => "WGS 84",
            Self::Etrs89 => "ETRS89",
        }
    }

    fn geogcs(self) -> &'static str {
        match self {
            Self::Wgs84 => {
                "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563]],\
                 PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433]]"
            }
            Self::Etrs89 => {
                "GEOGCS[\"ETRS89\",DATUM[\"European_Terrestrial_Reference_System_1989\",\
                 SPHEROID[\"GRS 1980\",6378137,298.257222101]],PRIMEM[\"Greenwich\",0],\
                 UNIT[\"degree\",0.0174532925199433]]"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    /// 1 to 60.
    pub zone: u32,
    pub south: bool,
    pub datum: Datum,
}

impl UtmZone {
    /// Longitude of the zone's central meridian, in degrees.
    pub fn central_meridian(&self) -> i32 {
        self.zone as i32 * 6 - 183
    }
}

impl fmt::Display for Epsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// Accepts both `"25832"` and `"EPSG:25832"`.
impl FromStr for Epsg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map(Epsg::from)
            .map_err(|_| Error::Configuration(format!("`{}` is not an EPSG code", s)))
    }
}

/// The coordinate system attached to a footprint or a raster grid.
#[derive(Debug, Clone, PartialEq, Eq, From)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum CrsDefinition {
    Epsg(Epsg),
    /// Well-known text of a local engineering frame (local tangent plane).
    Wkt(String),
}

impl CrsDefinition {
    /// Well-known text of the system, when it is a local frame or a code with known WKT.
    pub fn wkt(&self) -> Option<String> {
        match self {
            Self::Epsg(epsg) => epsg.wkt(),
            Self::Wkt(wkt) => Some(wkt.clone()),
        }
    }
}

impl fmt::Display for CrsDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epsg(epsg) => epsg.fmt(f),
            Self::Wkt(wkt) => f.write_str(wkt),
        }
    }
}

/// Batched transform of 3d points between two coordinate reference systems.
///
/// Geographic systems use `(longitude, latitude, height)` with angles in degrees.
/// Geocentric and projected systems use meters.
pub trait CrsTransform {
    /// Transforms `points` in place from `source` to `target`.
    fn transform(&self, source: Epsg, target: Epsg, points: &mut [Point3<f64>]) -> Result<()>;
}

impl<T> CrsTransform for &T
where
    T: CrsTransform + ?Sized,
{
    fn transform(&self, source: Epsg, target: Epsg, points: &mut [Point3<f64>]) -> Result<()> {
        (**self).transform(source, target, points)
    }
}
