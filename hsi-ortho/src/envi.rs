use core::fmt;
use hsi_core::{CrsDefinition, Datum, Raster, RasterGrid};

/// ENVI code of 32-bit float samples.
pub const ENVI_FLOAT32: u8 = 4;

/// Header metadata of a band-sequential ENVI cube.
///
/// Only the text of the `.hdr` file is produced here. The binary body is
/// [`Raster::to_band_sequential`] written out in native byte order.
#[derive(Debug, Clone, PartialEq)]
pub struct EnviHeader {
    pub samples: usize,
    pub lines: usize,
    pub bands: usize,
    pub data_type: u8,
    /// 0 for little endian.
    pub byte_order: u8,
    pub map_info: String,
    /// Well-known text of the grid system. Left out of the header when it is not known.
    pub coordinate_system: Option<String>,
    pub data_ignore_value: f64,
    /// Center wavelength per band, in nanometers.
    pub wavelengths: Vec<f64>,
    /// Radiometric unit of the samples.
    pub unit: String,
}

impl EnviHeader {
    /// Header for `cube`, whose bands are the datacube bands at `wavelengths`.
    pub fn for_cube(cube: &Raster, wavelengths: &[f64], unit: impl Into<String>) -> Self {
        let grid = cube.grid();
        Self {
            samples: grid.width,
            lines: grid.height,
            bands: cube.bands(),
            data_type: ENVI_FLOAT32,
            byte_order: if cfg!(target_endian = "big") { 1 } else { 0 },
            map_info: map_info(grid),
            coordinate_system: grid.crs.wkt(),
            data_ignore_value: grid.nodata,
            wavelengths: wavelengths.to_vec(),
            unit: unit.into(),
        }
    }
}

/// The `map info` tuple: projection, reference pixel (1-based), its position and pixel size.
fn map_info(grid: &RasterGrid) -> String {
    let t = &grid.transform;
    let utm = match &grid.crs {
        CrsDefinition::Epsg(epsg) => epsg.utm_zone(),
        CrsDefinition::Wkt(_) => None,
    };
    let (projection, zone) = match utm {
        Some(utm) => {
            let datum = match utm.datum {
                Datum::Wgs84 => "WGS-84",
                Datum::Etrs89 => "ETRS-89",
            };
            let hemisphere = if utm.south { "South" } else { "North" };
            ("UTM", format!(", {}, {}, {}", utm.zone, hemisphere, datum))
        }
        None => ("Arbitrary", String::new()),
    };
    format!(
        "{{{}, 1, 1, {}, {}, {}, {}{}, units=Meters}}",
        projection, t.x_origin, t.y_origin, t.a, -t.e, zone
    )
}

impl fmt::Display for EnviHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ENVI")?;
        writeln!(f, "samples = {}", self.samples)?;
        writeln!(f, "lines = {}", self.lines)?;
        writeln!(f, "bands = {}", self.bands)?;
        writeln!(f, "header offset = 0")?;
        writeln!(f, "file type = ENVI Standard")?;
        writeln!(f, "data type = {}", self.data_type)?;
        writeln!(f, "interleave = bsq")?;
        writeln!(f, "byte order = {}", self.byte_order)?;
        writeln!(f, "map info = {}", self.map_info)?;
        if let Some(wkt) = &self.coordinate_system {
            writeln!(f, "coordinate system string = {{{}}}", wkt)?;
        }
        writeln!(f, "data ignore value = {}", self.data_ignore_value)?;
        writeln!(f, "wavelength units = Nanometers")?;
        writeln!(f, "unit = {}", self.unit)?;
        let wavelengths: Vec<String> = self.wavelengths.iter().map(f64::to_string).collect();
        writeln!(f, "wavelength = {{{}}}", wavelengths.join(", "))
    }
}
