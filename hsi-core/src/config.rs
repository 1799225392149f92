use crate::{CrsDefinition, Epsg, Error, Result};
use nalgebra::Vector3;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// How point clouds of a run are referenced.
#[derive(Debug, Clone, PartialEq)]
pub enum CrsMode {
    /// A local tangent-plane frame. No transform is defined for it, so points stay as they are.
    Local {
        /// Well-known text describing the local frame, attached to every output.
        wkt: String,
    },
    /// Geocentric points stored with `offset` subtracted, projected to `projected` for mapping.
    Global {
        geocentric: Epsg,
        projected: Epsg,
        offset: Vector3<f64>,
    },
}

impl CrsMode {
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global { .. })
    }

    /// The coordinate system of the footprint and of every raster produced for the run.
    pub fn output_crs(&self) -> CrsDefinition {
        match self {
            Self::Local { wkt } => wkt.clone().into(),
            Self::Global { projected, .. } => (*projected).into(),
        }
    }
}

/// The only resampling method the resampler implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResamplingMethod {
    Nearest,
}

/// What the declared search radius means to the nearest-neighbor lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeighborCutoff {
    /// Every cell receives the globally nearest point, however far away it is.
    /// Cells outside the swath are still removed by the footprint mask.
    Unbounded,
    /// Cells with no point within the radius (in map units) are left unmatched.
    Enforced(f64),
}

/// Raw run settings, one field per entry of the processing configuration file.
///
/// Nothing in here is trusted. Convert it to a [`RunConfig`] with [`RunConfig::from_settings`]
/// once per run and pass that around instead.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Geocentric EPSG code of the exported point clouds, or `Local` for a local frame.
    pub geocentric_epsg: Option<String>,
    /// Projected EPSG code the mosaic is produced in (global mode only).
    pub projected_epsg: Option<String>,
    /// Well-known text of the local frame (local mode only).
    pub local_wkt: Option<String>,
    /// Offset subtracted from stored geocentric points.
    pub offset: [f64; 3],
    /// Ground sampling distance of the mosaic in map units.
    pub resolution: f64,
    pub red_wavelength: f64,
    pub green_wavelength: f64,
    pub blue_wavelength: f64,
    pub resampling_method: String,
    pub radiometric_unit: String,
    pub nodata: f64,
    /// Skip the full-band cube and only produce the 3-band composite.
    pub composite_only: bool,
    /// Nearest-neighbor search radius; defaults to the resolution.
    pub search_radius: Option<f64>,
    /// Turn the search radius into a hard "no match" cutoff.
    pub enforce_search_radius: bool,
    /// Lowe ratio between the best and the second best descriptor distance.
    pub ratio_threshold: f64,
    /// Largest displacement, in pixels, of a kept correspondence (exclusive).
    pub max_displacement: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            geocentric_epsg: None,
            projected_epsg: None,
            local_wkt: None,
            offset: [0.0; 3],
            resolution: 0.0,
            red_wavelength: 640.0,
            green_wavelength: 550.0,
            blue_wavelength: 460.0,
            resampling_method: "Nearest".into(),
            radiometric_unit: String::new(),
            nodata: -9999.0,
            composite_only: false,
            search_radius: None,
            enforce_search_radius: false,
            ratio_threshold: 0.8,
            max_displacement: 5.0,
        }
    }
}

/// The validated configuration of a run. Built once, passed by reference to every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub crs: CrsMode,
    pub resolution: f64,
    /// Red, green and blue wavelengths of the composite in nanometers.
    pub rgb_wavelengths: [f64; 3],
    pub resampling: ResamplingMethod,
    pub radiometric_unit: String,
    pub nodata: f64,
    pub composite_only: bool,
    pub neighbor_cutoff: NeighborCutoff,
    pub ratio_threshold: f64,
    pub max_displacement: f64,
}

impl RunConfig {
    /// Creates a configuration with the given frame and resolution, leaving everything else default.
    pub fn new(crs: CrsMode, resolution: f64) -> Result<Self> {
        let defaults = Settings::default();
        let config = Self {
            crs,
            resolution,
            rgb_wavelengths: [
                defaults.red_wavelength,
                defaults.green_wavelength,
                defaults.blue_wavelength,
            ],
            resampling: ResamplingMethod::Nearest,
            radiometric_unit: defaults.radiometric_unit,
            nodata: defaults.nodata,
            composite_only: defaults.composite_only,
            neighbor_cutoff: NeighborCutoff::Unbounded,
            ratio_threshold: defaults.ratio_threshold,
            max_displacement: defaults.max_displacement,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_settings(settings: Settings) -> Result<Self> {
        let crs = match settings.geocentric_epsg.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(Error::Configuration(
                    "geocentric EPSG code (or `Local`) is required".into(),
                ))
            }
            Some(local) if local.eq_ignore_ascii_case("local") => CrsMode::Local {
                wkt: settings.local_wkt.clone().ok_or_else(|| {
                    Error::Configuration("a WKT definition is required in local mode".into())
                })?,
            },
            Some(geocentric) => CrsMode::Global {
                geocentric: geocentric.parse()?,
                projected: settings
                    .projected_epsg
                    .as_deref()
                    .ok_or_else(|| {
                        Error::Configuration("projected EPSG code is required in global mode".into())
                    })?
                    .parse()?,
                offset: Vector3::from(settings.offset),
            },
        };

        let resampling = match settings.resampling_method.trim() {
            method if method.eq_ignore_ascii_case("nearest") => ResamplingMethod::Nearest,
            other => {
                return Err(Error::Configuration(format!(
                    "unsupported resampling method `{}`",
                    other
                )))
            }
        };

        let neighbor_cutoff = if settings.enforce_search_radius {
            NeighborCutoff::Enforced(settings.search_radius.unwrap_or(settings.resolution))
        } else {
            NeighborCutoff::Unbounded
        };

        let config = Self {
            crs,
            resolution: settings.resolution,
            rgb_wavelengths: [
                settings.red_wavelength,
                settings.green_wavelength,
                settings.blue_wavelength,
            ],
            resampling,
            radiometric_unit: settings.radiometric_unit,
            nodata: settings.nodata,
            composite_only: settings.composite_only,
            neighbor_cutoff,
            ratio_threshold: settings.ratio_threshold,
            max_displacement: settings.max_displacement,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::Configuration(format!(
                "mosaic resolution must be positive, got {}",
                self.resolution
            )));
        }
        if self.rgb_wavelengths.iter().any(|wl| !wl.is_finite()) {
            return Err(Error::Configuration(
                "composite wavelengths must be finite".into(),
            ));
        }
        if let NeighborCutoff::Enforced(radius) = self.neighbor_cutoff {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(Error::Configuration(format!(
                    "search radius must be positive, got {}",
                    radius
                )));
            }
        }
        if !(self.ratio_threshold > 0.0 && self.ratio_threshold <= 1.0) {
            return Err(Error::Configuration(format!(
                "ratio threshold must lie in (0, 1], got {}",
                self.ratio_threshold
            )));
        }
        if !(self.max_displacement > 0.0) {
            return Err(Error::Configuration(format!(
                "displacement threshold must be positive, got {}",
                self.max_displacement
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn rgb_wavelengths(self, rgb_wavelengths: [f64; 3]) -> Self {
        Self {
            rgb_wavelengths,
            ..self
        }
    }

    #[must_use]
    pub fn nodata(self, nodata: f64) -> Self {
        Self { nodata, ..self }
    }

    #[must_use]
    pub fn composite_only(self, composite_only: bool) -> Self {
        Self {
            composite_only,
            ..self
        }
    }

    #[must_use]
    pub fn neighbor_cutoff(self, neighbor_cutoff: NeighborCutoff) -> Self {
        Self {
            neighbor_cutoff,
            ..self
        }
    }

    #[must_use]
    pub fn radiometric_unit(self, radiometric_unit: impl Into<String>) -> Self {
        Self {
            radiometric_unit: radiometric_unit.into(),
            ..self
        }
    }
}
