use crate::{Error, Result};
use ndarray::{Array3, ArrayView1, ArrayView3};

/// Raw hyperspectral radiance of a transect, `(lines, samples, bands)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Datacube {
    radiance: Array3<f32>,
    /// Center wavelength of each band in nanometers.
    wavelengths: Vec<f64>,
}

impl Datacube {
    pub fn new(radiance: Array3<f32>, wavelengths: Vec<f64>) -> Result<Self> {
        if radiance.dim().2 != wavelengths.len() {
            return Err(Error::Geometry(format!(
                "datacube has {} bands but {} wavelengths",
                radiance.dim().2,
                wavelengths.len()
            )));
        }
        Ok(Self {
            radiance,
            wavelengths,
        })
    }

    pub fn lines(&self) -> usize {
        self.radiance.dim().0
    }

    /// Number of samples per line, the width used to decode flat indices.
    pub fn samples(&self) -> usize {
        self.radiance.dim().1
    }

    pub fn bands(&self) -> usize {
        self.radiance.dim().2
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn radiance(&self) -> ArrayView3<'_, f32> {
        self.radiance.view()
    }

    /// The spectrum of the pixel with line-major flat index `flat`.
    pub fn spectrum(&self, flat: usize) -> ArrayView1<'_, f32> {
        let samples = self.samples();
        self.radiance
            .slice(ndarray::s![flat / samples, flat % samples, ..])
    }
}
