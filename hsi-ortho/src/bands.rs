use hsi_core::{Error, Result};

/// Index of the band whose center wavelength is closest to `target`.
///
/// On a tie the lower index wins. Returns `None` for an empty band list.
pub fn nearest_band(wavelengths: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &wavelength) in wavelengths.iter().enumerate() {
        let distance = (wavelength - target).abs();
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Datacube bands used for the red, green and blue channels of the composite.
pub fn rgb_bands(wavelengths: &[f64], targets: [f64; 3]) -> Result<[usize; 3]> {
    let mut bands = [0; 3];
    for (band, target) in bands.iter_mut().zip(targets) {
        *band = nearest_band(wavelengths, target)
            .ok_or_else(|| Error::Geometry("the datacube has no bands".into()))?;
    }
    Ok(bands)
}
