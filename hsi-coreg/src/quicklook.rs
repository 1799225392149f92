use crate::percentile;
use hsi_core::{Error, Raster, Result};
use image::{GrayImage, Luma, Rgb, RgbImage};

/// Percentile of the composite radiance mapped to full brightness.
pub const QUICKLOOK_PERCENTILE: f64 = 99.0;

/// Converts the float composite of the mosaic to an 8-bit image.
///
/// Radiance is divided by its 99th percentile and clipped to 1 before scaling to 255. Black
/// pixels, and cells without data, come out white so that the empty surroundings of the swath
/// look like the bright background of an orthophoto.
pub fn radiance_quicklook(composite: &Raster) -> Result<RgbImage> {
    let data = composite.data();
    let valid = data
        .iter()
        .filter(|&&v| !composite.is_nodata(v) && v.is_finite())
        .map(|&v| f64::from(v));
    let scale = percentile(valid, QUICKLOOK_PERCENTILE)
        .filter(|&scale| scale > 0.0)
        .ok_or_else(|| Error::Matching("the mosaic has no positive radiance".into()))?;

    let grid = composite.grid();
    Ok(RgbImage::from_fn(grid.width as u32, grid.height as u32, |col, row| {
        let mut pixel = [u8::MAX; 3];
        for (channel, value) in pixel.iter_mut().enumerate() {
            let radiance = composite.get(row as usize, col as usize, channel);
            if composite.is_nodata(radiance) {
                continue;
            }
            let scaled = ((f64::from(radiance) / scale).min(1.0) * 255.0) as u8;
            *value = if scaled == 0 { u8::MAX } else { scaled };
        }
        Rgb(pixel)
    }))
}

/// Converts a 3-band reference raster holding 8-bit values to an image.
///
/// Values are clamped to `0..=255`; nodata cells become black.
pub fn reference_image(reference: &Raster) -> Result<RgbImage> {
    if reference.bands() < 3 {
        return Err(Error::GridMismatch {
            raster: "reference orthophoto",
            reason: format!("{} bands instead of 3", reference.bands()),
        });
    }
    let grid = reference.grid();
    Ok(RgbImage::from_fn(grid.width as u32, grid.height as u32, |col, row| {
        let mut pixel = [0; 3];
        for (channel, value) in pixel.iter_mut().enumerate() {
            let v = reference.get(row as usize, col as usize, channel);
            if !reference.is_nodata(v) && v.is_finite() {
                *value = v.clamp(0.0, 255.0) as u8;
            }
        }
        Rgb(pixel)
    }))
}

/// Stretches a grayscale image so its darkest pixel is 0 and its brightest is 255.
pub fn min_max_stretch(image: &GrayImage) -> GrayImage {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(min, max), &Luma([v])| {
            (min.min(v), max.max(v))
        });
    if max <= min {
        return GrayImage::new(image.width(), image.height());
    }
    let range = f32::from(max - min);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let Luma([v]) = *image.get_pixel(x, y);
        Luma([(f32::from(v - min) / range * 255.0) as u8])
    })
}
