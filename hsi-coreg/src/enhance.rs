use image::{imageops, GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::equalize_histogram;
use rayon::prelude::*;

/// Radiometric normalization applied to both images before matching.
pub trait ImageEnhancer {
    fn enhance(&self, image: &RgbImage) -> GrayImage;
}

impl<T> ImageEnhancer for &T
where
    T: ImageEnhancer + ?Sized,
{
    fn enhance(&self, image: &RgbImage) -> GrayImage {
        (**self).enhance(image)
    }
}

/// Contrast-limited adaptive histogram equalization of each channel, followed by conversion to
/// luma.
///
/// The image is split into a grid of tiles. Each tile gets its own equalization curve from a
/// histogram clipped at `clip_limit` times the mean bin height, with the clipped excess spread
/// over all bins. Every pixel blends the curves of the four nearest tile centers bilinearly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastLimitedLuma {
    /// Histogram bins are clipped at this multiple of the mean bin height. Zero disables clipping.
    pub clip_limit: f64,
    /// Number of tiles along x and y.
    pub tiles: (u32, u32),
}

impl ContrastLimitedLuma {
    pub fn new(clip_limit: f64, tiles: (u32, u32)) -> Self {
        Self { clip_limit, tiles }
    }

    fn equalize(&self, channel: &GrayImage) -> GrayImage {
        let (width, height) = channel.dimensions();
        if width == 0 || height == 0 {
            return channel.clone();
        }
        let tile_w = div_ceil(width, self.tiles.0.clamp(1, width));
        let tile_h = div_ceil(height, self.tiles.1.clamp(1, height));
        let (tiles_x, tiles_y) = (div_ceil(width, tile_w), div_ceil(height, tile_h));

        let luts: Vec<[u8; 256]> = (0..tiles_x * tiles_y)
            .into_par_iter()
            .map(|tile| {
                let (x0, y0) = ((tile % tiles_x) * tile_w, (tile / tiles_x) * tile_h);
                let (x1, y1) = ((x0 + tile_w).min(width), (y0 + tile_h).min(height));
                let mut histogram = [0u32; 256];
                for y in y0..y1 {
                    for x in x0..x1 {
                        histogram[channel.get_pixel(x, y)[0] as usize] += 1;
                    }
                }
                clipped_lut(histogram, (x1 - x0) * (y1 - y0), self.clip_limit)
            })
            .collect();

        let mut output = GrayImage::new(width, height);
        output
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                let (ty1, ty2, wy) = blend(y as f64 / tile_h as f64 - 0.5, tiles_y);
                for (x, pixel) in row.iter_mut().enumerate() {
                    let (tx1, tx2, wx) = blend(x as f64 / tile_w as f64 - 0.5, tiles_x);
                    let value = channel.get_pixel(x as u32, y as u32)[0] as usize;
                    let lut =
                        |tx: usize, ty: usize| luts[ty * tiles_x as usize + tx][value] as f64;
                    let top = lut(tx1, ty1) * (1.0 - wx) + lut(tx2, ty1) * wx;
                    let bottom = lut(tx1, ty2) * (1.0 - wx) + lut(tx2, ty2) * wx;
                    *pixel = (top * (1.0 - wy) + bottom * wy).round() as u8;
                }
            });
        output
    }
}

impl Default for ContrastLimitedLuma {
    fn default() -> Self {
        Self::new(2.0, (8, 8))
    }
}

impl ImageEnhancer for ContrastLimitedLuma {
    fn enhance(&self, image: &RgbImage) -> GrayImage {
        per_channel_luma(image, |channel| self.equalize(channel))
    }
}

/// Global histogram equalization of each channel followed by conversion to luma.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualizedLuma;

impl ImageEnhancer for EqualizedLuma {
    fn enhance(&self, image: &RgbImage) -> GrayImage {
        per_channel_luma(image, equalize_histogram)
    }
}

fn per_channel_luma(image: &RgbImage, equalize: impl Fn(&GrayImage) -> GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let channel =
        |c: usize| GrayImage::from_fn(width, height, |x, y| Luma([image.get_pixel(x, y)[c]]));
    let equalized: Vec<GrayImage> = (0..3).map(|c| equalize(&channel(c))).collect();
    let merged = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            equalized[0].get_pixel(x, y)[0],
            equalized[1].get_pixel(x, y)[0],
            equalized[2].get_pixel(x, y)[0],
        ])
    });
    imageops::grayscale(&merged)
}

/// Equalization curve of one tile.
fn clipped_lut(mut histogram: [u32; 256], area: u32, clip_limit: f64) -> [u8; 256] {
    if clip_limit > 0.0 {
        let clip = ((clip_limit * area as f64 / 256.0) as u32).max(1);
        let mut excess = 0;
        for bin in histogram.iter_mut() {
            if *bin > clip {
                excess += *bin - clip;
                *bin = clip;
            }
        }
        let (batch, residual) = (excess / 256, excess % 256);
        for bin in histogram.iter_mut() {
            *bin += batch;
        }
        if residual > 0 {
            let step = (256 / residual).max(1) as usize;
            for bin in histogram.iter_mut().step_by(step).take(residual as usize) {
                *bin += 1;
            }
        }
    }

    let scale = 255.0 / area as f64;
    let mut lut = [0u8; 256];
    let mut sum = 0;
    for (value, &count) in lut.iter_mut().zip(histogram.iter()) {
        sum += count;
        *value = (sum as f64 * scale).round().min(255.0) as u8;
    }
    lut
}

/// The two tiles whose centers bracket `position` (in tile units, relative to the first center)
/// and the weight of the second one.
fn blend(position: f64, tiles: u32) -> (usize, usize, f64) {
    let last = tiles as usize - 1;
    let lower = position.floor();
    let first = (lower.max(0.0) as usize).min(last);
    let second = ((lower + 1.0).max(0.0) as usize).min(last);
    (first, second, position - lower)
}

fn div_ceil(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}
