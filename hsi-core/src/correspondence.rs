use nalgebra::{Point2, Point3, Vector2};

/// A feature seen in both the mosaic and the reference image.
///
/// Pixel coordinates follow keypoint conventions: `x` is the column, `y` is the row, and the
/// origin is the center of the upper-left pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureCorrespondence {
    pub mosaic: Point2<f64>,
    pub reference: Point2<f64>,
    /// Length of `reference - mosaic` in pixels.
    pub displacement: f64,
}

impl FeatureCorrespondence {
    pub fn new(mosaic: Point2<f64>, reference: Point2<f64>) -> Self {
        Self {
            mosaic,
            reference,
            displacement: (reference - mosaic).norm(),
        }
    }

    /// `(Δu, Δv)` from the mosaic to the reference.
    pub fn delta(&self) -> Vector2<f64> {
        self.reference - self.mosaic
    }
}

/// A pixel of the raw datacube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawPixel {
    pub line: usize,
    pub sample: usize,
}

impl RawPixel {
    /// Decodes a line-major flat index of a cube that is `samples` wide.
    ///
    /// ```
    /// use hsi_core::RawPixel;
    /// assert_eq!(RawPixel::from_flat(250, 100), RawPixel { line: 2, sample: 50 });
    /// ```
    pub fn from_flat(flat: usize, samples: usize) -> Self {
        let sample = flat % samples;
        Self {
            line: (flat - sample) / samples,
            sample,
        }
    }

    pub fn flat(&self, samples: usize) -> usize {
        self.line * samples + self.sample
    }
}

/// A correspondence traced back into sensor space, ready for boresight calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPixelMapping {
    pub correspondence: FeatureCorrespondence,
    /// Raw pixels under the `(floor, floor)`, `(floor, ceil)`, `(ceil, floor)` and `(ceil, ceil)`
    /// neighbors of the mosaic position, as `(row, col)` pairs in that order.
    pub candidates: [RawPixel; 4],
    /// Fractional column and row of the mosaic position, the bilinear weights of the candidates.
    pub weights: Vector2<f64>,
    /// The reference position of the feature in the storage frame.
    pub world: Point3<f64>,
}
