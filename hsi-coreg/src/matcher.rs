use hsi_core::nalgebra::Point2;
use hsi_core::Result;
use image::GrayImage;

/// A mosaic feature with its two nearest reference features in descriptor space.
///
/// Positions are pixel coordinates, `x` being the column and `y` the row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnnMatch {
    pub mosaic: Point2<f64>,
    /// Position of the nearest reference feature.
    pub reference: Point2<f64>,
    /// Descriptor distance of the nearest reference feature.
    pub best: f64,
    /// Descriptor distance of the second nearest reference feature.
    pub second: f64,
}

/// Detects features in both images and matches every mosaic feature to its two nearest reference
/// features (`k = 2`).
///
/// Mosaic features without two reference neighbors are left out.
pub trait FeatureMatcher {
    fn match_features(&self, mosaic: &GrayImage, reference: &GrayImage) -> Result<Vec<KnnMatch>>;
}

impl<T> FeatureMatcher for &T
where
    T: FeatureMatcher + ?Sized,
{
    fn match_features(&self, mosaic: &GrayImage, reference: &GrayImage) -> Result<Vec<KnnMatch>> {
        (**self).match_features(mosaic, reference)
    }
}
