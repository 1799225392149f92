use crate::{FeatureMatcher, KnnMatch};
use akaze::Akaze;
use bitarray::{BitArray, Hamming};
use hsi_core::nalgebra::Point2;
use hsi_core::{Error, Result};
use image::{DynamicImage, GrayImage};
use log::*;
use rayon::prelude::*;
use space::{Knn, LinearKnn};

/// AKAZE keypoints with brute-force Hamming matching of their binary descriptors.
#[derive(Debug, Clone)]
pub struct AkazeMatcher {
    akaze: Akaze,
}

impl AkazeMatcher {
    pub fn new(akaze: Akaze) -> Self {
        Self { akaze }
    }

    /// A detector tuned for few, strong features.
    pub fn sparse() -> Self {
        Self::new(Akaze::sparse())
    }

    /// A detector tuned for many features.
    pub fn dense() -> Self {
        Self::new(Akaze::dense())
    }

    fn extract(&self, image: &GrayImage) -> (Vec<akaze::KeyPoint>, Vec<BitArray<64>>) {
        self.akaze
            .extract(&DynamicImage::ImageLuma8(image.clone()))
    }
}

impl Default for AkazeMatcher {
    fn default() -> Self {
        Self::new(Akaze::default())
    }
}

fn point(keypoint: &akaze::KeyPoint) -> Point2<f64> {
    Point2::new(f64::from(keypoint.point.0), f64::from(keypoint.point.1))
}

impl FeatureMatcher for AkazeMatcher {
    fn match_features(&self, mosaic: &GrayImage, reference: &GrayImage) -> Result<Vec<KnnMatch>> {
        let (mosaic_keypoints, mosaic_descriptors) = self.extract(mosaic);
        let (reference_keypoints, reference_descriptors) = self.extract(reference);
        debug!(
            "extracted {} mosaic and {} reference features",
            mosaic_descriptors.len(),
            reference_descriptors.len()
        );
        if reference_descriptors.len() < 2 {
            return Err(Error::Matching(format!(
                "{} reference features cannot be matched two-nearest",
                reference_descriptors.len()
            )));
        }

        let knn = LinearKnn {
            metric: Hamming,
            iter: reference_descriptors.iter(),
        };
        let matches = mosaic_descriptors
            .par_iter()
            .zip(mosaic_keypoints.par_iter())
            .filter_map(|(descriptor, keypoint)| {
                let neighbors = knn.knn(descriptor, 2);
                let (best, second) = (neighbors.first()?, neighbors.get(1)?);
                Some(KnnMatch {
                    mosaic: point(keypoint),
                    reference: point(&reference_keypoints[best.index]),
                    best: f64::from(best.distance),
                    second: f64::from(second.distance),
                })
            })
            .collect();
        Ok(matches)
    }
}
