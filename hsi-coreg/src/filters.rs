use hsi_core::FeatureCorrespondence;

/// Lowe's ratio test: the best match must be clearly better than the runner-up.
pub fn passes_ratio_test(best: f64, second: f64, ratio: f64) -> bool {
    best < ratio * second
}

/// Keeps correspondences displaced by strictly less than `max_displacement` pixels.
pub fn within_displacement(correspondence: &FeatureCorrespondence, max_displacement: f64) -> bool {
    correspondence.displacement < max_displacement
}
