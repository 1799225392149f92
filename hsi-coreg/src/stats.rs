use hsi_core::FeatureCorrespondence;

/// Linearly interpolated percentile (`0..=100`) of `values`, ignoring NaN.
///
/// Matches the default definition of most array libraries: the value at rank
/// `p / 100 * (n - 1)` of the sorted values, interpolated between its neighbors.
pub fn percentile(values: impl IntoIterator<Item = f64>, p: f64) -> Option<f64> {
    let mut values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (values.len() - 1) as f64;
    let (lower, upper) = (rank.floor() as usize, rank.ceil() as usize);
    let fraction = rank - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * fraction)
}

pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    percentile(values, 50.0)
}

/// Median absolute deviation around `center`.
pub fn median_absolute_deviation(values: &[f64], center: f64) -> Option<f64> {
    median(values.iter().map(|v| (v - center).abs()))
}

/// Diagnostics of one coregistration. None of these gate the filtering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplacementStats {
    /// Two-nearest matches reported by the matcher.
    pub candidates: usize,
    /// Matches that passed the ratio test.
    pub ratio_survivors: usize,
    /// Matches that also passed the displacement threshold.
    pub retained: usize,
    /// Median of `Δu` and `Δv` over ratio survivors with `|Δu| < 10`.
    pub median_delta: Option<[f64; 2]>,
    /// Median absolute deviation of `Δu` and `Δv` over the same subset.
    pub mad_delta: Option<[f64; 2]>,
    /// Median displacement of the retained matches.
    pub median_displacement: Option<f64>,
}

/// Bound on `|Δu|` of the subset the median and MAD are computed on.
pub const DIAGNOSTIC_DELTA_U_LIMIT: f64 = 10.0;

impl DisplacementStats {
    pub fn compute(
        candidates: usize,
        ratio_survivors: &[FeatureCorrespondence],
        retained: &[FeatureCorrespondence],
    ) -> Self {
        let (du, dv): (Vec<f64>, Vec<f64>) = ratio_survivors
            .iter()
            .map(FeatureCorrespondence::delta)
            .filter(|delta| delta.x.abs() < DIAGNOSTIC_DELTA_U_LIMIT)
            .map(|delta| (delta.x, delta.y))
            .unzip();
        let median_delta = median(du.iter().copied()).zip(median(dv.iter().copied()));
        let mad_delta = median_delta.and_then(|(mu, mv)| {
            median_absolute_deviation(&du, mu).zip(median_absolute_deviation(&dv, mv))
        });
        Self {
            candidates,
            ratio_survivors: ratio_survivors.len(),
            retained: retained.len(),
            median_delta: median_delta.map(|(u, v)| [u, v]),
            mad_delta: mad_delta.map(|(u, v)| [u, v]),
            median_displacement: median(retained.iter().map(|c| c.displacement)),
        }
    }
}
