use crate::{
    min_max_stretch, passes_ratio_test, radiance_quicklook, reference_image, within_displacement,
    DisplacementStats, FeatureMatcher, ImageEnhancer,
};
use hsi_core::{Error, FeatureCorrespondence, Raster, Result, RunConfig};
use log::*;

/// The filtered correspondences of one transect.
#[derive(Debug, Clone, PartialEq)]
pub struct Coregistration {
    pub correspondences: Vec<FeatureCorrespondence>,
    pub stats: DisplacementStats,
}

/// Aligns the mosaic composite with a reference orthophoto.
///
/// ```text
/// composite ──quicklook──┐
///                        ├─ enhance ─ stretch ─ match (k = 2) ─ ratio test ─ displacement < max
/// reference ──8 bit──────┘
/// ```
#[derive(Debug, Clone)]
pub struct CoregistrationEngine<'a, E, M> {
    config: &'a RunConfig,
    enhancer: E,
    matcher: M,
}

impl<'a, E, M> CoregistrationEngine<'a, E, M>
where
    E: ImageEnhancer,
    M: FeatureMatcher,
{
    pub fn new(config: &'a RunConfig, enhancer: E, matcher: M) -> Self {
        Self {
            config,
            enhancer,
            matcher,
        }
    }

    /// Matches `composite` against `reference` and filters the result.
    ///
    /// `reference` and `dem` must already be warped onto the grid of `composite`; a
    /// [`Error::GridMismatch`] is returned otherwise. An empty final set is a
    /// [`Error::Matching`].
    pub fn coregister(
        &self,
        composite: &Raster,
        reference: &Raster,
        dem: &Raster,
    ) -> Result<Coregistration> {
        let grid = composite.grid();
        grid.ensure_same_grid(reference.grid(), "reference orthophoto")?;
        grid.ensure_same_grid(dem.grid(), "DEM")?;

        let mosaic = min_max_stretch(&self.enhancer.enhance(&radiance_quicklook(composite)?));
        let reference = min_max_stretch(&self.enhancer.enhance(&reference_image(reference)?));

        let candidates = self.matcher.match_features(&mosaic, &reference)?;
        let survivors: Vec<FeatureCorrespondence> = candidates
            .iter()
            .filter(|m| passes_ratio_test(m.best, m.second, self.config.ratio_threshold))
            .map(|m| FeatureCorrespondence::new(m.mosaic, m.reference))
            .collect();
        let correspondences: Vec<FeatureCorrespondence> = survivors
            .iter()
            .copied()
            .filter(|c| within_displacement(c, self.config.max_displacement))
            .collect();

        let stats = DisplacementStats::compute(candidates.len(), &survivors, &correspondences);
        info!(
            "{} matches, {} pass the ratio test, {} displaced by less than {} px",
            stats.candidates, stats.ratio_survivors, stats.retained, self.config.max_displacement
        );
        if let (Some([mu, mv]), Some([su, sv])) = (stats.median_delta, stats.mad_delta) {
            debug!(
                "median shift ({:.3}, {:.3}) px, MAD ({:.3}, {:.3}) px",
                mu, mv, su, sv
            );
        }

        if correspondences.is_empty() {
            return Err(Error::Matching(format!(
                "none of {} matches passed the ratio test and the {} px displacement limit",
                stats.candidates, self.config.max_displacement
            )));
        }
        Ok(Coregistration {
            correspondences,
            stats,
        })
    }
}
