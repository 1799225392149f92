//! Coregistration of an orthorectified hyperspectral mosaic with an independent reference
//! orthophoto, and the inverse mapping of the resulting correspondences into raw sensor space.
//!
//! The reference orthophoto and the DEM must already be warped onto the exact grid of the
//! mosaic. [`CoregistrationEngine`] checks that, prepares both images, hands them to a
//! [`FeatureMatcher`] and filters what comes back. [`InversePixelMapper`] then turns every
//! surviving correspondence into a [`RawPixelMapping`](hsi_core::RawPixelMapping).
//!
//! Detection and description of features are not implemented here. With the `akaze` feature,
//! [`AkazeMatcher`] provides them through the `akaze` crate with brute-force Hamming matching.

#[cfg(feature = "akaze")]
mod akaze_matcher;
mod engine;
mod enhance;
mod filters;
mod inverse;
mod matcher;
mod quicklook;
mod stats;

#[cfg(feature = "akaze")]
pub use akaze_matcher::*;
pub use engine::*;
pub use enhance::*;
pub use filters::*;
pub use inverse::*;
pub use matcher::*;
pub use quicklook::*;
pub use stats::*;

pub use image;
