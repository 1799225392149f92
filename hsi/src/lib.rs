//! # `hsi`
//!
//! Batteries-included orthorectification of push-broom hyperspectral transects.
//!
//! All of the shared types live in the root of the crate. The stages are re-exported from their
//! own crates, each behind a cargo feature of the same name:
//!
//! * [`frames`] - storage frame to map projection and back
//! * [`ortho`] - footprint, grid, nearest-neighbor resampling, ENVI header metadata
//! * [`coreg`] - feature matching against a reference orthophoto and inverse pixel mapping
//!
//! [`Pipeline`] runs one transect through all of them. Everything it does not compute itself
//! (coordinate transforms, warping of the reference rasters, writing of products, image
//! enhancement, feature matching) is injected as a port, so the numerical core can be driven with
//! fakes in tests.

pub use hsi_core::*;

/// Conversion between the storage frame and the projected frame of a run
#[cfg(feature = "hsi-frames")]
pub mod frames {
    pub use hsi_frames::*;
}

/// Orthorectification onto a north-up raster grid
#[cfg(feature = "hsi-ortho")]
pub mod ortho {
    pub use hsi_ortho::*;
}

/// Coregistration and inverse mapping to raw sensor pixels
#[cfg(feature = "hsi-coreg")]
pub mod coreg {
    pub use hsi_coreg::*;
}

#[cfg(all(feature = "hsi-frames", feature = "hsi-ortho", feature = "hsi-coreg"))]
mod pipeline;

#[cfg(all(feature = "hsi-frames", feature = "hsi-ortho", feature = "hsi-coreg"))]
pub use pipeline::*;
