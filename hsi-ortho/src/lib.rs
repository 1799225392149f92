//! Orthorectification of a push-broom transect.
//!
//! The point cloud of a transect is irregular: one 3d position per sensor pixel, spaced however
//! the platform happened to move. This crate puts it on a regular north-up grid:
//!
//! 1. [`Footprint::from_cloud`] walks the four swath edges into a polygon.
//! 2. [`OrthoResampler`] lays a [`RasterGrid`](hsi_core::RasterGrid) over the footprint bounds,
//!    finds the nearest sensor pixel for every cell through a [`SpatialIndex`], gathers the
//!    radiance of those pixels, and blanks every cell outside the footprint.
//!
//! The resulting [`OrthoMosaic`] keeps the [`IndexMap`](hsi_core::IndexMap) used for the gather,
//! which is what later lets matched mosaic pixels be traced back into the raw datacube.

mod bands;
mod envi;
mod footprint;
mod index;
mod index_map;
mod mask;
mod resampler;

pub use bands::*;
pub use envi::*;
pub use footprint::*;
pub use index::*;
pub use index_map::*;
pub use mask::*;
pub use resampler::*;

pub use geo;
