//! Conversion between the storage frame of a run and its map projection.
//!
//! Point clouds come out of the photogrammetry export either in a local tangent-plane frame,
//! where nothing needs to happen, or as geocentric coordinates with a fixed offset subtracted.
//! [`FrameConverter`] moves points between that storage frame and the projected frame the
//! mosaic is built in, and back again for the feature points handed to calibration.
//!
//! The actual CRS math is delegated to a [`CrsTransform`](hsi_core::CrsTransform). With the
//! default `proj4rs` feature, [`Proj4Transform`] provides a pure-Rust implementation for the
//! handful of geocentric, geographic and UTM systems used for airborne surveys.

mod converter;
#[cfg(feature = "proj4rs")]
mod proj;

pub use converter::*;
#[cfg(feature = "proj4rs")]
pub use proj::*;
