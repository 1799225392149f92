//! # HSI Core
//!
//! Common types shared by every crate that turns a push-broom hyperspectral transect into an
//! orthorectified mosaic and a set of boresight calibration observations.
//!
//! The pipeline is a chain of pure stages, each consuming immutable values and producing new ones:
//!
//! ```text
//! PointCloud (storage frame)
//!     -> PointCloud (projected)
//!     -> Footprint
//!     -> RasterGrid + IndexMap
//!     -> Raster (3-band composite, full cube)
//!     -> FeatureCorrespondence
//!     -> RawPixelMapping
//! ```
//!
//! Everything that needs real geodesy, file formats or computer vision sits behind a narrow trait
//! (see [`CrsTransform`] and [`HeightSampler`], plus the ports in `hsi-ortho` and `hsi-coreg`), so
//! the numerical core can be exercised with fakes.
//!
//! ## Storage frame
//!
//! Geocentric coordinates near the surface of the Earth are on the order of `1e6` meters, which
//! eats most of the mantissa of an `f64` before any centimeter detail is represented. Point
//! clouds in global mode are therefore stored with a fixed per-run offset subtracted. The
//! [`CrsMode`] of a run carries that offset, and every stage that enters or leaves the storage
//! frame goes through it.

mod cloud;
mod config;
mod correspondence;
mod crs;
mod datacube;
mod error;
mod geo;
mod index_map;
mod raster;

pub use cloud::*;
pub use config::*;
pub use correspondence::*;
pub use crs::*;
pub use datacube::*;
pub use error::*;
pub use geo::*;
pub use index_map::*;
pub use nalgebra;
pub use ndarray;
pub use raster::*;
