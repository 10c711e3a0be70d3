//! Raster engine for gridded fire-emission data.
//!
//! This crate provides the in-memory raster model shared by every
//! inventory:
//!
//! - **RasterGrid**: multi-band field on a [`GridDefinition`] (CRS, affine
//!   transform, shape) with element-wise band arithmetic
//! - **RasterTimeSeries**: timestamp-ordered members with non-mutating
//!   year/month filters and NaN-aware summation
//! - **Reprojection**: nearest, bilinear and mass-conserving resampling
//!   onto analysis grids
//! - **Storage**: Zarr V3 arrays per month, grouped in directory collections
//!
//! # Data flow
//!
//! ```text
//! ZarrCollection::read_years
//!      │
//!      ▼
//! TimestampedRaster (native bands, native grid)
//!      │
//!      ├─► select_band / divide_scalar / rename_band
//!      │
//!      └─► reproject(analysis grid)
//!               │
//!               ▼
//!          RasterTimeSeries ──► filter_years ──► sum
//! ```
//!
//! [`GridDefinition`]: fire_common::GridDefinition

pub mod config;
pub mod downsample;
pub mod error;
pub mod ops;
pub mod projection;
pub mod series;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{RasterConfig, ResampleMethod, ZarrCompression};
pub use downsample::{downsample_by, DownsampleMethod};
pub use error::{RasterError, Result};
pub use projection::reproject;
pub use series::{RasterTimeSeries, TimestampedRaster};
pub use store::{read_raster, RasterMetadata, ZarrCollection, ZarrRasterWriter};
pub use types::{Band, RasterGrid};
