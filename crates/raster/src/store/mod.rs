//! Zarr V3 persistence for rasters and monthly collections.

pub mod collection;
pub mod metadata;
pub mod zarr;

pub use collection::{CollectionEntry, ZarrCollection};
pub use metadata::RasterMetadata;
pub use zarr::{read_raster, ZarrRasterWriter};
