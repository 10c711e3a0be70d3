//! Zarr V3 persistence for timestamped rasters.
//!
//! Each raster is one `float32` array shaped `[bands, rows, cols]` with
//! square per-band chunks. Band names, time, CRS and transform live in the
//! array attributes (see [`RasterMetadata`]).

use std::sync::Arc;

use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::storage::{ReadableStorageTraits, WritableStorageTraits};

use super::metadata::RasterMetadata;
use crate::config::{RasterConfig, ZarrCompression};
use crate::error::{RasterError, Result};
use crate::series::TimestampedRaster;
use crate::types::{Band, RasterGrid};

/// Writer for storing timestamped rasters as Zarr arrays.
pub struct ZarrRasterWriter {
    config: RasterConfig,
}

impl ZarrRasterWriter {
    pub fn new(config: RasterConfig) -> Self {
        Self { config }
    }

    /// Write a raster and its attributes under `path` in `storage`.
    ///
    /// Returns the number of payload bytes written (uncompressed).
    pub fn write<S: ReadableStorageTraits + WritableStorageTraits + 'static>(
        &self,
        storage: S,
        path: &str,
        member: &TimestampedRaster,
        source: Option<&str>,
    ) -> Result<u64> {
        let raster = &member.raster;
        let grid = raster.grid();
        let metadata = RasterMetadata {
            band_names: raster.band_names().iter().map(|s| s.to_string()).collect(),
            time: member.time,
            crs: grid.crs,
            transform: grid.transform.terms(),
            width: grid.width,
            height: grid.height,
            preliminary: member.preliminary,
            source: source.map(str::to_string),
        };

        let chunk = self.config.zarr_chunk_size as u64;
        let chunk_grid: zarrs::array::ChunkGrid = vec![
            1,
            chunk.min(grid.height as u64).max(1),
            chunk.min(grid.width as u64).max(1),
        ]
        .try_into()
        .map_err(|e| RasterError::ConfigError(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            vec![
                raster.band_count() as u64,
                grid.height as u64,
                grid.width as u64,
            ],
            DataType::Float32,
            chunk_grid,
            FillValue::from(f32::NAN),
        );
        let mut builder = binding.attributes(metadata.to_attributes()?);

        if self.config.zarr_compression != ZarrCompression::None {
            builder = builder.bytes_to_bytes_codecs(vec![self.create_compression_codec()?]);
        }

        let array = builder
            .build(Arc::new(storage), path)
            .map_err(|e| RasterError::zarr_error(e.to_string()))?;

        array
            .store_metadata()
            .map_err(|e| RasterError::storage_error(e.to_string()))?;

        for (i, band) in raster.bands().iter().enumerate() {
            let subset = ArraySubset::new_with_start_shape(
                vec![i as u64, 0, 0],
                vec![1, grid.height as u64, grid.width as u64],
            )
            .map_err(|e| RasterError::storage_error(e.to_string()))?;

            array
                .store_array_subset_elements(&subset, &band.data)
                .map_err(|e| RasterError::storage_error(e.to_string()))?;
        }

        Ok((raster.band_count() * raster.len() * std::mem::size_of::<f32>()) as u64)
    }

    fn create_compression_codec(
        &self,
    ) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
        let level = BloscCompressionLevel::try_from(self.config.zarr_compression_level)
            .map_err(|_| RasterError::ConfigError("Invalid compression level".to_string()))?;

        let compressor = match self.config.zarr_compression {
            ZarrCompression::None => {
                return Err(RasterError::ConfigError(
                    "No compression configured".to_string(),
                ))
            }
            ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
            ZarrCompression::BloscZstd => BloscCompressor::Zstd,
        };

        // typesize is required when shuffle is enabled
        let codec = BloscCodec::new(compressor, level, None, BloscShuffleMode::Shuffle, Some(4))
            .map_err(|e| RasterError::ConfigError(e.to_string()))?;

        Ok(Arc::new(codec))
    }
}

/// Read a timestamped raster written by [`ZarrRasterWriter`].
///
/// Returns the raster and the producing source recorded in its attributes.
pub fn read_raster<S: ReadableStorageTraits + 'static>(
    storage: S,
    path: &str,
) -> Result<(TimestampedRaster, Option<String>)> {
    let array = Array::open(Arc::new(storage), path)
        .map_err(|e| RasterError::zarr_error(e.to_string()))?;

    let metadata = RasterMetadata::from_attributes(array.attributes())?;
    let grid = metadata.grid();

    let shape = array.shape();
    let expected = [
        metadata.band_names.len() as u64,
        grid.height as u64,
        grid.width as u64,
    ];
    if shape != expected.as_slice() {
        return Err(RasterError::invalid_metadata(format!(
            "array shape {:?} does not match attributes {:?}",
            shape, expected
        )));
    }

    let mut bands = Vec::with_capacity(metadata.band_names.len());
    for (i, name) in metadata.band_names.iter().enumerate() {
        let subset = ArraySubset::new_with_start_shape(
            vec![i as u64, 0, 0],
            vec![1, grid.height as u64, grid.width as u64],
        )
        .map_err(|e| RasterError::zarr_error(e.to_string()))?;

        let data: Vec<f32> = array
            .retrieve_array_subset_elements(&subset)
            .map_err(|e| RasterError::zarr_error(e.to_string()))?;
        bands.push(Band::new(name.clone(), data));
    }

    let raster = RasterGrid::new(grid, bands)?;
    let member = TimestampedRaster::new(metadata.time, raster).with_preliminary(metadata.preliminary);
    Ok((member, metadata.source))
}
