//! A directory of monthly raster arrays: `{root}/{YYYY}/{MM}.zarr`.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zarrs_filesystem::FilesystemStore;

use super::zarr::{read_raster, ZarrRasterWriter};
use crate::error::{RasterError, Result};
use crate::series::TimestampedRaster;

/// One stored month of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    pub year: i32,
    pub month: u32,
    pub path: PathBuf,
}

/// Filesystem-backed collection of monthly rasters.
#[derive(Debug, Clone)]
pub struct ZarrCollection {
    root: PathBuf,
}

impl ZarrCollection {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the array holding a given month.
    pub fn member_path(&self, year: i32, month: u32) -> PathBuf {
        self.root
            .join(format!("{:04}", year))
            .join(format!("{:02}.zarr", month))
    }

    /// Store a month, replacing any existing array at its path.
    pub fn write(
        &self,
        writer: &ZarrRasterWriter,
        member: &TimestampedRaster,
        source: Option<&str>,
    ) -> Result<PathBuf> {
        let path = self.member_path(member.year(), member.month());
        std::fs::create_dir_all(&path)?;
        let store = FilesystemStore::new(&path)
            .map_err(|e| RasterError::storage_error(e.to_string()))?;
        let bytes = writer.write(store, "/", member, source)?;
        debug!(path = %path.display(), bytes, "Wrote raster");
        Ok(path)
    }

    /// Stored months in ascending order.
    ///
    /// A missing root yields an empty list. Entries whose names do not
    /// follow the layout are skipped with a warning.
    pub fn entries(&self) -> Result<Vec<CollectionEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| RasterError::storage_error(e.to_string()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            match parse_member_path(path) {
                Some((year, month)) => entries.push(CollectionEntry {
                    year,
                    month,
                    path: path.to_path_buf(),
                }),
                None => warn!(path = %path.display(), "Skipping unrecognised collection entry"),
            }
        }
        entries.sort_by_key(|e| (e.year, e.month));
        Ok(entries)
    }

    /// Read every stored month whose year lies in `[start, end]`.
    pub fn read_years(&self, start: i32, end: i32) -> Result<Vec<TimestampedRaster>> {
        self.entries()?
            .into_iter()
            .filter(|e| e.year >= start && e.year <= end)
            .map(|e| {
                let store = FilesystemStore::new(&e.path)
                    .map_err(|err| RasterError::storage_error(err.to_string()))?;
                let (member, _) = read_raster(store, "/")?;
                Ok(member)
            })
            .collect()
    }
}

fn parse_member_path(path: &Path) -> Option<(i32, u32)> {
    let month = path
        .file_name()?
        .to_str()?
        .strip_suffix(".zarr")?
        .parse::<u32>()
        .ok()
        .filter(|m| (1..=12).contains(m))?;
    let year = path.parent()?.file_name()?.to_str()?.parse::<i32>().ok()?;
    Some((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_path_layout() {
        let collection = ZarrCollection::new("/data/GFEDv4s");
        assert_eq!(
            collection.member_path(2010, 3),
            PathBuf::from("/data/GFEDv4s/2010/03.zarr")
        );
    }

    #[test]
    fn test_parse_member_path() {
        assert_eq!(
            parse_member_path(Path::new("/data/GFEDv4s/2010/03.zarr")),
            Some((2010, 3))
        );
        assert_eq!(parse_member_path(Path::new("/data/x/2010/13.zarr")), None);
        assert_eq!(parse_member_path(Path::new("/data/x/latest/03.zarr")), None);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let collection = ZarrCollection::new("/nonexistent/firecam/collection");
        assert!(collection.entries().unwrap().is_empty());
    }
}
