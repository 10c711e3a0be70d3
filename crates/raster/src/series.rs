//! Timestamped rasters and ordered raster time series.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use fire_common::GridDefinition;

use crate::error::{RasterError, Result};
use crate::types::RasterGrid;

/// A raster valid at a single point in time (month or day start).
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampedRaster {
    pub time: DateTime<Utc>,
    pub raster: RasterGrid,
    /// Data lies beyond the source's confirmed-final coverage.
    pub preliminary: bool,
}

impl TimestampedRaster {
    pub fn new(time: DateTime<Utc>, raster: RasterGrid) -> Self {
        Self {
            time,
            raster,
            preliminary: false,
        }
    }

    pub fn with_preliminary(mut self, preliminary: bool) -> Self {
        self.preliminary = preliminary;
        self
    }

    pub fn year(&self) -> i32 {
        self.time.year()
    }

    pub fn month(&self) -> u32 {
        self.time.month()
    }
}

/// Ordered sequence of timestamped rasters sharing one grid and band set.
///
/// Members are kept in ascending timestamp order (stable for equal
/// timestamps). Filtering returns a new series that shares members with
/// the source; the source is never modified.
#[derive(Debug, Clone)]
pub struct RasterTimeSeries {
    grid: GridDefinition,
    band_names: Vec<String>,
    members: Vec<Arc<TimestampedRaster>>,
}

impl RasterTimeSeries {
    /// Empty series with a fixed schema.
    pub fn new<S: AsRef<str>>(grid: GridDefinition, band_names: &[S]) -> Self {
        Self {
            grid,
            band_names: band_names.iter().map(|s| s.as_ref().to_string()).collect(),
            members: Vec::new(),
        }
    }

    /// Series from unordered members; every member must match the schema.
    pub fn from_members<S: AsRef<str>>(
        grid: GridDefinition,
        band_names: &[S],
        members: Vec<TimestampedRaster>,
    ) -> Result<Self> {
        let mut series = Self::new(grid, band_names);
        for member in members {
            series.push(member)?;
        }
        Ok(series)
    }

    /// Insert a member at its timestamp position.
    pub fn push(&mut self, member: TimestampedRaster) -> Result<()> {
        self.check_member(&member.raster)?;
        let pos = self.members.partition_point(|m| m.time <= member.time);
        self.members.insert(pos, Arc::new(member));
        Ok(())
    }

    fn check_member(&self, raster: &RasterGrid) -> Result<()> {
        if !self.grid.matches(raster.grid()) {
            return Err(RasterError::grid_mismatch(format!(
                "member grid {}x{} does not match series grid {}x{}",
                raster.width(),
                raster.height(),
                self.grid.width,
                self.grid.height
            )));
        }
        if raster.band_names() != self.band_names {
            return Err(RasterError::grid_mismatch(format!(
                "member bands {:?} do not match series bands {:?}",
                raster.band_names(),
                self.band_names
            )));
        }
        Ok(())
    }

    pub fn grid(&self) -> &GridDefinition {
        &self.grid
    }

    pub fn band_names(&self) -> &[String] {
        &self.band_names
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member at a position in timestamp order.
    pub fn get(&self, index: usize) -> Option<&TimestampedRaster> {
        self.members.get(index).map(Arc::as_ref)
    }

    pub fn first(&self) -> Option<&TimestampedRaster> {
        self.get(0)
    }

    /// Members in timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = &TimestampedRaster> + Clone {
        self.members.iter().map(Arc::as_ref)
    }

    /// Lazy view over members whose calendar year falls in `[start, end]`.
    pub fn iter_years(
        &self,
        start: i32,
        end: i32,
    ) -> impl Iterator<Item = &TimestampedRaster> + Clone {
        self.iter().filter(move |m| m.year() >= start && m.year() <= end)
    }

    /// Deterministic timestamp-ascending list of members.
    pub fn to_ordered_list(&self) -> Vec<&TimestampedRaster> {
        self.iter().collect()
    }

    fn filtered<F>(&self, keep: F) -> Self
    where
        F: Fn(&TimestampedRaster) -> bool,
    {
        Self {
            grid: self.grid,
            band_names: self.band_names.clone(),
            members: self
                .members
                .iter()
                .filter(|m| keep(m))
                .cloned()
                .collect(),
        }
    }

    /// Members whose calendar year falls in `[start, end]`.
    pub fn filter_years(&self, start: i32, end: i32) -> Self {
        self.filtered(|m| m.year() >= start && m.year() <= end)
    }

    /// Members in one calendar month (1-12) of any year.
    pub fn filter_month(&self, month: u32) -> Self {
        self.filtered(|m| m.month() == month)
    }

    /// True if any member is preliminary.
    pub fn any_preliminary(&self) -> bool {
        self.members.iter().any(|m| m.preliminary)
    }

    /// Element-wise sum across members, ignoring NaN cells.
    ///
    /// An empty series sums to a zero raster flagged as no data. A cell
    /// that is NaN in every member stays NaN.
    pub fn sum(&self) -> Result<RasterGrid> {
        let Some(first) = self.members.first() else {
            return Ok(RasterGrid::no_data(self.grid, &self.band_names));
        };

        let mut acc = first.raster.clone();
        for member in &self.members[1..] {
            acc.check_compatible(&member.raster)?;
            acc = acc.zip_with(&member.raster, |a, b| match (a.is_nan(), b.is_nan()) {
                (true, true) => f32::NAN,
                (true, false) => b,
                (false, true) => a,
                (false, false) => a + b,
            })?;
        }
        let no_data = self.members.iter().all(|m| m.raster.is_no_data());
        Ok(acc.with_no_data(no_data))
    }

    /// Transform every member, producing a series with a new schema.
    pub fn try_map<F, S>(&self, grid: GridDefinition, band_names: &[S], f: F) -> Result<Self>
    where
        F: Fn(&TimestampedRaster) -> Result<TimestampedRaster>,
        S: AsRef<str>,
    {
        let mut out = Self::new(grid, band_names);
        for member in self.iter() {
            out.push(f(member)?)?;
        }
        Ok(out)
    }
}
