//! Regional reduction of rasters to one value per band.
//!
//! The unweighted reducer counts a cell fully when its centre lies inside
//! the footprint. The area-weighted reducer counts the share of each cell
//! covered by the footprint, estimated from `k x k` sub-cell samples, and
//! weights means by true cell area.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use fire_common::{BoundingBox, FireError, FireResult, GridDefinition};
use raster::{RasterGrid, RasterTimeSeries};
use rayon::prelude::*;
use regions::Footprint;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    #[default]
    Sum,
    Mean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// Cells whose centre falls inside count fully.
    #[default]
    Unweighted,
    /// Cells count by the fraction of their area inside.
    AreaWeighted,
}

impl FromStr for Statistic {
    type Err = FireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(Statistic::Sum),
            "mean" => Ok(Statistic::Mean),
            other => Err(FireError::InvalidParameter {
                param: "statistic".to_string(),
                message: format!("expected sum or mean, got '{}'", other),
            }),
        }
    }
}

impl FromStr for Weighting {
    type Err = FireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "unweighted" => Ok(Weighting::Unweighted),
            "area_weighted" => Ok(Weighting::AreaWeighted),
            other => Err(FireError::InvalidParameter {
                param: "weighting".to_string(),
                message: format!("expected unweighted or area_weighted, got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Statistic::Sum => "sum",
            Statistic::Mean => "mean",
        })
    }
}

/// Statistic and weighting of a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reducer {
    pub statistic: Statistic,
    pub weighting: Weighting,
}

impl Reducer {
    pub fn new(statistic: Statistic, weighting: Weighting) -> Self {
        Self {
            statistic,
            weighting,
        }
    }

    pub fn sum() -> Self {
        Self::new(Statistic::Sum, Weighting::Unweighted)
    }
}

/// Cells of a grid inside a footprint, with their coverage weight.
#[derive(Debug, Clone)]
pub struct RegionMask {
    grid: GridDefinition,
    /// (flat index, covered fraction)
    cells: Vec<(usize, f64)>,
}

impl RegionMask {
    /// Select the cells of `grid` inside `footprint`.
    ///
    /// A point footprint selects the single cell that encloses it, so the
    /// effective footprint follows the grid resolution. `samples` is the
    /// number of sub-cell samples per axis used by area weighting.
    pub fn build(
        grid: &GridDefinition,
        footprint: &Footprint,
        weighting: Weighting,
        samples: usize,
    ) -> Self {
        let cells = if footprint.is_point() {
            Self::point_cell(grid, footprint)
        } else {
            match footprint.bbox() {
                Some(bbox) => Self::polygon_cells(grid, footprint, &bbox, weighting, samples.max(1)),
                None => Vec::new(),
            }
        };

        debug!(
            region = %footprint.name,
            cells = cells.len(),
            weighting = ?weighting,
            "Built region mask"
        );
        Self { grid: *grid, cells }
    }

    fn point_cell(grid: &GridDefinition, footprint: &Footprint) -> Vec<(usize, f64)> {
        let Some(bbox) = footprint.bbox() else {
            return Vec::new();
        };
        let (x, y) = grid.crs.from_geographic(bbox.min_x, bbox.min_y);
        grid.cell_at(x, y)
            .map(|(col, row)| vec![(grid.flat_index(col, row), 1.0)])
            .unwrap_or_default()
    }

    fn polygon_cells(
        grid: &GridDefinition,
        footprint: &Footprint,
        bbox: &BoundingBox,
        weighting: Weighting,
        samples: usize,
    ) -> Vec<(usize, f64)> {
        let geometry = &footprint.geometry;
        let transform = grid.transform;

        (0..grid.height)
            .into_par_iter()
            .flat_map_iter(|row| {
                (0..grid.width).filter_map(move |col| {
                    let idx = grid.flat_index(col, row);
                    match weighting {
                        Weighting::Unweighted => {
                            let (x, y) = grid.cell_center(col, row);
                            let (lon, lat) = grid.crs.to_geographic(x, y);
                            (bbox.contains_point(lon, lat) && geometry.contains(lon, lat))
                                .then_some((idx, 1.0))
                        }
                        Weighting::AreaWeighted => {
                            let cell = grid.cell_bounds(col, row);
                            let (west, south) = grid.crs.to_geographic(cell.min_x, cell.min_y);
                            let (east, north) = grid.crs.to_geographic(cell.max_x, cell.max_y);
                            if !BoundingBox::new(west, south, east, north).intersects(bbox) {
                                return None;
                            }
                            let mut inside = 0usize;
                            for i in 0..samples {
                                for j in 0..samples {
                                    let (x, y) = transform.apply(
                                        col as f64 + (i as f64 + 0.5) / samples as f64,
                                        row as f64 + (j as f64 + 0.5) / samples as f64,
                                    );
                                    let (lon, lat) = grid.crs.to_geographic(x, y);
                                    if geometry.contains(lon, lat) {
                                        inside += 1;
                                    }
                                }
                            }
                            (inside > 0).then(|| (idx, inside as f64 / (samples * samples) as f64))
                        }
                    }
                })
            })
            .collect()
    }

    pub fn grid(&self) -> &GridDefinition {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total covered fraction, in cells.
    pub fn coverage(&self) -> f64 {
        self.cells.iter().map(|(_, w)| w).sum()
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.cells.iter().copied()
    }
}

/// Reduce every band of `raster` over `mask`.
///
/// An empty mask yields zero for every band. A band whose masked cells are
/// all NaN yields `None`.
///
/// # Errors
/// `GridMismatch` if the raster is not on the mask's grid.
pub fn reduce(raster: &RasterGrid, mask: &RegionMask, reducer: Reducer) -> FireResult<Vec<(String, Option<f64>)>> {
    if !raster.grid().matches(&mask.grid) {
        return Err(FireError::GridMismatch(format!(
            "raster grid {}x{} does not match region mask grid {}x{}",
            raster.width(),
            raster.height(),
            mask.grid.width,
            mask.grid.height
        )));
    }

    let areas = match (reducer.statistic, reducer.weighting) {
        (Statistic::Mean, Weighting::AreaWeighted) => Some(
            mask.cells
                .iter()
                .map(|(idx, _)| {
                    let (col, row) = (idx % mask.grid.width, idx / mask.grid.width);
                    mask.grid.cell_area_m2(col, row)
                })
                .collect::<Vec<_>>(),
        ),
        _ => None,
    };

    Ok(raster
        .bands()
        .iter()
        .map(|band| {
            if mask.is_empty() {
                return (band.name.clone(), Some(0.0));
            }
            let mut sum = 0.0;
            let mut weight = 0.0;
            let mut valid = 0usize;
            for (k, (idx, w)) in mask.cells.iter().enumerate() {
                let v = band.data[*idx];
                if v.is_nan() {
                    continue;
                }
                let w = w * areas.as_ref().map_or(1.0, |a| a[k]);
                sum += v as f64 * w;
                weight += w;
                valid += 1;
            }
            let value = if valid == 0 {
                None
            } else {
                match reducer.statistic {
                    Statistic::Sum => Some(sum),
                    Statistic::Mean if weight > 0.0 => Some(sum / weight),
                    Statistic::Mean => None,
                }
            };
            (band.name.clone(), value)
        })
        .collect())
}

/// One reduced time step.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionResult {
    pub time: DateTime<Utc>,
    pub preliminary: bool,
    /// (band, value) in band order
    pub values: Vec<(String, Option<f64>)>,
}

/// Reduce every member of a series, in timestamp order.
pub fn reduce_series(
    series: &RasterTimeSeries,
    mask: &RegionMask,
    reducer: Reducer,
) -> FireResult<Vec<ReductionResult>> {
    let members = series.to_ordered_list();
    members
        .par_iter()
        .map(|member| -> FireResult<ReductionResult> {
            Ok(ReductionResult {
                time: member.time,
                preliminary: member.preliminary,
                values: reduce(&member.raster, mask, reducer)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_common::{AffineTransform, CrsCode};
    use regions::{Geometry, Region, RegionResolver};

    fn grid() -> GridDefinition {
        GridDefinition::new(
            CrsCode::Epsg4326,
            AffineTransform::north_up(0.0, 4.0, 1.0, 1.0),
            4,
            4,
        )
    }

    fn footprint(ring: Vec<[f64; 2]>) -> Footprint {
        Footprint {
            region: Region::Polygon { ring: ring.clone() },
            name: "Custom".to_string(),
            geometry: Geometry::polygon(ring).unwrap(),
        }
    }

    fn ramp() -> RasterGrid {
        RasterGrid::single_band(grid(), "CO", (0..16).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_unweighted_counts_centres() {
        // covers the centres of columns 0-1, rows 2-3
        let fp = footprint(vec![[0.0, 0.0], [1.9, 0.0], [1.9, 1.9], [0.0, 1.9]]);
        let mask = RegionMask::build(&grid(), &fp, Weighting::Unweighted, 4);
        assert_eq!(mask.len(), 4);

        let values = reduce(&ramp(), &mask, Reducer::sum()).unwrap();
        assert_eq!(values, vec![("CO".to_string(), Some(8.0 + 9.0 + 12.0 + 13.0))]);

        let mean = reduce(&ramp(), &mask, Reducer::new(Statistic::Mean, Weighting::Unweighted)).unwrap();
        assert_eq!(mean[0].1, Some(10.5));
    }

    #[test]
    fn test_area_weighted_partial_cells() {
        // west 40% of cell (0, 3); two of four sample columns fall inside
        let fp = footprint(vec![[0.0, 0.0], [0.4, 0.0], [0.4, 1.0], [0.0, 1.0]]);
        let unweighted = RegionMask::build(&grid(), &fp, Weighting::Unweighted, 4);
        assert!(unweighted.is_empty());

        let weighted = RegionMask::build(&grid(), &fp, Weighting::AreaWeighted, 4);
        assert_eq!(weighted.len(), 1);
        assert!((weighted.coverage() - 0.5).abs() < 1e-9);
        let values = reduce(&ramp(), &weighted, Reducer::new(Statistic::Sum, Weighting::AreaWeighted)).unwrap();
        assert_eq!(values[0].1, Some(6.0));
    }

    #[test]
    fn test_point_uses_enclosing_cell() {
        let resolver = RegionResolver::default();
        let fp = resolver.resolve(&Region::Point { lon: 2.5, lat: 0.5 }).unwrap();
        let mask = RegionMask::build(&grid(), &fp, Weighting::Unweighted, 4);
        let values = reduce(&ramp(), &mask, Reducer::sum()).unwrap();
        assert_eq!(values[0].1, Some(14.0));
    }

    #[test]
    fn test_empty_region_is_zero() {
        let fp = footprint(vec![[10.0, 10.0], [10.0, 10.0], [10.0, 10.0]]);
        let mask = RegionMask::build(&grid(), &fp, Weighting::Unweighted, 4);
        assert!(mask.is_empty());
        let values = reduce(&ramp(), &mask, Reducer::sum()).unwrap();
        assert_eq!(values[0].1, Some(0.0));
    }

    #[test]
    fn test_all_nan_is_none() {
        let fp = footprint(vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]);
        let mask = RegionMask::build(&grid(), &fp, Weighting::Unweighted, 4);
        let nan = RasterGrid::filled(grid(), &["CO"], f32::NAN);
        assert_eq!(reduce(&nan, &mask, Reducer::sum()).unwrap()[0].1, None);
    }

    #[test]
    fn test_grid_mismatch() {
        let fp = footprint(vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]);
        let mask = RegionMask::build(&grid(), &fp, Weighting::Unweighted, 4);
        let other = GridDefinition::new(
            CrsCode::Epsg4326,
            AffineTransform::north_up(0.0, 4.0, 2.0, 2.0),
            2,
            2,
        );
        let raster = RasterGrid::filled(other, &["CO"], 1.0);
        assert!(matches!(
            reduce(&raster, &mask, Reducer::sum()),
            Err(FireError::GridMismatch(_))
        ));
    }

    #[test]
    fn test_parse_reducer_settings() {
        assert_eq!("MEAN".parse::<Statistic>().unwrap(), Statistic::Mean);
        assert_eq!("area-weighted".parse::<Weighting>().unwrap(), Weighting::AreaWeighted);
        assert!("median".parse::<Statistic>().is_err());
    }
}
