//! Resampling rasters onto another grid definition.
//!
//! Point methods (nearest, bilinear) pull a value for every target cell
//! centre. Area methods push every source cell into the target cells it
//! overlaps:
//!
//! - aligned integer coarsening uses exact block aggregation
//! - axis-aligned grids in the same CRS use exact interval overlaps
//! - anything else (rotation, CRS change) distributes `k x k` sub-cell
//!   samples of each source cell
//!
//! `AreaWeighted` conserves the total of sum-type fields that fall inside
//! the target extent. `Mean` averages intensive fields.

use rayon::prelude::*;

use fire_common::GridDefinition;
use tracing::debug;

use super::interpolation::{bilinear_interpolate, nearest_interpolate};
use crate::config::ResampleMethod;
use crate::downsample::{downsample_by, DownsampleMethod};
use crate::error::{RasterError, Result};
use crate::types::{Band, RasterGrid};

/// Resample `raster` onto `target`.
///
/// # Arguments
/// * `raster` - Source raster
/// * `target` - Grid definition to resample onto (CRS, transform, shape)
/// * `method` - Resampling method
/// * `supersample` - Sub-cell samples per axis for the general area path
///
/// # Errors
/// `DegenerateTransform` if either transform has zero cell size. This is
/// a configuration error and is never retried.
pub fn reproject(
    raster: &RasterGrid,
    target: &GridDefinition,
    method: ResampleMethod,
    supersample: usize,
) -> Result<RasterGrid> {
    let source = raster.grid();
    if source.transform.is_degenerate() {
        return Err(RasterError::DegenerateTransform(format!(
            "source transform {:?} has zero cell size",
            source.transform.terms()
        )));
    }
    if target.transform.is_degenerate() {
        return Err(RasterError::DegenerateTransform(format!(
            "target transform {:?} has zero cell size",
            target.transform.terms()
        )));
    }
    if target.is_empty() {
        return Err(RasterError::grid_mismatch("target grid has no cells"));
    }
    if source.matches(target) {
        return Ok(raster.clone());
    }

    let bands: Vec<Band> = match method {
        ResampleMethod::Nearest => sample_points(raster, target, nearest_interpolate),
        ResampleMethod::Bilinear => sample_points(raster, target, bilinear_interpolate),
        ResampleMethod::AreaWeighted | ResampleMethod::Mean => {
            let conserve = method == ResampleMethod::AreaWeighted;
            if let Some(factor) = target.coarsening_factor_of(source) {
                debug!(factor, "Resampling by block aggregation");
                let block = if conserve {
                    DownsampleMethod::Sum
                } else {
                    DownsampleMethod::Mean
                };
                raster
                    .bands()
                    .par_iter()
                    .map(|band| {
                        let (data, _, _) =
                            downsample_by(&band.data, source.width, source.height, factor, block);
                        Band::new(band.name.clone(), data)
                    })
                    .collect()
            } else if source.crs == target.crs
                && source.transform.is_axis_aligned()
                && target.transform.is_axis_aligned()
            {
                debug!("Resampling by interval overlap");
                overlap_resample(raster, target, conserve)
            } else {
                debug!(supersample, "Resampling by sub-cell distribution");
                supersample_resample(raster, target, conserve, supersample.max(1))
            }
        }
    };

    RasterGrid::new(*target, bands).map(|r| r.with_no_data(raster.is_no_data()))
}

/// Pull one value per target cell centre through `sampler`.
fn sample_points<F>(raster: &RasterGrid, target: &GridDefinition, sampler: F) -> Vec<Band>
where
    F: Fn(&[f32], usize, usize, f64, f64) -> f32 + Sync,
{
    let source = raster.grid();

    // source pixel position of every target cell centre
    let positions: Vec<Option<(f64, f64)>> = (0..target.len())
        .into_par_iter()
        .map(|idx| {
            let (col, row) = (idx % target.width, idx / target.width);
            let (x, y) = target.cell_center(col, row);
            let (sx, sy) = target.crs.transform_point(source.crs, x, y);
            source.transform.invert(sx, sy)
        })
        .collect();

    raster
        .bands()
        .par_iter()
        .map(|band| {
            let data = positions
                .iter()
                .map(|pos| match pos {
                    Some((px, py)) => {
                        sampler(&band.data, source.width, source.height, *px, *py)
                    }
                    None => f32::NAN,
                })
                .collect();
            Band::new(band.name.clone(), data)
        })
        .collect()
}

/// Fractions of each source interval falling into each target interval.
///
/// Interval `i` of an axis spans `origin + scale * i` to
/// `origin + scale * (i + 1)`; scales may be negative.
fn axis_overlaps(
    src_origin: f64,
    src_scale: f64,
    src_len: usize,
    dst_origin: f64,
    dst_scale: f64,
    dst_len: usize,
) -> Vec<Vec<(usize, f64)>> {
    (0..src_len)
        .map(|i| {
            let a = src_origin + src_scale * i as f64;
            let b = a + src_scale;
            let (lo, hi) = (a.min(b), a.max(b));
            let width = hi - lo;

            let ja = (lo - dst_origin) / dst_scale;
            let jb = (hi - dst_origin) / dst_scale;
            let first = ja.min(jb).floor().max(0.0) as usize;
            let last = (ja.max(jb).ceil().max(0.0) as usize).min(dst_len);

            (first..last)
                .filter_map(|j| {
                    let c = dst_origin + dst_scale * j as f64;
                    let d = c + dst_scale;
                    let overlap = hi.min(c.max(d)) - lo.max(c.min(d));
                    (overlap > 0.0).then(|| (j, overlap / width))
                })
                .collect()
        })
        .collect()
}

fn overlap_resample(raster: &RasterGrid, target: &GridDefinition, conserve: bool) -> Vec<Band> {
    let source = raster.grid();
    let (st, tt) = (source.transform, target.transform);
    let cols = axis_overlaps(
        st.x_translation,
        st.x_scale,
        source.width,
        tt.x_translation,
        tt.x_scale,
        target.width,
    );
    let rows = axis_overlaps(
        st.y_translation,
        st.y_scale,
        source.height,
        tt.y_translation,
        tt.y_scale,
        target.height,
    );

    raster
        .bands()
        .par_iter()
        .map(|band| {
            let mut acc = vec![0.0f64; target.len()];
            let mut weight = vec![0.0f64; target.len()];

            for (r, row_parts) in rows.iter().enumerate() {
                if row_parts.is_empty() {
                    continue;
                }
                for (c, col_parts) in cols.iter().enumerate() {
                    let v = band.data[source.flat_index(c, r)];
                    if v.is_nan() {
                        continue;
                    }
                    for &(tr, fy) in row_parts {
                        for &(tc, fx) in col_parts {
                            let idx = target.flat_index(tc, tr);
                            let w = fx * fy;
                            acc[idx] += v as f64 * w;
                            weight[idx] += w;
                        }
                    }
                }
            }

            Band::new(band.name.clone(), finish(acc, weight, conserve))
        })
        .collect()
}

fn supersample_resample(
    raster: &RasterGrid,
    target: &GridDefinition,
    conserve: bool,
    k: usize,
) -> Vec<Band> {
    let source = raster.grid();
    let share = 1.0 / (k * k) as f64;

    // target cell of every sub-sample, in source-cell-major order
    let targets: Vec<Option<usize>> = (0..source.len())
        .into_par_iter()
        .flat_map_iter(|idx| {
            let (col, row) = (idx % source.width, idx / source.width);
            (0..k * k).map(move |s| {
                let px = col as f64 + ((s % k) as f64 + 0.5) / k as f64;
                let py = row as f64 + ((s / k) as f64 + 0.5) / k as f64;
                let (x, y) = source.transform.apply(px, py);
                let (tx, ty) = source.crs.transform_point(target.crs, x, y);
                target
                    .cell_at(tx, ty)
                    .map(|(c, r)| target.flat_index(c, r))
            })
        })
        .collect();

    raster
        .bands()
        .par_iter()
        .map(|band| {
            let mut acc = vec![0.0f64; target.len()];
            let mut weight = vec![0.0f64; target.len()];
            for (idx, &v) in band.data.iter().enumerate() {
                if v.is_nan() {
                    continue;
                }
                for t in targets[idx * k * k..(idx + 1) * k * k].iter().flatten() {
                    acc[*t] += v as f64 * share;
                    weight[*t] += share;
                }
            }
            Band::new(band.name.clone(), finish(acc, weight, conserve))
        })
        .collect()
}

/// Untouched cells become NaN; touched cells hold the total or the mean.
fn finish(acc: Vec<f64>, weight: Vec<f64>, conserve: bool) -> Vec<f32> {
    acc.into_iter()
        .zip(weight)
        .map(|(a, w)| {
            if w <= 0.0 {
                f32::NAN
            } else if conserve {
                a as f32
            } else {
                (a / w) as f32
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_common::{AffineTransform, CrsCode};

    fn geo(origin_x: f64, origin_y: f64, cell: f64, w: usize, h: usize) -> GridDefinition {
        GridDefinition::new(
            CrsCode::Epsg4326,
            AffineTransform::north_up(origin_x, origin_y, cell, cell),
            w,
            h,
        )
    }

    #[test]
    fn test_axis_overlaps_half_shift() {
        // source cells of width 1 starting at 0; target cells of width 1 starting at 0.5
        let parts = axis_overlaps(0.0, 1.0, 2, 0.5, 1.0, 2);
        assert_eq!(parts[0], vec![(0, 0.5)]);
        assert_eq!(parts[1], vec![(0, 0.5), (1, 0.5)]);
    }

    #[test]
    fn test_axis_overlaps_negative_scale() {
        let parts = axis_overlaps(90.0, -1.0, 2, 90.0, -2.0, 1);
        assert_eq!(parts[0], vec![(0, 1.0)]);
        assert_eq!(parts[1], vec![(0, 1.0)]);
    }

    #[test]
    fn test_identity_returns_clone() {
        let grid = geo(0.0, 2.0, 1.0, 2, 2);
        let raster = RasterGrid::single_band(grid, "v", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let out = reproject(&raster, &grid, ResampleMethod::Nearest, 4).unwrap();
        assert_eq!(out, raster);
    }

    #[test]
    fn test_shifted_area_weighted_conserves_interior_mass() {
        let src = geo(0.0, 4.0, 1.0, 4, 4);
        let raster = RasterGrid::single_band(src, "v", vec![1.0; 16]).unwrap();
        // target covers the same extent with cells offset by half a cell
        let dst = geo(-0.5, 4.5, 1.0, 5, 5);
        let out = reproject(&raster, &dst, ResampleMethod::AreaWeighted, 4).unwrap();
        let total = out.band("v").unwrap().total();
        assert!((total - 16.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean_keeps_constant_field() {
        let src = geo(0.0, 4.0, 1.0, 4, 4);
        let raster = RasterGrid::single_band(src, "frac", vec![0.25; 16]).unwrap();
        let dst = geo(0.0, 4.0, 1.5, 2, 2);
        let out = reproject(&raster, &dst, ResampleMethod::Mean, 4).unwrap();
        for v in out.band_data("frac").unwrap() {
            assert!((v - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_source_is_fatal() {
        let bad = GridDefinition::new(
            CrsCode::Epsg4326,
            AffineTransform::from_terms([0.0, 0.0, 0.0, 0.0, -1.0, 1.0]),
            2,
            1,
        );
        let raster = RasterGrid::single_band(bad, "v", vec![1.0, 1.0]).unwrap();
        let err = reproject(&raster, &geo(0.0, 1.0, 1.0, 2, 1), ResampleMethod::Nearest, 4);
        assert!(matches!(err, Err(RasterError::DegenerateTransform(_))));
    }

    #[test]
    fn test_nearest_to_mercator_and_back() {
        let src = geo(-10.0, 10.0, 1.0, 20, 20);
        let data: Vec<f32> = (0..400).map(|v| v as f32).collect();
        let raster = RasterGrid::single_band(src, "v", data).unwrap();

        let (x0, y0) = CrsCode::Epsg3857.from_geographic(-10.0, 10.0);
        let (x1, y1) = CrsCode::Epsg3857.from_geographic(10.0, -10.0);
        let merc = GridDefinition::new(
            CrsCode::Epsg3857,
            AffineTransform::north_up(x0, y0, (x1 - x0) / 20.0, (y0 - y1) / 20.0),
            20,
            20,
        );
        let out = reproject(&raster, &merc, ResampleMethod::Nearest, 4).unwrap();
        assert!(out.band_data("v").unwrap().iter().all(|v| !v.is_nan()));
    }
}
