//! Block aggregation for aligned integer coarsening (e.g. 0.25° to 0.5°).

use serde::{Deserialize, Serialize};

/// How the cells of one block collapse into a single coarse cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownsampleMethod {
    /// Total of the block, for sum-type fields (emissions, burned area)
    #[default]
    Sum,
    /// Average of the block, for intensive fields (fractions)
    Mean,
    /// Maximum of the block
    Max,
}

/// Aggregate a row-major grid by `factor` in both directions.
///
/// NaN cells are skipped; a block with no valid cells becomes NaN.
/// Trailing rows/columns that do not fill a whole block are dropped.
///
/// # Returns
/// Tuple of (aggregated_data, new_width, new_height)
pub fn downsample_by(
    data: &[f32],
    width: usize,
    height: usize,
    factor: usize,
    method: DownsampleMethod,
) -> (Vec<f32>, usize, usize) {
    if factor == 0 {
        return (vec![], 0, 0);
    }
    let new_width = width / factor;
    let new_height = height / factor;

    if new_width == 0 || new_height == 0 {
        return (vec![], 0, 0);
    }

    let mut output = vec![f32::NAN; new_width * new_height];

    for out_y in 0..new_height {
        for out_x in 0..new_width {
            let mut acc = 0.0f64;
            let mut max = f32::NEG_INFINITY;
            let mut count = 0usize;

            for dy in 0..factor {
                let row = out_y * factor + dy;
                let start = row * width + out_x * factor;
                for &v in &data[start..start + factor] {
                    if !v.is_nan() {
                        acc += v as f64;
                        max = max.max(v);
                        count += 1;
                    }
                }
            }

            if count > 0 {
                output[out_y * new_width + out_x] = match method {
                    DownsampleMethod::Sum => acc as f32,
                    DownsampleMethod::Mean => (acc / count as f64) as f32,
                    DownsampleMethod::Max => max,
                };
            }
        }
    }

    (output, new_width, new_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_2x() {
        // 4x2 grid
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let (out, w, h) = downsample_by(&data, 4, 2, 2, DownsampleMethod::Sum);
        assert_eq!((w, h), (2, 1));
        assert_eq!(out, vec![14.0, 22.0]);
    }

    #[test]
    fn test_mean_skips_nan() {
        let data = vec![1.0, f32::NAN, 3.0, f32::NAN];
        let (out, _, _) = downsample_by(&data, 2, 2, 2, DownsampleMethod::Mean);
        assert_eq!(out, vec![2.0]);
    }

    #[test]
    fn test_all_nan_block() {
        let data = vec![f32::NAN; 4];
        let (out, _, _) = downsample_by(&data, 2, 2, 2, DownsampleMethod::Sum);
        assert!(out[0].is_nan());
    }

    #[test]
    fn test_max_and_odd_dimensions() {
        let data = vec![1.0, 9.0, 0.0, 2.0, 3.0, 0.0, 5.0, 5.0, 5.0];
        let (out, w, h) = downsample_by(&data, 3, 3, 2, DownsampleMethod::Max);
        assert_eq!((w, h), (1, 1));
        assert_eq!(out, vec![9.0]);
    }
}
