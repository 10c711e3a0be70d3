//! Point sampling of a row-major grid at fractional pixel positions.
//!
//! Positions use corner-origin pixel coordinates: cell (c, r) covers
//! `[c, c + 1) x [r, r + 1)` and its centre sits at `(c + 0.5, r + 0.5)`.

/// Value of the cell containing the position, or NaN off-grid.
pub fn nearest_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if x < 0.0 || y < 0.0 {
        return f32::NAN;
    }
    let col = x.floor() as usize;
    let row = y.floor() as usize;

    if col >= width || row >= height {
        return f32::NAN;
    }

    data[row * width + col]
}

/// Bilinear interpolation between the four nearest cell centres.
///
/// Positions within half a cell of the edge are clamped to the edge
/// centres. Any NaN corner yields NaN.
pub fn bilinear_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if width == 0 || height == 0 || x < 0.0 || y < 0.0 || x > width as f64 || y > height as f64 {
        return f32::NAN;
    }

    // shift to centre-origin coordinates
    let cx = (x - 0.5).clamp(0.0, (width - 1) as f64);
    let cy = (y - 0.5).clamp(0.0, (height - 1) as f64);

    let x0 = cx.floor() as usize;
    let y0 = cy.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = (cx - x0 as f64) as f32;
    let yf = (cy - y0 as f64) as f32;

    let v00 = data[y0 * width + x0];
    let v10 = data[y0 * width + x1];
    let v01 = data[y1 * width + x0];
    let v11 = data[y1 * width + x1];

    if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
        return f32::NAN;
    }

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: [f32; 4] = [0.0, 10.0, 20.0, 30.0];

    #[test]
    fn test_nearest() {
        assert_eq!(nearest_interpolate(&DATA, 2, 2, 0.2, 0.9), 0.0);
        assert_eq!(nearest_interpolate(&DATA, 2, 2, 1.7, 1.1), 30.0);
        assert!(nearest_interpolate(&DATA, 2, 2, 2.1, 0.0).is_nan());
        assert!(nearest_interpolate(&DATA, 2, 2, -0.1, 0.0).is_nan());
    }

    #[test]
    fn test_bilinear_at_centres_and_middle() {
        assert_eq!(bilinear_interpolate(&DATA, 2, 2, 0.5, 0.5), 0.0);
        assert_eq!(bilinear_interpolate(&DATA, 2, 2, 1.5, 1.5), 30.0);
        assert_eq!(bilinear_interpolate(&DATA, 2, 2, 1.0, 1.0), 15.0);
    }

    #[test]
    fn test_bilinear_nan_corner() {
        let data = [0.0, f32::NAN, 20.0, 30.0];
        assert!(bilinear_interpolate(&data, 2, 2, 1.0, 1.0).is_nan());
    }
}
