//! Resampling between grid definitions.

pub mod interpolation;
pub mod reproject;

pub use interpolation::{bilinear_interpolate, nearest_interpolate};
pub use reproject::reproject;
