//! Common types and utilities shared across the fire-emissions crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod species;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::{AffineTransform, CrsCode};
pub use error::{FireError, FireResult};
pub use grid::GridDefinition;
pub use species::Species;
pub use time::{TimeResolution, YearRange};
