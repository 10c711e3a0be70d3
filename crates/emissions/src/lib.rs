//! Multi-inventory fire emission harmonization.
//!
//! Five global fire-emission inventories (GFEDv4s, FINNv1.5, GFASv1.2,
//! QFEDv2.5r1, FEERv1.0-G1.2) publish on different grids, in different
//! units and for different species. This crate brings them onto one
//! comparison grid in Tg per month, aggregates them over a region and
//! emits time-indexed tables.
//!
//! - **Adapters** ([`adapter`]): one per inventory, turning stored
//!   monthly rasters into a species series on a target grid
//! - **EF model** ([`ef_model`], [`ef_table`]): GFED dry matter times
//!   per-category emission factors
//! - **Temporal** ([`temporal`]): multi-inventory monthly stacks and
//!   annual sums
//! - **Reducer** ([`reduce`]): sum or mean over a region mask
//! - **Tables** ([`table`]): ordered rows and CSV export
//!
//! # Request flow
//!
//! ```text
//! EmissionsRequest ──► RegionResolver::resolve ──► Footprint
//!        │
//!        ▼
//! InventoryAdapter::fetch (per inventory, cached)
//!        │
//!        ▼
//! combine_by_month ──► by_year ──► reduce_series ──► OutputTable
//! ```

pub mod adapter;
pub mod cache;
pub mod config;
pub mod ef_model;
pub mod ef_table;
pub mod inventory;
pub mod lulc;
pub mod pipeline;
pub mod reduce;
pub mod source;
pub mod table;
pub mod temporal;

pub use adapter::{AdapterContext, InventoryAdapter, UnitScale};
pub use cache::{CacheKey, CacheStats, SeriesCache, SeriesView};
pub use config::{EmissionsConfig, GridSpec, InventorySettings, ReducerSettings};
pub use ef_model::EfModel;
pub use ef_table::{EfTable, LandCover};
pub use inventory::{Coverage, Inventory};
pub use lulc::{Composition, LandCoverClass};
pub use pipeline::{ComparisonTables, EmissionsPipeline, EmissionsRequest};
pub use reduce::{Reducer, RegionMask, Statistic, Weighting};
pub use source::{MemorySource, RasterSource, ZarrSource};
pub use table::{export_stem, OutputTable, TableRow};
