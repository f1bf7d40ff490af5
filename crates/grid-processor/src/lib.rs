//! Grid alignment for PM2.5 estimation
//!
//! Turns the three decoded grid sources into one table of model inputs:
//!
//! ```text
//! AOD grid ──► FlatTable ─┐
//!                         ├─► ⋈ rounded (lat, lon) ─┐
//! MET grid ──► FlatTable ─┘                         ├─► ⋈ ─► drop missing ─► MergedRecord[]
//! PBLH grid ─► FlatTable ───────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{align_sources, FeatureBindings};
//! use pm_common::{FeatureSchema, JoinResolution};
//!
//! let alignment = align_sources(
//!     &aod, &met, &pblh,
//!     &FeatureSchema::pm25(),
//!     &FeatureBindings::standard(),
//!     JoinResolution::default(),
//! )?;
//! let rows = alignment.feature_matrix();
//! ```

pub mod align;
pub mod flatten;
pub mod join;

pub use align::{align_sources, AlignStats, Alignment, FeatureBinding, FeatureBindings};
pub use flatten::FlatTable;
pub use join::{inner_join, JoinOutput};
