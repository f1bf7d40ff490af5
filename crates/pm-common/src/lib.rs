//! Common types shared by the PM2.5 estimation crates and service.

pub mod bbox;
pub mod coord;
pub mod error;
pub mod feature;
pub mod grid;
pub mod record;

pub use bbox::BoundingBox;
pub use coord::{CoordKey, JoinResolution};
pub use error::{PipelineError, PipelineResult};
pub use feature::{Feature, FeatureRow, FeatureSchema, FEATURE_COUNT};
pub use grid::{GridField, GridKind, GridSource};
pub use record::{MergedRecord, Prediction};
