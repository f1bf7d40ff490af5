//! PM2.5 regression models.
//!
//! Models are read once at startup from a JSON artifact, checked against the
//! [`FeatureSchema`](pm_common::FeatureSchema) and shared as an
//! `Arc<dyn Regressor>`. Two model families are supported:
//!
//! - [`LinearModel`]: intercept plus weighted sum of the features
//! - [`TreeEnsemble`]: random forest (mean) or gradient boosting (sum)

pub mod artifact;
pub mod error;
pub mod linear;
pub mod regressor;
pub mod tree;

pub use artifact::{load_model, ModelArtifact, ModelSpec};
pub use error::{ModelError, ModelResult};
pub use linear::LinearModel;
pub use regressor::{check_schema, predict_rows, Regressor};
pub use tree::{Aggregation, Node, Tree, TreeEnsemble};
