//! JSON model artifacts.
//!
//! ```json
//! {
//!   "name": "pm25-rf",
//!   "feature_names": ["aod", "PBLH", "PS", "T2M", "QV2M", "U10M", "V10M"],
//!   "model": { "type": "linear", "intercept": 12.0, "coefficients": [ ... ] }
//! }
//! ```

use std::path::Path;

use pm_common::FeatureRow;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ModelError, ModelResult};
use crate::linear::LinearModel;
use crate::regressor::Regressor;
use crate::tree::TreeEnsemble;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelSpec {
    pub fn type_name(&self) -> &'static str {
        match self {
            ModelSpec::Linear(_) => "linear",
            ModelSpec::TreeEnsemble(_) => "tree_ensemble",
        }
    }
}

/// A model as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub model: ModelSpec,
}

impl ModelArtifact {
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> ModelResult<()> {
        match &self.model {
            ModelSpec::Linear(m) => m.validate()?,
            ModelSpec::TreeEnsemble(m) => m.validate()?,
        }
        if let Some(names) = &self.feature_names {
            self.check_width(names.len())?;
        }
        Ok(())
    }
}

impl Regressor for ModelArtifact {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn check_width(&self, width: usize) -> ModelResult<()> {
        match &self.model {
            ModelSpec::Linear(m) => m.check_width(width),
            ModelSpec::TreeEnsemble(m) => m.check_width(width),
        }
    }

    fn predict(&self, rows: &[FeatureRow]) -> ModelResult<Vec<f64>> {
        match &self.model {
            ModelSpec::Linear(m) => m.predict(rows),
            ModelSpec::TreeEnsemble(m) => m.predict(rows),
        }
    }
}

/// Read and validate a model artifact.
pub fn load_model<P: AsRef<Path>>(path: P) -> ModelResult<ModelArtifact> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let artifact = ModelArtifact::from_json(&json)?;

    info!(
        path = %path.display(),
        name = %artifact.name,
        model_type = artifact.model.type_name(),
        named_inputs = artifact.feature_names.is_some(),
        "Loaded model artifact"
    );

    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_linear() {
        let artifact = ModelArtifact::from_json(
            r#"{"name": "lin", "model": {"type": "linear", "intercept": 1.0,
                "coefficients": [1, 0, 0, 0, 0, 0, 0]}}"#,
        )
        .unwrap();
        assert_eq!(artifact.model.type_name(), "linear");
        assert!(artifact.feature_names().is_none());
        assert_eq!(artifact.predict(&[[2.0; 7]]).unwrap(), vec![3.0]);
    }

    #[test]
    fn test_parse_tree_ensemble() {
        let artifact = ModelArtifact::from_json(
            r#"{"name": "rf", "model": {"type": "tree_ensemble", "aggregation": "mean",
                "trees": [{"nodes": [
                    {"feature": 0, "threshold": 0.4, "left": 1, "right": 2},
                    {"value": 35.0}, {"value": 80.0}]}]}}"#,
        )
        .unwrap();
        let rows = [
            [0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        assert_eq!(artifact.predict(&rows).unwrap(), vec![35.0, 80.0]);
    }

    #[test]
    fn test_unknown_model_type_rejected() {
        let err = ModelArtifact::from_json(r#"{"name": "x", "model": {"type": "svm"}}"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn test_named_width_must_match_coefficients() {
        let err = ModelArtifact::from_json(
            r#"{"name": "lin", "feature_names": ["aod", "PBLH"],
                "model": {"type": "linear", "intercept": 0.0, "coefficients": [1, 2, 3]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::FeatureWidth { .. }));
    }
}
