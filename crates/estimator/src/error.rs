//! Error types for model loading and inference.

use pm_common::PipelineError;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    /// Artifact parsed but is structurally unusable
    #[error("invalid model: {0}")]
    Invalid(String),

    /// Declared inputs disagree with the feature schema
    #[error("model inputs do not match the feature schema: {0}")]
    FeatureMismatch(String),

    #[error("expected {expected} features per row, got {actual}")]
    FeatureWidth { expected: usize, actual: usize },

    #[error("model returned {actual} predictions for {expected} rows")]
    PredictionCount { expected: usize, actual: usize },

    #[error("{0}")]
    Inference(String),
}

impl From<ModelError> for PipelineError {
    fn from(err: ModelError) -> Self {
        PipelineError::ModelInvocation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_model_invocation() {
        let err: PipelineError = ModelError::PredictionCount {
            expected: 3,
            actual: 2,
        }
        .into();
        assert_eq!(err.kind(), "model_invocation");
        assert_eq!(err.http_status_code(), 500);
        assert!(err.to_string().contains("2 predictions for 3 rows"));
    }
}
