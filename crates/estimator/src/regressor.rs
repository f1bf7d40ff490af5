//! The model capability consumed by the pipeline.

use pm_common::{FeatureRow, FeatureSchema, PipelineResult};

use crate::error::{ModelError, ModelResult};

/// A pretrained regressor over ordered feature rows.
///
/// Implementations are immutable after construction and shared across
/// requests behind an `Arc`.
pub trait Regressor: Send + Sync {
    /// Human readable model name for logs and run summaries.
    fn name(&self) -> &str;

    /// Input names in training order, if the artifact records them.
    fn feature_names(&self) -> Option<&[String]>;

    /// Check that rows of `width` values are a valid input.
    fn check_width(&self, width: usize) -> ModelResult<()>;

    /// Predict one value per row, in row order.
    fn predict(&self, rows: &[FeatureRow]) -> ModelResult<Vec<f64>>;
}

/// Startup check of a model against the feature schema.
///
/// Named inputs must match the schema order exactly. Without names only the
/// width can be checked.
pub fn check_schema(model: &dyn Regressor, schema: &FeatureSchema) -> ModelResult<()> {
    if let Some(names) = model.feature_names() {
        schema.check_names(names).map_err(ModelError::FeatureMismatch)?;
    }
    model.check_width(schema.len())
}

/// Batch inference with the row-count invariant enforced.
pub fn predict_rows(model: &dyn Regressor, rows: &[FeatureRow]) -> PipelineResult<Vec<f64>> {
    let predictions = model.predict(rows)?;
    if predictions.len() != rows.len() {
        return Err(ModelError::PredictionCount {
            expected: rows.len(),
            actual: predictions.len(),
        }
        .into());
    }
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_common::PipelineError;

    struct Truncating;

    impl Regressor for Truncating {
        fn name(&self) -> &str {
            "truncating"
        }

        fn feature_names(&self) -> Option<&[String]> {
            None
        }

        fn check_width(&self, _width: usize) -> ModelResult<()> {
            Ok(())
        }

        fn predict(&self, rows: &[FeatureRow]) -> ModelResult<Vec<f64>> {
            Ok(rows.iter().skip(1).map(|r| r[0]).collect())
        }
    }

    #[test]
    fn test_prediction_count_enforced() {
        let rows = [[1.0; 7], [2.0; 7]];
        let err = predict_rows(&Truncating, &rows).unwrap_err();
        assert!(matches!(err, PipelineError::ModelInvocation(_)));
    }
}
