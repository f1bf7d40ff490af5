//! Linear regression: `y = intercept + Σ coefficient[i] · x[i]`.

use pm_common::FeatureRow;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.coefficients.is_empty() {
            return Err(ModelError::Invalid("linear model has no coefficients".into()));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Invalid("linear model has non-finite weights".into()));
        }
        Ok(())
    }

    pub fn check_width(&self, width: usize) -> ModelResult<()> {
        if width != self.n_features() {
            return Err(ModelError::FeatureWidth {
                expected: self.n_features(),
                actual: width,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn predict_row(&self, row: &FeatureRow) -> f64 {
        self.coefficients
            .iter()
            .zip(row.iter())
            .fold(self.intercept, |acc, (w, x)| acc + w * x)
    }

    pub fn predict(&self, rows: &[FeatureRow]) -> ModelResult<Vec<f64>> {
        self.check_width(pm_common::FEATURE_COUNT)?;
        Ok(rows.iter().map(|r| self.predict_row(r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_row() {
        let model = LinearModel::new(2.0, vec![10.0, 0.0, 0.0, 0.0, 0.0, 1.0, -1.0]);
        let row = [0.5, 500.0, 101325.0, 300.0, 0.01, 1.0, -1.0];
        assert_eq!(model.predict_row(&row), 2.0 + 5.0 + 1.0 + 1.0);
    }

    #[test]
    fn test_width_must_match() {
        let model = LinearModel::new(0.0, vec![1.0; 6]);
        assert!(matches!(
            model.check_width(7),
            Err(ModelError::FeatureWidth {
                expected: 6,
                actual: 7
            })
        ));
        assert!(model.predict(&[[0.0; 7]]).is_err());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(LinearModel::new(1.0, vec![]).validate().is_err());
        assert!(LinearModel::new(f64::NAN, vec![1.0]).validate().is_err());
    }
}
