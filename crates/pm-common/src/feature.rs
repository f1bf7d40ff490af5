//! Model input schema.
//!
//! The order of [`FeatureSchema::columns`] is the order in which values are
//! handed to the regressor. Feature selection and inference both go through
//! this type so the two can never disagree.

use serde::{Deserialize, Serialize};

/// Number of predictors consumed by the PM2.5 model.
pub const FEATURE_COUNT: usize = 7;

/// One ordered feature vector.
pub type FeatureRow = [f64; FEATURE_COUNT];

/// A single model predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Aerosol optical depth
    Aod,
    /// Planetary boundary layer height (m)
    Pblh,
    /// Surface pressure (Pa)
    Ps,
    /// 2 m air temperature (K)
    T2m,
    /// 2 m specific humidity (kg/kg)
    Qv2m,
    /// 10 m eastward wind (m/s)
    U10m,
    /// 10 m northward wind (m/s)
    V10m,
}

impl Feature {
    /// Column name as used in the model artifact and the source files.
    pub fn column_name(&self) -> &'static str {
        match self {
            Feature::Aod => "aod",
            Feature::Pblh => "PBLH",
            Feature::Ps => "PS",
            Feature::T2m => "T2M",
            Feature::Qv2m => "QV2M",
            Feature::U10m => "U10M",
            Feature::V10m => "V10M",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        match name {
            "aod" | "AOD" => Some(Feature::Aod),
            "PBLH" => Some(Feature::Pblh),
            "PS" => Some(Feature::Ps),
            "T2M" => Some(Feature::T2m),
            "QV2M" => Some(Feature::Qv2m),
            "U10M" => Some(Feature::U10m),
            "V10M" => Some(Feature::V10m),
            _ => None,
        }
    }
}

/// Named, ordered model inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: [Feature; FEATURE_COUNT],
}

impl FeatureSchema {
    /// The order the PM2.5 model was trained with.
    pub fn pm25() -> Self {
        Self {
            columns: [
                Feature::Aod,
                Feature::Pblh,
                Feature::Ps,
                Feature::T2m,
                Feature::Qv2m,
                Feature::U10m,
                Feature::V10m,
            ],
        }
    }

    pub fn columns(&self) -> &[Feature; FEATURE_COUNT] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(Feature::column_name).collect()
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check a model's declared input names against this schema.
    ///
    /// Returns a human readable description of the first difference.
    pub fn check_names<S: AsRef<str>>(&self, names: &[S]) -> Result<(), String> {
        if names.len() != FEATURE_COUNT {
            return Err(format!(
                "model declares {} features, expected {} ({})",
                names.len(),
                FEATURE_COUNT,
                self.column_names().join(", ")
            ));
        }
        for (i, (expected, actual)) in self.columns.iter().zip(names).enumerate() {
            let actual = actual.as_ref();
            if Feature::from_column_name(actual) != Some(*expected) {
                return Err(format!(
                    "feature {} is '{}', expected '{}'",
                    i,
                    actual,
                    expected.column_name()
                ));
            }
        }
        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::pm25()
    }
}
