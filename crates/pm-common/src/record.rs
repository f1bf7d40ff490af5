//! Joined records and model output.

use serde::{Deserialize, Serialize};

use crate::coord::CoordKey;
use crate::feature::FeatureRow;

/// One grid cell after the three-way join.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    /// Unrounded AOD latitude (canonical output location)
    pub lat: f64,
    /// Unrounded AOD longitude (canonical output location)
    pub lon: f64,
    pub key: CoordKey,
    /// Predictors in schema order
    pub features: FeatureRow,
}

impl MergedRecord {
    pub fn has_missing_feature(&self) -> bool {
        self.features.iter().any(|v| v.is_nan())
    }
}

/// A predicted concentration at the canonical output location.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "lon_aod")]
    pub lon: f64,
    #[serde(rename = "lat_aod")]
    pub lat: f64,
    #[serde(rename = "pred_pm25")]
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_feature_detection() {
        let mut record = MergedRecord {
            lat: 10.0,
            lon: 80.0,
            key: CoordKey { lat: 100, lon: 800 },
            features: [0.5, 500.0, 101325.0, 300.0, 0.01, 1.0, -1.0],
        };
        assert!(!record.has_missing_feature());
        record.features[4] = f64::NAN;
        assert!(record.has_missing_feature());
    }
}
