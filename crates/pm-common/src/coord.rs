//! Rounded coordinate keys used to align grids of different resolution.

use serde::{Deserialize, Serialize};

/// Decimal places kept when rounding coordinates for the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResolution {
    pub decimals: u32,
}

impl JoinResolution {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    /// Multiplier that turns degrees into key units.
    pub fn scale(&self) -> f64 {
        10f64.powi(self.decimals as i32)
    }

    /// Round a single coordinate to key units.
    ///
    /// Ties go to even, matching the array rounding the model's training
    /// data was aligned with (10.25 -> 102, 10.35 -> 104 in tenths).
    /// Non-finite coordinates have no key.
    pub fn round(&self, degrees: f64) -> Option<i64> {
        if !degrees.is_finite() {
            return None;
        }
        Some((degrees * self.scale()).round_ties_even() as i64)
    }

    pub fn key(&self, lat: f64, lon: f64) -> Option<CoordKey> {
        Some(CoordKey {
            lat: self.round(lat)?,
            lon: self.round(lon)?,
        })
    }
}

impl Default for JoinResolution {
    fn default() -> Self {
        Self { decimals: 1 }
    }
}

/// Rounded (lat, lon) pair in integer key units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoordKey {
    pub lat: i64,
    pub lon: i64,
}

impl CoordKey {
    /// Key coordinates back in degrees.
    pub fn to_degrees(&self, resolution: JoinResolution) -> (f64, f64) {
        let scale = resolution.scale();
        (self.lat as f64 / scale, self.lon as f64 / scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bucket_same_key() {
        let res = JoinResolution::default();
        assert_eq!(res.key(10.00, 80.00), res.key(10.04, 80.02));
        assert_eq!(res.key(10.04, 80.02), Some(CoordKey { lat: 100, lon: 800 }));
    }

    #[test]
    fn test_more_than_half_bucket_apart_differs() {
        let res = JoinResolution::default();
        assert_ne!(res.key(10.00, 80.00), res.key(10.06, 80.00));
        assert_ne!(res.key(10.00, 80.00), res.key(10.00, 79.94));
    }

    #[test]
    fn test_negative_coordinates() {
        let res = JoinResolution::default();
        assert_eq!(res.round(-33.87), Some(-339));
        assert_eq!(res.round(-0.04), Some(0));
    }

    #[test]
    fn test_ties_round_to_even() {
        let res = JoinResolution::default();
        assert_eq!(res.round(0.25), Some(2));
        assert_eq!(res.round(0.75), Some(8));
    }

    #[test]
    fn test_nan_has_no_key() {
        let res = JoinResolution::default();
        assert_eq!(res.key(f64::NAN, 80.0), None);
    }

    #[test]
    fn test_to_degrees() {
        let res = JoinResolution::new(2);
        let key = res.key(28.613, 77.209).unwrap();
        let (lat, lon) = key.to_degrees(res);
        assert!((lat - 28.61).abs() < 1e-9);
        assert!((lon - 77.21).abs() < 1e-9);
    }
}
