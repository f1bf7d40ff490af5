//! Geographic extent of a set of points.

use serde::{Deserialize, Serialize};

/// A lon/lat bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Smallest box containing every finite (lon, lat) point.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut bbox: Option<Self> = None;
        for (lon, lat) in points {
            if !lon.is_finite() || !lat.is_finite() {
                continue;
            }
            bbox = Some(match bbox {
                None => Self::new(lon, lat, lon, lat),
                Some(b) => Self::new(
                    b.min_lon.min(lon),
                    b.min_lat.min(lat),
                    b.max_lon.max(lon),
                    b.max_lat.max(lat),
                ),
            });
        }
        bbox
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Grow each side by `fraction` of the extent, or by `min_pad` degrees
    /// when the extent along that axis is zero.
    pub fn padded(&self, fraction: f64, min_pad: f64) -> Self {
        let pad_x = if self.width() > 0.0 { self.width() * fraction } else { min_pad };
        let pad_y = if self.height() > 0.0 { self.height() * fraction } else { min_pad };
        Self::new(
            self.min_lon - pad_x,
            self.min_lat - pad_y,
            self.max_lon + pad_x,
            self.max_lat + pad_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let bbox = BoundingBox::from_points(vec![(80.0, 10.0), (82.5, 9.0), (81.0, 12.0)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(80.0, 9.0, 82.5, 12.0));
    }

    #[test]
    fn test_from_points_skips_nan() {
        let bbox = BoundingBox::from_points(vec![(f64::NAN, 10.0), (80.0, 10.0)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(80.0, 10.0, 80.0, 10.0));
    }

    #[test]
    fn test_from_points_empty() {
        assert!(BoundingBox::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_padded_single_point() {
        let bbox = BoundingBox::new(80.0, 10.0, 80.0, 10.0).padded(0.05, 0.5);
        assert_eq!(bbox, BoundingBox::new(79.5, 9.5, 80.5, 10.5));
    }
}
