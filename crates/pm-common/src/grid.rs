//! Decoded grid sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three inputs the estimator aligns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridKind {
    /// Satellite aerosol optical depth
    Aod,
    /// Meteorological reanalysis (PS, T2M, QV2M, U10M, V10M)
    Met,
    /// Planetary boundary layer height
    Pblh,
}

impl GridKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridKind::Aod => "aod",
            GridKind::Met => "met",
            GridKind::Pblh => "pblh",
        }
    }
}

impl fmt::Display for GridKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One 2-D raster, flattened row-major as (lat, lon).
#[derive(Debug, Clone, PartialEq)]
pub struct GridField {
    pub name: String,
    pub values: Vec<f64>,
}

impl GridField {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A rectangular lat/lon grid with one or more co-located rasters.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSource {
    pub kind: GridKind,
    /// Latitude of each raster row
    pub lat: Vec<f64>,
    /// Longitude of each raster column
    pub lon: Vec<f64>,
    pub fields: Vec<GridField>,
}

impl GridSource {
    pub fn new(kind: GridKind, lat: Vec<f64>, lon: Vec<f64>, fields: Vec<GridField>) -> Self {
        Self {
            kind,
            lat,
            lon,
            fields,
        }
    }

    /// Number of raster cells (len(lat) * len(lon)).
    pub fn n_cells(&self) -> usize {
        self.lat.len() * self.lon.len()
    }

    pub fn field(&self, name: &str) -> Option<&GridField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check that every raster has exactly one value per coordinate pair.
    pub fn validate(&self) -> Result<(), String> {
        let expected = self.n_cells();
        for field in &self.fields {
            if field.values.len() != expected {
                return Err(format!(
                    "{} has {} values but the {}x{} lat/lon grid has {} cells",
                    field.name,
                    field.values.len(),
                    self.lat.len(),
                    self.lon.len(),
                    expected
                ));
            }
        }
        Ok(())
    }
}
