//! Where each source keeps its arrays.

use serde::{Deserialize, Serialize};

/// Variable names and decoding rules for one grid source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLayout {
    /// Value rasters, in the order they are stored on the resulting grid
    pub value_vars: Vec<String>,
    /// 1-D latitude coordinate variable
    pub lat_var: String,
    /// 1-D longitude coordinate variable
    pub lon_var: String,
    /// Dimension reduced to its first index before squeezing.
    /// `None` keeps every dimension (only size-1 axes are dropped).
    #[serde(default)]
    pub time_dim: Option<String>,
    /// Apply `_FillValue`/`missing_value` masking and `scale_factor`/`add_offset`
    #[serde(default = "default_decode_cf")]
    pub decode_cf: bool,
}

fn default_decode_cf() -> bool {
    true
}

impl SourceLayout {
    /// HDF5 AOD product: `AOD`, `latitude`, `longitude`, values used raw.
    pub fn aod() -> Self {
        Self {
            value_vars: vec!["AOD".to_string()],
            lat_var: "latitude".to_string(),
            lon_var: "longitude".to_string(),
            time_dim: None,
            decode_cf: false,
        }
    }

    /// Reanalysis single-level meteorology.
    pub fn met() -> Self {
        Self {
            value_vars: ["PS", "T2M", "QV2M", "U10M", "V10M"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            lat_var: "lat".to_string(),
            lon_var: "lon".to_string(),
            time_dim: Some("time".to_string()),
            decode_cf: true,
        }
    }

    /// Reanalysis boundary layer height.
    pub fn pblh() -> Self {
        Self {
            value_vars: vec!["PBLH".to_string()],
            lat_var: "lat".to_string(),
            lon_var: "lon".to_string(),
            time_dim: Some("time".to_string()),
            decode_cf: true,
        }
    }
}
