//! Service configuration loaded from an optional YAML file.
//!
//! Every section has defaults, so an empty file (or no file) yields the
//! standard PM2.5 setup:
//!
//! ```yaml
//! sources:
//!   aod:
//!     value_vars: [AOD]
//!     lat_var: latitude
//!     lon_var: longitude
//!     decode_cf: false
//! join:
//!   decimals: 1
//! retention:
//!   hours: 24
//! plot:
//!   title: PM2.5 Concentration Map
//!   vmax: 250.0
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use grid_processor::FeatureBindings;
use netcdf_parser::SourceLayout;
use pm_common::{Feature, GridKind, JoinResolution};
use renderer::PlotConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Feature fed by each MET variable, in `value_vars` order.
const MET_FEATURES: [Feature; 5] = [
    Feature::Ps,
    Feature::T2m,
    Feature::Qv2m,
    Feature::U10m,
    Feature::V10m,
];

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub join: JoinConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Per-source variable layout. A listed source replaces the default layout
/// for that source entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "SourceLayout::aod")]
    pub aod: SourceLayout,
    #[serde(default = "SourceLayout::met")]
    pub met: SourceLayout,
    #[serde(default = "SourceLayout::pblh")]
    pub pblh: SourceLayout,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            aod: SourceLayout::aod(),
            met: SourceLayout::met(),
            pblh: SourceLayout::pblh(),
        }
    }
}

impl SourcesConfig {
    pub fn layout(&self, kind: GridKind) -> &SourceLayout {
        match kind {
            GridKind::Aod => &self.aod,
            GridKind::Met => &self.met,
            GridKind::Pblh => &self.pblh,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Decimal places kept when rounding coordinates
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    1
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
        }
    }
}

/// Removal of old per-request directories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_retention_enabled")]
    pub enabled: bool,
    /// Age in hours after which a request directory is removed
    #[serde(default = "default_retention_hours")]
    pub hours: u32,
    /// Seconds between sweeps
    #[serde(default = "default_cleanup_interval_secs")]
    pub interval_secs: u64,
}

fn default_retention_enabled() -> bool {
    true
}

fn default_retention_hours() -> u32 {
    24
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_retention_enabled(),
            hours: default_retention_hours(),
            interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "Loaded service config");
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ServiceConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let expected = [
            (GridKind::Aod, 1),
            (GridKind::Met, MET_FEATURES.len()),
            (GridKind::Pblh, 1),
        ];
        for (kind, count) in expected {
            let layout = self.sources.layout(kind);
            if layout.value_vars.len() != count {
                bail!(
                    "sources.{}.value_vars must list {} variable(s), got {:?}",
                    kind,
                    count,
                    layout.value_vars
                );
            }
        }
        if self.join.decimals > 6 {
            bail!("join.decimals must be at most 6, got {}", self.join.decimals);
        }
        if self.plot.width == 0 || self.plot.height == 0 {
            bail!("plot.width and plot.height must be positive");
        }
        if let (Some(lo), Some(hi)) = (self.plot.vmin, self.plot.vmax) {
            if lo >= hi {
                bail!("plot.vmin ({}) must be below plot.vmax ({})", lo, hi);
            }
        }
        if self.retention.enabled && (self.retention.hours == 0 || self.retention.interval_secs == 0) {
            bail!(
                "retention.hours and retention.interval_secs must be positive, got {} and {}",
                self.retention.hours,
                self.retention.interval_secs
            );
        }
        Ok(())
    }

    pub fn resolution(&self) -> JoinResolution {
        JoinResolution::new(self.join.decimals)
    }

    /// Feature → source column mapping implied by the source layouts.
    pub fn bindings(&self) -> FeatureBindings {
        let mut bindings = FeatureBindings::standard();
        if let Some(aod) = self.sources.aod.value_vars.first() {
            bindings = bindings.rename(Feature::Aod, aod.clone());
        }
        if let Some(pblh) = self.sources.pblh.value_vars.first() {
            bindings = bindings.rename(Feature::Pblh, pblh.clone());
        }
        for (feature, var) in MET_FEATURES.iter().zip(&self.sources.met.value_vars) {
            bindings = bindings.rename(*feature, var.clone());
        }
        bindings
    }
}
