//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use estimator::{check_schema, Regressor};
use grid_processor::FeatureBindings;
use metrics_exporter_prometheus::PrometheusHandle;
use pm_common::FeatureSchema;
use tracing::info;

use crate::config::ServiceConfig;

/// Default request body limit (512 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Read-only state shared by every request.
pub struct AppState {
    pub model: Arc<dyn Regressor>,
    pub schema: FeatureSchema,
    pub bindings: FeatureBindings,
    pub config: ServiceConfig,
    /// Root of the per-request upload directories
    pub upload_dir: PathBuf,
    /// Root of the per-request output directories, served under `/static`
    pub output_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Validate the model against the feature schema and prepare directories.
    pub fn new(
        model: Arc<dyn Regressor>,
        config: ServiceConfig,
        upload_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let schema = FeatureSchema::pm25();
        check_schema(model.as_ref(), &schema)
            .with_context(|| format!("Model '{}' does not fit the feature schema", model.name()))?;
        config.validate()?;

        let upload_dir = upload_dir.into();
        let output_dir = output_dir.into();
        for dir in [&upload_dir, &output_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        info!(
            model = %model.name(),
            features = ?schema.column_names(),
            upload_dir = %upload_dir.display(),
            output_dir = %output_dir.display(),
            "Application state ready"
        );

        Ok(Self {
            model,
            schema,
            bindings: config.bindings(),
            config,
            upload_dir,
            output_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            prometheus: None,
        })
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
