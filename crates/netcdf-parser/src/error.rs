//! Error types for grid file reading.

use pm_common::{GridKind, PipelineError};
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF/HDF5 grid reading.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File could not be opened as netCDF-4/HDF5
    #[error("failed to open {path}: {message}")]
    OpenFailed { path: String, message: String },

    /// Missing required variable or dataset
    #[error("variable '{0}' not found")]
    MissingVariable(String),

    /// Array shape does not match the coordinate vectors
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Invalid data format
    #[error("invalid data format: {0}")]
    InvalidFormat(String),
}

impl NetCdfError {
    /// Classify into the pipeline's error kinds for the given source.
    pub fn into_pipeline_error(self, kind: GridKind) -> PipelineError {
        match self {
            NetCdfError::MissingVariable(_) | NetCdfError::ShapeMismatch(_) => {
                PipelineError::schema(kind.as_str(), self.to_string())
            }
            NetCdfError::OpenFailed { .. }
            | NetCdfError::InvalidFormat(_) => PipelineError::decode(kind.as_str(), self.to_string()),
        }
    }
}
