//! Error types for the estimation pipeline.

use thiserror::Error;

/// Result type alias using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything that can stop a prediction request.
///
/// Only `MissingInput` is a client error. Every other kind is a processing
/// failure and surfaces as a 500 carrying the display text.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing required files")]
    MissingInput(Vec<String>),

    #[error("failed to decode {source_name}: {message}")]
    Decode { source_name: String, message: String },

    #[error("schema mismatch in {source_name}: {message}")]
    SchemaMismatch { source_name: String, message: String },

    #[error("no grid cells left after joining AOD, MET and PBLH on rounded coordinates")]
    EmptyJoin,

    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("failed to write output {path}: {message}")]
    Output { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn decode(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn schema(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn output(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Output {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MissingInput(_) => "missing_input",
            PipelineError::Decode { .. } => "decode",
            PipelineError::SchemaMismatch { .. } => "schema_mismatch",
            PipelineError::EmptyJoin => "empty_join",
            PipelineError::ModelInvocation(_) => "model_invocation",
            PipelineError::Render(_) => "render",
            PipelineError::Output { .. } | PipelineError::Io(_) => "output",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            PipelineError::MissingInput(_) => 400,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::output("run summary", format!("JSON error: {}", err))
    }
}
