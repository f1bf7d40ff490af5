//! HTTP handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Multipart},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use pm_common::PipelineError;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::metrics::{record_pipeline, record_request};
use crate::output::discard_dir;
use crate::page::{render_index, ResultLinks};
use crate::pipeline::{run_pipeline, RunSummary};
use crate::state::AppState;
use crate::upload::read_multipart;

/// Pipeline failure as an HTTP response.
///
/// Missing uploads are a 400 with a fixed message; everything else is a 500
/// carrying the error text.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match &self.0 {
            PipelineError::MissingInput(_) => self.0.to_string(),
            other => format!("An error occurred: {}", other),
        };
        (status, body).into_response()
    }
}

/// GET / - upload form
pub async fn index_handler() -> Html<String> {
    Html(render_index(None))
}

/// POST /predict - run the pipeline on uploaded files
pub async fn predict_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Html<String>, ApiError> {
    let request_id = Uuid::new_v4();
    let started = Instant::now();

    let result = predict(state, request_id, multipart).await;
    match &result {
        Ok(summary) => {
            record_request("ok");
            record_pipeline(started.elapsed(), summary.rows.merged_rows);
        }
        Err(PipelineError::MissingInput(fields)) => {
            record_request("missing_input");
            warn!(%request_id, missing = ?fields, "Rejected request with missing files");
        }
        Err(e) => {
            record_request(e.kind());
            error!(%request_id, kind = e.kind(), error = %e, "Prediction failed");
        }
    }

    let summary = result?;
    let links = ResultLinks::for_request(
        &request_id.to_string(),
        summary.rows.merged_rows,
        summary.outputs.reference.is_some(),
    );
    Ok(Html(render_index(Some(&links))))
}

async fn predict(
    state: Arc<AppState>,
    request_id: Uuid,
    multipart: Multipart,
) -> Result<RunSummary, PipelineError> {
    let upload = read_multipart(multipart).await?;
    info!(
        %request_id,
        aod = %upload.aod.file_name,
        met = %upload.met.file_name,
        pblh = %upload.pblh.file_name,
        cpcb = upload.cpcb.as_ref().map(|f| f.file_name.as_str()),
        bytes = upload.size(),
        "Received prediction request"
    );

    tokio::task::spawn_blocking(move || {
        let id = request_id.to_string();
        let inputs = upload.save(&state.upload_dir.join(&id))?;
        let output_dir = state.output_dir.join(&id);
        let result = run_pipeline(&state, request_id, &inputs, &output_dir);
        if result.is_err() {
            discard_dir(&output_dir);
        }
        result
    })
    .await
    .map_err(|e| PipelineError::Io(std::io::Error::other(e.to_string())))?
}

/// GET /health - Liveness check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}
