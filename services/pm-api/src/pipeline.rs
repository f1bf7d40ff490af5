//! One prediction run: extract, align, infer, write.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use estimator::predict_rows;
use grid_processor::{align_sources, AlignStats};
use netcdf_parser::load_grid;
use pm_common::{GridKind, GridSource, PipelineResult, Prediction};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::output::{self, OutputPaths};
use crate::state::AppState;
use crate::upload::InputFiles;

/// Summary statistics of the predicted values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl PredictionStats {
    pub fn from_predictions(predictions: &[Prediction]) -> Option<Self> {
        if predictions.is_empty() {
            return None;
        }
        let (min, max, sum) = predictions.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, sum), p| (lo.min(p.value), hi.max(p.value), sum + p.value),
        );
        Some(Self {
            count: predictions.len(),
            min,
            max,
            mean: sum / predictions.len() as f64,
        })
    }
}

/// Wall time per stage in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageTimings {
    pub extract_ms: f64,
    pub align_ms: f64,
    pub predict_ms: f64,
    pub render_ms: f64,
    pub write_ms: f64,
    pub total_ms: f64,
}

/// Everything worth knowing about a finished run. Written as `run.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub request_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub model: String,
    pub rows: AlignStats,
    pub predictions: Option<PredictionStats>,
    pub reference_records: Option<usize>,
    pub timings: StageTimings,
    pub outputs: OutputPaths,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn extract(state: &AppState, inputs: &InputFiles, kind: GridKind) -> PipelineResult<GridSource> {
    let layout = state.config.sources.layout(kind);
    let grid = load_grid(inputs.grid(kind), kind, layout).map_err(|e| e.into_pipeline_error(kind))?;
    info!(
        source = %kind,
        rows = grid.lat.len(),
        cols = grid.lon.len(),
        variables = grid.fields.len(),
        "Extracted grid"
    );
    Ok(grid)
}

/// Run the whole pipeline for saved inputs, writing into `output_dir`.
///
/// Stops at the first failing stage. The caller owns `output_dir` and removes
/// it when this returns an error.
pub fn run_pipeline(
    state: &AppState,
    request_id: Uuid,
    inputs: &InputFiles,
    output_dir: &Path,
) -> PipelineResult<RunSummary> {
    let started = Instant::now();
    let mut timings = StageTimings::default();
    output::create_dir(output_dir)?;

    let stage = Instant::now();
    let aod = extract(state, inputs, GridKind::Aod)?;
    let met = extract(state, inputs, GridKind::Met)?;
    let pblh = extract(state, inputs, GridKind::Pblh)?;
    timings.extract_ms = elapsed_ms(stage);

    let stage = Instant::now();
    let alignment = align_sources(
        &aod,
        &met,
        &pblh,
        &state.schema,
        &state.bindings,
        state.config.resolution(),
    )?;
    timings.align_ms = elapsed_ms(stage);
    drop((aod, met, pblh));

    let stage = Instant::now();
    let rows = alignment.feature_matrix();
    let values = predict_rows(state.model.as_ref(), &rows)?;
    let predictions: Vec<Prediction> = alignment
        .records
        .iter()
        .zip(values)
        .map(|(record, value)| Prediction {
            lon: record.lon,
            lat: record.lat,
            value,
        })
        .collect();
    timings.predict_ms = elapsed_ms(stage);
    let stats = PredictionStats::from_predictions(&predictions);
    info!(
        %request_id,
        rows = predictions.len(),
        min = stats.map(|s| s.min),
        max = stats.map(|s| s.max),
        "Predicted PM2.5"
    );

    let paths = OutputPaths::new(output_dir, inputs.cpcb.is_some());

    let stage = Instant::now();
    output::write_predictions_csv(&paths.predictions, &predictions)?;
    timings.write_ms = elapsed_ms(stage);

    let stage = Instant::now();
    let png = renderer::render_scatter_png(&predictions, &state.config.plot)?;
    timings.render_ms = elapsed_ms(stage);

    let stage = Instant::now();
    output::write_bytes(&paths.plot, &png)?;
    drop(png);

    let reference_records = match (&inputs.cpcb, &paths.reference) {
        (Some(src), Some(dst)) => Some(output::copy_reference_csv(src, dst)?),
        _ => None,
    };
    timings.write_ms += elapsed_ms(stage);
    timings.total_ms = elapsed_ms(started);

    let summary = RunSummary {
        request_id,
        created_at: Utc::now(),
        model: state.model.name().to_string(),
        rows: alignment.stats,
        predictions: stats,
        reference_records,
        timings,
        outputs: paths,
    };
    output::write_json(&summary.outputs.summary, &summary)?;

    info!(
        %request_id,
        merged_rows = summary.rows.merged_rows,
        total_ms = summary.timings.total_ms,
        output_dir = %output_dir.display(),
        "Pipeline completed"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_stats() {
        let predictions = [
            Prediction { lon: 0.0, lat: 0.0, value: 10.0 },
            Prediction { lon: 0.0, lat: 0.0, value: 30.0 },
            Prediction { lon: 0.0, lat: 0.0, value: 20.0 },
        ];
        let stats = PredictionStats::from_predictions(&predictions).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.mean, 20.0);
        assert!(PredictionStats::from_predictions(&[]).is_none());
    }
}
