//! Output artifacts of one request.
//!
//! Every file is written to a temporary file in its destination directory
//! and renamed into place, so readers only ever see complete files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use pm_common::{PipelineError, PipelineResult, Prediction};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub const PREDICTIONS_CSV: &str = "PM_Map_Final.csv";
pub const PLOT_PNG: &str = "PM_Map_1deg.png";
pub const REFERENCE_CSV: &str = "CPCB_Uploaded.csv";
pub const SUMMARY_JSON: &str = "run.json";

/// Where one request's outputs live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub predictions: PathBuf,
    pub plot: PathBuf,
    pub reference: Option<PathBuf>,
    pub summary: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: &Path, with_reference: bool) -> Self {
        Self {
            dir: dir.to_path_buf(),
            predictions: dir.join(PREDICTIONS_CSV),
            plot: dir.join(PLOT_PNG),
            reference: with_reference.then(|| dir.join(REFERENCE_CSV)),
            summary: dir.join(SUMMARY_JSON),
        }
    }
}

fn output_error(path: &Path, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::output(path.display().to_string(), err.to_string())
}

/// Create the output directory of a request.
pub fn create_dir(dir: &Path) -> PipelineResult<()> {
    fs::create_dir_all(dir).map_err(|e| output_error(dir, e))
}

/// Remove what a failed run left in its output directory.
pub fn discard_dir(dir: &Path) {
    match fs::remove_dir_all(dir) {
        Ok(()) => debug!(dir = %dir.display(), "Removed output directory of failed run"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to remove output directory"),
    }
}

/// Write `path` through a same-directory temporary file and rename.
pub fn write_atomic<F>(path: &Path, write: F) -> PipelineResult<()>
where
    F: FnOnce(&mut NamedTempFile) -> PipelineResult<()>,
{
    let dir = path
        .parent()
        .ok_or_else(|| output_error(path, "path has no parent directory"))?;
    fs::create_dir_all(dir).map_err(|e| output_error(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| output_error(path, e))?;
    write(&mut tmp)?;
    tmp.as_file().sync_all().map_err(|e| output_error(path, e))?;
    tmp.persist(path).map_err(|e| output_error(path, e.error))?;
    Ok(())
}

/// `lon_aod,lat_aod,pred_pm25`, one row per prediction.
pub fn write_predictions_csv(path: &Path, predictions: &[Prediction]) -> PipelineResult<()> {
    write_atomic(path, |tmp| {
        let mut writer = csv::Writer::from_writer(tmp);
        if predictions.is_empty() {
            writer
                .write_record(["lon_aod", "lat_aod", "pred_pm25"])
                .map_err(|e| output_error(path, e))?;
        }
        for p in predictions {
            writer.serialize(p).map_err(|e| output_error(path, e))?;
        }
        writer.flush().map_err(|e| output_error(path, e))
    })?;
    debug!(path = %path.display(), rows = predictions.len(), "Wrote predictions CSV");
    Ok(())
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> PipelineResult<()> {
    write_atomic(path, |tmp| {
        tmp.write_all(bytes).map_err(|e| output_error(path, e))
    })
}

/// Copy a CSV table record by record, without interpreting its columns.
///
/// Ragged rows are kept as they are. Returns the number of records,
/// header included.
pub fn copy_reference_csv(src: &Path, dst: &Path) -> PipelineResult<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(src)
        .map_err(|e| PipelineError::decode("cpcb", e.to_string()))?;

    let mut count = 0;
    write_atomic(dst, |tmp| {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(tmp);
        for record in reader.byte_records() {
            let record = record.map_err(|e| PipelineError::decode("cpcb", e.to_string()))?;
            writer
                .write_byte_record(&record)
                .map_err(|e| output_error(dst, e))?;
            count += 1;
        }
        writer.flush().map_err(|e| output_error(dst, e))
    })?;
    debug!(path = %dst.display(), records = count, "Copied reference table");
    Ok(count)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    write_atomic(path, |tmp| {
        serde_json::to_writer_pretty(&mut *tmp, value)?;
        tmp.write_all(b"\n").map_err(|e| output_error(path, e))
    })
}
