//! Multipart upload handling.
//!
//! Parts are buffered fully before anything touches the disk, so a request
//! missing a required file leaves no trace.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use bytes::Bytes;
use pm_common::{GridKind, PipelineError, PipelineResult};
use tracing::{debug, warn};

pub const AOD_FIELD: &str = "aod_file";
pub const MET_FIELD: &str = "met_file";
pub const PBLH_FIELD: &str = "pblh_file";
pub const CPCB_FIELD: &str = "cpcb_file";

const REQUIRED_FIELDS: [&str; 3] = [AOD_FIELD, MET_FIELD, PBLH_FIELD];

/// One uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// The files of one prediction request.
#[derive(Debug, Clone)]
pub struct PredictUpload {
    pub aod: UploadedFile,
    pub met: UploadedFile,
    pub pblh: UploadedFile,
    /// Optional CPCB station table
    pub cpcb: Option<UploadedFile>,
}

impl PredictUpload {
    /// Pick the known fields out of the submitted parts.
    ///
    /// Fails with the names of every missing required field.
    pub fn from_parts(mut parts: HashMap<String, UploadedFile>) -> PipelineResult<Self> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|f| !parts.contains_key(**f))
            .map(|f| f.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingInput(missing));
        }

        let cpcb = parts.remove(CPCB_FIELD);
        let mut take = |name: &str| {
            parts
                .remove(name)
                .ok_or_else(|| PipelineError::MissingInput(vec![name.to_string()]))
        };
        Ok(Self {
            aod: take(AOD_FIELD)?,
            met: take(MET_FIELD)?,
            pblh: take(PBLH_FIELD)?,
            cpcb,
        })
    }

    /// Total buffered bytes.
    pub fn size(&self) -> usize {
        [&self.aod, &self.met, &self.pblh]
            .into_iter()
            .chain(self.cpcb.as_ref())
            .map(|f| f.data.len())
            .sum()
    }

    /// Write the files into `dir` under fixed names.
    ///
    /// The returned guard removes `dir` when dropped.
    pub fn save(&self, dir: &Path) -> PipelineResult<InputFiles> {
        fs::create_dir_all(dir)?;
        let inputs = InputFiles {
            dir: dir.to_path_buf(),
            aod: dir.join("aod.h5"),
            met: dir.join("met.nc4"),
            pblh: dir.join("pblh.nc"),
            cpcb: self.cpcb.as_ref().map(|_| dir.join("cpcb.csv")),
        };

        fs::write(&inputs.aod, &self.aod.data)?;
        fs::write(&inputs.met, &self.met.data)?;
        fs::write(&inputs.pblh, &self.pblh.data)?;
        if let (Some(file), Some(path)) = (&self.cpcb, &inputs.cpcb) {
            fs::write(path, &file.data)?;
        }

        debug!(dir = %dir.display(), bytes = self.size(), "Saved uploaded files");
        Ok(inputs)
    }
}

/// Per-request input paths. Removes its directory on drop.
#[derive(Debug)]
pub struct InputFiles {
    pub dir: PathBuf,
    pub aod: PathBuf,
    pub met: PathBuf,
    pub pblh: PathBuf,
    pub cpcb: Option<PathBuf>,
}

impl InputFiles {
    pub fn grid(&self, kind: GridKind) -> &Path {
        match kind {
            GridKind::Aod => &self.aod,
            GridKind::Met => &self.met,
            GridKind::Pblh => &self.pblh,
        }
    }
}

impl Drop for InputFiles {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "Failed to remove upload directory");
        }
    }
}

/// Buffer every file part of a multipart body.
///
/// Parts without a file name (unselected inputs in a browser form) are
/// skipped, as are non-file fields.
pub async fn read_multipart(mut multipart: Multipart) -> PipelineResult<PredictUpload> {
    let mut parts = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::decode("upload", e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| PipelineError::decode("upload", e.to_string()))?;

        if file_name.is_empty() {
            debug!(field = %name, "Skipping part without a file name");
            continue;
        }
        debug!(field = %name, file_name = %file_name, bytes = data.len(), "Received upload");
        parts.insert(name, UploadedFile { file_name, data });
    }

    PredictUpload::from_parts(parts)
}
