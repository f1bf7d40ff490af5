//! Retention sweep for per-request directories.
//!
//! Every request writes under `<root>/<request_id>/`. A background task
//! removes request directories older than the configured retention from the
//! upload and output roots. Other entries in those roots are left alone.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::RetentionConfig;
use crate::state::AppState;

/// Statistics from one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupStats {
    /// Request directories removed
    pub dirs_removed: u64,
    /// Request directories that could not be removed
    pub delete_errors: u64,
}

impl CleanupStats {
    fn add(&mut self, other: CleanupStats) {
        self.dirs_removed += other.dirs_removed;
        self.delete_errors += other.delete_errors;
    }
}

/// Remove request directories under `root` last modified before `cutoff`.
pub fn sweep_expired(root: &Path, cutoff: DateTime<Utc>) -> CleanupStats {
    let mut stats = CleanupStats::default();

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %root.display(), error = %e, "Nothing to sweep");
            return stats;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_request_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| Uuid::parse_str(name).is_ok());
        if !is_request_dir {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(time) => DateTime::<Utc>::from(time),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read directory age");
                continue;
            }
        };
        if modified >= cutoff {
            continue;
        }

        match fs::remove_dir_all(&path) {
            Ok(()) => {
                debug!(path = %path.display(), modified = %modified, "Removed expired request directory");
                stats.dirs_removed += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove request directory");
                stats.delete_errors += 1;
            }
        }
    }

    stats
}

/// Background retention task.
#[derive(Debug, Clone)]
pub struct CleanupTask {
    roots: Vec<PathBuf>,
    config: RetentionConfig,
}

impl CleanupTask {
    pub fn new(state: &AppState) -> Self {
        Self {
            roots: vec![state.output_dir.clone(), state.upload_dir.clone()],
            config: state.config.retention.clone(),
        }
    }

    /// Sweep every root with an explicit cutoff.
    pub fn sweep_before(&self, cutoff: DateTime<Utc>) -> CleanupStats {
        let mut stats = CleanupStats::default();
        for root in &self.roots {
            stats.add(sweep_expired(root, cutoff));
        }
        stats
    }

    /// Sweep every root with the configured retention.
    pub fn run_once(&self) -> CleanupStats {
        let cutoff = Utc::now() - Duration::hours(i64::from(self.config.hours));
        let stats = self.sweep_before(cutoff);
        info!(
            cutoff = %cutoff,
            removed = stats.dirs_removed,
            errors = stats.delete_errors,
            "Cleanup cycle complete"
        );
        stats
    }

    /// Run the sweep on a fixed interval. Returns at once when disabled.
    pub async fn run_forever(self) {
        if !self.config.enabled {
            info!("Cleanup task disabled");
            return;
        }

        info!(
            retention_hours = self.config.hours,
            interval_secs = self.config.interval_secs,
            "Starting cleanup background task"
        );

        // The first tick completes immediately, so a sweep runs at startup.
        let mut ticker = interval(TokioDuration::from_secs(self.config.interval_secs));
        loop {
            ticker.tick().await;
            let task = self.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || task.run_once()).await {
                error!(error = %e, "Cleanup cycle failed");
            }
        }
    }
}
