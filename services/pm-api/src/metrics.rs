//! Prometheus metrics for prediction requests.

use std::time::Duration;

use metrics::{counter, histogram};

pub const REQUESTS_TOTAL: &str = "pm_predict_requests_total";
pub const PIPELINE_DURATION: &str = "pm_pipeline_duration_seconds";
pub const MERGED_ROWS: &str = "pm_merged_rows";

/// Count a finished `/predict` request. `outcome` is `ok` or an error kind.
pub fn record_request(outcome: &'static str) {
    counter!(REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_pipeline(duration: Duration, merged_rows: usize) {
    histogram!(PIPELINE_DURATION).record(duration.as_secs_f64());
    histogram!(MERGED_ROWS).record(merged_rows as f64);
}
