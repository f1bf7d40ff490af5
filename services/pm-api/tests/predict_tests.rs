//! Request-level tests of the prediction service.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use estimator::{ModelError, ModelResult, Regressor};
use chrono::{Duration, Utc};
use pm_api::{build_router, cleanup::CleanupTask, config::ServiceConfig, state::AppState};
use pm_common::FeatureRow;
use tempfile::TempDir;
use test_utils::Scenario;
use tower::ServiceExt;

const BOUNDARY: &str = "pm25-test-boundary";

/// `10 * aod + 0.1 * PBLH`, ignoring the meteorology.
struct FixedWeights;

impl Regressor for FixedWeights {
    fn name(&self) -> &str {
        "fixed-weights"
    }

    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn check_width(&self, _width: usize) -> ModelResult<()> {
        Ok(())
    }

    fn predict(&self, rows: &[FeatureRow]) -> ModelResult<Vec<f64>> {
        Ok(rows.iter().map(|r| 10.0 * r[0] + 0.1 * r[1]).collect())
    }
}

struct Broken;

impl Regressor for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn check_width(&self, _width: usize) -> ModelResult<()> {
        Ok(())
    }

    fn predict(&self, _rows: &[FeatureRow]) -> ModelResult<Vec<f64>> {
        Err(ModelError::Inference("weights not loaded".to_string()))
    }
}

struct TestService {
    root: TempDir,
    state: Arc<AppState>,
    app: Router,
}

impl TestService {
    fn new(model: Arc<dyn Regressor>) -> Self {
        let root = tempfile::tempdir().unwrap();
        let state = AppState::new(
            model,
            ServiceConfig::default(),
            root.path().join("uploads"),
            root.path().join("static"),
        )
        .unwrap();
        let state = Arc::new(state);
        let app = build_router(state.clone());
        Self { root, state, app }
    }

    fn upload_dir(&self) -> PathBuf {
        self.root.path().join("uploads")
    }

    fn output_dir(&self) -> PathBuf {
        self.root.path().join("static")
    }

    /// Request directories created under the output root.
    fn request_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(self.output_dir())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        dirs.sort();
        dirs
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    async fn predict(&self, parts: &[Part]) -> (StatusCode, String) {
        self.send(multipart_request(parts)).await
    }
}

struct Part {
    field: &'static str,
    file_name: &'static str,
    data: Vec<u8>,
}

fn part(field: &'static str, file_name: &'static str, data: Vec<u8>) -> Part {
    Part {
        field,
        file_name,
        data,
    }
}

fn multipart_request(parts: &[Part]) -> Request<Body> {
    let mut body = Vec::new();
    for p in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                p.field, p.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(&p.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Encoded scenario files: (aod, met, pblh).
fn scenario_bytes(scenario: &Scenario) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let dir = tempfile::tempdir().unwrap();
    let files = scenario.write_to(dir.path()).unwrap();
    (
        fs::read(&files.aod).unwrap(),
        fs::read(&files.met).unwrap(),
        fs::read(&files.pblh).unwrap(),
    )
}

fn required_parts(scenario: &Scenario) -> Vec<Part> {
    let (aod, met, pblh) = scenario_bytes(scenario);
    vec![
        part("aod_file", "aod.h5", aod),
        part("met_file", "met.nc4", met),
        part("pblh_file", "pblh.nc", pblh),
    ]
}

fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn test_index_page() {
    let service = TestService::new(Arc::new(FixedWeights));
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = service.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"action="/predict""#));
    assert!(body.contains(r#"name="pblh_file""#));
}

#[tokio::test]
async fn test_health() {
    let service = TestService::new(Arc::new(FixedWeights));
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = service.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_missing_required_file_is_400_without_writes() {
    for missing in ["aod_file", "met_file", "pblh_file"] {
        let service = TestService::new(Arc::new(FixedWeights));
        let mut parts = required_parts(&Scenario::single_cell());
        parts.retain(|p| p.field != missing);

        let (status, body) = service.predict(&parts).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "without {}", missing);
        assert_eq!(body, "Missing required files");
        assert!(dir_is_empty(&service.upload_dir()), "without {}", missing);
        assert!(dir_is_empty(&service.output_dir()), "without {}", missing);
    }
}

#[tokio::test]
async fn test_part_without_file_name_counts_as_missing() {
    let service = TestService::new(Arc::new(FixedWeights));
    let mut parts = required_parts(&Scenario::single_cell());
    parts[2] = part("pblh_file", "", Vec::new());

    let (status, body) = service.predict(&parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing required files");
}

#[tokio::test]
async fn test_single_cell_end_to_end() {
    let service = TestService::new(Arc::new(FixedWeights));
    let (status, body) = service.predict(&required_parts(&Scenario::single_cell())).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let dirs = service.request_dirs();
    assert_eq!(dirs.len(), 1);
    let dir = &dirs[0];
    let request_id = dir.file_name().unwrap().to_string_lossy().into_owned();

    // 10 * 0.5 + 0.1 * 500
    let csv = fs::read_to_string(dir.join("PM_Map_Final.csv")).unwrap();
    assert_eq!(csv, "lon_aod,lat_aod,pred_pm25\n80.0,10.0,55.0\n");

    let png = fs::read(dir.join("PM_Map_1deg.png")).unwrap();
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("run.json")).unwrap()).unwrap();
    assert_eq!(summary["rows"]["merged_rows"], 1);
    assert_eq!(summary["model"], "fixed-weights");
    assert_eq!(summary["predictions"]["max"], 55.0);

    assert!(!dir.join("CPCB_Uploaded.csv").exists());
    assert!(dir_is_empty(&service.upload_dir()));
    assert!(body.contains(&format!("/static/{}/PM_Map_1deg.png", request_id)));
}

#[tokio::test]
async fn test_outputs_are_served_under_static() {
    let service = TestService::new(Arc::new(FixedWeights));
    let (status, _) = service.predict(&required_parts(&Scenario::single_cell())).await;
    assert_eq!(status, StatusCode::OK);

    let dir = &service.request_dirs()[0];
    let id = dir.file_name().unwrap().to_string_lossy().into_owned();
    let request = Request::builder()
        .uri(format!("/static/{}/PM_Map_Final.csv", id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = service.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("lon_aod,lat_aod,pred_pm25\n"));
}

#[tokio::test]
async fn test_identical_inputs_give_identical_csv() {
    let service = TestService::new(Arc::new(FixedWeights));
    let scenario = Scenario::regional();

    for _ in 0..2 {
        let (status, body) = service.predict(&required_parts(&scenario)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    let dirs = service.request_dirs();
    assert_eq!(dirs.len(), 2);
    let first = fs::read(dirs[0].join("PM_Map_Final.csv")).unwrap();
    let second = fs::read(dirs[1].join("PM_Map_Final.csv")).unwrap();
    assert_eq!(first, second);
    // header plus the five cells present in all three grids
    assert_eq!(String::from_utf8(first).unwrap().lines().count(), 6);
}

#[tokio::test]
async fn test_reference_table_is_copied() {
    let service = TestService::new(Arc::new(FixedWeights));
    let table = b"station,lat,lon,pm25\nSite A,10.0,80.0,61\n".to_vec();
    let mut parts = required_parts(&Scenario::single_cell());
    parts.push(part("cpcb_file", "cpcb.csv", table.clone()));

    let (status, body) = service.predict(&parts).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let dir = &service.request_dirs()[0];
    assert_eq!(fs::read(dir.join("CPCB_Uploaded.csv")).unwrap(), table);
    assert!(body.contains("CPCB_Uploaded.csv"));
}

#[tokio::test]
async fn test_unreadable_grid_is_500() {
    let service = TestService::new(Arc::new(FixedWeights));
    let mut parts = required_parts(&Scenario::single_cell());
    parts[0] = part("aod_file", "aod.h5", b"definitely not hdf5".to_vec());

    let (status, body) = service.predict(&parts).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("An error occurred: failed to decode aod"), "{}", body);
    assert!(dir_is_empty(&service.upload_dir()));
    assert!(dir_is_empty(&service.output_dir()));
}

#[tokio::test]
async fn test_disjoint_grids_are_500() {
    let service = TestService::new(Arc::new(FixedWeights));
    let mut scenario = Scenario::single_cell();
    scenario.met.lat = vec![20.0];

    let (status, body) = service.predict(&required_parts(&scenario)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("no grid cells left after joining"), "{}", body);
    assert!(dir_is_empty(&service.output_dir()));
}

#[tokio::test]
async fn test_model_failure_is_500() {
    let service = TestService::new(Arc::new(Broken));
    let (status, body) = service.predict(&required_parts(&Scenario::single_cell())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        "An error occurred: model invocation failed: weights not loaded"
    );
    assert!(dir_is_empty(&service.output_dir()));
}

#[tokio::test]
async fn test_retention_sweep_removes_finished_requests() {
    let service = TestService::new(Arc::new(FixedWeights));
    let (status, _) = service.predict(&required_parts(&Scenario::single_cell())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(service.request_dirs().len(), 1);

    let task = CleanupTask::new(&service.state);
    let kept = task.sweep_before(Utc::now() - Duration::hours(1));
    assert_eq!(kept.dirs_removed, 0);
    assert_eq!(service.request_dirs().len(), 1);

    let swept = task.sweep_before(Utc::now() + Duration::minutes(1));
    assert_eq!(swept.dirs_removed, 1);
    assert!(dir_is_empty(&service.output_dir()));
}
