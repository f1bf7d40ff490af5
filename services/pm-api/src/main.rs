//! PM2.5 estimation service.
//!
//! Serves the upload form and runs one extract → align → predict → render
//! cycle per `POST /predict`.

use anyhow::{Context, Result};
use clap::Parser;
use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pm_api::{build_router, cleanup::CleanupTask, config::ServiceConfig, state::AppState};

#[derive(Parser, Debug)]
#[command(name = "pm-api")]
#[command(about = "PM2.5 estimation from AOD, meteorology and boundary layer grids")]
struct Args {
    /// Listen address
    #[arg(short, long, env = "PM_LISTEN", default_value = "0.0.0.0:5000")]
    listen: String,

    /// JSON model artifact
    #[arg(long, env = "PM_MODEL_PATH", default_value = "model_pm25.json")]
    model_path: PathBuf,

    /// Root directory for per-request uploads
    #[arg(long, env = "PM_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Root directory for per-request outputs, served under /static
    #[arg(long, env = "PM_OUTPUT_DIR", default_value = "static")]
    output_dir: PathBuf,

    /// Optional YAML file with source, join and plot settings
    #[arg(short, long, env = "PM_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum request body size in bytes
    #[arg(long, env = "PM_MAX_UPLOAD_BYTES", default_value_t = pm_api::state::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Hours a request's files are kept (overrides `retention.hours`)
    #[arg(long, env = "PM_RETENTION_HOURS")]
    retention_hours: Option<u32>,

    /// Seconds between retention sweeps (overrides `retention.interval_secs`)
    #[arg(long, env = "PM_CLEANUP_INTERVAL_SECS")]
    cleanup_interval_secs: Option<u64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long)]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    } else if let Ok(threads_str) = env::var("TOKIO_WORKER_THREADS") {
        if let Ok(threads) = threads_str.parse::<usize>() {
            runtime_builder.worker_threads(threads);
        }
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))?;
    Ok(())
}

async fn async_main(args: Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // HDF5 prints handled errors to stderr otherwise
    netcdf_parser::silence_hdf5_errors();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    info!("Prometheus metrics exporter initialized");
    info!("Starting PM2.5 estimation service");

    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(hours) = args.retention_hours {
        config.retention.hours = hours;
    }
    if let Some(secs) = args.cleanup_interval_secs {
        config.retention.interval_secs = secs;
    }

    let model = estimator::load_model(&args.model_path)
        .with_context(|| format!("Failed to load model from {}", args.model_path.display()))?;

    let state = AppState::new(Arc::new(model), config, &args.upload_dir, &args.output_dir)?
        .with_max_upload_bytes(args.max_upload_bytes)
        .with_prometheus(prometheus_handle);

    let state = Arc::new(state);
    tokio::spawn(CleanupTask::new(&state).run_forever());

    let app = build_router(state);

    let addr: SocketAddr = args.listen.parse()?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
