//! Classroom Engagement Monitor
//!
//! Wires the engagement engine to its two triggers (landmark frames and the
//! reporting clock) and serves live status over HTTP.

use attendance_sync::{ConfiguredSink, SyncError};
use axum::{extract::State, response::IntoResponse, routing::{get, post}, Json, Router};
use engagement::{EngagementError, EngagementSession};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use report_scheduler::{ReportScheduler, SharedSession};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::{watch, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod frames;
mod routes;

pub use config::{IdentityConfig, LogFormat, MonitorConfig};
pub use frames::{parse_frame_line, run_frame_source};

/// Monitor errors
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Engagement(#[from] EngagementError),

    #[error("Attendance sink error: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid frame: {0}")]
    Frame(String),
}

/// Application state shared across handlers
pub struct AppState {
    /// The monitored session
    pub session: SharedSession,
    /// Prometheus renderer, if a recorder was installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(session: SharedSession, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            session,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub session_active: bool,
    pub frames_processed: u64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/engagement", get(routes::engagement::get_engagement))
        .route("/api/v1/session/start", post(routes::session::start_session))
        .route("/api/v1/session/stop", post(routes::session::stop_session))
        .route("/metrics", get(routes::metrics::render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.read().await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        session_active: session.is_active(),
        frames_processed: session.frames_processed(),
    })
}

/// Initialize logging (stderr, so stdout stays free for piped output)
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), MonitorError> {
    let level: Level = level
        .parse()
        .map_err(|_| MonitorError::Config(format!("unknown log level {}", level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };
    result.map_err(|e| MonitorError::Config(e.to_string()))
}

/// Run the monitor until frame input ends or Ctrl-C
pub async fn run(config: MonitorConfig) -> Result<(), MonitorError> {
    config.validate()?;

    let mut session = EngagementSession::new(config.engagement.clone())?;
    if let Some(identity) = &config.identity {
        session.start(identity.to_identity()?);
    }
    let session: SharedSession = Arc::new(RwLock::new(session));

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics recorder not installed: {}", e);
            None
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sink = Arc::new(ConfiguredSink::connect(&config.sink)?);
    let scheduler = ReportScheduler::new(config.reporting.clone(), session.clone(), sink);
    let scheduler_task = {
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };

    let app = create_router(Arc::new(AppState::new(session.clone(), metrics)));
    let listener = tokio::net::TcpListener::bind(&config.api_addr).await?;
    info!("Status API listening on {}", config.api_addr);
    let server_task = {
        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    while !*shutdown.borrow() {
                        if shutdown.changed().await.is_err() {
                            break;
                        }
                    }
                })
                .await
        })
    };

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &config.frames_path {
        Some(path) => {
            info!("Reading frames from {}", path.display());
            Box::new(BufReader::new(tokio::fs::File::open(path).await?))
        }
        None => {
            info!("Reading frames from stdin");
            Box::new(BufReader::new(tokio::io::stdin()))
        }
    };

    let outcome = tokio::select! {
        result = run_frame_source(reader, session.clone(), shutdown_rx) => result.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    };

    let _ = shutdown_tx.send(true);
    session.write().await.stop();

    if let Err(e) = scheduler_task.await {
        warn!("Report scheduler task failed: {}", e);
    }
    match server_task.await {
        Ok(Err(e)) => warn!("Status API error: {}", e),
        Err(e) => warn!("Status API task failed: {}", e),
        Ok(Ok(())) => {}
    }

    info!("Monitor stopped");
    outcome
}
