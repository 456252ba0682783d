//! Session Routes

use axum::{extract::State, http::StatusCode, Json};
use engagement::{EngagementSnapshot, SessionIdentity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::AppState;

/// Body for the start endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub class_code: String,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

/// Response for the stop endpoint
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub status: String,
    pub was_active: bool,
    pub final_score: f64,
}

/// Start (or restart) monitoring
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<EngagementSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    let identity = SessionIdentity::new(&request.student_name, &request.class_code).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                status: "error".to_string(),
                message: e.to_string(),
            }),
        )
    })?;

    let mut session = state.session.write().await;
    session.start(identity);
    Ok(Json(session.snapshot()))
}

/// Stop monitoring; reporting pauses until the next start
pub async fn stop_session(State(state): State<Arc<AppState>>) -> Json<StopResponse> {
    let mut session = state.session.write().await;
    let was_active = session.stop().is_some();
    if !was_active {
        info!("Stop requested with no active session");
    }

    Json(StopResponse {
        status: "ok".to_string(),
        was_active,
        final_score: session.score(),
    })
}
