//! Prometheus exposition

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::AppState;

pub async fn render_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
