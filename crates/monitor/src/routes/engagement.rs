//! Live Engagement Route

use axum::{extract::State, Json};
use engagement::EngagementSnapshot;
use std::sync::Arc;

use crate::AppState;

/// Current score and flags
pub async fn get_engagement(State(state): State<Arc<AppState>>) -> Json<EngagementSnapshot> {
    Json(state.session.read().await.snapshot())
}
