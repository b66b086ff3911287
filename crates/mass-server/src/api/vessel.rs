//! Vessel snapshot endpoints.

use axum::{extract::State, Json};
use std::sync::Arc;

use mass_core::{TickReport, TrackSnapshot};

use crate::state::AppState;

/// Latest tick report: nav state, gates, roster and status string.
/// GET /v1/vessel
pub async fn get_vessel(State(state): State<Arc<AppState>>) -> Json<TickReport> {
    Json(state.report().as_ref().clone())
}

/// Read-only plotting snapshot: position history, gates, status string.
/// GET /v1/track
pub async fn get_track(State(state): State<Arc<AppState>>) -> Json<TrackSnapshot> {
    Json(state.track().as_ref().clone())
}
