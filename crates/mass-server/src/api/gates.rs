//! Safety-gate read endpoints. Gate toggles ride the control endpoint as
//! `gate-status` commands.

use axum::{extract::State, Json};
use std::sync::Arc;

use mass_core::GateSnapshot;

use crate::state::AppState;

/// List all gates with the timing computed on the latest tick.
/// GET /v1/gates
pub async fn list_gates(State(state): State<Arc<AppState>>) -> Json<Vec<GateSnapshot>> {
    Json(state.report().gates.clone())
}
