//! Route table for the vessel server.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

use super::{control, gates, handover, vessel};

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/vessel", get(vessel::get_vessel))
        .route("/v1/track", get(vessel::get_track))
        .route("/v1/gates", get(gates::list_gates))
        .route("/v1/control/:field", post(control::legacy_command))
        .route("/v1/control/roc/:roc_id/:field", post(control::roc_command))
        .route("/v1/handover/relinquish", post(handover::relinquish))
        .route("/v1/handover/takeover", post(handover::takeover))
}
