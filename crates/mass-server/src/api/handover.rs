//! Handover notification endpoints.
//!
//! ROCs announce relinquish/takeover here; the coordinator applies them at
//! the next tick boundary. Out-of-order or mismatched messages are ignored
//! by the core without side effect, so these endpoints always accept.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use mass_core::InboundMessage;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HandoverRequest {
    pub roc_id: String,
    /// Absent on the legacy wire format
    #[serde(default)]
    pub gate_id: Option<u32>,
}

/// The current priority ROC announces readiness to relinquish.
/// POST /v1/handover/relinquish
pub async fn relinquish(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HandoverRequest>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    tracing::info!(roc = %request.roc_id, gate = ?request.gate_id, "relinquish received");
    enqueue(
        &state,
        InboundMessage::Relinquish {
            roc_id: request.roc_id,
            gate_id: request.gate_id,
        },
    )
}

/// A ROC asks to assume control.
/// POST /v1/handover/takeover
pub async fn takeover(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HandoverRequest>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    tracing::info!(roc = %request.roc_id, gate = ?request.gate_id, "takeover received");
    enqueue(
        &state,
        InboundMessage::Takeover {
            roc_id: request.roc_id,
            gate_id: request.gate_id,
        },
    )
}

fn enqueue(
    state: &AppState,
    message: InboundMessage,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    if !state.enqueue(message) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "queued" }))))
}
