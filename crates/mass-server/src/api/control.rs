//! Control command endpoints.
//!
//! Both the legacy (non-ROC-qualified) and ROC-qualified forms feed the
//! same queue; legacy commands are left untagged and act as the current
//! priority ROC when drained. Payloads are parsed into tagged command
//! variants here, at the transport boundary.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use mass_core::{CommandBody, InboundMessage};

use crate::state::AppState;
use crate::wire;

/// Issue a legacy control command.
/// POST /v1/control/{field}
pub async fn legacy_command(
    State(state): State<Arc<AppState>>,
    Path(field): Path<String>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    submit(&state, None, &field, &payload)
}

/// Issue a ROC-qualified control command.
/// POST /v1/control/roc/{roc_id}/{field}
pub async fn roc_command(
    State(state): State<Arc<AppState>>,
    Path((roc_id, field)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    submit(&state, Some(roc_id), &field, &payload)
}

fn submit(
    state: &AppState,
    roc_id: Option<String>,
    field: &str,
    payload: &Value,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let body = parse_body(field, payload).ok_or(StatusCode::BAD_REQUEST)?;

    tracing::debug!(field, roc = roc_id.as_deref().unwrap_or("<legacy>"), "command received");

    if !state.enqueue(InboundMessage::Command {
        roc_id,
        body,
        received_at: Utc::now(),
    }) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "queued" }))))
}

/// Decode one `{ "value": ... }` payload for a target field.
fn parse_body(field: &str, payload: &Value) -> Option<CommandBody> {
    let value = payload.get("value")?;
    match field {
        "cog" | "COG" => Some(CommandBody::Cog(value.as_f64()?)),
        "sog" | "SOG" => Some(CommandBody::Sog(value.as_f64()?)),
        "state" => wire::parse_state(value.as_str()?).map(CommandBody::State),
        "gate-status" => {
            let (gate_id, active) = wire::parse_gate_toggle(value.as_str()?)?;
            Some(CommandBody::GateStatus { gate_id, active })
        }
        _ => None,
    }
}
