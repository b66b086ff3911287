//! Parsing of string-encoded legacy payloads at the transport boundary.
//!
//! The core never inspects raw strings; everything is turned into a tagged
//! command variant here.

use mass_core::OperationalState;

/// Parse a `"go"` / `"no-go"` state payload.
pub fn parse_state(payload: &str) -> Option<OperationalState> {
    match payload.trim() {
        "go" => Some(OperationalState::Go),
        "no-go" => Some(OperationalState::NoGo),
        _ => None,
    }
}

/// Parse the legacy `"<gate_id> <0|1>"` gate toggle payload.
pub fn parse_gate_toggle(payload: &str) -> Option<(u32, bool)> {
    let mut parts = payload.split_whitespace();
    let gate_id = parts.next()?.parse().ok()?;
    let active = match parts.next()? {
        "0" => false,
        "1" => true,
        _ => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((gate_id, active))
}
