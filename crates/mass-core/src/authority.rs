//! Command-authority arbitration.
//!
//! Exactly one ROC holds priority at any time; only its commands mutate the
//! vessel. Everything else is rejected as a recorded event, not an error:
//! competing ROCs are expected traffic, not faults.

use std::fmt;

use crate::gates::GateRegistry;
use crate::models::{Command, CommandBody, OperationalState, VesselState};
use crate::spatial;

/// Why a command was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Sender does not hold priority
    NotPriority { priority_roc: String },
    /// SOG command while the vessel is held in `no-go`
    SpeedLockedOut,
    /// Non-finite numeric value
    NotFinite,
    /// Negative speed
    NegativeSpeed,
    /// `gate-status` names a gate that does not exist
    UnknownGate(u32),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotPriority { priority_roc } => {
                write!(f, "sender is not the priority ROC ({priority_roc})")
            }
            RejectReason::SpeedLockedOut => write!(f, "SOG is locked out while in no-go"),
            RejectReason::NotFinite => write!(f, "value is not a finite number"),
            RejectReason::NegativeSpeed => write!(f, "speed must not be negative"),
            RejectReason::UnknownGate(id) => write!(f, "unknown gate {id}"),
        }
    }
}

/// Validates and applies control commands against the current priority ROC.
///
/// Holds no state of its own; the priority ROC id lives on the vessel and
/// only [`AuthorityArbiter::set_priority`] (called by the handover
/// coordinator on completion) may move it.
#[derive(Debug, Clone, Default)]
pub struct AuthorityArbiter;

impl AuthorityArbiter {
    /// Apply `command` to the vessel if its sender currently holds
    /// priority and the value is well-formed.
    pub fn submit(
        &self,
        vessel: &mut VesselState,
        gates: &mut GateRegistry,
        command: &Command,
    ) -> Result<(), RejectReason> {
        if command.roc_id != vessel.priority_roc {
            return Err(RejectReason::NotPriority {
                priority_roc: vessel.priority_roc.clone(),
            });
        }

        match &command.body {
            CommandBody::Cog(value) => {
                if !value.is_finite() {
                    return Err(RejectReason::NotFinite);
                }
                vessel.commanded_cog_deg = spatial::normalize_course_deg(*value);
            }
            CommandBody::Sog(value) => {
                if !value.is_finite() {
                    return Err(RejectReason::NotFinite);
                }
                if *value < 0.0 {
                    return Err(RejectReason::NegativeSpeed);
                }
                if vessel.state == OperationalState::NoGo {
                    return Err(RejectReason::SpeedLockedOut);
                }
                vessel.commanded_sog_knots = *value;
            }
            CommandBody::State(state) => {
                vessel.state = *state;
            }
            CommandBody::GateStatus { gate_id, active } => {
                if !gates.set_active(*gate_id, *active) {
                    return Err(RejectReason::UnknownGate(*gate_id));
                }
                tracing::info!(
                    gate_id = *gate_id,
                    active = *active,
                    roc = %command.roc_id,
                    "gate toggled"
                );
            }
        }

        Ok(())
    }

    /// Move priority to `roc_id`. Only the handover coordinator calls this,
    /// on completion; it is never reachable from a command.
    pub(crate) fn set_priority(vessel: &mut VesselState, roc_id: &str) {
        vessel.priority_roc = roc_id.to_string();
    }
}
