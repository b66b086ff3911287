//! Core data models for the vessel / ROC handover system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational state of the vessel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationalState {
    /// Free to make way at the commanded speed
    #[default]
    #[serde(rename = "go")]
    Go,
    /// Ordered (or forced by a gate) to stop
    #[serde(rename = "no-go")]
    NoGo,
}

impl OperationalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationalState::Go => "go",
            OperationalState::NoGo => "no-go",
        }
    }
}

impl std::fmt::Display for OperationalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registrar data for the simulated vessel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselIdentity {
    pub name: String,
    pub mmsi_number: u32,
    pub imo_number: u32,
    /// Gross tonnage; drives default accel/decel rates
    pub tonnage: f64,
    pub length_m: f64,
}

/// Mutable navigation + authority state of the single simulated vessel.
///
/// Owned exclusively by the tick loop; everything else sees snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselState {
    pub identity: VesselIdentity,
    pub lat: f64,
    pub lon: f64,
    /// Actual course over ground, degrees [0, 360)
    pub cog_deg: f64,
    /// Actual speed over ground, knots (never negative)
    pub sog_knots: f64,
    /// Last commanded course; heading converges toward this
    pub commanded_cog_deg: f64,
    /// Last commanded speed; throttle converges toward this while in `go`
    pub commanded_sog_knots: f64,
    pub state: OperationalState,
    /// The single ROC whose commands are currently honored
    pub priority_roc: String,
    /// Gate of the most recent in-flight handover session, if any
    pub active_gate: Option<u32>,
}

/// A geofenced trigger zone requiring the vessel to stop and potentially
/// change controlling ROC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyGate {
    pub id: u32,
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
    pub active: bool,
    /// Time-to-gate threshold that arms a handover, seconds
    pub threshold_secs: f64,
}

/// A control command, fully tagged with its sending ROC.
///
/// Legacy (non-ROC-qualified) commands are tagged with the current
/// priority ROC before they reach the arbiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub roc_id: String,
    #[serde(flatten)]
    pub body: CommandBody,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value")]
pub enum CommandBody {
    #[serde(rename = "COG")]
    Cog(f64),
    #[serde(rename = "SOG")]
    Sog(f64),
    #[serde(rename = "state")]
    State(OperationalState),
    #[serde(rename = "gate-status")]
    GateStatus { gate_id: u32, active: bool },
}

impl CommandBody {
    /// Wire name of the targeted field, used in rejection events.
    pub fn field_name(&self) -> &'static str {
        match self {
            CommandBody::Cog(_) => "COG",
            CommandBody::Sog(_) => "SOG",
            CommandBody::State(_) => "state",
            CommandBody::GateStatus { .. } => "gate-status",
        }
    }
}

/// Messages crossing the transport → tick-loop boundary.
///
/// Queued by the transport layer, drained at tick boundaries.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    Command {
        /// `None` marks a legacy command; it is tagged with the current
        /// priority ROC when drained.
        roc_id: Option<String>,
        body: CommandBody,
        received_at: DateTime<Utc>,
    },
    Relinquish {
        roc_id: String,
        /// Absent on the legacy wire format; routed to the single
        /// in-flight session when there is exactly one.
        gate_id: Option<u32>,
    },
    Takeover {
        roc_id: String,
        gate_id: Option<u32>,
    },
}

/// Broadcasts emitted by the core for the transport layer to publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VesselEvent {
    ReadyForHandover {
        gate_id: u32,
        time_to_gate_secs: f64,
        current_roc: String,
        timestamp: DateTime<Utc>,
    },
    HandoverCompleted {
        gate_id: u32,
        new_priority: String,
        timestamp: DateTime<Utc>,
    },
    HandoverAborted {
        gate_id: u32,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    CommandRejected {
        roc_id: String,
        field: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

// ========== PER-TICK OUTPUT FRAMES ==========

/// Navigation state published once per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavFrame {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub cog_deg: f64,
    pub sog_knots: f64,
    pub state: OperationalState,
    pub priority_roc: String,
    pub timestamp: DateTime<Utc>,
}

/// Gate geometry plus the timing computed on the current tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSnapshot {
    pub gate_id: u32,
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
    pub active: bool,
    /// `None` when the gate is not on the current course or speed is zero
    pub time_to_gate_secs: Option<f64>,
    pub inside: bool,
}

/// One known ROC entity and whether it currently holds priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RocEntity {
    pub roc_id: String,
    pub has_priority: bool,
}

/// Everything the core emits for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub nav: NavFrame,
    pub identity: VesselIdentity,
    pub gates: Vec<GateSnapshot>,
    pub rocs: Vec<RocEntity>,
    /// Human-readable remote status line
    pub status_text: String,
    pub events: Vec<VesselEvent>,
}

/// Read-only snapshot for plotting consumers: position history, gate list
/// and the current status string. No feedback into the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub name: String,
    /// Traversed positions as [lat, lon] pairs, oldest first
    pub track: Vec<[f64; 2]>,
    pub gates: Vec<SafetyGate>,
    pub status_text: String,
}

/// Frame union carried on the outbound stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    NavStatus(NavFrame),
    RemoteStatus {
        text: String,
        timestamp: DateTime<Utc>,
    },
    Broadcast(VesselEvent),
}
