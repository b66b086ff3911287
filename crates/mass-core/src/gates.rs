//! Safety-gate registry: geometry, timing and proximity signals.

use crate::models::{GateSnapshot, OperationalState, SafetyGate, VesselState};
use crate::spatial;

/// Default proximity threshold: 15 minutes.
pub const DEFAULT_THRESHOLD_SECS: f64 = 900.0;

#[derive(Debug, Clone)]
struct GateRecord {
    gate: SafetyGate,
    /// Set when the begin-handover signal for the current approach has
    /// fired; cleared by a session abort or manual reactivation.
    handover_initiated: bool,
}

/// Timing computed for one active gate on the current tick.
#[derive(Debug, Clone)]
pub struct GateApproach {
    pub gate_id: u32,
    pub time_to_gate_secs: Option<f64>,
    pub inside: bool,
}

/// A gate's proximity threshold was crossed; a handover must start.
#[derive(Debug, Clone, PartialEq)]
pub struct BeginHandover {
    pub gate_id: u32,
    pub time_to_gate_secs: f64,
}

/// Result of one evaluation pass over all gates.
#[derive(Debug, Clone, Default)]
pub struct GateEvaluation {
    pub approaches: Vec<GateApproach>,
    pub begin_handover: Vec<BeginHandover>,
}

impl GateEvaluation {
    /// Soonest reachable gate, for the status line.
    pub fn closest_approach(&self) -> Option<&GateApproach> {
        self.approaches
            .iter()
            .filter(|a| a.time_to_gate_secs.is_some())
            .min_by(|a, b| {
                let ta = a.time_to_gate_secs.unwrap_or(f64::INFINITY);
                let tb = b.time_to_gate_secs.unwrap_or(f64::INFINITY);
                ta.partial_cmp(&tb).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    pub fn inside_any(&self) -> bool {
        self.approaches.iter().any(|a| a.inside)
    }
}

/// Holds gate geometry/state; computes time-to-gate and crossing events.
#[derive(Debug, Clone)]
pub struct GateRegistry {
    gates: Vec<GateRecord>,
}

impl GateRegistry {
    pub fn new(gates: Vec<SafetyGate>) -> Self {
        Self {
            gates: gates
                .into_iter()
                .map(|gate| GateRecord {
                    gate,
                    handover_initiated: false,
                })
                .collect(),
        }
    }

    /// Evaluate all active gates against the vessel.
    ///
    /// Forces `no-go` while the vessel is inside an active gate's radius.
    /// Emits a begin-handover signal the first time a gate's time-to-gate
    /// drops to or below its threshold while approaching; the signal fires
    /// once per approach.
    pub fn evaluate(&mut self, vessel: &mut VesselState) -> GateEvaluation {
        let mut evaluation = GateEvaluation::default();

        for record in self.gates.iter_mut().filter(|r| r.gate.active) {
            let gate = &record.gate;
            let inside =
                spatial::haversine_distance(vessel.lat, vessel.lon, gate.lat, gate.lon)
                    <= gate.radius_m;
            let time_to_gate = if inside {
                Some(0.0)
            } else {
                spatial::time_to_circle(
                    vessel.lat,
                    vessel.lon,
                    vessel.cog_deg,
                    vessel.sog_knots,
                    gate.lat,
                    gate.lon,
                    gate.radius_m,
                )
            };

            if inside {
                vessel.state = OperationalState::NoGo;
            }

            if let Some(t) = time_to_gate {
                if t > 0.0 && t <= gate.threshold_secs && !record.handover_initiated {
                    record.handover_initiated = true;
                    evaluation.begin_handover.push(BeginHandover {
                        gate_id: gate.id,
                        time_to_gate_secs: t,
                    });
                }
            }

            evaluation.approaches.push(GateApproach {
                gate_id: gate.id,
                time_to_gate_secs: time_to_gate,
                inside,
            });
        }

        evaluation
    }

    /// Deactivate a gate. Idempotent: deactivating an inactive or unknown
    /// gate is a no-op. Returns whether the gate was active.
    pub fn deactivate(&mut self, gate_id: u32) -> bool {
        match self.record_mut(gate_id) {
            Some(record) if record.gate.active => {
                record.gate.active = false;
                true
            }
            _ => false,
        }
    }

    /// Manual gate toggle. Reactivation re-arms the handover trigger.
    /// Returns false for an unknown gate id.
    pub fn set_active(&mut self, gate_id: u32, active: bool) -> bool {
        let Some(record) = self.record_mut(gate_id) else {
            return false;
        };
        if active && !record.gate.active {
            record.handover_initiated = false;
        }
        record.gate.active = active;
        true
    }

    /// Re-arm a gate's handover trigger after a session abort so a later
    /// approach can trigger again.
    pub fn reset_handover_flag(&mut self, gate_id: u32) {
        if let Some(record) = self.record_mut(gate_id) {
            record.handover_initiated = false;
        }
    }

    pub fn gate(&self, gate_id: u32) -> Option<&SafetyGate> {
        self.gates
            .iter()
            .map(|r| &r.gate)
            .find(|g| g.id == gate_id)
    }

    pub fn gates(&self) -> Vec<SafetyGate> {
        self.gates.iter().map(|r| r.gate.clone()).collect()
    }

    /// Merge gate geometry with the current tick's timing into snapshots.
    /// Inactive gates are reported with no timing.
    pub fn snapshots(&self, evaluation: &GateEvaluation) -> Vec<GateSnapshot> {
        self.gates
            .iter()
            .map(|record| {
                let approach = evaluation
                    .approaches
                    .iter()
                    .find(|a| a.gate_id == record.gate.id);
                GateSnapshot {
                    gate_id: record.gate.id,
                    lat: record.gate.lat,
                    lon: record.gate.lon,
                    radius_m: record.gate.radius_m,
                    active: record.gate.active,
                    time_to_gate_secs: approach.and_then(|a| a.time_to_gate_secs),
                    inside: approach.map(|a| a.inside).unwrap_or(false),
                }
            })
            .collect()
    }

    fn record_mut(&mut self, gate_id: u32) -> Option<&mut GateRecord> {
        self.gates.iter_mut().find(|r| r.gate.id == gate_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VesselIdentity;

    fn vessel_heading_north(sog_knots: f64) -> VesselState {
        VesselState {
            identity: VesselIdentity {
                name: "MASS_0".to_string(),
                mmsi_number: 265_123_000,
                imo_number: 9_319_466,
                tonnage: 5000.0,
                length_m: 120.0,
            },
            lat: 30.0,
            lon: -40.0,
            cog_deg: 0.0,
            sog_knots,
            commanded_cog_deg: 0.0,
            commanded_sog_knots: sog_knots,
            state: OperationalState::Go,
            priority_roc: "ROC_1".to_string(),
            active_gate: None,
        }
    }

    fn gate_north_of(vessel: &VesselState, meters: f64, id: u32) -> SafetyGate {
        SafetyGate {
            id,
            lat: vessel.lat + spatial::meters_to_lat(meters, vessel.lat),
            lon: vessel.lon,
            radius_m: 100.0,
            active: true,
            threshold_secs: DEFAULT_THRESHOLD_SECS,
        }
    }

    #[test]
    fn begin_handover_fires_once_per_approach() {
        let mut vessel = vessel_heading_north(10.0);
        // ~350s out at 10kn: already under the 900s threshold.
        let gate = gate_north_of(&vessel, 1900.0, 1);
        let mut registry = GateRegistry::new(vec![gate]);

        let first = registry.evaluate(&mut vessel);
        assert_eq!(first.begin_handover.len(), 1);
        assert_eq!(first.begin_handover[0].gate_id, 1);

        // Still under threshold on following ticks: no re-trigger.
        for _ in 0..5 {
            let again = registry.evaluate(&mut vessel);
            assert!(again.begin_handover.is_empty());
        }
    }

    #[test]
    fn begin_handover_rearms_after_flag_reset() {
        let mut vessel = vessel_heading_north(10.0);
        let gate = gate_north_of(&vessel, 1900.0, 7);
        let mut registry = GateRegistry::new(vec![gate]);

        assert_eq!(registry.evaluate(&mut vessel).begin_handover.len(), 1);
        registry.reset_handover_flag(7);
        assert_eq!(registry.evaluate(&mut vessel).begin_handover.len(), 1);
    }

    #[test]
    fn no_signal_beyond_threshold() {
        let mut vessel = vessel_heading_north(10.0);
        // ~2h out at 10kn.
        let gate = gate_north_of(&vessel, 37_000.0, 1);
        let mut registry = GateRegistry::new(vec![gate]);

        let evaluation = registry.evaluate(&mut vessel);
        assert!(evaluation.begin_handover.is_empty());
        let t = evaluation.approaches[0]
            .time_to_gate_secs
            .expect("gate on path");
        assert!(t > DEFAULT_THRESHOLD_SECS);
    }

    #[test]
    fn zero_speed_reports_no_time_to_gate() {
        let mut vessel = vessel_heading_north(0.0);
        let gate = gate_north_of(&vessel, 1900.0, 1);
        let mut registry = GateRegistry::new(vec![gate]);

        let evaluation = registry.evaluate(&mut vessel);
        assert_eq!(evaluation.approaches[0].time_to_gate_secs, None);
        assert!(evaluation.begin_handover.is_empty());
    }

    #[test]
    fn entering_gate_forces_no_go() {
        let mut vessel = vessel_heading_north(5.0);
        let gate = SafetyGate {
            id: 2,
            lat: vessel.lat,
            lon: vessel.lon,
            radius_m: 100.0,
            active: true,
            threshold_secs: DEFAULT_THRESHOLD_SECS,
        };
        let mut registry = GateRegistry::new(vec![gate]);

        let evaluation = registry.evaluate(&mut vessel);
        assert!(evaluation.approaches[0].inside);
        assert_eq!(vessel.state, OperationalState::NoGo);
    }

    #[test]
    fn inactive_gate_never_triggers() {
        let mut vessel = vessel_heading_north(5.0);
        let mut gate = SafetyGate {
            id: 3,
            lat: vessel.lat,
            lon: vessel.lon,
            radius_m: 100.0,
            active: true,
            threshold_secs: DEFAULT_THRESHOLD_SECS,
        };
        gate.active = false;
        let mut registry = GateRegistry::new(vec![gate]);

        let evaluation = registry.evaluate(&mut vessel);
        assert!(evaluation.approaches.is_empty());
        assert_eq!(vessel.state, OperationalState::Go);
    }

    #[test]
    fn deactivate_is_idempotent() {
        let vessel = vessel_heading_north(5.0);
        let gate = gate_north_of(&vessel, 1900.0, 4);
        let mut registry = GateRegistry::new(vec![gate]);

        assert!(registry.deactivate(4));
        assert!(!registry.deactivate(4));
        assert!(!registry.deactivate(99));
    }

    #[test]
    fn time_to_gate_decreases_while_closing() {
        let mut vessel = vessel_heading_north(10.0);
        let gate = gate_north_of(&vessel, 37_000.0, 1);
        let mut registry = GateRegistry::new(vec![gate]);

        let t0 = registry.evaluate(&mut vessel).approaches[0]
            .time_to_gate_secs
            .unwrap();
        // Move the vessel 1000m closer along its course.
        vessel.lat += spatial::meters_to_lat(1000.0, vessel.lat);
        let t1 = registry.evaluate(&mut vessel).approaches[0]
            .time_to_gate_secs
            .unwrap();
        assert!(t1 < t0, "t1={t1} should be below t0={t0}");
    }
}
