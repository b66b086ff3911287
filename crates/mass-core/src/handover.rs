//! Handover protocol: transfers priority-ROC authority at a safety gate.
//!
//! Relinquish and takeover are separate, ordered steps: the current
//! priority ROC must explicitly relinquish before any takeover is
//! accepted. This prevents two ROCs simultaneously believing they hold
//! authority, and prevents hijacking by a non-priority ROC.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::authority::AuthorityArbiter;
use crate::gates::{BeginHandover, GateRegistry};
use crate::models::{VesselEvent, VesselState};

/// Where a session sits in the relinquish → takeover exchange.
/// Completion and abort are terminal: the session is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoverPhase {
    AwaitingRelinquish,
    AwaitingTakeover,
}

/// One in-flight handover exchange for a single gate.
#[derive(Debug, Clone)]
pub struct HandoverSession {
    pub gate_id: u32,
    /// ROC that held priority when the session started and must relinquish
    pub outgoing_roc: String,
    /// Filled by a valid takeover
    pub incoming_roc: Option<String>,
    pub relinquish_received: bool,
    pub phase: HandoverPhase,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

/// Deadlines for the two waiting phases.
#[derive(Debug, Clone)]
pub struct HandoverTimeouts {
    /// From broadcast until the outgoing ROC must relinquish
    pub relinquish: Duration,
    /// From relinquish until a takeover must arrive
    pub takeover: Duration,
}

impl Default for HandoverTimeouts {
    fn default() -> Self {
        Self {
            relinquish: Duration::seconds(180),
            takeover: Duration::seconds(180),
        }
    }
}

/// Per-gate handover state machine. Sessions for different gates are
/// independent; one session per gate at a time.
#[derive(Debug, Clone)]
pub struct HandoverCoordinator {
    timeouts: HandoverTimeouts,
    sessions: HashMap<u32, HandoverSession>,
}

impl HandoverCoordinator {
    pub fn new(timeouts: HandoverTimeouts) -> Self {
        Self {
            timeouts,
            sessions: HashMap::new(),
        }
    }

    pub fn session(&self, gate_id: u32) -> Option<&HandoverSession> {
        self.sessions.get(&gate_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Open a session for a gate whose proximity threshold was crossed and
    /// broadcast readiness. No-op if a session for this gate already
    /// exists.
    pub fn begin(
        &mut self,
        vessel: &mut VesselState,
        trigger: &BeginHandover,
        now: DateTime<Utc>,
    ) -> Option<VesselEvent> {
        if self.sessions.contains_key(&trigger.gate_id) {
            return None;
        }

        let current_roc = vessel.priority_roc.clone();
        self.sessions.insert(
            trigger.gate_id,
            HandoverSession {
                gate_id: trigger.gate_id,
                outgoing_roc: current_roc.clone(),
                incoming_roc: None,
                relinquish_received: false,
                phase: HandoverPhase::AwaitingRelinquish,
                created_at: now,
                deadline: now + self.timeouts.relinquish,
            },
        );
        vessel.active_gate = Some(trigger.gate_id);

        tracing::info!(
            gate_id = trigger.gate_id,
            time_to_gate_secs = trigger.time_to_gate_secs,
            %current_roc,
            "handover armed, broadcasting readiness"
        );

        Some(VesselEvent::ReadyForHandover {
            gate_id: trigger.gate_id,
            time_to_gate_secs: trigger.time_to_gate_secs,
            current_roc,
            timestamp: now,
        })
    }

    /// The outgoing ROC announces it is ready to relinquish. Only the
    /// current priority ROC is accepted, and only while the session is
    /// awaiting it; anything else is ignored without side effect.
    pub fn on_relinquish(
        &mut self,
        vessel: &VesselState,
        roc_id: &str,
        gate_id: Option<u32>,
        now: DateTime<Utc>,
    ) {
        let takeover_timeout = self.timeouts.takeover;
        let Some(session) = self.route_mut(gate_id) else {
            tracing::debug!(%roc_id, ?gate_id, "relinquish ignored: no matching session");
            return;
        };

        if session.phase != HandoverPhase::AwaitingRelinquish {
            tracing::debug!(
                %roc_id,
                gate_id = session.gate_id,
                "relinquish ignored: already recorded"
            );
            return;
        }
        if roc_id != vessel.priority_roc {
            tracing::debug!(
                %roc_id,
                gate_id = session.gate_id,
                "relinquish ignored: sender is not the priority ROC"
            );
            return;
        }

        session.relinquish_received = true;
        session.phase = HandoverPhase::AwaitingTakeover;
        session.deadline = now + takeover_timeout;
        tracing::info!(%roc_id, gate_id = session.gate_id, "relinquish recorded");
    }

    /// A ROC asks to assume control. Accepted only after relinquish and
    /// only from a ROC other than the relinquishing one; completion applies
    /// all effects atomically and destroys the session.
    pub fn on_takeover(
        &mut self,
        vessel: &mut VesselState,
        gates: &mut GateRegistry,
        roc_id: &str,
        gate_id: Option<u32>,
        now: DateTime<Utc>,
    ) -> Option<VesselEvent> {
        let Some(session) = self.route_mut(gate_id) else {
            tracing::debug!(%roc_id, ?gate_id, "takeover ignored: no matching session");
            return None;
        };

        if session.phase != HandoverPhase::AwaitingTakeover {
            tracing::debug!(
                %roc_id,
                gate_id = session.gate_id,
                "takeover ignored: relinquish not yet received"
            );
            return None;
        }
        if roc_id == session.outgoing_roc {
            tracing::debug!(
                %roc_id,
                gate_id = session.gate_id,
                "takeover ignored: a ROC cannot take over from itself"
            );
            return None;
        }

        session.incoming_roc = Some(roc_id.to_string());
        let gate = session.gate_id;
        self.sessions.remove(&gate);

        // Completion effects, applied together: priority flips, the gate is
        // retired so it cannot retrigger, and the session is gone.
        AuthorityArbiter::set_priority(vessel, roc_id);
        gates.deactivate(gate);
        vessel.active_gate = None;

        tracing::info!(gate_id = gate, new_priority = %roc_id, "handover completed");

        Some(VesselEvent::HandoverCompleted {
            gate_id: gate,
            new_priority: roc_id.to_string(),
            timestamp: now,
        })
    }

    /// Abort sessions whose deadline has passed. Priority and gate state
    /// are untouched; the gate's trigger is re-armed so a later approach
    /// can start a fresh session.
    pub fn check_timeouts(
        &mut self,
        vessel: &mut VesselState,
        gates: &mut GateRegistry,
        now: DateTime<Utc>,
    ) -> Vec<VesselEvent> {
        let expired: Vec<u32> = self
            .sessions
            .values()
            .filter(|s| now >= s.deadline)
            .map(|s| s.gate_id)
            .collect();

        let mut events = Vec::with_capacity(expired.len());
        for gate_id in expired {
            let Some(session) = self.sessions.remove(&gate_id) else {
                continue;
            };
            let reason = match session.phase {
                HandoverPhase::AwaitingRelinquish => "relinquish-timeout",
                HandoverPhase::AwaitingTakeover => "takeover-timeout",
            };
            gates.reset_handover_flag(gate_id);
            if vessel.active_gate == Some(gate_id) {
                vessel.active_gate = None;
            }
            tracing::warn!(gate_id, reason, "handover aborted");
            events.push(VesselEvent::HandoverAborted {
                gate_id,
                reason: reason.to_string(),
                timestamp: now,
            });
        }
        events
    }

    /// Route a message to its session. A message without a gate reference
    /// (legacy wire format) matches only when exactly one session is in
    /// flight.
    fn route_mut(&mut self, gate_id: Option<u32>) -> Option<&mut HandoverSession> {
        match gate_id {
            Some(id) => self.sessions.get_mut(&id),
            None => {
                if self.sessions.len() == 1 {
                    self.sessions.values_mut().next()
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::DEFAULT_THRESHOLD_SECS;
    use crate::models::{OperationalState, SafetyGate, VesselIdentity};

    fn vessel() -> VesselState {
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
            sog_knots: 10.0,
            commanded_cog_deg: 0.0,
            commanded_sog_knots: 10.0,
            state: OperationalState::Go,
            priority_roc: "ROC_1".to_string(),
            active_gate: None,
        }
    }

    fn registry_with_gate(id: u32) -> GateRegistry {
        GateRegistry::new(vec![SafetyGate {
            id,
            lat: 30.1,
            lon: -40.0,
            radius_m: 100.0,
            active: true,
            threshold_secs: DEFAULT_THRESHOLD_SECS,
        }])
    }

    fn trigger(gate_id: u32) -> BeginHandover {
        BeginHandover {
            gate_id,
            time_to_gate_secs: 899.0,
        }
    }

    #[test]
    fn full_handover_flips_priority_and_retires_gate() {
        let mut coordinator = HandoverCoordinator::new(HandoverTimeouts::default());
        let mut vessel = vessel();
        let mut gates = registry_with_gate(1);
        let now = Utc::now();

        let ready = coordinator
            .begin(&mut vessel, &trigger(1), now)
            .expect("readiness broadcast");
        assert_eq!(
            ready,
            VesselEvent::ReadyForHandover {
                gate_id: 1,
                time_to_gate_secs: 899.0,
                current_roc: "ROC_1".to_string(),
                timestamp: now,
            }
        );
        assert_eq!(vessel.active_gate, Some(1));

        coordinator.on_relinquish(&vessel, "ROC_1", Some(1), now);
        assert_eq!(
            coordinator.session(1).unwrap().phase,
            HandoverPhase::AwaitingTakeover
        );

        let completed = coordinator
            .on_takeover(&mut vessel, &mut gates, "ROC_2", Some(1), now)
            .expect("handover completes");
        assert_eq!(
            completed,
            VesselEvent::HandoverCompleted {
                gate_id: 1,
                new_priority: "ROC_2".to_string(),
                timestamp: now,
            }
        );
        assert_eq!(vessel.priority_roc, "ROC_2");
        assert_eq!(vessel.active_gate, None);
        assert!(!gates.gate(1).unwrap().active);
        assert_eq!(coordinator.session_count(), 0);
    }

    #[test]
    fn takeover_before_relinquish_is_ignored() {
        let mut coordinator = HandoverCoordinator::new(HandoverTimeouts::default());
        let mut vessel = vessel();
        let mut gates = registry_with_gate(1);
        let now = Utc::now();

        coordinator.begin(&mut vessel, &trigger(1), now);

        let premature = coordinator.on_takeover(&mut vessel, &mut gates, "ROC_2", Some(1), now);
        assert_eq!(premature, None);
        assert_eq!(vessel.priority_roc, "ROC_1");
        assert_eq!(
            coordinator.session(1).unwrap().phase,
            HandoverPhase::AwaitingRelinquish
        );
    }

    #[test]
    fn relinquish_from_non_priority_roc_is_ignored() {
        let mut coordinator = HandoverCoordinator::new(HandoverTimeouts::default());
        let mut vessel = vessel();
        let now = Utc::now();

        coordinator.begin(&mut vessel, &trigger(1), now);
        coordinator.on_relinquish(&vessel, "ROC_2", Some(1), now);

        assert_eq!(
            coordinator.session(1).unwrap().phase,
            HandoverPhase::AwaitingRelinquish
        );
    }

    #[test]
    fn takeover_from_relinquishing_roc_is_rejected() {
        let mut coordinator = HandoverCoordinator::new(HandoverTimeouts::default());
        let mut vessel = vessel();
        let mut gates = registry_with_gate(1);
        let now = Utc::now();

        coordinator.begin(&mut vessel, &trigger(1), now);
        coordinator.on_relinquish(&vessel, "ROC_1", Some(1), now);

        let same_roc = coordinator.on_takeover(&mut vessel, &mut gates, "ROC_1", Some(1), now);
        assert_eq!(same_roc, None);
        assert_eq!(vessel.priority_roc, "ROC_1");
        assert_eq!(
            coordinator.session(1).unwrap().phase,
            HandoverPhase::AwaitingTakeover
        );
    }

    #[test]
    fn timeout_after_relinquish_aborts_without_priority_change() {
        let mut coordinator = HandoverCoordinator::new(HandoverTimeouts::default());
        let mut vessel = vessel();
        let mut gates = registry_with_gate(1);
        let now = Utc::now();

        coordinator.begin(&mut vessel, &trigger(1), now);
        coordinator.on_relinquish(&vessel, "ROC_1", Some(1), now);

        let later = now + Duration::seconds(181);
        let events = coordinator.check_timeouts(&mut vessel, &mut gates, later);

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            VesselEvent::HandoverAborted { gate_id: 1, reason, .. }
                if reason == "takeover-timeout"
        ));
        assert_eq!(vessel.priority_roc, "ROC_1");
        assert!(gates.gate(1).unwrap().active);
        assert_eq!(coordinator.session_count(), 0);
    }

    #[test]
    fn timeout_waiting_for_relinquish_aborts() {
        let mut coordinator = HandoverCoordinator::new(HandoverTimeouts::default());
        let mut vessel = vessel();
        let mut gates = registry_with_gate(1);
        let now = Utc::now();

        coordinator.begin(&mut vessel, &trigger(1), now);

        let later = now + Duration::seconds(181);
        let events = coordinator.check_timeouts(&mut vessel, &mut gates, later);
        assert!(matches!(
            &events[0],
            VesselEvent::HandoverAborted { reason, .. } if reason == "relinquish-timeout"
        ));
        assert_eq!(vessel.active_gate, None);
    }

    #[test]
    fn sessions_for_different_gates_are_independent() {
        let mut coordinator = HandoverCoordinator::new(HandoverTimeouts::default());
        let mut vessel = vessel();
        let mut gates = GateRegistry::new(vec![
            SafetyGate {
                id: 1,
                lat: 30.1,
                lon: -40.0,
                radius_m: 100.0,
                active: true,
                threshold_secs: DEFAULT_THRESHOLD_SECS,
            },
            SafetyGate {
                id: 2,
                lat: 30.2,
                lon: -40.0,
                radius_m: 100.0,
                active: true,
                threshold_secs: DEFAULT_THRESHOLD_SECS,
            },
        ]);
        let now = Utc::now();

        coordinator.begin(&mut vessel, &trigger(1), now);
        coordinator.begin(&mut vessel, &trigger(2), now);
        assert_eq!(coordinator.session_count(), 2);

        // An un-routed legacy message is ambiguous with two sessions open.
        coordinator.on_relinquish(&vessel, "ROC_1", None, now);
        assert_eq!(
            coordinator.session(1).unwrap().phase,
            HandoverPhase::AwaitingRelinquish
        );
        assert_eq!(
            coordinator.session(2).unwrap().phase,
            HandoverPhase::AwaitingRelinquish
        );

        // Gate-addressed messages drive only their own session.
        coordinator.on_relinquish(&vessel, "ROC_1", Some(2), now);
        let completed = coordinator.on_takeover(&mut vessel, &mut gates, "ROC_2", Some(2), now);
        assert!(completed.is_some());
        assert!(coordinator.session(1).is_some());
        assert!(coordinator.session(2).is_none());
        assert_eq!(vessel.priority_roc, "ROC_2");
    }

    #[test]
    fn legacy_messages_route_to_single_session() {
        let mut coordinator = HandoverCoordinator::new(HandoverTimeouts::default());
        let mut vessel = vessel();
        let mut gates = registry_with_gate(1);
        let now = Utc::now();

        coordinator.begin(&mut vessel, &trigger(1), now);
        coordinator.on_relinquish(&vessel, "ROC_1", None, now);
        let completed = coordinator.on_takeover(&mut vessel, &mut gates, "ROC_2", None, now);
        assert!(completed.is_some());
    }
}
