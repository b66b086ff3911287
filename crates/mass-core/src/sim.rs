//! Tick orchestrator owning the vessel aggregate.
//!
//! One periodic tick drives kinematics → gate evaluation → handover in
//! strict sequence. Inbound messages are applied between ticks by the
//! caller, so the integration step always sees a consistent vessel and
//! authority state.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use rand_distr::{Distribution, Normal};

use crate::authority::AuthorityArbiter;
use crate::config::{ConfigError, SimConfig};
use crate::gates::{GateEvaluation, GateRegistry};
use crate::handover::{HandoverCoordinator, HandoverTimeouts};
use crate::kinematics::KinematicsEngine;
use crate::models::{
    Command, InboundMessage, NavFrame, RocEntity, TickReport, TrackSnapshot, VesselEvent,
    VesselIdentity, VesselState,
};
use crate::spatial;

const STATUS_NO_GATES: &str = "Normal. No gates on path";
const STATUS_INSIDE_GATE: &str = "Inside safety gate - Stopping";

#[derive(Debug, Clone)]
struct NoiseModel {
    sog: Normal<f64>,
    cog: Normal<f64>,
}

/// The running simulation: vessel, gates, arbiter and handover sessions,
/// advanced tick by tick.
#[derive(Debug)]
pub struct VesselSim {
    vessel: VesselState,
    kinematics: KinematicsEngine,
    gates: GateRegistry,
    arbiter: AuthorityArbiter,
    coordinator: HandoverCoordinator,
    roster: Vec<String>,
    history: VecDeque<[f64; 2]>,
    history_limit: usize,
    noise: Option<NoiseModel>,
    last_status: String,
}

impl VesselSim {
    /// Build the simulation from validated configuration. Any
    /// [`ConfigError`] is fatal: the simulation must not start.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let vessel = VesselState {
            identity: VesselIdentity {
                name: config.vessel.name.clone(),
                mmsi_number: config.vessel.mmsi_number,
                imo_number: config.vessel.imo_number,
                tonnage: config.vessel.tonnage,
                length_m: config.vessel.length_m,
            },
            lat: config.vessel.lat,
            lon: config.vessel.lon,
            cog_deg: spatial::normalize_course_deg(config.vessel.cog_deg),
            sog_knots: config.vessel.sog_knots,
            commanded_cog_deg: spatial::normalize_course_deg(config.vessel.cog_deg),
            commanded_sog_knots: config.vessel.sog_knots,
            state: Default::default(),
            priority_roc: config.rocs.initial_priority.clone(),
            active_gate: None,
        };

        let mut kinematics = KinematicsEngine::for_tonnage(config.vessel.tonnage);
        if let Some(accel) = config.kinematics.accel_knots_per_sec {
            kinematics.accel_knots_per_sec = accel;
        }
        if let Some(decel) = config.kinematics.decel_knots_per_sec {
            kinematics.decel_knots_per_sec = decel;
        }
        if let Some(turn_rate) = config.kinematics.turn_rate_deg_per_sec {
            kinematics.turn_rate_deg_per_sec = turn_rate;
        }

        let gates = GateRegistry::new(
            config
                .gates
                .iter()
                .map(|g| crate::models::SafetyGate {
                    id: g.id,
                    lat: g.lat,
                    lon: g.lon,
                    radius_m: g.radius_m,
                    active: true,
                    threshold_secs: g.threshold_secs,
                })
                .collect(),
        );

        let timeouts = HandoverTimeouts {
            relinquish: Duration::milliseconds(
                (config.handover.relinquish_timeout_secs * 1000.0) as i64,
            ),
            takeover: Duration::milliseconds(
                (config.handover.takeover_timeout_secs * 1000.0) as i64,
            ),
        };

        let noise = match &config.noise {
            Some(noise) => Some(NoiseModel {
                sog: Normal::new(0.0, noise.sog_sigma_knots)
                    .map_err(|e| ConfigError::InvalidNoise(e.to_string()))?,
                cog: Normal::new(0.0, noise.cog_sigma_deg)
                    .map_err(|e| ConfigError::InvalidNoise(e.to_string()))?,
            }),
            None => None,
        };

        let mut history = VecDeque::with_capacity(1024);
        history.push_back([vessel.lat, vessel.lon]);

        Ok(Self {
            vessel,
            kinematics,
            gates,
            arbiter: AuthorityArbiter,
            coordinator: HandoverCoordinator::new(timeouts),
            roster: config.rocs.ids.clone(),
            history,
            history_limit: config.history_limit.max(2),
            noise,
            last_status: STATUS_NO_GATES.to_string(),
        })
    }

    pub fn vessel(&self) -> &VesselState {
        &self.vessel
    }

    /// Apply one queued inbound message. Called between ticks only.
    /// Returns rejection/handover events for the transport layer.
    pub fn apply_message(
        &mut self,
        message: InboundMessage,
        now: DateTime<Utc>,
    ) -> Vec<VesselEvent> {
        match message {
            InboundMessage::Command {
                roc_id,
                body,
                received_at,
            } => {
                // Legacy commands carry no ROC; they act as the priority ROC.
                let roc_id = roc_id.unwrap_or_else(|| self.vessel.priority_roc.clone());
                let command = Command {
                    roc_id,
                    body,
                    received_at,
                };
                match self
                    .arbiter
                    .submit(&mut self.vessel, &mut self.gates, &command)
                {
                    Ok(()) => Vec::new(),
                    Err(reason) => {
                        tracing::debug!(
                            roc = %command.roc_id,
                            field = command.body.field_name(),
                            %reason,
                            "command rejected"
                        );
                        vec![VesselEvent::CommandRejected {
                            roc_id: command.roc_id,
                            field: command.body.field_name().to_string(),
                            reason: reason.to_string(),
                            timestamp: now,
                        }]
                    }
                }
            }
            InboundMessage::Relinquish { roc_id, gate_id } => {
                self.coordinator
                    .on_relinquish(&self.vessel, &roc_id, gate_id, now);
                Vec::new()
            }
            InboundMessage::Takeover { roc_id, gate_id } => {
                let completed = self.coordinator.on_takeover(
                    &mut self.vessel,
                    &mut self.gates,
                    &roc_id,
                    gate_id,
                    now,
                );
                if completed.is_some() && !self.roster.contains(&roc_id) {
                    // A previously unknown ROC that completes a takeover
                    // joins the roster.
                    self.roster.push(roc_id);
                }
                completed.into_iter().collect()
            }
        }
    }

    /// Advance the simulation by one fixed step.
    pub fn tick(&mut self, dt_secs: f64, now: DateTime<Utc>) -> TickReport {
        let mut events = Vec::new();

        self.apply_noise();
        self.kinematics.advance(&mut self.vessel, dt_secs);
        self.push_history();

        let evaluation = self.gates.evaluate(&mut self.vessel);
        for trigger in &evaluation.begin_handover {
            if let Some(event) = self.coordinator.begin(&mut self.vessel, trigger, now) {
                events.push(event);
            }
        }
        events.extend(
            self.coordinator
                .check_timeouts(&mut self.vessel, &mut self.gates, now),
        );

        let status_text = self.status_text(&evaluation);
        self.last_status = status_text.clone();

        TickReport {
            nav: self.nav_frame(now),
            identity: self.vessel.identity.clone(),
            gates: self.gates.snapshots(&evaluation),
            rocs: self.roc_entities(),
            status_text,
            events,
        }
    }

    /// Report built before the first tick so consumers never see an empty
    /// snapshot. Gate timing is not yet computed.
    pub fn initial_report(&self, now: DateTime<Utc>) -> TickReport {
        TickReport {
            nav: self.nav_frame(now),
            identity: self.vessel.identity.clone(),
            gates: self.gates.snapshots(&GateEvaluation::default()),
            rocs: self.roc_entities(),
            status_text: self.last_status.clone(),
            events: Vec::new(),
        }
    }

    /// Read-only snapshot for plotting consumers.
    pub fn track_snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            name: self.vessel.identity.name.clone(),
            track: self.history.iter().copied().collect(),
            gates: self.gates.gates(),
            status_text: self.last_status.clone(),
        }
    }

    fn apply_noise(&mut self) {
        let Some(noise) = &self.noise else {
            return;
        };
        let mut rng = rand::rng();
        self.vessel.sog_knots = (self.vessel.sog_knots + noise.sog.sample(&mut rng)).max(0.0);
        self.vessel.cog_deg =
            spatial::normalize_course_deg(self.vessel.cog_deg + noise.cog.sample(&mut rng));
    }

    fn push_history(&mut self) {
        self.history.push_back([self.vessel.lat, self.vessel.lon]);
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }

    fn status_text(&self, evaluation: &GateEvaluation) -> String {
        if evaluation.inside_any() {
            return STATUS_INSIDE_GATE.to_string();
        }
        match evaluation
            .closest_approach()
            .and_then(|a| a.time_to_gate_secs)
        {
            Some(t) => format!("Normal. Time to next safety gate: {:.1}", t / 60.0),
            None => STATUS_NO_GATES.to_string(),
        }
    }

    fn nav_frame(&self, now: DateTime<Utc>) -> NavFrame {
        NavFrame {
            name: self.vessel.identity.name.clone(),
            lat: self.vessel.lat,
            lon: self.vessel.lon,
            cog_deg: self.vessel.cog_deg,
            sog_knots: self.vessel.sog_knots,
            state: self.vessel.state,
            priority_roc: self.vessel.priority_roc.clone(),
            timestamp: now,
        }
    }

    fn roc_entities(&self) -> Vec<RocEntity> {
        self.roster
            .iter()
            .map(|id| RocEntity {
                roc_id: id.clone(),
                has_priority: *id == self.vessel.priority_roc,
            })
            .collect()
    }
}
