//! Core logic for the MASS vessel simulator: kinematics, safety gates,
//! command-authority arbitration and the ROC handover protocol.

pub mod authority;
pub mod config;
pub mod gates;
pub mod handover;
pub mod kinematics;
pub mod models;
pub mod sim;
pub mod spatial;

pub use authority::{AuthorityArbiter, RejectReason};
pub use config::{ConfigError, GateConfig, NoiseConfig, RocRosterConfig, SimConfig, VesselConfig};
pub use gates::{BeginHandover, GateApproach, GateEvaluation, GateRegistry};
pub use handover::{HandoverCoordinator, HandoverPhase, HandoverSession, HandoverTimeouts};
pub use kinematics::KinematicsEngine;
pub use models::{
    Command, CommandBody, GateSnapshot, InboundMessage, NavFrame, OperationalState, RocEntity,
    SafetyGate, StreamFrame, TickReport, TrackSnapshot, VesselEvent, VesselIdentity, VesselState,
};
pub use sim::VesselSim;
pub use spatial::haversine_distance;
