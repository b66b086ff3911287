//! Startup configuration. Gates and the ROC roster are supplied once at
//! simulation start; invalid geometry or a bad roster is fatal and
//! prevents the simulation from starting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gates::DEFAULT_THRESHOLD_SECS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ROC roster is empty")]
    EmptyRoster,
    #[error("duplicate ROC id in roster: {0}")]
    DuplicateRocId(String),
    #[error("initial priority ROC '{0}' is not in the roster")]
    UnknownPriorityRoc(String),
    #[error("duplicate gate id: {0}")]
    DuplicateGateId(u32),
    #[error("gate {id}: {reason}")]
    InvalidGateGeometry { id: u32, reason: String },
    #[error("vessel: {0}")]
    InvalidVessel(String),
    #[error("noise: {0}")]
    InvalidNoise(String),
}

/// Full simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub vessel: VesselConfig,
    #[serde(default)]
    pub gates: Vec<GateConfig>,
    pub rocs: RocRosterConfig,
    #[serde(default)]
    pub kinematics: KinematicsConfig,
    #[serde(default)]
    pub handover: HandoverTimeoutConfig,
    #[serde(default)]
    pub noise: Option<NoiseConfig>,
    /// Upper bound on the retained position history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselConfig {
    pub name: String,
    #[serde(default = "default_mmsi")]
    pub mmsi_number: u32,
    #[serde(default = "default_imo")]
    pub imo_number: u32,
    #[serde(default = "default_tonnage")]
    pub tonnage: f64,
    #[serde(default = "default_length")]
    pub length_m: f64,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub cog_deg: f64,
    #[serde(default)]
    pub sog_knots: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    pub id: u32,
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
    #[serde(default = "default_threshold_secs")]
    pub threshold_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocRosterConfig {
    pub ids: Vec<String>,
    pub initial_priority: String,
}

/// Optional overrides for the tonnage-derived kinematic rates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KinematicsConfig {
    pub accel_knots_per_sec: Option<f64>,
    pub decel_knots_per_sec: Option<f64>,
    pub turn_rate_deg_per_sec: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoverTimeoutConfig {
    #[serde(default = "default_handover_timeout_secs")]
    pub relinquish_timeout_secs: f64,
    #[serde(default = "default_handover_timeout_secs")]
    pub takeover_timeout_secs: f64,
}

impl Default for HandoverTimeoutConfig {
    fn default() -> Self {
        Self {
            relinquish_timeout_secs: default_handover_timeout_secs(),
            takeover_timeout_secs: default_handover_timeout_secs(),
        }
    }
}

/// Gaussian per-step motion noise (off unless configured).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    #[serde(default = "default_sog_sigma")]
    pub sog_sigma_knots: f64,
    #[serde(default = "default_cog_sigma")]
    pub cog_sigma_deg: f64,
}

fn default_history_limit() -> usize {
    10_000
}

fn default_mmsi() -> u32 {
    265_123_000
}

fn default_imo() -> u32 {
    9_319_466
}

fn default_tonnage() -> f64 {
    5000.0
}

fn default_length() -> f64 {
    120.0
}

fn default_threshold_secs() -> f64 {
    DEFAULT_THRESHOLD_SECS
}

fn default_handover_timeout_secs() -> f64 {
    180.0
}

fn default_sog_sigma() -> f64 {
    0.05
}

fn default_cog_sigma() -> f64 {
    0.2
}

impl SimConfig {
    /// Validate everything that must hold before the simulation starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rocs.ids.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        let mut seen_rocs = std::collections::HashSet::new();
        for id in &self.rocs.ids {
            if !seen_rocs.insert(id.as_str()) {
                return Err(ConfigError::DuplicateRocId(id.clone()));
            }
        }
        if !self.rocs.ids.contains(&self.rocs.initial_priority) {
            return Err(ConfigError::UnknownPriorityRoc(
                self.rocs.initial_priority.clone(),
            ));
        }

        let mut seen_gates = std::collections::HashSet::new();
        for gate in &self.gates {
            if !seen_gates.insert(gate.id) {
                return Err(ConfigError::DuplicateGateId(gate.id));
            }
            if !gate.lat.is_finite() || !(-90.0..=90.0).contains(&gate.lat) {
                return Err(ConfigError::InvalidGateGeometry {
                    id: gate.id,
                    reason: format!("latitude {} out of range", gate.lat),
                });
            }
            if !gate.lon.is_finite() || !(-180.0..=180.0).contains(&gate.lon) {
                return Err(ConfigError::InvalidGateGeometry {
                    id: gate.id,
                    reason: format!("longitude {} out of range", gate.lon),
                });
            }
            if !gate.radius_m.is_finite() || gate.radius_m <= 0.0 {
                return Err(ConfigError::InvalidGateGeometry {
                    id: gate.id,
                    reason: format!("radius {} must be positive", gate.radius_m),
                });
            }
            if !gate.threshold_secs.is_finite() || gate.threshold_secs <= 0.0 {
                return Err(ConfigError::InvalidGateGeometry {
                    id: gate.id,
                    reason: format!("threshold {} must be positive", gate.threshold_secs),
                });
            }
        }

        if !self.vessel.lat.is_finite() || !(-90.0..=90.0).contains(&self.vessel.lat) {
            return Err(ConfigError::InvalidVessel(format!(
                "latitude {} out of range",
                self.vessel.lat
            )));
        }
        if !self.vessel.lon.is_finite() || !(-180.0..=180.0).contains(&self.vessel.lon) {
            return Err(ConfigError::InvalidVessel(format!(
                "longitude {} out of range",
                self.vessel.lon
            )));
        }
        if !self.vessel.sog_knots.is_finite() || self.vessel.sog_knots < 0.0 {
            return Err(ConfigError::InvalidVessel(format!(
                "initial SOG {} must be non-negative",
                self.vessel.sog_knots
            )));
        }

        if let Some(noise) = &self.noise {
            if !noise.sog_sigma_knots.is_finite() || noise.sog_sigma_knots < 0.0 {
                return Err(ConfigError::InvalidNoise(format!(
                    "SOG sigma {} must be non-negative",
                    noise.sog_sigma_knots
                )));
            }
            if !noise.cog_sigma_deg.is_finite() || noise.cog_sigma_deg < 0.0 {
                return Err(ConfigError::InvalidNoise(format!(
                    "COG sigma {} must be non-negative",
                    noise.cog_sigma_deg
                )));
            }
        }

        Ok(())
    }

    /// Built-in scenario: MASS_0 steaming north-east with a single safety
    /// gate roughly a kilometer ahead and two competing ROCs.
    pub fn default_scenario() -> Self {
        Self {
            vessel: VesselConfig {
                name: "MASS_0".to_string(),
                mmsi_number: default_mmsi(),
                imo_number: default_imo(),
                tonnage: default_tonnage(),
                length_m: default_length(),
                lat: 30.0,
                lon: -40.0,
                cog_deg: 45.0,
                sog_knots: 15.0,
            },
            gates: vec![GateConfig {
                id: 1,
                lat: 30.001,
                lon: -39.999,
                radius_m: 100.0,
                threshold_secs: DEFAULT_THRESHOLD_SECS,
            }],
            rocs: RocRosterConfig {
                ids: vec!["ROC_1".to_string(), "ROC_2".to_string()],
                initial_priority: "ROC_1".to_string(),
            },
            kinematics: KinematicsConfig::default(),
            handover: HandoverTimeoutConfig::default(),
            noise: None,
            history_limit: default_history_limit(),
        }
    }
}
