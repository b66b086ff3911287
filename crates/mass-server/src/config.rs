//! Server configuration from environment.

use std::env;

use anyhow::{Context, Result};
use mass_core::SimConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Tick frequency of the simulation loop
    pub tick_hz: f64,
    /// Optional path to a scenario JSON file; built-in scenario otherwise
    pub scenario_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("MASS_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            tick_hz: env::var("MASS_TICK_HZ")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|hz: &f64| hz.is_finite() && *hz > 0.0)
                .unwrap_or(5.0),
            scenario_path: env::var("MASS_SCENARIO").ok(),
        }
    }

    /// Load the simulation scenario this server will run.
    pub fn load_scenario(&self) -> Result<SimConfig> {
        match &self.scenario_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading scenario file {path}"))?;
                let config: SimConfig = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing scenario file {path}"))?;
                Ok(config)
            }
            None => Ok(SimConfig::default_scenario()),
        }
    }
}
