//! Dead-reckoning integration of vessel motion over fixed time steps.

use crate::models::{OperationalState, VesselState};
use crate::spatial;

/// Default bounded turn rate for a large hull, degrees per second.
const DEFAULT_TURN_RATE_DEG_PER_SEC: f64 = 2.0;

/// Integrates heading, speed and position. Inputs are pre-validated by the
/// arbiter before they reach here; `advance` has no error conditions.
#[derive(Debug, Clone)]
pub struct KinematicsEngine {
    pub accel_knots_per_sec: f64,
    pub decel_knots_per_sec: f64,
    pub turn_rate_deg_per_sec: f64,
}

impl KinematicsEngine {
    /// Rates derived from tonnage; heavier hulls respond slower.
    pub fn for_tonnage(tonnage: f64) -> Self {
        let rate = (5000.0 / (tonnage + 1.0)).clamp(0.01, 0.5);
        Self {
            accel_knots_per_sec: rate,
            decel_knots_per_sec: rate,
            turn_rate_deg_per_sec: DEFAULT_TURN_RATE_DEG_PER_SEC,
        }
    }

    /// Advance the vessel by `dt_secs`: turn toward the commanded course,
    /// converge speed, then dead-reckon the position.
    pub fn advance(&self, vessel: &mut VesselState, dt_secs: f64) {
        self.turn(vessel, dt_secs);
        self.throttle(vessel, dt_secs);
        self.dead_reckon(vessel, dt_secs);
    }

    /// Turn toward the commanded course along the shorter arc, bounded by
    /// the turn rate.
    fn turn(&self, vessel: &mut VesselState, dt_secs: f64) {
        let delta = spatial::shortest_turn_deg(vessel.cog_deg, vessel.commanded_cog_deg);
        let max_step = self.turn_rate_deg_per_sec * dt_secs;
        let step = delta.clamp(-max_step, max_step);
        vessel.cog_deg = spatial::normalize_course_deg(vessel.cog_deg + step);
    }

    /// Converge speed toward the commanded SOG in `go`, decay toward zero
    /// in `no-go`. Clamped: never negative, never past the target.
    fn throttle(&self, vessel: &mut VesselState, dt_secs: f64) {
        match vessel.state {
            OperationalState::NoGo => {
                vessel.sog_knots =
                    (vessel.sog_knots - self.decel_knots_per_sec * dt_secs).max(0.0);
            }
            OperationalState::Go => {
                let target = vessel.commanded_sog_knots;
                if vessel.sog_knots < target {
                    vessel.sog_knots =
                        (vessel.sog_knots + self.accel_knots_per_sec * dt_secs).min(target);
                } else if vessel.sog_knots > target {
                    vessel.sog_knots =
                        (vessel.sog_knots - self.decel_knots_per_sec * dt_secs).max(target);
                }
            }
        }
    }

    /// Simple dead reckoning along the current course at local scale.
    fn dead_reckon(&self, vessel: &mut VesselState, dt_secs: f64) {
        let speed_mps = vessel.sog_knots * spatial::KNOTS_TO_MPS;
        if speed_mps <= 0.0 {
            return;
        }
        let distance_m = speed_mps * dt_secs;
        let course = vessel.cog_deg.to_radians();
        let north_m = distance_m * course.cos();
        let east_m = distance_m * course.sin();

        vessel.lat += spatial::meters_to_lat(north_m, vessel.lat);
        vessel.lon += spatial::meters_to_lon(east_m, vessel.lat);
    }
}
