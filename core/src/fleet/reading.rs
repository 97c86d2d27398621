use crate::fleet::vehicle::LifecycleStatus;
use serde::{Deserialize, Serialize};

pub const PERCENT_MAX: f64 = 100.0;
pub const SPEED_MAX_KMH: f64 = 120.0;

/// Live reading for one vehicle. `fuel_level` doubles as battery charge for EVs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryState {
    pub fuel_level: f64,
    pub engine_health: f64,
    pub tire_wear: f64,
    pub speed: f64,
    pub lifecycle_status: LifecycleStatus,
}

impl Default for TelemetryState {
    fn default() -> Self {
        Self {
            fuel_level: 0.0,
            engine_health: PERCENT_MAX,
            tire_wear: 0.0,
            speed: 0.0,
            lifecycle_status: LifecycleStatus::Available,
        }
    }
}

/// Why a session reached its terminal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroundingReason {
    OutOfEnergy,
    EngineFailure,
    TiresWornOut,
}

impl GroundingReason {
    pub fn describe(&self) -> &'static str {
        match self {
            GroundingReason::OutOfEnergy => "no fuel left",
            GroundingReason::EngineFailure => "engine health exhausted",
            GroundingReason::TiresWornOut => "tires fully worn",
        }
    }
}

impl TelemetryState {
    pub fn new(fuel_level: f64, engine_health: f64, tire_wear: f64) -> Self {
        Self {
            fuel_level,
            engine_health,
            tire_wear,
            ..Default::default()
        }
        .clamped()
    }

    pub fn with_status(mut self, status: LifecycleStatus) -> Self {
        self.lifecycle_status = status;
        self
    }

    /// Pulls every bounded field back into its domain.
    pub fn clamped(mut self) -> Self {
        self.fuel_level = clamp_percent(self.fuel_level);
        self.engine_health = clamp_percent(self.engine_health);
        self.tire_wear = clamp_percent(self.tire_wear);
        self.speed = clamp_range(self.speed, SPEED_MAX_KMH);
        self
    }

    /// Terminal check, fuel first, then engine, then tires.
    pub fn grounding_reason(&self) -> Option<GroundingReason> {
        if self.fuel_level <= 0.0 {
            Some(GroundingReason::OutOfEnergy)
        } else if self.engine_health <= 0.0 {
            Some(GroundingReason::EngineFailure)
        } else if self.tire_wear >= PERCENT_MAX {
            Some(GroundingReason::TiresWornOut)
        } else {
            None
        }
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    clamp_range(value, PERCENT_MAX)
}

fn clamp_range(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_keeps_fields_in_domain() {
        let state = TelemetryState {
            fuel_level: -3.0,
            engine_health: 140.0,
            tire_wear: 101.0,
            speed: 400.0,
            lifecycle_status: LifecycleStatus::Available,
        }
        .clamped();
        assert_eq!(state.fuel_level, 0.0);
        assert_eq!(state.engine_health, 100.0);
        assert_eq!(state.tire_wear, 100.0);
        assert_eq!(state.speed, SPEED_MAX_KMH);
    }

    #[test]
    fn nan_collapses_to_zero() {
        assert_eq!(clamp_percent(f64::NAN), 0.0);
    }

    #[test]
    fn grounding_prefers_fuel_reason() {
        let state = TelemetryState::new(0.0, 0.0, 100.0);
        assert_eq!(state.grounding_reason(), Some(GroundingReason::OutOfEnergy));
        let state = TelemetryState::new(10.0, 50.0, 100.0);
        assert_eq!(state.grounding_reason(), Some(GroundingReason::TiresWornOut));
        assert_eq!(TelemetryState::new(10.0, 50.0, 20.0).grounding_reason(), None);
    }
}
