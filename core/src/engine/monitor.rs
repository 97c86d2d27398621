use crate::fleet::TelemetryState;
use serde::{Deserialize, Serialize};

pub const ENGINE_HEALTH_LOW_PCT: f64 = 25.0;
pub const TIRE_WEAR_HIGH_PCT: f64 = 75.0;
pub const OVERSPEED_KMH: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionKind {
    EngineHealthLow,
    TireWearHigh,
    Overspeed,
}

impl ConditionKind {
    /// Repeating conditions fire on every qualifying tick.
    pub fn is_repeating(&self) -> bool {
        matches!(self, ConditionKind::Overspeed)
    }
}

/// One-way flags for the non-repeating conditions of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiredFlags {
    engine_alert_fired: bool,
    tire_alert_fired: bool,
}

impl FiredFlags {
    pub fn engine_alert_fired(&self) -> bool {
        self.engine_alert_fired
    }

    pub fn tire_alert_fired(&self) -> bool {
        self.tire_alert_fired
    }

    pub fn has_fired(&self, condition: ConditionKind) -> bool {
        match condition {
            ConditionKind::EngineHealthLow => self.engine_alert_fired,
            ConditionKind::TireWearHigh => self.tire_alert_fired,
            ConditionKind::Overspeed => false,
        }
    }

    pub(crate) fn mark(&mut self, condition: ConditionKind) {
        match condition {
            ConditionKind::EngineHealthLow => self.engine_alert_fired = true,
            ConditionKind::TireWearHigh => self.tire_alert_fired = true,
            ConditionKind::Overspeed => {}
        }
    }
}

/// Evaluates a reading against the fixed safety thresholds.
pub struct ThresholdMonitor;

impl ThresholdMonitor {
    /// Conditions newly true for this reading, engine before tires before speed.
    pub fn evaluate(state: &TelemetryState, fired: &FiredFlags) -> Vec<ConditionKind> {
        let candidates = [
            (
                ConditionKind::EngineHealthLow,
                state.engine_health <= ENGINE_HEALTH_LOW_PCT,
            ),
            (
                ConditionKind::TireWearHigh,
                state.tire_wear >= TIRE_WEAR_HIGH_PCT,
            ),
            (ConditionKind::Overspeed, state.speed >= OVERSPEED_KMH),
        ];

        candidates
            .into_iter()
            .filter(|(condition, breached)| *breached && !fired.has_fired(*condition))
            .map(|(condition, _)| condition)
            .collect()
    }
}
