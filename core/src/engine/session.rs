use crate::engine::dispatcher::{AlertDispatcher, AlertRecord};
use crate::engine::monitor::{FiredFlags, ThresholdMonitor};
use crate::engine::steps::StepSource;
use crate::fleet::{
    EnergySource, GroundingReason, LifecycleStatus, TelemetryState, VehicleIdentity,
    VehicleRecord,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const TICK_PERIOD: Duration = Duration::from_millis(2000);
pub const FUEL_PER_TICK: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Running,
    Stopped,
}

/// How a session stopped ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Grounded(GroundingReason),
    /// Another vehicle was selected while this one was running.
    Replaced,
    Closed,
}

/// Result of one synchronous step.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub state: TelemetryState,
    pub alerts: Vec<AlertRecord>,
    pub grounded: Option<GroundingReason>,
}

/// Read-only view published to the live-tracking display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTelemetry {
    pub vehicle: VehicleIdentity,
    pub energy: EnergySource,
    pub state: TelemetryState,
    pub phase: SessionPhase,
    pub ticks: u64,
    pub updated_at: DateTime<Utc>,
}

impl LiveTelemetry {
    pub fn energy_label(&self) -> &'static str {
        self.energy.label()
    }
}

/// Live simulation bound to one selected vehicle.
///
/// Sessions are only created by [`crate::engine::SimulationController`], which
/// keeps at most one of them alive.
#[derive(Debug)]
pub struct SimulationSession {
    vehicle: VehicleIdentity,
    energy: EnergySource,
    state: TelemetryState,
    fired: FiredFlags,
    phase: SessionPhase,
    ticks: u64,
}

impl SimulationSession {
    /// Creates the session and runs the immediate seed step.
    pub(crate) fn seed(
        record: &VehicleRecord,
        steps: &mut dyn StepSource,
        dispatcher: &AlertDispatcher,
    ) -> (Self, TickOutcome) {
        let mut session = Self {
            vehicle: record.identity.clone(),
            energy: record.energy,
            state: record.reading.clamped(),
            fired: FiredFlags::default(),
            phase: SessionPhase::Running,
            ticks: 0,
        };
        let outcome = session.advance(steps, dispatcher);
        (session, outcome)
    }

    /// One periodic tick. Returns `None` once the session has stopped.
    pub(crate) fn tick(
        &mut self,
        steps: &mut dyn StepSource,
        dispatcher: &AlertDispatcher,
    ) -> Option<TickOutcome> {
        if self.phase == SessionPhase::Stopped {
            return None;
        }
        self.ticks += 1;
        Some(self.advance(steps, dispatcher))
    }

    fn advance(&mut self, steps: &mut dyn StepSource, dispatcher: &AlertDispatcher) -> TickOutcome {
        let mut next = self.state;
        next.fuel_level -= FUEL_PER_TICK;
        next.engine_health -= f64::from(steps.wear_step());
        next.tire_wear += f64::from(steps.wear_step());
        next.speed = f64::from(steps.speed_kmh());
        let mut next = next.clamped();

        dispatcher.sync_fuel(&self.vehicle, next.fuel_level);

        if let Some(reason) = next.grounding_reason() {
            next.lifecycle_status = LifecycleStatus::UnderMaintenance;
            next.speed = 0.0;
            self.state = next;
            self.phase = SessionPhase::Stopped;
            return TickOutcome {
                state: next,
                alerts: Vec::new(),
                grounded: Some(reason),
            };
        }

        let alerts = ThresholdMonitor::evaluate(&next, &self.fired)
            .into_iter()
            .map(|condition| {
                self.fired.mark(condition);
                dispatcher.dispatch(&self.vehicle, condition, &next)
            })
            .collect();
        self.state = next;

        TickOutcome {
            state: next,
            alerts,
            grounded: None,
        }
    }

    pub fn vehicle(&self) -> &VehicleIdentity {
        &self.vehicle
    }

    pub fn state(&self) -> &TelemetryState {
        &self.state
    }

    pub fn fired(&self) -> FiredFlags {
        self.fired
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn snapshot(&self) -> LiveTelemetry {
        LiveTelemetry {
            vehicle: self.vehicle.clone(),
            energy: self.energy,
            state: self.state,
            phase: self.phase,
            ticks: self.ticks,
            updated_at: Utc::now(),
        }
    }
}
