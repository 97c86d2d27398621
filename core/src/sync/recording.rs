use crate::fleet::VehicleIdentity;
use crate::prelude::{SyncError, SyncResult};
use crate::sync::BackendSync;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UpdateFuel(VehicleIdentity, f64),
    RecordAlert(VehicleIdentity, String),
    ReportOverspeed(VehicleIdentity, f64),
}

/// Backend double that records every call and can fail alert deliveries.
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    fail_alerts: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_alerts: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn alert_result(&self) -> SyncResult<()> {
        if self.fail_alerts {
            Err(SyncError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BackendSync for RecordingBackend {
    async fn update_fuel(&self, vehicle: &VehicleIdentity, fuel_level: f64) -> SyncResult<()> {
        self.push(Call::UpdateFuel(vehicle.clone(), fuel_level));
        Ok(())
    }

    async fn record_alert(
        &self,
        vehicle: &VehicleIdentity,
        issue: &str,
        _action_needed: &str,
    ) -> SyncResult<()> {
        self.push(Call::RecordAlert(vehicle.clone(), issue.to_string()));
        self.alert_result()
    }

    async fn report_overspeed(
        &self,
        vehicle: &VehicleIdentity,
        _timestamp: DateTime<Utc>,
        speed: f64,
    ) -> SyncResult<()> {
        self.push(Call::ReportOverspeed(vehicle.clone(), speed));
        self.alert_result()
    }
}
