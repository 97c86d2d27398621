//! Outbound calls to the backend of record.
//!
//! The tick loop never awaits the backend: it pushes a [`SyncEvent`] onto a
//! [`SyncQueue`] and continues. A [`SyncWorker`] task drains the queue and
//! performs the calls, logging failures without feeding them back.

#[cfg(test)]
pub(crate) mod recording;
pub mod worker;

use crate::fleet::VehicleIdentity;
use crate::prelude::{SyncError, SyncResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

pub use worker::{SyncWorker, SyncWorkerHandle};

/// Network layer of record for fuel levels, alerts and overspeed reports.
#[async_trait]
pub trait BackendSync: Send + Sync {
    async fn update_fuel(&self, vehicle: &VehicleIdentity, fuel_level: f64) -> SyncResult<()>;

    async fn record_alert(
        &self,
        vehicle: &VehicleIdentity,
        issue: &str,
        action_needed: &str,
    ) -> SyncResult<()>;

    async fn report_overspeed(
        &self,
        vehicle: &VehicleIdentity,
        timestamp: DateTime<Utc>,
        speed: f64,
    ) -> SyncResult<()>;
}

/// One pending backend call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SyncEvent {
    UpdateFuel {
        vehicle: VehicleIdentity,
        fuel_level: f64,
    },
    RecordAlert {
        vehicle: VehicleIdentity,
        issue: String,
        action_needed: String,
    },
    ReportOverspeed {
        vehicle: VehicleIdentity,
        timestamp: DateTime<Utc>,
        speed: f64,
    },
}

impl SyncEvent {
    pub fn vehicle(&self) -> &VehicleIdentity {
        match self {
            SyncEvent::UpdateFuel { vehicle, .. }
            | SyncEvent::RecordAlert { vehicle, .. }
            | SyncEvent::ReportOverspeed { vehicle, .. } => vehicle,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::UpdateFuel { .. } => "updateFuel",
            SyncEvent::RecordAlert { .. } => "recordAlert",
            SyncEvent::ReportOverspeed { .. } => "reportOverspeed",
        }
    }

    /// Performs the call this event stands for.
    pub async fn deliver(&self, backend: &dyn BackendSync) -> SyncResult<()> {
        match self {
            SyncEvent::UpdateFuel {
                vehicle,
                fuel_level,
            } => backend.update_fuel(vehicle, *fuel_level).await,
            SyncEvent::RecordAlert {
                vehicle,
                issue,
                action_needed,
            } => backend.record_alert(vehicle, issue, action_needed).await,
            SyncEvent::ReportOverspeed {
                vehicle,
                timestamp,
                speed,
            } => backend.report_overspeed(vehicle, *timestamp, *speed).await,
        }
    }
}

/// Non-blocking producer side of the outbound queue.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    tx: mpsc::UnboundedSender<SyncEvent>,
}

impl SyncQueue {
    pub fn emit(&self, event: SyncEvent) -> SyncResult<()> {
        self.tx.send(event).map_err(|_| SyncError::Unavailable)
    }
}

pub fn channel() -> (SyncQueue, mpsc::UnboundedReceiver<SyncEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SyncQueue { tx }, rx)
}
