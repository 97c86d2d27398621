use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetcore::fleet::VehicleIdentity;
use fleetcore::sync::BackendSync;
use fleetcore::SyncResult;
use log::info;

/// Backend used when no URL is configured: every call is logged and succeeds.
pub struct LoggingBackend;

#[async_trait]
impl BackendSync for LoggingBackend {
    async fn update_fuel(&self, vehicle: &VehicleIdentity, fuel_level: f64) -> SyncResult<()> {
        info!("[backend] updateFuel {} -> {}", vehicle, fuel_level);
        Ok(())
    }

    async fn record_alert(
        &self,
        vehicle: &VehicleIdentity,
        issue: &str,
        action_needed: &str,
    ) -> SyncResult<()> {
        info!("[backend] recordAlert {}: {} ({})", vehicle, issue, action_needed);
        Ok(())
    }

    async fn report_overspeed(
        &self,
        vehicle: &VehicleIdentity,
        timestamp: DateTime<Utc>,
        speed: f64,
    ) -> SyncResult<()> {
        info!(
            "[backend] reportOverspeed {} at {}: {} km/h",
            vehicle, timestamp, speed
        );
        Ok(())
    }
}
