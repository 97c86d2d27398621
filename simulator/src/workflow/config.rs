use crate::generator::profile::{build_fleet, FleetProfile};
use anyhow::Context;
use fleetcore::engine::TICK_PERIOD;
use fleetcore::fleet::{LifecycleStatus, TelemetryState, VehicleRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

/// Explicit vehicle entry, shaped like the backend's vehicle record.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSeed {
    pub reg_no: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub vehicle_type: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub fuel: f64,
    #[serde(default)]
    pub engine_health: Option<f64>,
    #[serde(default)]
    pub tire_wear: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl VehicleSeed {
    pub fn into_record(self) -> VehicleRecord {
        let reading = TelemetryState::new(
            self.fuel,
            self.engine_health.unwrap_or(100.0),
            self.tire_wear.unwrap_or(0.0),
        );
        let status = self
            .status
            .as_deref()
            .map(LifecycleStatus::from_backend)
            .unwrap_or_default();
        VehicleRecord::new(
            self.reg_no,
            self.name.unwrap_or_else(|| "Unknown Vehicle".into()),
            self.vehicle_type,
        )
        .with_location(self.location.as_deref())
        .with_reading(reading)
        .with_status(status)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub tick_period_ms: u64,
    pub backend_url: Option<String>,
    pub bind: SocketAddr,
    pub seed: Option<u64>,
    pub fleet: FleetProfile,
    pub vehicles: Vec<VehicleSeed>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: TICK_PERIOD.as_millis() as u64,
            backend_url: None,
            bind: default_bind(),
            seed: None,
            fleet: FleetProfile::default(),
            vehicles: Vec::new(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.tick_period_ms > 0, "tick_period_ms must be positive");
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }

    /// Explicit vehicles win over the generated fleet.
    pub fn fleet_records(&self) -> Vec<VehicleRecord> {
        if self.vehicles.is_empty() {
            build_fleet(&self.fleet)
        } else {
            self.vehicles
                .iter()
                .cloned()
                .map(VehicleSeed::into_record)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_ticks_every_two_seconds() {
        let cfg = WorkflowConfig::default();
        assert_eq!(cfg.tick_period(), Duration::from_millis(2000));
        assert_eq!(cfg.fleet_records().len(), cfg.fleet.count);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"tick_period_ms: 500\nbackend_url: http://localhost:8080\nvehicles:\n  - regNo: WB-01\n    type: EV Van\n    fuel: 42\n    status: MAINTENANCE\n  - regNo: WB-02\n    name: Hauler\n    type: Diesel\n    location: Sector 5, Kolkata\n    fuel: 80\n    tireWear: 12\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.tick_period_ms, 500);
        assert_eq!(cfg.backend_url.as_deref(), Some("http://localhost:8080"));

        let records = cfg.fleet_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status(), LifecycleStatus::UnderMaintenance);
        assert_eq!(records[0].energy.label(), "battery");
        assert_eq!(records[0].name, "Unknown Vehicle");
        assert_eq!(records[1].city, "Kolkata");
        assert_eq!(records[1].reading.tire_wear, 12.0);
        assert_eq!(records[1].reading.engine_health, 100.0);
    }

    #[test]
    fn zero_period_is_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"tick_period_ms: 0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
