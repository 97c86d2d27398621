use crate::fleet::reading::TelemetryState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration number used to correlate sessions with backend records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleIdentity(String);

impl VehicleIdentity {
    pub fn new(reg_no: impl Into<String>) -> Self {
        Self(reg_no.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VehicleIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle status of a vehicle. The engine only ever sets `UnderMaintenance`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    #[default]
    #[serde(alias = "Available")]
    Available,
    #[serde(alias = "InService", alias = "IN-SERVICE")]
    InService,
    #[serde(alias = "MAINTENANCE", alias = "Maintenance", alias = "UnderMaintenance")]
    UnderMaintenance,
}

impl LifecycleStatus {
    /// Lenient mapping of the status strings stored by the backend.
    pub fn from_backend(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "MAINTENANCE" | "UNDER_MAINTENANCE" => LifecycleStatus::UnderMaintenance,
            "IN_SERVICE" | "INSERVICE" => LifecycleStatus::InService,
            _ => LifecycleStatus::Available,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Available => "AVAILABLE",
            LifecycleStatus::InService => "IN_SERVICE",
            LifecycleStatus::UnderMaintenance => "UNDER_MAINTENANCE",
        }
    }
}

/// Whether `fuelLevel` is read as fuel or as battery charge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergySource {
    #[default]
    Fuel,
    Battery,
}

impl EnergySource {
    pub fn from_vehicle_type(vehicle_type: &str) -> Self {
        if vehicle_type.to_ascii_lowercase().contains("ev") {
            EnergySource::Battery
        } else {
            EnergySource::Fuel
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EnergySource::Fuel => "fuel",
            EnergySource::Battery => "battery",
        }
    }
}

/// One entry of the fleet list shared by the tick loop and the CRUD surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub identity: VehicleIdentity,
    pub name: String,
    pub vehicle_type: String,
    pub energy: EnergySource,
    pub city: String,
    pub reading: TelemetryState,
}

impl VehicleRecord {
    pub fn new(
        identity: impl Into<VehicleIdentity>,
        name: impl Into<String>,
        vehicle_type: impl Into<String>,
    ) -> Self {
        let vehicle_type = vehicle_type.into();
        Self {
            identity: identity.into(),
            name: name.into(),
            energy: EnergySource::from_vehicle_type(&vehicle_type),
            vehicle_type,
            city: extract_city(None),
            reading: TelemetryState::default(),
        }
    }

    pub fn with_reading(mut self, reading: TelemetryState) -> Self {
        self.reading = reading.clamped();
        self
    }

    pub fn with_status(mut self, status: LifecycleStatus) -> Self {
        self.reading.lifecycle_status = status;
        self
    }

    pub fn with_location(mut self, location: Option<&str>) -> Self {
        self.city = extract_city(location);
        self
    }

    pub fn set_vehicle_type(&mut self, vehicle_type: impl Into<String>) {
        self.vehicle_type = vehicle_type.into();
        self.energy = EnergySource::from_vehicle_type(&self.vehicle_type);
    }

    pub fn status(&self) -> LifecycleStatus {
        self.reading.lifecycle_status
    }

    pub fn is_selectable(&self) -> bool {
        self.status() != LifecycleStatus::UnderMaintenance
    }
}

/// Last comma-separated segment of a free-form address.
pub fn extract_city(location: Option<&str>) -> String {
    location
        .and_then(|value| value.rsplit(',').next())
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .unwrap_or("N/A")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ev_types_read_as_battery() {
        assert_eq!(EnergySource::from_vehicle_type("EV Van"), EnergySource::Battery);
        assert_eq!(EnergySource::from_vehicle_type("Diesel Truck"), EnergySource::Fuel);
    }

    #[test]
    fn backend_maintenance_spellings_map_to_under_maintenance() {
        for raw in ["MAINTENANCE", "Maintenance", "under_maintenance", "UNDER-MAINTENANCE"] {
            assert_eq!(
                LifecycleStatus::from_backend(raw),
                LifecycleStatus::UnderMaintenance
            );
        }
        assert_eq!(LifecycleStatus::from_backend("garbage"), LifecycleStatus::Available);
    }

    #[test]
    fn status_deserializes_legacy_alias() {
        let status: LifecycleStatus = serde_json::from_str("\"MAINTENANCE\"").unwrap();
        assert_eq!(status, LifecycleStatus::UnderMaintenance);
    }

    #[test]
    fn city_is_last_location_segment() {
        assert_eq!(extract_city(Some("12 Park Street, Kolkata")), "Kolkata");
        assert_eq!(extract_city(None), "N/A");
        assert_eq!(extract_city(Some("  ")), "N/A");
    }

    #[test]
    fn maintenance_records_are_not_selectable() {
        let record = VehicleRecord::new("WB-01", "Van", "Petrol")
            .with_status(LifecycleStatus::UnderMaintenance);
        assert!(!record.is_selectable());
    }
}
