use crate::fleet::reading::TelemetryState;
use crate::fleet::vehicle::{extract_city, LifecycleStatus, VehicleIdentity, VehicleRecord};
use crate::prelude::{SimulationError, SimulationResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Update produced by the tick loop.
///
/// Carries only the simulated measurements. The lifecycle status belongs to
/// the CRUD surface, except that a grounding tick moves it to maintenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryPatch {
    pub fuel_level: f64,
    pub engine_health: f64,
    pub tire_wear: f64,
    pub speed: f64,
    pub grounded: bool,
}

impl TelemetryPatch {
    pub fn from_reading(reading: &TelemetryState, grounded: bool) -> Self {
        Self {
            fuel_level: reading.fuel_level,
            engine_health: reading.engine_health,
            tire_wear: reading.tire_wear,
            speed: reading.speed,
            grounded,
        }
    }
}

/// Update produced by the CRUD surface. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrudPatch {
    pub name: Option<String>,
    pub vehicle_type: Option<String>,
    pub location: Option<String>,
    pub fuel_level: Option<f64>,
    pub status: Option<LifecycleStatus>,
}

/// Owned fleet list. Both writers go through the narrow update methods below:
/// the tick loop calls [`FleetStore::apply_telemetry_update`], while the
/// inventory CRUD surface (an external caller) uses `insert`, `remove` and
/// [`FleetStore::apply_crud_update`].
#[derive(Debug, Clone, Default)]
pub struct FleetStore {
    inner: Arc<RwLock<Vec<VehicleRecord>>>,
}

impl FleetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = VehicleRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<VehicleRecord>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<VehicleRecord>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces by identity, returning the replaced record.
    pub fn insert(&self, record: VehicleRecord) -> Option<VehicleRecord> {
        let mut records = self.write();
        match records.iter_mut().find(|r| r.identity == record.identity) {
            Some(existing) => Some(std::mem::replace(existing, record)),
            None => {
                records.push(record);
                None
            }
        }
    }

    pub fn remove(&self, id: &VehicleIdentity) -> Option<VehicleRecord> {
        let mut records = self.write();
        let index = records.iter().position(|r| &r.identity == id)?;
        Some(records.remove(index))
    }

    pub fn get(&self, id: &VehicleIdentity) -> Option<VehicleRecord> {
        self.read().iter().find(|r| &r.identity == id).cloned()
    }

    pub fn list(&self) -> Vec<VehicleRecord> {
        self.read().clone()
    }

    pub fn contains(&self, id: &VehicleIdentity) -> bool {
        self.read().iter().any(|r| &r.identity == id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn apply_crud_update(
        &self,
        id: &VehicleIdentity,
        patch: CrudPatch,
    ) -> SimulationResult<VehicleRecord> {
        let mut records = self.write();
        let record = records
            .iter_mut()
            .find(|r| &r.identity == id)
            .ok_or_else(|| SimulationError::VehicleNotFound(id.clone()))?;

        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(vehicle_type) = patch.vehicle_type {
            record.set_vehicle_type(vehicle_type);
        }
        if let Some(location) = patch.location {
            record.city = extract_city(Some(&location));
        }
        if let Some(fuel_level) = patch.fuel_level {
            record.reading.fuel_level = fuel_level;
        }
        if let Some(status) = patch.status {
            record.reading.lifecycle_status = status;
        }
        record.reading = record.reading.clamped();
        Ok(record.clone())
    }

    /// Writes the measured fields and returns the lifecycle status now on
    /// record.
    pub fn apply_telemetry_update(
        &self,
        id: &VehicleIdentity,
        patch: TelemetryPatch,
    ) -> SimulationResult<LifecycleStatus> {
        let mut records = self.write();
        let record = records
            .iter_mut()
            .find(|r| &r.identity == id)
            .ok_or_else(|| SimulationError::VehicleNotFound(id.clone()))?;

        let reading = &mut record.reading;
        reading.fuel_level = patch.fuel_level;
        reading.engine_health = patch.engine_health;
        reading.tire_wear = patch.tire_wear;
        reading.speed = patch.speed;
        if patch.grounded {
            reading.lifecycle_status = LifecycleStatus::UnderMaintenance;
        }
        *reading = reading.clamped();
        Ok(reading.lifecycle_status)
    }
}
