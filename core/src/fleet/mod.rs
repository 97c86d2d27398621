pub mod reading;
pub mod store;
pub mod vehicle;

pub use reading::{clamp_percent, GroundingReason, TelemetryState, PERCENT_MAX, SPEED_MAX_KMH};
pub use store::{CrudPatch, FleetStore, TelemetryPatch};
pub use vehicle::{EnergySource, LifecycleStatus, VehicleIdentity, VehicleRecord};
