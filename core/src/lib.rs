//! Telemetry simulation and threshold-alerting engine for the fleet dashboard.
//!
//! A single [`engine::SimulationController`] owns at most one live
//! [`engine::SimulationSession`]. Each tick mutates the vehicle's reading,
//! evaluates the safety thresholds, and hands outbound calls to the
//! [`sync`] queue so the backend never stalls the tick loop.

pub mod engine;
pub mod fleet;
pub mod prelude;
pub mod sync;
pub mod telemetry;

pub use engine::{SimulationController, SimulationSession};
pub use fleet::{FleetStore, LifecycleStatus, TelemetryState, VehicleIdentity, VehicleRecord};
pub use prelude::{SimulationError, SimulationResult, SyncError, SyncResult};
