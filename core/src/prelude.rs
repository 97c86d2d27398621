use crate::fleet::VehicleIdentity;

/// Errors surfaced to the operator by the simulation controller.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("vehicle {0} is under maintenance")]
    VehicleUnavailable(VehicleIdentity),
    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleIdentity),
}

pub type SimulationResult<T> = Result<T, SimulationError>;

/// Failure of an outbound backend call. Never fatal to the tick loop.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("backend rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("sync queue closed")]
    Unavailable,
}

pub type SyncResult<T> = Result<T, SyncError>;
