use crate::engine::dispatcher::AlertRecord;
use crate::fleet::{GroundingReason, VehicleIdentity};
use serde::Serialize;
use tokio::sync::broadcast;

pub const NOTICE_CAPACITY: usize = 64;

/// Operator-facing notice raised by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    SelectionRejected {
        vehicle: VehicleIdentity,
        message: String,
    },
    VehicleGrounded {
        vehicle: VehicleIdentity,
        reason: GroundingReason,
        message: String,
    },
    ThresholdBreach {
        alert: AlertRecord,
    },
    Overspeed {
        alert: AlertRecord,
    },
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::SelectionRejected { message, .. } | Notice::VehicleGrounded { message, .. } => {
                message
            }
            Notice::ThresholdBreach { alert } | Notice::Overspeed { alert } => &alert.message,
        }
    }
}

/// Fan-out of notices to whoever displays them. Sending with no listeners is fine.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    tx: broadcast::Sender<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { tx }
    }

    pub fn post(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}
