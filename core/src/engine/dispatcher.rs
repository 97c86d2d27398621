use crate::engine::monitor::ConditionKind;
use crate::engine::notice::{Notice, NoticeBoard};
use crate::fleet::{TelemetryState, VehicleIdentity};
use crate::sync::{SyncEvent, SyncQueue};
use crate::telemetry::{LogManager, MetricsRecorder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable record of one fired alert condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub vehicle: VehicleIdentity,
    pub condition: ConditionKind,
    pub message: String,
    pub reading: f64,
    pub timestamp: DateTime<Utc>,
}

impl AlertRecord {
    pub fn new(
        vehicle: VehicleIdentity,
        condition: ConditionKind,
        state: &TelemetryState,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let (reading, message) = match condition {
            ConditionKind::EngineHealthLow => (
                state.engine_health,
                format!("Engine health low ({}%)", state.engine_health),
            ),
            ConditionKind::TireWearHigh => (
                state.tire_wear,
                format!("Tire wear high ({}%)", state.tire_wear),
            ),
            ConditionKind::Overspeed => {
                (state.speed, format!("Overspeed {} km/h", state.speed))
            }
        };
        Self {
            vehicle,
            condition,
            message,
            reading,
            timestamp,
        }
    }

    pub fn action_needed(&self) -> &'static str {
        match self.condition {
            ConditionKind::EngineHealthLow => "Schedule engine diagnostics/maintenance",
            ConditionKind::TireWearHigh => "Inspect/rotate tires or schedule replacement",
            ConditionKind::Overspeed => "Contact driver about speeding",
        }
    }
}

/// Turns fired conditions into alert records and queues their backend calls.
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    queue: SyncQueue,
    notices: NoticeBoard,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl AlertDispatcher {
    pub fn new(queue: SyncQueue, notices: NoticeBoard, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            queue,
            notices,
            metrics,
            logger: LogManager::new("alerts"),
        }
    }

    pub fn dispatch(
        &self,
        vehicle: &VehicleIdentity,
        condition: ConditionKind,
        state: &TelemetryState,
    ) -> AlertRecord {
        let record = AlertRecord::new(vehicle.clone(), condition, state, Utc::now());
        let event = match condition {
            ConditionKind::Overspeed => SyncEvent::ReportOverspeed {
                vehicle: vehicle.clone(),
                timestamp: record.timestamp,
                speed: record.reading,
            },
            ConditionKind::EngineHealthLow | ConditionKind::TireWearHigh => {
                SyncEvent::RecordAlert {
                    vehicle: vehicle.clone(),
                    issue: record.message.clone(),
                    action_needed: record.action_needed().to_string(),
                }
            }
        };
        self.forward(event);

        self.metrics.record_alert();
        if condition == ConditionKind::Overspeed {
            self.metrics.record_overspeed();
        }
        self.logger
            .warn(&format!("{} alert for {}", record.message, vehicle));
        self.notices.post(match condition {
            ConditionKind::Overspeed => Notice::Overspeed {
                alert: record.clone(),
            },
            _ => Notice::ThresholdBreach {
                alert: record.clone(),
            },
        });
        record
    }

    /// Queues a fuel/battery level update for the backend.
    pub fn sync_fuel(&self, vehicle: &VehicleIdentity, fuel_level: f64) {
        self.forward(SyncEvent::UpdateFuel {
            vehicle: vehicle.clone(),
            fuel_level,
        });
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    fn forward(&self, event: SyncEvent) {
        if let Err(err) = self.queue.emit(event) {
            self.logger.warn(&format!("dropping backend call: {}", err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync;

    fn dispatcher() -> (
        AlertDispatcher,
        tokio::sync::mpsc::UnboundedReceiver<SyncEvent>,
        NoticeBoard,
    ) {
        let (queue, rx) = sync::channel();
        let notices = NoticeBoard::new();
        (
            AlertDispatcher::new(queue, notices.clone(), Arc::new(MetricsRecorder::new())),
            rx,
            notices,
        )
    }

    #[test]
    fn engine_alert_embeds_reading_and_records_alert() {
        let (dispatcher, mut rx, notices) = dispatcher();
        let mut listener = notices.subscribe();
        let state = TelemetryState::new(40.0, 23.0, 30.0);
        let record = dispatcher.dispatch(&"WB-07".into(), ConditionKind::EngineHealthLow, &state);

        assert_eq!(record.message, "Engine health low (23%)");
        assert_eq!(record.reading, 23.0);
        assert_eq!(
            rx.try_recv().unwrap(),
            SyncEvent::RecordAlert {
                vehicle: "WB-07".into(),
                issue: "Engine health low (23%)".into(),
                action_needed: "Schedule engine diagnostics/maintenance".into(),
            }
        );
        assert!(rx.try_recv().is_err());
        assert!(matches!(
            listener.try_recv().unwrap(),
            Notice::ThresholdBreach { .. }
        ));
    }

    #[test]
    fn overspeed_goes_to_overspeed_endpoint_only() {
        let (dispatcher, mut rx, _notices) = dispatcher();
        let state = TelemetryState {
            speed: 105.0,
            ..TelemetryState::new(40.0, 80.0, 10.0)
        };
        let record = dispatcher.dispatch(&"WB-07".into(), ConditionKind::Overspeed, &state);

        match rx.try_recv().unwrap() {
            SyncEvent::ReportOverspeed {
                speed, timestamp, ..
            } => {
                assert_eq!(speed, 105.0);
                assert_eq!(timestamp, record.timestamp);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_queue_does_not_fail_dispatch() {
        let (dispatcher, rx, _notices) = dispatcher();
        drop(rx);
        let record = dispatcher.dispatch(
            &"WB-07".into(),
            ConditionKind::TireWearHigh,
            &TelemetryState::new(40.0, 80.0, 78.0),
        );
        assert_eq!(record.message, "Tire wear high (78%)");
    }
}
