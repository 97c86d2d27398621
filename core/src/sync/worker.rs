use crate::sync::{BackendSync, SyncEvent};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

/// Drains the outbound queue against a [`BackendSync`] implementation.
///
/// Each event is delivered on its own task, so a slow call never holds up
/// the ones queued after it.
pub struct SyncWorker {
    backend: Arc<dyn BackendSync>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

/// Handle used to stop the worker once queued events have been flushed.
pub struct SyncWorkerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SyncWorkerHandle {
    /// Delivers whatever is still queued, waits for calls in flight, then
    /// stops the worker.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.join.await {
            log::warn!("sync worker ended abnormally: {}", err);
        }
    }

    pub fn abort(&self) {
        self.join.abort();
    }
}

impl SyncWorker {
    pub fn new(backend: Arc<dyn BackendSync>, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            backend,
            metrics,
            logger: LogManager::new("sync"),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn spawn(self, rx: mpsc::UnboundedReceiver<SyncEvent>) -> SyncWorkerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(rx, shutdown_rx));
        SyncWorkerHandle { shutdown, join }
    }

    async fn run(
        self,
        mut rx: mpsc::UnboundedReceiver<SyncEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => self.launch(&mut in_flight, event),
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    self.reap(joined);
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        while let Ok(event) = rx.try_recv() {
                            self.launch(&mut in_flight, event);
                        }
                        break;
                    }
                }
            }
        }
        while let Some(joined) = in_flight.join_next().await {
            self.reap(joined);
        }
        self.logger.trace("sync worker stopped");
    }

    fn launch(&self, in_flight: &mut JoinSet<()>, event: SyncEvent) {
        in_flight.spawn(deliver(
            self.backend.clone(),
            self.metrics.clone(),
            self.logger,
            event,
        ));
    }

    fn reap(&self, joined: Result<(), tokio::task::JoinError>) {
        if let Err(err) = joined {
            self.logger.warn(&format!("delivery task ended abnormally: {}", err));
        }
    }
}

async fn deliver(
    backend: Arc<dyn BackendSync>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
    event: SyncEvent,
) {
    match event.deliver(backend.as_ref()).await {
        Ok(()) => {
            metrics.record_sync_ok();
            logger.trace(&format!("{} delivered for {}", event.name(), event.vehicle()));
        }
        Err(err) => {
            metrics.record_sync_failure();
            logger.warn(&format!(
                "{} failed for {}: {}",
                event.name(),
                event.vehicle(),
                err
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::VehicleIdentity;
    use crate::prelude::SyncResult;
    use crate::sync::channel;
    use crate::sync::recording::{Call, RecordingBackend};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::{self, Instant};

    /// Backend whose fuel updates take five seconds; logs when each call returns.
    struct SlowFuelBackend {
        started: Instant,
        finished: Mutex<Vec<(&'static str, Duration)>>,
    }

    impl SlowFuelBackend {
        fn new() -> Self {
            Self {
                started: Instant::now(),
                finished: Mutex::new(Vec::new()),
            }
        }

        fn finish(&self, call: &'static str) {
            let elapsed = self.started.elapsed();
            self.finished.lock().unwrap().push((call, elapsed));
        }
    }

    #[async_trait]
    impl BackendSync for SlowFuelBackend {
        async fn update_fuel(&self, _vehicle: &VehicleIdentity, _fuel: f64) -> SyncResult<()> {
            time::sleep(Duration::from_secs(5)).await;
            self.finish("fuel");
            Ok(())
        }

        async fn record_alert(
            &self,
            _vehicle: &VehicleIdentity,
            _issue: &str,
            _action_needed: &str,
        ) -> SyncResult<()> {
            self.finish("alert");
            Ok(())
        }

        async fn report_overspeed(
            &self,
            _vehicle: &VehicleIdentity,
            _timestamp: DateTime<Utc>,
            _speed: f64,
        ) -> SyncResult<()> {
            self.finish("overspeed");
            Ok(())
        }
    }

    #[tokio::test]
    async fn worker_flushes_queue_on_shutdown() {
        let backend = Arc::new(RecordingBackend::new());
        let metrics = Arc::new(MetricsRecorder::new());
        let (queue, rx) = channel();
        let handle = SyncWorker::new(backend.clone(), metrics.clone()).spawn(rx);

        for fuel in [40.0, 39.0] {
            queue
                .emit(SyncEvent::UpdateFuel {
                    vehicle: VehicleIdentity::new("WB-01"),
                    fuel_level: fuel,
                })
                .unwrap();
        }
        handle.shutdown().await;

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.contains(&Call::UpdateFuel("WB-01".into(), 40.0)));
        assert!(calls.contains(&Call::UpdateFuel("WB-01".into(), 39.0)));
        assert_eq!(metrics.snapshot().sync_ok, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_does_not_hold_up_later_calls() {
        let backend = Arc::new(SlowFuelBackend::new());
        let metrics = Arc::new(MetricsRecorder::new());
        let (queue, rx) = channel();
        let handle = SyncWorker::new(backend.clone(), metrics.clone()).spawn(rx);

        for fuel in [40.0, 39.0, 38.0] {
            queue
                .emit(SyncEvent::UpdateFuel {
                    vehicle: VehicleIdentity::new("WB-01"),
                    fuel_level: fuel,
                })
                .unwrap();
        }
        queue
            .emit(SyncEvent::RecordAlert {
                vehicle: VehicleIdentity::new("WB-01"),
                issue: "Tire wear high (76%)".into(),
                action_needed: "Inspect/rotate tires or schedule replacement".into(),
            })
            .unwrap();
        handle.shutdown().await;

        let finished = backend.finished.lock().unwrap().clone();
        assert_eq!(finished.len(), 4);
        let alert = finished.iter().find(|(call, _)| *call == "alert").unwrap();
        assert!(alert.1 < Duration::from_secs(1));
        assert!(finished
            .iter()
            .filter(|(call, _)| *call == "fuel")
            .all(|(_, at)| *at < Duration::from_secs(6)));
        assert_eq!(metrics.snapshot().sync_ok, 4);
    }

    #[tokio::test]
    async fn failures_are_counted_not_propagated() {
        let backend = Arc::new(RecordingBackend::failing());
        let metrics = Arc::new(MetricsRecorder::new());
        let (queue, rx) = channel();
        let handle = SyncWorker::new(backend.clone(), metrics.clone()).spawn(rx);

        queue
            .emit(SyncEvent::RecordAlert {
                vehicle: VehicleIdentity::new("WB-02"),
                issue: "Engine health low (20%)".into(),
                action_needed: "Schedule engine diagnostics/maintenance".into(),
            })
            .unwrap();
        handle.shutdown().await;

        assert_eq!(backend.calls().len(), 1);
        assert_eq!(metrics.snapshot().sync_failures, 1);
        assert_eq!(metrics.snapshot().sync_ok, 0);
    }
}
