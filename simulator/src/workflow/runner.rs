use crate::backend::{HttpBackend, LoggingBackend};
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use fleetcore::engine::{LiveTelemetry, RandomSteps, SessionPhase, SimulationController};
use fleetcore::fleet::{FleetStore, VehicleIdentity};
use fleetcore::sync::{self, BackendSync, SyncWorker, SyncWorkerHandle};
use fleetcore::telemetry::{MetricsRecorder, MetricsSnapshot};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedController = Arc<Mutex<SimulationController<RandomSteps>>>;

/// Live engine wiring: controller, fleet list, counters and the sync worker.
pub struct FleetRuntime {
    pub controller: SharedController,
    pub store: FleetStore,
    pub metrics: Arc<MetricsRecorder>,
    worker: SyncWorkerHandle,
}

impl FleetRuntime {
    /// Closes the active session and flushes pending backend calls.
    pub async fn shutdown(self) {
        self.controller.lock().await.close();
        self.worker.shutdown().await;
    }
}

#[derive(Debug)]
pub struct OfflineSummary {
    pub vehicle: VehicleIdentity,
    pub last: LiveTelemetry,
    pub metrics: MetricsSnapshot,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    fn backend(&self) -> anyhow::Result<Arc<dyn BackendSync>> {
        match self.config.backend_url.as_deref() {
            Some(url) => {
                let backend = HttpBackend::new(url)
                    .with_context(|| format!("configuring backend at {}", url))?;
                Ok(Arc::new(backend))
            }
            None => Ok(Arc::new(LoggingBackend)),
        }
    }

    fn steps(&self) -> RandomSteps {
        match self.config.seed {
            Some(seed) => RandomSteps::seeded(seed),
            None => RandomSteps::from_entropy(),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> anyhow::Result<FleetRuntime> {
        let backend = self.backend()?;
        Ok(self.start_with(backend))
    }

    pub fn start_with(&self, backend: Arc<dyn BackendSync>) -> FleetRuntime {
        let store = FleetStore::from_records(self.config.fleet_records());
        let metrics = Arc::new(MetricsRecorder::new());
        let (queue, rx) = sync::channel();
        let worker = SyncWorker::new(backend, metrics.clone()).spawn(rx);
        let controller =
            SimulationController::new(store.clone(), self.steps(), queue, metrics.clone())
                .with_period(self.config.tick_period());

        log::info!(
            "fleet loaded: {} vehicles, tick every {} ms",
            store.len(),
            self.config.tick_period_ms
        );

        FleetRuntime {
            controller: Arc::new(Mutex::new(controller)),
            store,
            metrics,
            worker,
        }
    }

    /// Tracks one vehicle until its session stops.
    ///
    /// Without an explicit vehicle the first selectable one is used.
    pub async fn run_offline(
        &self,
        runtime: &FleetRuntime,
        vehicle: Option<VehicleIdentity>,
    ) -> anyhow::Result<OfflineSummary> {
        let vehicle = match vehicle {
            Some(vehicle) => vehicle,
            None => runtime
                .store
                .list()
                .into_iter()
                .find(|record| record.is_selectable())
                .map(|record| record.identity)
                .context("no vehicle available for tracking")?,
        };

        let mut live = {
            let mut controller = runtime.controller.lock().await;
            let live = controller.subscribe();
            controller
                .select(&vehicle)
                .with_context(|| format!("selecting vehicle {}", vehicle))?;
            live
        };

        let last = live
            .wait_for(|snapshot| {
                snapshot
                    .as_ref()
                    .is_some_and(|s| s.phase == SessionPhase::Stopped)
            })
            .await
            .context("live telemetry feed closed")?
            .clone()
            .context("live telemetry cleared before the session stopped")?;

        Ok(OfflineSummary {
            vehicle,
            last,
            metrics: runtime.metrics.snapshot(),
        })
    }
}
