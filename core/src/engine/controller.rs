use crate::engine::dispatcher::AlertDispatcher;
use crate::engine::monitor::FiredFlags;
use crate::engine::notice::{Notice, NoticeBoard};
use crate::engine::session::{
    LiveTelemetry, SessionEnd, SessionPhase, SimulationSession, TickOutcome, TICK_PERIOD,
};
use crate::engine::steps::StepSource;
use crate::fleet::{FleetStore, TelemetryPatch, VehicleIdentity};
use crate::prelude::{SimulationError, SimulationResult};
use crate::sync::SyncQueue;
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// State shared between the controller and its tick task.
///
/// `generation` changes on every teardown; a tick task whose generation no
/// longer matches exits without touching anything.
struct Engine<S> {
    steps: S,
    session: Option<SimulationSession>,
    generation: u64,
}

/// Where tick results go: the fleet list, the live view and the notice board.
#[derive(Clone)]
struct Projection {
    store: FleetStore,
    live: watch::Sender<Option<LiveTelemetry>>,
    notices: NoticeBoard,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl Projection {
    /// Publishes one step and returns the published snapshot. Returns `None`
    /// when the vehicle is no longer in the fleet list.
    fn commit(
        &self,
        outcome: &TickOutcome,
        mut snapshot: LiveTelemetry,
    ) -> Option<LiveTelemetry> {
        let vehicle = snapshot.vehicle.clone();
        let patch = TelemetryPatch::from_reading(&outcome.state, outcome.grounded.is_some());
        match self.store.apply_telemetry_update(&vehicle, patch) {
            Ok(status) => snapshot.state.lifecycle_status = status,
            Err(err) => {
                self.logger.warn(&format!("dropping session for {}: {}", vehicle, err));
                return None;
            }
        }

        self.logger.trace(&format!(
            "{} tick {}: {} {:.0}% engine {:.0}% tires {:.0}% speed {:.0} km/h",
            vehicle,
            snapshot.ticks,
            snapshot.energy_label(),
            outcome.state.fuel_level,
            outcome.state.engine_health,
            outcome.state.tire_wear,
            outcome.state.speed
        ));

        if let Some(reason) = outcome.grounded {
            let message = format!(
                "Vehicle {} grounded for maintenance: {}",
                vehicle,
                reason.describe()
            );
            self.logger.warn(&message);
            self.notices.post(Notice::VehicleGrounded {
                vehicle,
                reason,
                message,
            });
        }

        self.live.send_replace(Some(snapshot.clone()));
        Some(snapshot)
    }

    fn ended(&self, session: &SimulationSession, reason: SessionEnd) {
        self.logger.trace(&format!(
            "session for {} ended after {} ticks: {:?}",
            session.vehicle(),
            session.ticks(),
            reason
        ));
    }
}

/// Owns the single active simulation session.
///
/// Selecting a vehicle tears down the previous session before the new one is
/// seeded. The tick task must be spawned from within a tokio runtime.
pub struct SimulationController<S: StepSource + 'static> {
    engine: Arc<Mutex<Engine<S>>>,
    task: Option<JoinHandle<()>>,
    dispatcher: AlertDispatcher,
    projection: Projection,
    period: Duration,
}

fn lock<S>(engine: &Mutex<Engine<S>>) -> MutexGuard<'_, Engine<S>> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: StepSource + 'static> SimulationController<S> {
    pub fn new(
        store: FleetStore,
        steps: S,
        queue: SyncQueue,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let notices = NoticeBoard::new();
        let (live, _) = watch::channel(None);
        Self {
            engine: Arc::new(Mutex::new(Engine {
                steps,
                session: None,
                generation: 0,
            })),
            task: None,
            dispatcher: AlertDispatcher::new(queue, notices.clone(), metrics.clone()),
            projection: Projection {
                store,
                live,
                notices,
                metrics,
                logger: LogManager::new("session"),
            },
            period: TICK_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn store(&self) -> &FleetStore {
        &self.projection.store
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<LiveTelemetry>> {
        self.projection.live.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.projection.notices.subscribe()
    }

    pub fn latest(&self) -> Option<LiveTelemetry> {
        self.projection.live.borrow().clone()
    }

    pub fn active_vehicle(&self) -> Option<VehicleIdentity> {
        lock(&self.engine)
            .session
            .as_ref()
            .map(|session| session.vehicle().clone())
    }

    pub fn fired_flags(&self) -> Option<FiredFlags> {
        lock(&self.engine).session.as_ref().map(|session| session.fired())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.engine)
            .session
            .as_ref()
            .is_some_and(|session| session.phase() == SessionPhase::Running)
    }

    /// Starts simulating `id`, replacing any active session.
    ///
    /// A vehicle under maintenance is rejected and the active session, if
    /// any, keeps running.
    pub fn select(&mut self, id: &VehicleIdentity) -> SimulationResult<LiveTelemetry> {
        let record = self
            .projection
            .store
            .get(id)
            .ok_or_else(|| SimulationError::VehicleNotFound(id.clone()))?;

        if !record.is_selectable() {
            let message = format!(
                "Vehicle {} is in maintenance. Cannot start tracking.",
                id
            );
            self.projection.logger.warn(&message);
            self.projection.metrics.record_rejection();
            self.projection.notices.post(Notice::SelectionRejected {
                vehicle: id.clone(),
                message,
            });
            return Err(SimulationError::VehicleUnavailable(id.clone()));
        }

        self.stop(SessionEnd::Replaced);

        let (snapshot, generation, running) = {
            let mut engine = lock(&self.engine);
            let Engine { steps, session, generation } = &mut *engine;
            let (seeded, outcome) = SimulationSession::seed(&record, steps, &self.dispatcher);
            let Some(snapshot) = self.projection.commit(&outcome, seeded.snapshot()) else {
                return Err(SimulationError::VehicleNotFound(id.clone()));
            };
            let running = seeded.phase() == SessionPhase::Running;
            *session = Some(seeded);
            (snapshot, *generation, running)
        };

        self.projection
            .logger
            .record(&format!("tracking {} ({})", id, snapshot.energy_label()));

        if running {
            self.task = Some(tokio::spawn(drive(
                self.engine.clone(),
                generation,
                self.period,
                self.dispatcher.clone(),
                self.projection.clone(),
            )));
        }
        Ok(snapshot)
    }

    /// Cancels the active session, keeping the last published snapshot.
    /// Idempotent.
    pub fn teardown(&mut self) {
        self.stop(SessionEnd::Closed);
    }

    /// Tears down and clears the live view.
    pub fn close(&mut self) {
        self.teardown();
        self.projection.live.send_replace(None);
    }

    fn stop(&mut self, reason: SessionEnd) {
        let ended = {
            let mut engine = lock(&self.engine);
            engine.generation = engine.generation.wrapping_add(1);
            engine.session.take()
        };
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(session) = ended {
            self.projection.ended(&session, reason);
        }
    }
}

impl<S: StepSource + 'static> Drop for SimulationController<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn drive<S: StepSource + 'static>(
    engine: Arc<Mutex<Engine<S>>>,
    generation: u64,
    period: Duration,
    dispatcher: AlertDispatcher,
    projection: Projection,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if !step(&engine, generation, &dispatcher, &projection) {
            break;
        }
    }
}

/// Runs one tick under the engine lock. Returns whether ticking should go on.
///
/// A session whose vehicle has left the fleet list is closed here.
fn step<S: StepSource>(
    engine: &Mutex<Engine<S>>,
    generation: u64,
    dispatcher: &AlertDispatcher,
    projection: &Projection,
) -> bool {
    let mut engine = lock(engine);
    if engine.generation != generation {
        return false;
    }
    let Engine {
        steps,
        session,
        generation: current,
    } = &mut *engine;
    let Some(active) = session.as_mut() else {
        return false;
    };

    let committed = projection.store.contains(active.vehicle())
        && match active.tick(steps, dispatcher) {
            Some(outcome) => {
                projection.metrics.record_tick();
                projection.commit(&outcome, active.snapshot()).is_some()
            }
            None => return false,
        };
    let running = active.phase() == SessionPhase::Running;

    if !committed {
        *current = current.wrapping_add(1);
        if let Some(ended) = session.take() {
            projection
                .logger
                .warn(&format!("{} left the fleet list", ended.vehicle()));
            projection.ended(&ended, SessionEnd::Closed);
        }
        projection.live.send_replace(None);
        return false;
    }
    running
}
