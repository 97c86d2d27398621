pub mod controller;
pub mod dispatcher;
pub mod monitor;
pub mod notice;
pub mod session;
pub mod steps;

pub use controller::SimulationController;
pub use dispatcher::{AlertDispatcher, AlertRecord};
pub use monitor::{ConditionKind, FiredFlags, ThresholdMonitor};
pub use notice::{Notice, NoticeBoard};
pub use session::{LiveTelemetry, SessionEnd, SessionPhase, SimulationSession, TickOutcome, TICK_PERIOD};
pub use steps::{RandomSteps, ScriptedSteps, StepSource};
