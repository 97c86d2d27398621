use anyhow::Context;
use clap::Parser;
use fleetcore::fleet::VehicleIdentity;
use gui_bridge::bridge::GuiBridge;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod backend;
mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Fleet telemetry simulation driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Base URL of the fleet backend; calls are only logged when absent
    #[arg(long)]
    backend_url: Option<String>,
    /// Tick period in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Number of synthetic vehicles when the workflow lists none
    #[arg(long)]
    vehicles: Option<usize>,
    /// Seed for telemetry draws
    #[arg(long)]
    seed: Option<u64>,
    /// Registration number to start tracking immediately
    #[arg(long)]
    select: Option<String>,
    /// Track one vehicle until it is grounded, print a summary and exit
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Keep the HTTP bridge alive for the dashboard
    #[arg(long, default_value_t = false)]
    serve: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut WorkflowConfig) {
        if let Some(url) = &self.backend_url {
            config.backend_url = Some(url.clone());
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_period_ms = tick_ms;
        }
        if let Some(count) = self.vehicles {
            config.fleet.count = count;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
            config.fleet.seed = seed;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = match &args.workflow {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    };
    args.apply_overrides(&mut workflow_config);
    workflow_config.validate()?;

    // Ticks, sync calls and the bridge share one cooperative thread.
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;
    runtime.block_on(run(args, workflow_config))
}

async fn run(args: Args, workflow_config: WorkflowConfig) -> anyhow::Result<()> {
    let runner = Runner::new(workflow_config);
    let fleet = runner.start()?;
    let selected = args.select.as_deref().map(VehicleIdentity::new);

    if args.offline {
        let summary = runner.run_offline(&fleet, selected.clone()).await?;
        println!(
            "Offline run -> {} grounded after {} ticks: {} {:.0}%, engine {:.0}%, tires {:.0}%; alerts {}, overspeed {}, sync failures {}",
            summary.vehicle,
            summary.last.ticks,
            summary.last.energy_label(),
            summary.last.state.fuel_level,
            summary.last.state.engine_health,
            summary.last.state.tire_wear,
            summary.metrics.alerts_dispatched,
            summary.metrics.overspeed_reports,
            summary.metrics.sync_failures
        );
    } else if let Some(vehicle) = &selected {
        let snapshot = fleet
            .controller
            .lock()
            .await
            .select(vehicle)
            .with_context(|| format!("selecting vehicle {}", vehicle))?;
        println!(
            "Tracking {} ({} {:.0}%)",
            snapshot.vehicle,
            snapshot.energy_label(),
            snapshot.state.fuel_level
        );
    }

    if args.serve {
        let bridge = GuiBridge::new(&fleet).await;
        let bind = runner.config().bind;
        tokio::spawn(bridge.serve(bind));
        println!("HTTP bridge running on http://{} (Ctrl+C to stop)...", bind);
        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
    } else if selected.is_some() && !args.offline {
        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
    }

    fleet.shutdown().await;
    Ok(())
}
