use anyhow::{Context, Result};
use occupant_behavior_model::{config, domain::ReferenceData, driver, simulation::Simulation, telemetry};
use config::Config;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    let reference = ReferenceData::from_json_file(&cfg.run.reference_data)?;
    let samples = driver::load_environment(&cfg.run.environment)?;
    if samples.is_empty() {
        warn!(path = %cfg.run.environment.display(), "environment series is empty");
    }

    let sim = Simulation::from_config(&cfg, reference).context("failed to build simulation")?;

    info!(
        start = %cfg.simulation.start,
        steps = samples.len(),
        homes = cfg.simulation.homes,
        occupants_per_home = cfg.simulation.occupants_per_home,
        theory = %cfg.occupant.discomfort.theory(),
        "starting occupant simulation"
    );

    let stop = Arc::new(AtomicBool::new(false));
    let signal_task = {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            telemetry::shutdown_signal().await;
            stop.store(true, Ordering::Relaxed);
        })
    };

    let output = cfg.run.output.clone();
    let summary = tokio::task::spawn_blocking(move || {
        driver::run_to_file(sim, &samples, &output, &stop)
    })
    .await
    .context("simulation task panicked")??;

    signal_task.abort();

    if summary.stopped_early {
        warn!("shutdown complete, run was interrupted");
    }
    Ok(())
}
