//! Batch driver: feeds a recorded environment series through the simulation
//! and writes one JSON line per occupant per step.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::domain::{EnvironmentSample, OverrideKind};
use crate::simulation::Simulation;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub steps: usize,
    pub records: usize,
    pub routine_overrides: usize,
    pub discomfort_overrides: usize,
    pub setpoint_repairs: usize,
    pub stopped_early: bool,
}

pub fn load_environment(path: impl AsRef<Path>) -> Result<Vec<EnvironmentSample>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read environment series from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse environment series in {}", path.display()))
}

/// Step through `samples`, feeding each one to every home.
///
/// `stop` is checked before every step; a set flag ends the run early with
/// the records written so far.
pub fn run<W: Write>(
    sim: &mut Simulation,
    samples: &[EnvironmentSample],
    mut out: W,
    stop: &AtomicBool,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for sample in samples {
        if stop.load(Ordering::Relaxed) {
            warn!(steps = summary.steps, "stop requested, ending run early");
            summary.stopped_early = true;
            break;
        }

        let report = sim
            .step_uniform(sample)
            .with_context(|| format!("simulation step at {} failed", sample.timestamp))?;

        for output in report.outputs.values() {
            match output.override_kind {
                Some(OverrideKind::Routine) => summary.routine_overrides += 1,
                Some(OverrideKind::Discomfort) => summary.discomfort_overrides += 1,
                None => {}
            }
            summary.setpoint_repairs += output.diagnostics.len();

            serde_json::to_writer(&mut out, output).context("failed to serialize output record")?;
            out.write_all(b"\n")?;
            summary.records += 1;
        }
        summary.steps += 1;
    }

    out.flush()?;
    Ok(summary)
}

/// [`run`] writing to a file, creating parent directories as needed
pub fn run_to_file(
    mut sim: Simulation,
    samples: &[EnvironmentSample],
    output: &Path,
    stop: &AtomicBool,
) -> Result<RunSummary> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(output)
        .with_context(|| format!("failed to create output file {}", output.display()))?;

    let summary = run(&mut sim, samples, BufWriter::new(file), stop)?;
    info!(
        output = %output.display(),
        steps = summary.steps,
        records = summary.records,
        routine_overrides = summary.routine_overrides,
        discomfort_overrides = summary.discomfort_overrides,
        setpoint_repairs = summary.setpoint_repairs,
        stopped_early = summary.stopped_early,
        "run complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OccupantConfig, SimulationConfig};
    use crate::domain::{OccupantOutput, ReferenceData, TransitionTable};
    use chrono::{Duration, NaiveDate};

    fn simulation() -> Simulation {
        let simulation = SimulationConfig {
            start: NaiveDate::from_ymd_opt(2024, 1, 8)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            random_seed: Some(5),
            homes: 2,
            ..SimulationConfig::default()
        };
        let reference = ReferenceData {
            occupancy: TransitionTable::constant(10, 0.0, 0.0),
            routine: Default::default(),
        };
        Simulation::new(&simulation, &OccupantConfig::default(), reference).unwrap()
    }

    fn series(sim: &Simulation, len: i64) -> Vec<EnvironmentSample> {
        (0..len)
            .map(|i| EnvironmentSample {
                timestamp: sim.now() + Duration::minutes(5 * i),
                indoor_temp: 60.0,
                outdoor_temp: 25.0,
                humidity: 30.0,
                cooling_setpoint: 76.0,
                heating_setpoint: 68.0,
                heating_running: true,
                cooling_running: false,
            })
            .collect()
    }

    #[test]
    fn test_run_writes_json_lines() {
        let mut sim = simulation();
        let samples = series(&sim, 4);
        let mut buffer = Vec::new();

        let summary = run(&mut sim, &samples, &mut buffer, &AtomicBool::new(false)).unwrap();
        assert_eq!(summary.steps, 4);
        assert_eq!(summary.records, 8);
        // Both occupants are home for the first 10-minute slot, too cold, and
        // the 5-minute steps sit exactly one cooldown apart
        assert_eq!(summary.discomfort_overrides, 4);

        let text = String::from_utf8(buffer).unwrap();
        let records: Vec<OccupantOutput> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 8);
        assert_eq!(records[0].occupant_id, 1);
        assert_eq!(records[1].home_id, 2);
    }

    #[test]
    fn test_stop_flag_ends_run() {
        let mut sim = simulation();
        let samples = series(&sim, 4);

        let summary = run(&mut sim, &samples, std::io::sink(), &AtomicBool::new(true)).unwrap();
        assert!(summary.stopped_early);
        assert_eq!(summary.steps, 0);
    }

    #[test]
    fn test_misaligned_series_fails() {
        let mut sim = simulation();
        let mut samples = series(&sim, 2);
        samples[1].timestamp += Duration::minutes(1);

        let err = run(&mut sim, &samples, std::io::sink(), &AtomicBool::new(false)).unwrap_err();
        assert!(err.to_string().contains("simulation step"));
    }
}
