//! # Occupant Simulation Module
//!
//! Simulates how household occupants interact with a thermostat: when they are
//! home, when they follow a routine setpoint change, and when thermal
//! discomfort pushes them into an unscheduled override.
//!
//! ## Components
//!
//! - **Sampler**: categorical draws from fitted probability vectors
//! - **Occupancy**: time-of-day Markov chain producing one day of presence
//! - **Routine**: daily manual setpoint changes from empirical distributions
//! - **Discomfort**: comfort-zone and thermal-frustration override triggers
//! - **Arbitrator**: merges routine and discomfort overrides into one valid pair
//! - **Orchestrator**: ticks the clock and steps every occupant
//!
//! ## Usage
//!
//! ```rust,no_run
//! use occupant_behavior_model::config::Config;
//! use occupant_behavior_model::domain::ReferenceData;
//! use occupant_behavior_model::simulation::Simulation;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let reference = ReferenceData::from_json_file(&config.run.reference_data)?;
//! let mut sim = Simulation::from_config(&config, reference)?;
//!
//! # let sample: occupant_behavior_model::domain::EnvironmentSample = todo!();
//! let report = sim.step_uniform(&sample)?;
//! for output in report.outputs.values() {
//!     println!("{} -> {}", output.occupant_id, output.setpoints);
//! }
//! # Ok(())
//! # }
//! ```

pub mod arbitrator;
pub mod clock;
pub mod discomfort;
pub mod occupancy;
pub mod occupant;
pub mod orchestrator;
pub mod routine;
pub mod sampler;
pub mod setpoints;

pub use arbitrator::{
    Arbitration, OverrideArbitrator, OverrideCooldown, DEFAULT_OVERRIDE_COOLDOWN_SECONDS,
};
pub use clock::{ClockEvent, SimulationClock};
pub use discomfort::{
    ComfortState, ComfortZone, DiscomfortConfig, DiscomfortModel, DiscomfortTheory, Frustration,
};
pub use occupancy::{InitialPresence, OccupancyChain, OccupancySchedule};
pub use occupant::{occupant_rng, OccupantAgent};
pub use orchestrator::{Simulation, StepReport};
pub use routine::{RoutineEvent, RoutineEventSet, RoutineOverrideSampler};
pub use setpoints::{validate_setpoints, ValidatedSetpoints};
