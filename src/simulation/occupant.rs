//! # Occupant Agent
//!
//! One simulated occupant: owns its random stream, comfort state, the day's
//! occupancy schedule and routine changes, and its override arbitrator.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use super::arbitrator::{OverrideArbitrator, OverrideCooldown};
use super::discomfort::ComfortState;
use super::occupancy::{OccupancyChain, OccupancySchedule};
use super::routine::{RoutineEvent, RoutineEventSet, RoutineOverrideSampler};
use crate::config::OccupantConfig;
use crate::domain::{
    EnvironmentSample, HomeId, OccupantId, OccupantOutput, Result, Season, TemperatureUnit,
};

/// Private random stream for one occupant
pub fn occupant_rng(random_seed: Option<u64>, occupant_id: OccupantId) -> StdRng {
    match random_seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(occupant_id))),
        None => StdRng::from_entropy(),
    }
}

#[derive(Debug)]
pub struct OccupantAgent {
    id: OccupantId,
    home: HomeId,
    unit: TemperatureUnit,
    rng: StdRng,
    comfort: ComfortState,
    chain: OccupancyChain,
    routine_sampler: RoutineOverrideSampler,
    schedule: Option<OccupancySchedule>,
    routine: Option<RoutineEventSet>,
    arbitrator: OverrideArbitrator,
}

impl OccupantAgent {
    pub fn new(
        id: OccupantId,
        home: HomeId,
        config: &OccupantConfig,
        unit: TemperatureUnit,
        chain: OccupancyChain,
        routine_sampler: RoutineOverrideSampler,
        rng: StdRng,
    ) -> Self {
        let comfort = ComfortState::new(
            unit.to_fahrenheit(config.comfort_temperature),
            config.discomfort.build(unit),
        );
        let arbitrator = OverrideArbitrator::new(
            unit,
            config.deadband,
            OverrideCooldown::new(config.override_cooldown()),
        );

        Self {
            id,
            home,
            unit,
            rng,
            comfort,
            chain,
            routine_sampler,
            schedule: None,
            routine: None,
            arbitrator,
        }
    }

    pub fn id(&self) -> OccupantId {
        self.id
    }

    pub fn home(&self) -> HomeId {
        self.home
    }

    pub fn comfort(&self) -> &ComfortState {
        &self.comfort
    }

    pub fn schedule(&self) -> Option<&OccupancySchedule> {
        self.schedule.as_ref()
    }

    pub fn routine_events(&self) -> Option<&RoutineEventSet> {
        self.routine.as_ref()
    }

    /// Replace the schedule and routine changes with fresh ones for `date`
    pub fn start_day(&mut self, date: NaiveDate) -> Result<()> {
        let schedule = self.chain.generate_day(date, &mut self.rng)?;
        let routine = self.routine_sampler.realize_day(&schedule, &mut self.rng)?;

        info!(
            occupant = self.id,
            home = self.home,
            %date,
            present_steps = schedule.present_count(),
            routine_changes = routine.len(),
            "started new day"
        );

        self.schedule = Some(schedule);
        self.routine = Some(routine);
        Ok(())
    }

    /// Process one timestep. `sample` is in the configured unit.
    pub fn step(&mut self, sample: &EnvironmentSample) -> Result<OccupantOutput> {
        let date = sample.timestamp.date();
        if self.schedule.as_ref().map(|s| s.date()) != Some(date) {
            self.start_day(date)?;
        }

        let present = self
            .schedule
            .as_ref()
            .map_or(false, |s| s.is_present_at(sample.timestamp));
        let events: Vec<RoutineEvent> = self
            .routine
            .as_ref()
            .map(|set| set.at(sample.timestamp).copied().collect())
            .unwrap_or_default();

        let arbitration = self.arbitrator.arbitrate(
            sample,
            Season::for_date(date),
            present,
            &events,
            &mut self.comfort,
        );

        let indoor_f = self.unit.to_fahrenheit(sample.indoor_temp);
        let comfort_delta = self
            .unit
            .delta_from_fahrenheit(self.comfort.comfort_delta(indoor_f));

        let output = OccupantOutput {
            occupant_id: self.id,
            home_id: self.home,
            timestamp: sample.timestamp,
            present: arbitration.present,
            setpoints: arbitration.setpoints,
            override_kind: arbitration.override_kind,
            frustration: self.comfort.frustration(),
            comfort_delta,
            diagnostics: arbitration.diagnostics,
        };

        debug!(
            occupant = self.id,
            timestamp = %output.timestamp,
            present = output.present,
            setpoints = %output.setpoints,
            override_kind = ?output.override_kind,
            "occupant step"
        );
        Ok(output)
    }
}
