//! # Simulation Orchestrator
//!
//! Owns the clock and every occupant agent. Each step evaluates the agents in
//! ascending occupant id against their home's environment sample, then
//! advances the clock and regenerates day-level state on midnight.

use chrono::NaiveDateTime;
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

use super::clock::{ClockEvent, SimulationClock};
use super::occupancy::OccupancyChain;
use super::occupant::{occupant_rng, OccupantAgent};
use super::routine::RoutineOverrideSampler;
use crate::config::{Config, OccupantConfig, SimulationConfig};
use crate::domain::{
    EnvironmentSample, HomeId, OccupantId, OccupantOutput, ReferenceData, Result,
    SimulationError, TemperatureUnit,
};

/// Outputs of one step, keyed by occupant id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub timestamp: NaiveDateTime,
    pub outputs: BTreeMap<OccupantId, OccupantOutput>,
}

impl StepReport {
    pub fn overrides(&self) -> usize {
        self.outputs
            .values()
            .filter(|o| o.override_kind.is_some())
            .count()
    }
}

#[derive(Debug)]
pub struct Simulation {
    clock: SimulationClock,
    unit: TemperatureUnit,
    homes: Vec<HomeId>,
    agents: BTreeMap<OccupantId, OccupantAgent>,
}

impl Simulation {
    pub fn from_config(config: &Config, reference: ReferenceData) -> Result<Self> {
        config.validate_all()?;
        Self::new(&config.simulation, &config.occupant, reference)
    }

    /// Build `homes x occupants_per_home` agents and realize their first day.
    ///
    /// Homes are numbered from 1; occupant ids are sequential from 1 across
    /// homes.
    pub fn new(
        simulation: &SimulationConfig,
        occupant: &OccupantConfig,
        reference: ReferenceData,
    ) -> Result<Self> {
        let table = Arc::new(reference.occupancy);
        let distributions = Arc::new(reference.routine);
        let clock = SimulationClock::new(simulation.start, simulation.sampling_interval_minutes);

        let homes: Vec<HomeId> = (1..=simulation.homes).collect();
        let mut agents = BTreeMap::new();
        for (index, (home, _)) in
            iproduct!(homes.iter().copied(), 0..simulation.occupants_per_home).enumerate()
        {
            let id = index as OccupantId + 1;
            let chain = OccupancyChain::new(
                Arc::clone(&table),
                simulation.sampling_interval_minutes,
                simulation.initial_presence,
            )?;
            let mut agent = OccupantAgent::new(
                id,
                home,
                occupant,
                simulation.unit,
                chain,
                RoutineOverrideSampler::new(Arc::clone(&distributions)),
                occupant_rng(simulation.random_seed, id),
            );
            agent.start_day(clock.date())?;
            agents.insert(id, agent);
        }

        info!(
            homes = homes.len(),
            occupants = agents.len(),
            start = %clock.now(),
            interval_minutes = simulation.sampling_interval_minutes,
            unit = %simulation.unit,
            "simulation initialized"
        );

        Ok(Self {
            clock,
            unit: simulation.unit,
            homes,
            agents,
        })
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn homes(&self) -> &[HomeId] {
        &self.homes
    }

    pub fn agent(&self, id: OccupantId) -> Option<&OccupantAgent> {
        self.agents.get(&id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &OccupantAgent> {
        self.agents.values()
    }

    /// Advance one timestep with one sample per home.
    ///
    /// Every sample must be stamped with the current simulation time.
    pub fn step(&mut self, samples: &HashMap<HomeId, EnvironmentSample>) -> Result<StepReport> {
        let now = self.clock.now();
        for home in &self.homes {
            let sample = samples
                .get(home)
                .ok_or(SimulationError::MissingEnvironmentSample { home: *home })?;
            if sample.timestamp != now {
                return Err(SimulationError::TimestampMismatch {
                    expected: now,
                    actual: sample.timestamp,
                });
            }
        }

        let mut outputs = BTreeMap::new();
        for (id, agent) in self.agents.iter_mut() {
            let sample = samples
                .get(&agent.home())
                .ok_or(SimulationError::MissingEnvironmentSample { home: agent.home() })?;
            outputs.insert(*id, agent.step(sample)?);
        }

        if let Some(ClockEvent::DayStarted(date)) = self.clock.advance() {
            info!(%date, season = %self.clock.season(), "day boundary, regenerating schedules");
            for agent in self.agents.values_mut() {
                agent.start_day(date)?;
            }
        }

        Ok(StepReport {
            timestamp: now,
            outputs,
        })
    }

    /// Advance one timestep feeding the same sample to every home
    pub fn step_uniform(&mut self, sample: &EnvironmentSample) -> Result<StepReport> {
        let samples: HashMap<HomeId, EnvironmentSample> = self
            .homes
            .iter()
            .map(|home| (*home, sample.clone()))
            .collect();
        self.step(&samples)
    }
}
