//! # Occupancy Markov Chain
//!
//! Synthesizes one day of presence/absence from a time-inhomogeneous
//! first-order Markov chain. The transition table works at a coarse base
//! resolution (10 minutes in the reference data, 144 slots); each slot is then
//! repeated to fill the configured sampling interval.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::sampler;
use crate::domain::{Result, SimulationError, TransitionTable};

/// How the first slot of a day is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialPresence {
    /// The occupant is home at midnight
    #[default]
    Present,
    /// Fair coin flip
    Random,
}

/// One day of presence at the sampling interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancySchedule {
    date: NaiveDate,
    interval_minutes: u32,
    entries: Vec<(NaiveDateTime, bool)>,
}

impl OccupancySchedule {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    pub fn entries(&self) -> &[(NaiveDateTime, bool)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Presence at `timestamp`; false for instants outside this day
    pub fn is_present_at(&self, timestamp: NaiveDateTime) -> bool {
        if timestamp.date() != self.date {
            return false;
        }
        let minute = timestamp.hour() * 60 + timestamp.minute();
        let index = (minute / self.interval_minutes) as usize;
        self.entries.get(index).map_or(false, |(_, present)| *present)
    }

    /// Timestamps at which the occupant is home, in order
    pub fn present_timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.entries
            .iter()
            .filter(|(_, present)| *present)
            .map(|(timestamp, _)| *timestamp)
    }

    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|(_, present)| *present).count()
    }
}

/// Occupancy generator bound to a shared transition table
#[derive(Debug, Clone)]
pub struct OccupancyChain {
    table: Arc<TransitionTable>,
    sampling_interval_minutes: u32,
    initial_presence: InitialPresence,
}

impl OccupancyChain {
    /// Fails with `UnsupportedSamplingInterval` unless the base resolution
    /// evenly divides the day and the sampling interval evenly divides the
    /// base resolution.
    pub fn new(
        table: Arc<TransitionTable>,
        sampling_interval_minutes: u32,
        initial_presence: InitialPresence,
    ) -> Result<Self> {
        let base = table.base_resolution_minutes();
        if sampling_interval_minutes == 0
            || base == 0
            || 24 * 60 % base != 0
            || base % sampling_interval_minutes != 0
        {
            return Err(SimulationError::UnsupportedSamplingInterval {
                interval_minutes: sampling_interval_minutes,
                base_minutes: base,
            });
        }

        Ok(Self {
            table,
            sampling_interval_minutes,
            initial_presence,
        })
    }

    pub fn sampling_interval_minutes(&self) -> u32 {
        self.sampling_interval_minutes
    }

    /// Generate the schedule for `date`, stamped from local midnight
    pub fn generate_day<R: Rng + ?Sized>(
        &self,
        date: NaiveDate,
        rng: &mut R,
    ) -> Result<OccupancySchedule> {
        let slots = self.table.slots_per_day();
        let repeat = (self.table.base_resolution_minutes() / self.sampling_interval_minutes) as usize;

        let mut states = Vec::with_capacity(slots);
        let mut current = match self.initial_presence {
            InitialPresence::Present => true,
            InitialPresence::Random => rng.gen_bool(0.5),
        };
        states.push(current);

        for slot in 1..slots {
            let probabilities = self.table.row(slot, current)?;
            current = sampler::sample_index(rng, probabilities)? == 1;
            states.push(current);
        }

        let midnight = date.and_time(chrono::NaiveTime::MIN);
        let step = Duration::minutes(i64::from(self.sampling_interval_minutes));
        let entries: Vec<_> = states
            .into_iter()
            .flat_map(|present| std::iter::repeat(present).take(repeat))
            .enumerate()
            .map(|(i, present)| (midnight + step * i as i32, present))
            .collect();

        let schedule = OccupancySchedule {
            date,
            interval_minutes: self.sampling_interval_minutes,
            entries,
        };
        debug!(
            %date,
            present_steps = schedule.present_count(),
            total_steps = schedule.len(),
            "generated occupancy schedule"
        );
        Ok(schedule)
    }
}
