//! # Simulation Clock
//!
//! Single owner of calendar state for a run. Occupants read season, day kind
//! and time of day from it and react to [`ClockEvent::DayStarted`] instead of
//! polling for midnight themselves.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::{DayKind, DayProfile, Season};

/// Calendar events raised while advancing the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockEvent {
    /// The clock crossed midnight into a new calendar day
    DayStarted(NaiveDate),
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    now: NaiveDateTime,
    step: Duration,
    steps_taken: u64,
}

impl SimulationClock {
    pub fn new(start: NaiveDateTime, sampling_interval_minutes: u32) -> Self {
        Self {
            now: start,
            step: Duration::minutes(i64::from(sampling_interval_minutes)),
            steps_taken: 0,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn date(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    pub fn season(&self) -> Season {
        Season::for_date(self.date())
    }

    pub fn day_kind(&self) -> DayKind {
        DayKind::for_date(self.date())
    }

    pub fn day_profile(&self) -> DayProfile {
        DayProfile::for_date(self.date())
    }

    /// Minutes elapsed since local midnight
    pub fn minute_of_day(&self) -> u32 {
        self.now.hour() * 60 + self.now.minute()
    }

    /// Index of the current timestep within the day
    pub fn timestep_of_day(&self) -> usize {
        let step_minutes = self.step.num_minutes().max(1) as u32;
        (self.minute_of_day() / step_minutes) as usize
    }

    /// Number of timesteps that make up one day
    pub fn timesteps_per_day(&self) -> usize {
        (24 * 60 / self.step.num_minutes().max(1)) as usize
    }

    /// Advance by one sampling interval.
    ///
    /// Returns [`ClockEvent::DayStarted`] when the step crosses into a new
    /// calendar day.
    pub fn advance(&mut self) -> Option<ClockEvent> {
        let previous = self.now.date();
        self.now += self.step;
        self.steps_taken += 1;

        let current = self.now.date();
        (current != previous).then_some(ClockEvent::DayStarted(current))
    }
}
