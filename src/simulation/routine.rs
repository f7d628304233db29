//! # Routine Override Sampler
//!
//! Realizes the day's scheduled manual setpoint changes (MSCs) from empirical
//! distributions conditioned on season and weekday/weekend.
//!
//! ## Chain of realizations
//!
//! Each attribute is drawn in order, conditioned on what was already drawn:
//!
//! 1. number of changes for the day (clamped to 2)
//! 2. time of the first change
//! 3. type of the first change
//! 4. magnitude of the first change, given its time
//! 5. time of the second change, given the first time
//! 6. type of the second change, given the first type
//! 7. magnitude of the second change, given the first magnitude
//!
//! A change is only scheduled at a time the occupant is home. Time draws are
//! retried a bounded number of times before falling back to a uniform choice
//! among present timestamps.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::occupancy::OccupancySchedule;
use super::sampler;
use crate::domain::{
    routine_keys, ConditionalTable, ConditioningMode, DayProfile, Result, RoutineDistributions,
    SimulationError,
};

/// Draw attempts for an event time before the fallback kicks in
pub const MAX_TIME_DRAWS: usize = 100;

/// Days with this many present timesteps or fewer get no routine changes
pub const MIN_PRESENT_STEPS: usize = 10;

/// Highest number of routine changes realized per day
pub const MAX_EVENTS_PER_DAY: u32 = 2;

const TIME_FORMAT: &str = "%H:%M:%S";

/// One scheduled setpoint change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutineEvent {
    pub timestamp: NaiveDateTime,
    /// Change applied to the cooling setpoint (°F)
    pub cooling_delta: f64,
    /// Change applied to the heating setpoint (°F)
    pub heating_delta: f64,
}

/// The day's routine changes, ordered by time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineEventSet {
    date: NaiveDate,
    events: Vec<RoutineEvent>,
}

impl RoutineEventSet {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            events: Vec::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn events(&self) -> &[RoutineEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events scheduled exactly at `timestamp`
    pub fn at(&self, timestamp: NaiveDateTime) -> impl Iterator<Item = &RoutineEvent> + '_ {
        self.events.iter().filter(move |e| e.timestamp == timestamp)
    }
}

/// Routine change generator bound to a shared distribution bundle
#[derive(Debug, Clone)]
pub struct RoutineOverrideSampler {
    distributions: Arc<RoutineDistributions>,
    max_time_draws: usize,
}

/// Day-level context shared by the per-event draws
struct DayContext<'a> {
    profile: DayProfile,
    date: NaiveDate,
    present: &'a [NaiveDateTime],
    present_set: HashSet<NaiveDateTime>,
}

impl DayContext<'_> {
    fn is_present(&self, timestamp: &NaiveDateTime) -> bool {
        self.present_set.contains(timestamp)
    }

    fn event(&self, timestamp: NaiveDateTime, magnitude: f64) -> RoutineEvent {
        let (cooling_delta, heating_delta) = match self.profile.season.conditioning_mode() {
            ConditioningMode::Cooling => (magnitude, 0.0),
            ConditioningMode::Heating => (0.0, magnitude),
        };
        RoutineEvent {
            timestamp,
            cooling_delta,
            heating_delta,
        }
    }
}

impl RoutineOverrideSampler {
    pub fn new(distributions: Arc<RoutineDistributions>) -> Self {
        Self {
            distributions,
            max_time_draws: MAX_TIME_DRAWS,
        }
    }

    pub fn with_max_time_draws(mut self, max_time_draws: usize) -> Self {
        self.max_time_draws = max_time_draws.max(1);
        self
    }

    /// Realize the routine changes for the schedule's day
    pub fn realize_day<R: Rng + ?Sized>(
        &self,
        schedule: &OccupancySchedule,
        rng: &mut R,
    ) -> Result<RoutineEventSet> {
        let date = schedule.date();
        let profile = DayProfile::for_date(date);

        if profile.season.is_shoulder() {
            debug!(%date, season = %profile.season, "no routine changes in shoulder season");
            return Ok(RoutineEventSet::empty(date));
        }

        let present: Vec<NaiveDateTime> = schedule.present_timestamps().collect();
        if present.len() <= MIN_PRESENT_STEPS {
            debug!(
                %date,
                present_steps = present.len(),
                "too little presence to schedule routine changes"
            );
            return Ok(RoutineEventSet::empty(date));
        }

        let ctx = DayContext {
            profile,
            date,
            present_set: present.iter().copied().collect(),
            present: &present,
        };

        let mut events = match self.realize_count(&ctx, rng)? {
            0 => Vec::new(),
            1 => vec![self.realize_single(&ctx, rng)?],
            _ => self.realize_pair(&ctx, rng)?,
        };
        events.sort_by_key(|event| event.timestamp);

        debug!(%date, profile = %profile, events = events.len(), "realized routine changes");
        Ok(RoutineEventSet { date, events })
    }

    fn realize_count<R: Rng + ?Sized>(&self, ctx: &DayContext<'_>, rng: &mut R) -> Result<u32> {
        let key = routine_keys::daily_count(ctx.profile);
        let table = self.distributions.marginal(&key)?;
        let drawn = sampler::sample(rng, &table.outcomes, &table.probabilities)?;
        let count = parse_count(&key, drawn)?;

        if count > MAX_EVENTS_PER_DAY {
            warn!(
                drawn = count,
                used = MAX_EVENTS_PER_DAY,
                "routine change count above supported maximum, clamping"
            );
            return Ok(MAX_EVENTS_PER_DAY);
        }
        Ok(count)
    }

    fn realize_single<R: Rng + ?Sized>(
        &self,
        ctx: &DayContext<'_>,
        rng: &mut R,
    ) -> Result<RoutineEvent> {
        let time = self.realize_first_time(ctx, &routine_keys::single_time(ctx.profile), rng)?;

        let kind = self.draw_kind(&routine_keys::single_type(ctx.profile), rng)?;

        let key = routine_keys::single_magnitude(ctx.profile, &kind);
        let table = self.distributions.conditional(&key)?;
        let magnitude = draw_magnitude(rng, &key, table, &format_time(time))?;

        Ok(ctx.event(time, magnitude))
    }

    fn realize_pair<R: Rng + ?Sized>(
        &self,
        ctx: &DayContext<'_>,
        rng: &mut R,
    ) -> Result<Vec<RoutineEvent>> {
        let first_time = self.realize_first_time(ctx, &routine_keys::first_time(ctx.profile), rng)?;
        let first_kind = self.draw_kind(&routine_keys::first_type(ctx.profile), rng)?;

        let key = routine_keys::first_magnitude(ctx.profile, &first_kind);
        let table = self.distributions.conditional(&key)?;
        let first_magnitude = draw_magnitude(rng, &key, table, &format_time(first_time))?;

        let first = ctx.event(first_time, first_magnitude);

        let Some(second_time) = self.realize_second_time(ctx, first_time, rng)? else {
            warn!(
                date = %ctx.date,
                first = %first_time,
                "no presence left after first routine change, dropping second"
            );
            return Ok(vec![first]);
        };

        let second_kind =
            self.draw_kind(&routine_keys::second_type(ctx.profile, &first_kind), rng)?;

        let key = routine_keys::second_magnitude(ctx.profile, &first_kind, &second_kind);
        let table = self.distributions.conditional(&key)?;
        let second_magnitude = draw_magnitude(rng, &key, table, &format_magnitude(first_magnitude))?;

        Ok(vec![first, ctx.event(second_time, second_magnitude)])
    }

    fn draw_kind<R: Rng + ?Sized>(&self, key: &str, rng: &mut R) -> Result<String> {
        let table = self.distributions.marginal(key)?;
        sampler::sample(rng, &table.outcomes, &table.probabilities).cloned()
    }

    /// Time of a first change: retried until it lands on a present step,
    /// then a uniform pick among present steps.
    fn realize_first_time<R: Rng + ?Sized>(
        &self,
        ctx: &DayContext<'_>,
        key: &str,
        rng: &mut R,
    ) -> Result<NaiveDateTime> {
        let table = self.distributions.marginal(key)?;
        let times = parse_times(key, &table.outcomes, ctx.date)?;

        for _ in 0..self.max_time_draws {
            let candidate = *sampler::sample(rng, &times, &table.probabilities)?;
            if ctx.is_present(&candidate) {
                return Ok(candidate);
            }
        }

        warn!(
            date = %ctx.date,
            attempts = self.max_time_draws,
            "could not draw a present time for routine change, choosing among present steps"
        );
        sampler::sample_uniform(rng, ctx.present).copied()
    }

    /// Time of the second change given the first. `None` when the occupant is
    /// never home after the first change.
    fn realize_second_time<R: Rng + ?Sized>(
        &self,
        ctx: &DayContext<'_>,
        first_time: NaiveDateTime,
        rng: &mut R,
    ) -> Result<Option<NaiveDateTime>> {
        let key = routine_keys::second_time(ctx.profile);
        let table = self.distributions.conditional(&key)?;
        let times = parse_times(&key, &table.outcomes, ctx.date)?;
        let given = format_time(first_time);
        let row = table
            .row(&given)
            .ok_or_else(|| SimulationError::missing_row(key.as_str(), given.as_str()))?;

        // Draws are restricted to times after the first change, renormalized
        let later_row = later_weights(&times, row, first_time)?;
        let later: Vec<NaiveDateTime> = times.iter().copied().filter(|t| *t > first_time).collect();

        if later_row.is_some() || !later.is_empty() {
            for _ in 0..self.max_time_draws {
                let candidate = match &later_row {
                    Some(weights) => *sampler::sample(rng, &times, weights)?,
                    None => *sampler::sample_uniform(rng, &later)?,
                };
                if ctx.is_present(&candidate) {
                    return Ok(Some(candidate));
                }
            }
        }

        let remaining: Vec<NaiveDateTime> = ctx
            .present
            .iter()
            .copied()
            .filter(|t| *t > first_time)
            .collect();
        if remaining.is_empty() {
            return Ok(None);
        }

        warn!(
            date = %ctx.date,
            attempts = self.max_time_draws,
            "could not draw a present time for second routine change, choosing among present steps after the first"
        );
        sampler::sample_uniform(rng, &remaining).copied().map(Some)
    }
}

/// Second-time row with every time at or before `first_time` zeroed and the
/// rest rescaled to sum to one. `None` when the row is all zero or carries no
/// weight after `first_time`.
fn later_weights(
    times: &[NaiveDateTime],
    row: &[f64],
    first_time: NaiveDateTime,
) -> Result<Option<Vec<f64>>> {
    if sampler::is_degenerate(row) {
        return Ok(None);
    }
    let row = sampler::normalize(row)?;
    let masked: Vec<f64> = times
        .iter()
        .zip(&row)
        .map(|(t, p)| if *t > first_time { *p } else { 0.0 })
        .collect();
    let mass: f64 = masked.iter().sum();
    if mass <= 0.0 {
        return Ok(None);
    }
    Ok(Some(masked.into_iter().map(|p| p / mass).collect()))
}

/// Magnitude draw from a conditional table; all-zero rows fall back to a
/// uniform pick over the columns.
fn draw_magnitude<R: Rng + ?Sized>(
    rng: &mut R,
    key: &str,
    table: &ConditionalTable,
    given: &str,
) -> Result<f64> {
    let row = table
        .row(given)
        .ok_or_else(|| SimulationError::missing_row(key, given))?;

    let outcome = if sampler::is_degenerate(row) {
        sampler::sample_uniform(rng, &table.outcomes)?
    } else {
        sampler::sample(rng, &table.outcomes, row)?
    };
    parse_magnitude(key, outcome)
}

fn malformed(key: &str, value: &str) -> SimulationError {
    SimulationError::MalformedDistributionEntry {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_time_of_day(key: &str, value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| malformed(key, value))
}

fn parse_times(key: &str, outcomes: &[String], date: NaiveDate) -> Result<Vec<NaiveDateTime>> {
    outcomes
        .iter()
        .map(|value| parse_time_of_day(key, value).map(|time| date.and_time(time)))
        .collect()
}

fn parse_count(key: &str, value: &str) -> Result<u32> {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n.round() as u32),
        _ => Err(malformed(key, value)),
    }
}

fn parse_magnitude(key: &str, value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(m) if m.is_finite() => Ok(m.round()),
        _ => Err(malformed(key, value)),
    }
}

fn format_time(timestamp: NaiveDateTime) -> String {
    timestamp.time().format(TIME_FORMAT).to_string()
}

fn format_magnitude(magnitude: f64) -> String {
    format!("{}", magnitude.round() as i64)
}
