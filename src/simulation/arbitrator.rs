//! # Override Arbitration
//!
//! Reconciles routine changes and discomfort triggers into one setpoint pair
//! per timestep. Precedence, highest first:
//!
//! 1. shoulder season: no action, input passes through
//! 2. absent: no action, held override released
//! 3. routine change scheduled at this timestamp
//! 4. discomfort override, if the cooldown has elapsed
//! 5. pass through
//!
//! An accepted override becomes the held pair for as long as the occupant
//! stays home, so later steps report it instead of the caller's setpoints.
//! Routine changes build on the held pair. A discomfort override always
//! shifts the caller's setpoints, so repeated triggers against the same
//! indoor temperature land on the same pair instead of compounding.

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use super::discomfort::ComfortState;
use super::routine::RoutineEvent;
use super::setpoints::validate_setpoints;
use crate::domain::{
    EnvironmentSample, OverrideKind, Season, SetpointDiagnostic, SetpointPair, TemperatureUnit,
};

pub const DEFAULT_OVERRIDE_COOLDOWN_SECONDS: i64 = 300;

/// Suppresses discomfort overrides for a window after the last accepted
/// override
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideCooldown {
    window: Duration,
    last: Option<NaiveDateTime>,
}

impl OverrideCooldown {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn last(&self) -> Option<NaiveDateTime> {
        self.last
    }

    pub fn is_elapsed(&self, now: NaiveDateTime) -> bool {
        self.last.map_or(true, |last| now - last >= self.window)
    }

    pub fn record(&mut self, now: NaiveDateTime) {
        self.last = Some(now);
    }
}

impl Default for OverrideCooldown {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_OVERRIDE_COOLDOWN_SECONDS))
    }
}

/// Result of arbitrating one timestep
#[derive(Debug, Clone, PartialEq)]
pub struct Arbitration {
    pub present: bool,
    /// Final pair in the configured unit
    pub setpoints: SetpointPair,
    pub override_kind: Option<OverrideKind>,
    pub diagnostics: Vec<SetpointDiagnostic>,
}

#[derive(Debug, Clone)]
pub struct OverrideArbitrator {
    unit: TemperatureUnit,
    /// Deadband in the configured unit
    deadband: f64,
    cooldown: OverrideCooldown,
    /// Last accepted override in °F
    held: Option<SetpointPair>,
}

impl OverrideArbitrator {
    pub fn new(unit: TemperatureUnit, deadband: f64, cooldown: OverrideCooldown) -> Self {
        Self {
            unit,
            deadband,
            cooldown,
            held: None,
        }
    }

    pub fn cooldown(&self) -> &OverrideCooldown {
        &self.cooldown
    }

    /// Held override pair in °F, if any
    pub fn held(&self) -> Option<SetpointPair> {
        self.held
    }

    /// Arbitrate one timestep.
    ///
    /// `sample` is in the configured unit. `routine` holds the routine changes
    /// scheduled at the sample's timestamp.
    pub fn arbitrate(
        &mut self,
        sample: &EnvironmentSample,
        season: Season,
        present: bool,
        routine: &[RoutineEvent],
        comfort: &mut ComfortState,
    ) -> Arbitration {
        let input = sample.setpoints();

        if season.is_shoulder() {
            // Shoulder days report the occupant as absent
            comfort.on_absent();
            self.held = None;
            return Arbitration {
                present: false,
                setpoints: input,
                override_kind: None,
                diagnostics: Vec::new(),
            };
        }

        if !present {
            comfort.on_absent();
            if self.held.take().is_some() {
                debug!(timestamp = %sample.timestamp, "occupant left, releasing held override");
            }
            return self.finish(input, season, false, None);
        }

        let now = sample.timestamp;
        let indoor_f = self.unit.to_fahrenheit(sample.indoor_temp);
        let comfort_delta_f = comfort.comfort_delta(indoor_f);
        let discomfort = comfort.evaluate(indoor_f);
        let input_f = input.to_fahrenheit(self.unit);
        let current = self.held.unwrap_or(input_f);

        let (candidate, override_kind) = if !routine.is_empty() {
            let (cooling, heating) = routine.iter().fold((0.0, 0.0), |(c, h), event| {
                (c + event.cooling_delta, h + event.heating_delta)
            });
            (current.adjusted(cooling, heating), Some(OverrideKind::Routine))
        } else if discomfort && self.cooldown.is_elapsed(now) {
            (input_f.shifted(-comfort_delta_f), Some(OverrideKind::Discomfort))
        } else {
            if discomfort {
                debug!(timestamp = %now, "discomfort override suppressed by cooldown");
            }
            (current, None)
        };

        let candidate = candidate.from_fahrenheit(self.unit);
        let arbitration = self.finish(candidate, season, true, override_kind);

        if let Some(kind) = override_kind {
            self.cooldown.record(now);
            self.held = Some(arbitration.setpoints.to_fahrenheit(self.unit));
            debug!(
                timestamp = %now,
                kind = %kind,
                setpoints = %arbitration.setpoints,
                "override accepted"
            );
        }

        arbitration
    }

    fn finish(
        &self,
        candidate: SetpointPair,
        season: Season,
        present: bool,
        override_kind: Option<OverrideKind>,
    ) -> Arbitration {
        let validated = validate_setpoints(candidate, self.deadband, season, self.unit);
        Arbitration {
            present,
            setpoints: validated.pair,
            override_kind,
            diagnostics: validated.diagnostics,
        }
    }
}
