//! # Discomfort Theories
//!
//! Decide whether thermal discomfort pushes an occupant into an unscheduled
//! override. Two theories are available behind [`DiscomfortModel`]:
//!
//! - **Comfort-zone theory (CZT)**: fires as soon as the indoor temperature
//!   leaves a band around the comfort temperature.
//! - **Thermal frustration theory (TFT)**: accumulates discomfort over time
//!   and fires once the accumulated frustration crosses a bound.
//!
//! All values are in °F (bounds and thresholds are temperature differences).

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::Display;

use crate::domain::TemperatureUnit;

/// Discomfort theory label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum DiscomfortTheory {
    #[serde(rename = "czt")]
    #[strum(serialize = "czt")]
    ComfortZone,
    #[serde(rename = "tft")]
    #[strum(serialize = "tft")]
    Frustration,
}

/// Override trigger driven by the deviation from the comfort temperature
pub trait DiscomfortModel: Send + Sync + fmt::Debug {
    fn theory(&self) -> DiscomfortTheory;

    /// Feed one present timestep's `indoor - comfort` and report whether an
    /// override fires
    fn evaluate(&mut self, comfort_delta: f64) -> bool;

    /// Called on every absent timestep
    fn on_absent(&mut self);

    /// Current accumulated frustration, if the theory keeps one
    fn frustration(&self) -> Option<f64> {
        None
    }
}

/// Comfort-zone theory with strict bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComfortZone {
    upper_threshold: f64,
    lower_threshold: f64,
}

impl ComfortZone {
    pub fn new(upper_threshold: f64, lower_threshold: f64) -> Self {
        Self {
            upper_threshold,
            lower_threshold,
        }
    }
}

impl Default for ComfortZone {
    fn default() -> Self {
        Self::new(4.0, -4.0)
    }
}

impl DiscomfortModel for ComfortZone {
    fn theory(&self) -> DiscomfortTheory {
        DiscomfortTheory::ComfortZone
    }

    fn evaluate(&mut self, comfort_delta: f64) -> bool {
        comfort_delta > self.upper_threshold || comfort_delta < self.lower_threshold
    }

    fn on_absent(&mut self) {}
}

/// Thermal frustration theory: `F <- alpha * F + beta * delta`
#[derive(Debug, Clone, PartialEq)]
pub struct Frustration {
    alpha: f64,
    beta: f64,
    upper_bound: f64,
    lower_bound: f64,
    value: f64,
    away: bool,
}

impl Frustration {
    pub fn new(alpha: f64, beta: f64, upper_bound: f64, lower_bound: f64) -> Self {
        Self {
            alpha,
            beta,
            upper_bound,
            lower_bound,
            value: 0.0,
            away: false,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Default for Frustration {
    fn default() -> Self {
        Self::new(1.0, 1.0, 50.0, -50.0)
    }
}

impl DiscomfortModel for Frustration {
    fn theory(&self) -> DiscomfortTheory {
        DiscomfortTheory::Frustration
    }

    fn evaluate(&mut self, comfort_delta: f64) -> bool {
        self.away = false;
        self.value = self.alpha * self.value + self.beta * comfort_delta;
        self.value >= self.upper_bound || self.value <= self.lower_bound
    }

    fn on_absent(&mut self) {
        // Reset once on leaving, not on every absent step
        if !self.away {
            self.value = 0.0;
            self.away = true;
        }
    }

    fn frustration(&self) -> Option<f64> {
        Some(self.value)
    }
}

/// Discomfort theory as configured, expressed in the configured unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "theory", rename_all = "lowercase")]
pub enum DiscomfortConfig {
    Czt {
        upper_threshold: f64,
        lower_threshold: f64,
    },
    Tft {
        alpha: f64,
        beta: f64,
        upper_bound: f64,
        lower_bound: f64,
    },
}

impl Default for DiscomfortConfig {
    fn default() -> Self {
        DiscomfortConfig::Czt {
            upper_threshold: 4.0,
            lower_threshold: -4.0,
        }
    }
}

impl DiscomfortConfig {
    pub fn theory(&self) -> DiscomfortTheory {
        match self {
            DiscomfortConfig::Czt { .. } => DiscomfortTheory::ComfortZone,
            DiscomfortConfig::Tft { .. } => DiscomfortTheory::Frustration,
        }
    }

    /// Build a fresh model, converting thresholds from `unit` to °F
    pub fn build(&self, unit: TemperatureUnit) -> Box<dyn DiscomfortModel> {
        match *self {
            DiscomfortConfig::Czt {
                upper_threshold,
                lower_threshold,
            } => Box::new(ComfortZone::new(
                unit.delta_to_fahrenheit(upper_threshold),
                unit.delta_to_fahrenheit(lower_threshold),
            )),
            DiscomfortConfig::Tft {
                alpha,
                beta,
                upper_bound,
                lower_bound,
            } => Box::new(Frustration::new(
                alpha,
                beta,
                unit.delta_to_fahrenheit(upper_bound),
                unit.delta_to_fahrenheit(lower_bound),
            )),
        }
    }
}

/// Per-occupant comfort state
#[derive(Debug)]
pub struct ComfortState {
    comfort_temperature_f: f64,
    model: Box<dyn DiscomfortModel>,
}

impl ComfortState {
    pub fn new(comfort_temperature_f: f64, model: Box<dyn DiscomfortModel>) -> Self {
        Self {
            comfort_temperature_f,
            model,
        }
    }

    pub fn comfort_temperature(&self) -> f64 {
        self.comfort_temperature_f
    }

    pub fn theory(&self) -> DiscomfortTheory {
        self.model.theory()
    }

    /// `indoor - comfort` in °F
    pub fn comfort_delta(&self, indoor_temp_f: f64) -> f64 {
        indoor_temp_f - self.comfort_temperature_f
    }

    pub fn evaluate(&mut self, indoor_temp_f: f64) -> bool {
        let delta = self.comfort_delta(indoor_temp_f);
        self.model.evaluate(delta)
    }

    pub fn on_absent(&mut self) {
        self.model.on_absent();
    }

    pub fn frustration(&self) -> Option<f64> {
        self.model.frustration()
    }
}
