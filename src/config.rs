use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use figment::{providers::{Env, Format, Serialized, Toml}, Figment};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::domain::{SimulationError, TemperatureUnit};
use crate::simulation::{DiscomfortConfig, InitialPresence, DEFAULT_OVERRIDE_COOLDOWN_SECONDS};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub simulation: SimulationConfig,
    #[validate(nested)]
    pub occupant: OccupantConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    /// Unit of every temperature in config, input samples and output records
    pub unit: TemperatureUnit,
    #[validate(range(min = 1, max = 60))]
    pub sampling_interval_minutes: u32,
    pub start: NaiveDateTime,
    /// Per-occupant streams are seeded with `random_seed + occupant_id`
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub initial_presence: InitialPresence,
    #[validate(range(min = 1))]
    pub homes: u32,
    #[validate(range(min = 1))]
    pub occupants_per_home: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            unit: TemperatureUnit::Fahrenheit,
            sampling_interval_minutes: 5,
            start: chrono::NaiveDate::from_ymd_opt(2024, 7, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            random_seed: None,
            initial_presence: InitialPresence::Present,
            homes: 1,
            occupants_per_home: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OccupantConfig {
    /// Comfort temperature in the configured unit
    pub comfort_temperature: f64,
    /// Minimum cooling-heating gap in the configured unit
    #[validate(range(min = 0.0))]
    pub deadband: f64,
    pub override_cooldown_seconds: u64,
    #[serde(default)]
    pub discomfort: DiscomfortConfig,
}

impl Default for OccupantConfig {
    fn default() -> Self {
        Self {
            comfort_temperature: 72.0,
            deadband: 1.0,
            override_cooldown_seconds: DEFAULT_OVERRIDE_COOLDOWN_SECONDS as u64,
            discomfort: DiscomfortConfig::default(),
        }
    }
}

impl OccupantConfig {
    pub fn override_cooldown(&self) -> Duration {
        Duration::seconds(i64::try_from(self.override_cooldown_seconds).unwrap_or(i64::MAX / 1000))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub reference_data: PathBuf,
    /// JSON array of environment samples
    pub environment: PathBuf,
    /// JSON lines output, one record per occupant per step
    pub output: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            reference_data: PathBuf::from("data/reference.json"),
            environment: PathBuf::from("data/environment.json"),
            output: PathBuf::from("output/occupants.jsonl"),
        }
    }
}

impl From<validator::ValidationErrors> for SimulationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        SimulationError::InvalidConfiguration(errors.to_string())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("OBM__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().context("failed to load configuration")?;
        config.validate_all()?;
        Ok(config)
    }

    /// Range checks plus the cross-field checks the derive cannot express
    pub fn validate_all(&self) -> Result<(), SimulationError> {
        self.validate()?;

        if 1440 % self.simulation.sampling_interval_minutes != 0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "sampling interval of {} min does not divide a day",
                self.simulation.sampling_interval_minutes
            )));
        }

        match self.occupant.discomfort {
            DiscomfortConfig::Czt {
                upper_threshold,
                lower_threshold,
            } if lower_threshold >= upper_threshold => Err(SimulationError::InvalidConfiguration(
                format!("comfort zone lower threshold {lower_threshold} must be below upper threshold {upper_threshold}"),
            )),
            DiscomfortConfig::Tft {
                upper_bound,
                lower_bound,
                ..
            } if lower_bound >= upper_bound => Err(SimulationError::InvalidConfiguration(
                format!("frustration lower bound {lower_bound} must be below upper bound {upper_bound}"),
            )),
            _ => Ok(()),
        }
    }
}
