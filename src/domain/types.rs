use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

// ============================================================================
// Identity
// ============================================================================

pub type OccupantId = u32;
pub type HomeId = u32;

// ============================================================================
// Temperature
// ============================================================================

/// Temperature unit used at the configuration and I/O boundary.
///
/// The engine itself works in degrees Fahrenheit; values crossing the boundary
/// are converted with [`TemperatureUnit::to_fahrenheit`] and
/// [`TemperatureUnit::from_fahrenheit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum TemperatureUnit {
    #[serde(rename = "F", alias = "f")]
    #[strum(to_string = "F", serialize = "f")]
    Fahrenheit,
    #[serde(rename = "C", alias = "c")]
    #[strum(to_string = "C", serialize = "c")]
    Celsius,
}

impl TemperatureUnit {
    /// Convert an absolute temperature in this unit to Fahrenheit
    pub fn to_fahrenheit(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Fahrenheit => value,
            TemperatureUnit::Celsius => value * 9.0 / 5.0 + 32.0,
        }
    }

    /// Convert an absolute Fahrenheit temperature into this unit
    pub fn from_fahrenheit(self, value_f: f64) -> f64 {
        match self {
            TemperatureUnit::Fahrenheit => value_f,
            TemperatureUnit::Celsius => (value_f - 32.0) * 5.0 / 9.0,
        }
    }

    /// Convert a temperature difference in this unit to Fahrenheit degrees
    pub fn delta_to_fahrenheit(self, delta: f64) -> f64 {
        match self {
            TemperatureUnit::Fahrenheit => delta,
            TemperatureUnit::Celsius => delta * 9.0 / 5.0,
        }
    }

    /// Convert a Fahrenheit temperature difference into this unit
    pub fn delta_from_fahrenheit(self, delta_f: f64) -> f64 {
        match self {
            TemperatureUnit::Fahrenheit => delta_f,
            TemperatureUnit::Celsius => delta_f * 5.0 / 9.0,
        }
    }

    /// Safe fallback pair used when a setpoint goes negative
    pub fn setpoint_floor(self) -> SetpointPair {
        match self {
            TemperatureUnit::Fahrenheit => SetpointPair::new(60.0, 50.0),
            TemperatureUnit::Celsius => SetpointPair::new(15.0, 10.0),
        }
    }
}

/// Cooling/heating setpoint pair.
///
/// Valid pairs satisfy `cooling - deadband >= heating` with both values
/// non-negative; see [`crate::simulation::setpoints::validate_setpoints`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetpointPair {
    pub cooling: f64,
    pub heating: f64,
}

impl SetpointPair {
    pub fn new(cooling: f64, heating: f64) -> Self {
        Self { cooling, heating }
    }

    /// Shift both setpoints by the same amount
    pub fn shifted(self, delta: f64) -> Self {
        Self::new(self.cooling + delta, self.heating + delta)
    }

    /// Apply independent cooling and heating deltas
    pub fn adjusted(self, cooling_delta: f64, heating_delta: f64) -> Self {
        Self::new(self.cooling + cooling_delta, self.heating + heating_delta)
    }

    pub fn satisfies_deadband(&self, deadband: f64) -> bool {
        self.cooling - deadband >= self.heating
    }

    pub fn to_fahrenheit(self, unit: TemperatureUnit) -> Self {
        Self::new(unit.to_fahrenheit(self.cooling), unit.to_fahrenheit(self.heating))
    }

    pub fn from_fahrenheit(self, unit: TemperatureUnit) -> Self {
        Self::new(
            unit.from_fahrenheit(self.cooling),
            unit.from_fahrenheit(self.heating),
        )
    }
}

impl fmt::Display for SetpointPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cool {:.1} / heat {:.1}", self.cooling, self.heating)
    }
}

/// Non-fatal repairs applied while validating a setpoint pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SetpointDiagnostic {
    /// Deadband violated; one side was moved to restore the gap
    Repaired {
        original: SetpointPair,
        repaired: SetpointPair,
    },
    /// A setpoint went negative; both were replaced by the unit floor pair
    FloorClamped {
        original: SetpointPair,
        floor: SetpointPair,
    },
}

// ============================================================================
// Calendar
// ============================================================================

/// Season label derived from the calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum Season {
    /// December - February
    #[serde(rename = "heat")]
    #[strum(serialize = "heat")]
    Heat,
    /// March - May
    #[serde(rename = "heat2cool")]
    #[strum(serialize = "heat2cool")]
    HeatToCool,
    /// June - August
    #[serde(rename = "cool")]
    #[strum(serialize = "cool")]
    Cool,
    /// September - November
    #[serde(rename = "cool2heat")]
    #[strum(serialize = "cool2heat")]
    CoolToHeat,
}

/// Which side of the thermostat a season's overrides act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditioningMode {
    Heating,
    Cooling,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Heat,
            3..=5 => Season::HeatToCool,
            6..=8 => Season::Cool,
            _ => Season::CoolToHeat,
        }
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }

    /// Transitional seasons in which the occupant takes no action
    pub fn is_shoulder(self) -> bool {
        matches!(self, Season::HeatToCool | Season::CoolToHeat)
    }

    /// Conditioning convention for this season.
    ///
    /// Shoulder seasons follow the season they lead into.
    pub fn conditioning_mode(self) -> ConditioningMode {
        match self {
            Season::Heat | Season::CoolToHeat => ConditioningMode::Heating,
            Season::Cool | Season::HeatToCool => ConditioningMode::Cooling,
        }
    }
}

/// Weekday or weekend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum DayKind {
    #[serde(rename = "wd")]
    #[strum(serialize = "wd")]
    Weekday,
    #[serde(rename = "we")]
    #[strum(serialize = "we")]
    Weekend,
}

impl DayKind {
    pub fn for_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => DayKind::Weekend,
            _ => DayKind::Weekday,
        }
    }
}

/// Season plus day kind, rendered as `<season>_<wd|we>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayProfile {
    pub season: Season,
    pub day_kind: DayKind,
}

impl DayProfile {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            season: Season::for_date(date),
            day_kind: DayKind::for_date(date),
        }
    }
}

impl fmt::Display for DayProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.season, self.day_kind)
    }
}

// ============================================================================
// Engine I/O
// ============================================================================

/// Per-timestep environment reading supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSample {
    pub timestamp: NaiveDateTime,
    pub indoor_temp: f64,
    pub outdoor_temp: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    pub cooling_setpoint: f64,
    pub heating_setpoint: f64,
    #[serde(default)]
    pub heating_running: bool,
    #[serde(default)]
    pub cooling_running: bool,
}

impl EnvironmentSample {
    pub fn setpoints(&self) -> SetpointPair {
        SetpointPair::new(self.cooling_setpoint, self.heating_setpoint)
    }

    /// Copy of this sample with every temperature expressed in Fahrenheit
    pub fn to_fahrenheit(&self, unit: TemperatureUnit) -> Self {
        Self {
            indoor_temp: unit.to_fahrenheit(self.indoor_temp),
            outdoor_temp: unit.to_fahrenheit(self.outdoor_temp),
            cooling_setpoint: unit.to_fahrenheit(self.cooling_setpoint),
            heating_setpoint: unit.to_fahrenheit(self.heating_setpoint),
            ..self.clone()
        }
    }
}

/// Which override fired in a timestep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OverrideKind {
    /// Scheduled, habit-driven setpoint change
    Routine,
    /// Unscheduled change triggered by thermal discomfort
    Discomfort,
}

/// Output record for one occupant and one timestep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupantOutput {
    pub occupant_id: OccupantId,
    pub home_id: HomeId,
    pub timestamp: NaiveDateTime,
    pub present: bool,
    /// Final setpoints in the configured unit
    pub setpoints: SetpointPair,
    pub override_kind: Option<OverrideKind>,
    /// Accumulated frustration, only for the frustration theory
    pub frustration: Option<f64>,
    /// Indoor minus comfort temperature, in the configured unit
    pub comfort_delta: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<SetpointDiagnostic>,
}

impl OccupantOutput {
    pub fn routine_override(&self) -> bool {
        self.override_kind == Some(OverrideKind::Routine)
    }

    pub fn discomfort_override(&self) -> bool {
        self.override_kind == Some(OverrideKind::Discomfort)
    }
}
