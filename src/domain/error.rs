use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised by the occupant decision engine.
///
/// All variants are fatal for the occupant (or run) that produced them.
/// Recoverable setpoint repairs are reported as
/// [`SetpointDiagnostic`](crate::domain::SetpointDiagnostic) instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Invalid probability distribution: {reason}")]
    InvalidDistribution { reason: String },

    #[error("No transition row for slot {slot} with current state present={present}")]
    MissingTransitionRow { slot: usize, present: bool },

    #[error("Missing distribution entry '{key}'{}", describe_given(.given))]
    MissingDistributionEntry { key: String, given: Option<String> },

    #[error("Malformed value '{value}' in distribution entry '{key}'")]
    MalformedDistributionEntry { key: String, value: String },

    #[error("Sampling interval of {interval_minutes} min is incompatible with the {base_minutes} min base resolution")]
    UnsupportedSamplingInterval { interval_minutes: u32, base_minutes: u32 },

    #[error("Environment sample stamped {actual} does not match simulation time {expected}")]
    TimestampMismatch {
        expected: NaiveDateTime,
        actual: NaiveDateTime,
    },

    #[error("No environment sample supplied for home {home}")]
    MissingEnvironmentSample { home: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SimulationError {
    pub(crate) fn invalid_distribution(reason: impl Into<String>) -> Self {
        SimulationError::InvalidDistribution {
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_entry(key: impl Into<String>) -> Self {
        SimulationError::MissingDistributionEntry {
            key: key.into(),
            given: None,
        }
    }

    pub(crate) fn missing_row(key: impl Into<String>, given: impl Into<String>) -> Self {
        SimulationError::MissingDistributionEntry {
            key: key.into(),
            given: Some(given.into()),
        }
    }
}

fn describe_given(given: &Option<String>) -> String {
    given
        .as_ref()
        .map(|g| format!(" for '{g}'"))
        .unwrap_or_default()
}

pub type Result<T, E = SimulationError> = std::result::Result<T, E>;
