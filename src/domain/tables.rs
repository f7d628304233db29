//! # Reference Tables
//!
//! Shared, read-only data the engine samples from:
//!
//! - [`TransitionTable`]: time-of-day indexed two-state Markov transition rows
//!   for occupancy.
//! - [`RoutineDistributions`]: the keyed bundle of empirical distributions used
//!   to realize routine manual setpoint changes. Keys follow the
//!   `<season>_<wd|we>_<...>` convention, see [`routine_keys`].
//!
//! Tables are loaded once and shared across occupants behind an `Arc`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::error::{Result, SimulationError};
use super::types::{DayProfile, Season};

// ============================================================================
// Occupancy transition table
// ============================================================================

/// One row of the occupancy transition table as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRow {
    /// Zero-based time slot of the day
    pub slot: usize,
    /// Current state the row is conditioned on
    pub present: bool,
    /// `[p_absent, p_present]` for the next slot
    pub probabilities: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransitionTableRecord {
    base_resolution_minutes: u32,
    rows: Vec<TransitionRow>,
}

/// Time-inhomogeneous transition table over {absent, present}
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "TransitionTableRecord")]
pub struct TransitionTable {
    base_resolution_minutes: u32,
    rows: HashMap<(usize, bool), [f64; 2]>,
}

impl From<TransitionTableRecord> for TransitionTable {
    fn from(record: TransitionTableRecord) -> Self {
        Self::from_rows(record.base_resolution_minutes, record.rows)
    }
}

impl TransitionTable {
    /// Build a table from explicit rows. Later rows replace earlier ones with
    /// the same key.
    pub fn from_rows(
        base_resolution_minutes: u32,
        rows: impl IntoIterator<Item = TransitionRow>,
    ) -> Self {
        Self {
            base_resolution_minutes,
            rows: rows
                .into_iter()
                .map(|row| ((row.slot, row.present), row.probabilities))
                .collect(),
        }
    }

    /// Table whose rows are identical for every slot of the day.
    ///
    /// `p_arrive` is the probability of becoming present when absent,
    /// `p_stay` the probability of remaining present when present.
    pub fn constant(base_resolution_minutes: u32, p_arrive: f64, p_stay: f64) -> Self {
        let slots = (24 * 60 / base_resolution_minutes.max(1)) as usize;
        let rows = (0..slots).flat_map(|slot| {
            [
                TransitionRow {
                    slot,
                    present: false,
                    probabilities: [1.0 - p_arrive, p_arrive],
                },
                TransitionRow {
                    slot,
                    present: true,
                    probabilities: [1.0 - p_stay, p_stay],
                },
            ]
        });
        Self::from_rows(base_resolution_minutes, rows)
    }

    pub fn base_resolution_minutes(&self) -> u32 {
        self.base_resolution_minutes
    }

    /// Number of base-resolution slots in one day
    pub fn slots_per_day(&self) -> usize {
        (24 * 60 / self.base_resolution_minutes.max(1)) as usize
    }

    /// `[p_absent, p_present]` for the given slot and current state
    pub fn row(&self, slot: usize, present: bool) -> Result<&[f64; 2]> {
        self.rows
            .get(&(slot, present))
            .ok_or(SimulationError::MissingTransitionRow { slot, present })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Empirical distributions
// ============================================================================

/// Unconditional categorical distribution over textual outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginalTable {
    pub outcomes: Vec<String>,
    pub probabilities: Vec<f64>,
}

impl MarginalTable {
    pub fn new<S: Into<String>>(outcomes: impl IntoIterator<Item = S>, probabilities: Vec<f64>) -> Self {
        Self {
            outcomes: outcomes.into_iter().map(Into::into).collect(),
            probabilities,
        }
    }
}

/// One conditioning value and the probabilities over the table's outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRow {
    pub given: String,
    pub probabilities: Vec<f64>,
}

/// Conditional distribution: one probability row per conditioning value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalTable {
    pub outcomes: Vec<String>,
    pub rows: Vec<ConditionalRow>,
}

impl ConditionalTable {
    pub fn new<S: Into<String>>(outcomes: impl IntoIterator<Item = S>) -> Self {
        Self {
            outcomes: outcomes.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, given: impl Into<String>, probabilities: Vec<f64>) -> Self {
        self.rows.push(ConditionalRow {
            given: given.into(),
            probabilities,
        });
        self
    }

    pub fn row(&self, given: &str) -> Option<&[f64]> {
        self.rows
            .iter()
            .find(|row| row.given == given)
            .map(|row| row.probabilities.as_slice())
    }
}

/// Keyed bundle of empirical routine-override distributions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutineDistributions {
    #[serde(default)]
    marginals: BTreeMap<String, MarginalTable>,
    #[serde(default)]
    conditionals: BTreeMap<String, ConditionalTable>,
}

impl RoutineDistributions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_marginal(&mut self, key: impl Into<String>, table: MarginalTable) -> &mut Self {
        self.marginals.insert(key.into(), table);
        self
    }

    pub fn insert_conditional(
        &mut self,
        key: impl Into<String>,
        table: ConditionalTable,
    ) -> &mut Self {
        self.conditionals.insert(key.into(), table);
        self
    }

    pub fn marginal(&self, key: &str) -> Result<&MarginalTable> {
        self.marginals
            .get(key)
            .ok_or_else(|| SimulationError::missing_entry(key))
    }

    pub fn conditional(&self, key: &str) -> Result<&ConditionalTable> {
        self.conditionals
            .get(key)
            .ok_or_else(|| SimulationError::missing_entry(key))
    }

    pub fn len(&self) -> usize {
        self.marginals.len() + self.conditionals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marginals.is_empty() && self.conditionals.is_empty()
    }
}

/// Key builders for the routine distribution bundle.
///
/// `mscpd` is "manual setpoint changes per day", `tod` time of day and `DOO`
/// degree of override (the magnitude of the change).
pub mod routine_keys {
    use super::{DayProfile, Season};

    pub fn daily_count(profile: DayProfile) -> String {
        format!("{profile}_Nmscpd")
    }

    pub fn single_time(profile: DayProfile) -> String {
        format!("{profile}_1mscpd_tod")
    }

    pub fn single_type(profile: DayProfile) -> String {
        format!("{profile}_1mscpd_type")
    }

    pub fn single_magnitude(profile: DayProfile, kind: &str) -> String {
        format!("{profile}_1mscpd_{}_DOO_{kind}_type", profile.season)
    }

    pub fn first_time(profile: DayProfile) -> String {
        format!("{profile}_2mscpd_tod1")
    }

    pub fn first_type(profile: DayProfile) -> String {
        format!("{profile}_2mscpd_type1")
    }

    pub fn first_magnitude(profile: DayProfile, kind: &str) -> String {
        format!("{profile}_2mscpd_{}_DOO1_{kind}_type", profile.season)
    }

    pub fn second_time(profile: DayProfile) -> String {
        format!("{profile}_2mscpd_tod2_tod1")
    }

    pub fn second_type(profile: DayProfile, first_kind: &str) -> String {
        format!("{profile}_2mscpd_type2_type1_{first_kind}")
    }

    pub fn second_magnitude(profile: DayProfile, first_kind: &str, second_kind: &str) -> String {
        let season: Season = profile.season;
        format!(
            "{profile}_2mscpd_row{season}_col{season}_DOO2_{first_kind}_type1_{second_kind}_type2"
        )
    }
}

// ============================================================================
// Reference bundle
// ============================================================================

/// All reference data a simulation run needs
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceData {
    pub occupancy: TransitionTable,
    #[serde(default)]
    pub routine: RoutineDistributions,
}

impl ReferenceData {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse reference data")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read reference data from {}", path.display()))?;
        Self::from_json_str(&raw)
    }
}
