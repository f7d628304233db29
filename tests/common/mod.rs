//! Shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use occupant_behavior_model::config::{OccupantConfig, SimulationConfig};
use occupant_behavior_model::domain::{
    ConditionalTable, EnvironmentSample, MarginalTable, ReferenceData, RoutineDistributions,
    TransitionRow, TransitionTable,
};
use occupant_behavior_model::simulation::{DiscomfortConfig, InitialPresence};

pub const PROFILES: [&str; 4] = ["heat_wd", "heat_we", "cool_wd", "cool_we"];

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Occupant never leaves
pub fn always_home() -> TransitionTable {
    TransitionTable::constant(10, 1.0, 1.0)
}

/// Home until `leave_slot`, away until `return_slot`, then home again
/// (10-minute slots)
pub fn leave_and_return(leave_slot: usize, return_slot: usize) -> TransitionTable {
    let rows = (0..144).flat_map(move |slot| {
        let stay = if slot == leave_slot { 0.0 } else { 1.0 };
        let arrive = if slot == return_slot { 1.0 } else { 0.0 };
        [
            TransitionRow {
                slot,
                present: true,
                probabilities: [1.0 - stay, stay],
            },
            TransitionRow {
                slot,
                present: false,
                probabilities: [1.0 - arrive, arrive],
            },
        ]
    });
    TransitionTable::from_rows(10, rows)
}

/// Bundle in which every day has zero routine changes
pub fn no_routine() -> RoutineDistributions {
    let mut bundle = RoutineDistributions::new();
    for profile in PROFILES {
        bundle.insert_marginal(
            format!("{profile}_Nmscpd"),
            MarginalTable::new(["0"], vec![1.0]),
        );
    }
    bundle
}

/// Complete bundle for every non-shoulder profile: changes on the hour
/// between 06:00 and 22:00, typed `up` or `down`, magnitudes of 1 or 2 °F.
pub fn full_routine() -> RoutineDistributions {
    let hours: Vec<String> = (6..=22).map(|h| format!("{h:02}:00:00")).collect();
    let uniform = |n: usize| vec![1.0 / n as f64; n];
    let magnitudes = |kind: &str| match kind {
        "up" => vec!["1", "2"],
        _ => vec!["-1", "-2"],
    };

    let mut bundle = RoutineDistributions::new();
    for profile in PROFILES {
        let season = profile.split('_').next().unwrap();

        bundle
            .insert_marginal(
                format!("{profile}_Nmscpd"),
                MarginalTable::new(["0", "1", "2"], vec![0.2, 0.4, 0.4]),
            )
            .insert_marginal(
                format!("{profile}_1mscpd_tod"),
                MarginalTable::new(hours.clone(), uniform(hours.len())),
            )
            .insert_marginal(
                format!("{profile}_1mscpd_type"),
                MarginalTable::new(["up", "down"], vec![0.5, 0.5]),
            )
            .insert_marginal(
                format!("{profile}_2mscpd_tod1"),
                MarginalTable::new(hours.clone(), uniform(hours.len())),
            )
            .insert_marginal(
                format!("{profile}_2mscpd_type1"),
                MarginalTable::new(["up", "down"], vec![0.5, 0.5]),
            );

        let mut second_time = ConditionalTable::new(hours.clone());
        for (i, given) in hours.iter().enumerate() {
            // Only later hours; the last hour has an all-zero row
            let later = hours.len() - i - 1;
            let row = (0..hours.len())
                .map(|j| if j > i { 1.0 / later as f64 } else { 0.0 })
                .collect();
            second_time = second_time.with_row(given.clone(), row);
        }
        bundle.insert_conditional(format!("{profile}_2mscpd_tod2_tod1"), second_time);

        for kind in ["up", "down"] {
            let mut single = ConditionalTable::new(magnitudes(kind));
            let mut first = ConditionalTable::new(magnitudes(kind));
            for given in &hours {
                single = single.with_row(given.clone(), vec![0.5, 0.5]);
                first = first.with_row(given.clone(), vec![0.5, 0.5]);
            }
            bundle
                .insert_conditional(format!("{profile}_1mscpd_{season}_DOO_{kind}_type"), single)
                .insert_conditional(format!("{profile}_2mscpd_{season}_DOO1_{kind}_type"), first)
                .insert_marginal(
                    format!("{profile}_2mscpd_type2_type1_{kind}"),
                    MarginalTable::new(["up", "down"], vec![0.5, 0.5]),
                );

            for second_kind in ["up", "down"] {
                let mut table = ConditionalTable::new(magnitudes(second_kind));
                for given in ["-2", "-1", "1", "2"] {
                    table = table.with_row(given, vec![0.5, 0.5]);
                }
                bundle.insert_conditional(
                    format!(
                        "{profile}_2mscpd_row{season}_col{season}_DOO2_{kind}_type1_{second_kind}_type2"
                    ),
                    table,
                );
            }
        }
    }
    bundle
}

pub fn reference(occupancy: TransitionTable, routine: RoutineDistributions) -> ReferenceData {
    ReferenceData { occupancy, routine }
}

pub fn simulation_config(start: NaiveDateTime, seed: u64) -> SimulationConfig {
    SimulationConfig {
        start,
        random_seed: Some(seed),
        sampling_interval_minutes: 5,
        initial_presence: InitialPresence::Present,
        homes: 1,
        occupants_per_home: 1,
        ..SimulationConfig::default()
    }
}

pub fn czt_occupant(comfort: f64) -> OccupantConfig {
    OccupantConfig {
        comfort_temperature: comfort,
        deadband: 1.0,
        override_cooldown_seconds: 300,
        discomfort: DiscomfortConfig::Czt {
            upper_threshold: 4.0,
            lower_threshold: -4.0,
        },
    }
}

pub fn tft_occupant(comfort: f64, bound: f64) -> OccupantConfig {
    OccupantConfig {
        discomfort: DiscomfortConfig::Tft {
            alpha: 1.0,
            beta: 1.0,
            upper_bound: bound,
            lower_bound: -bound,
        },
        ..czt_occupant(comfort)
    }
}

pub fn sample(timestamp: NaiveDateTime, indoor: f64, cooling: f64, heating: f64) -> EnvironmentSample {
    EnvironmentSample {
        timestamp,
        indoor_temp: indoor,
        outdoor_temp: indoor + 10.0,
        humidity: 45.0,
        cooling_setpoint: cooling,
        heating_setpoint: heating,
        heating_running: false,
        cooling_running: false,
    }
}

/// `count` timestamps from `start` at `step_minutes`
pub fn timestamps(start: NaiveDateTime, step_minutes: i64, count: usize) -> Vec<NaiveDateTime> {
    (0..count as i64)
        .map(|i| start + Duration::minutes(step_minutes * i))
        .collect()
}
