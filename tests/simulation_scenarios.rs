mod common;

use common::*;
use occupant_behavior_model::domain::{
    OverrideKind, RoutineDistributions, SetpointPair, TemperatureUnit, TransitionTable,
};
use occupant_behavior_model::simulation::{DiscomfortConfig, Simulation};
use std::collections::BTreeSet;

#[test]
fn test_comfort_zone_override_end_to_end() {
    // Monday in July, always home, no routine changes
    let start = at(2024, 7, 1, 12, 0);
    let mut sim = Simulation::new(
        &simulation_config(start, 1),
        &czt_occupant(70.0),
        reference(always_home(), no_routine()),
    )
    .unwrap();

    let indoor = [70.0, 71.25, 72.5, 73.75, 75.0, 72.0, 72.0, 72.0];
    let outputs: Vec<_> = timestamps(start, 5, indoor.len())
        .into_iter()
        .zip(indoor)
        .map(|(ts, t)| {
            let report = sim.step_uniform(&sample(ts, t, 76.0, 68.0)).unwrap();
            report.outputs[&1].clone()
        })
        .collect();

    let fired: Vec<usize> = outputs
        .iter()
        .enumerate()
        .filter(|(_, o)| o.discomfort_override())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(fired, vec![4]);

    let overridden = SetpointPair::new(71.0, 63.0);
    assert_eq!(outputs[4].setpoints, overridden);
    for output in &outputs[4..] {
        assert!(output.present);
        assert!(output.setpoints.cooling <= 76.0);
        assert_eq!(output.setpoints, overridden);
    }
    for output in &outputs[..4] {
        assert_eq!(output.setpoints, SetpointPair::new(76.0, 68.0));
        assert_eq!(output.override_kind, None);
    }
    assert_eq!(outputs[4].comfort_delta, 5.0);
}

#[test]
fn test_absence_resets_frustration() {
    // Leave at 12:00 (slot 72), return at 13:00 (slot 78)
    let start = at(2024, 7, 1, 11, 40);
    let mut config = simulation_config(start, 2);
    config.sampling_interval_minutes = 10;
    let mut sim = Simulation::new(
        &config,
        &tft_occupant(70.0, 100.0),
        reference(leave_and_return(72, 78), no_routine()),
    )
    .unwrap();

    let frustration: Vec<(bool, Option<f64>)> = timestamps(start, 10, 10)
        .into_iter()
        .map(|ts| {
            let report = sim.step_uniform(&sample(ts, 72.0, 76.0, 68.0)).unwrap();
            let output = &report.outputs[&1];
            (output.present, output.frustration)
        })
        .collect();

    assert_eq!(
        frustration,
        vec![
            (true, Some(2.0)),
            (true, Some(4.0)),
            (false, Some(0.0)),
            (false, Some(0.0)),
            (false, Some(0.0)),
            (false, Some(0.0)),
            (false, Some(0.0)),
            (false, Some(0.0)),
            (true, Some(2.0)),
            (true, Some(4.0)),
        ]
    );
}

#[test]
fn test_sustained_heat_keeps_override_near_input() {
    let start = at(2024, 7, 1, 12, 0);
    let mut sim = Simulation::new(
        &simulation_config(start, 8),
        &czt_occupant(70.0),
        reference(always_home(), no_routine()),
    )
    .unwrap();

    for ts in timestamps(start, 5, 12) {
        let report = sim.step_uniform(&sample(ts, 80.0, 76.0, 68.0)).unwrap();
        let output = &report.outputs[&1];
        assert!(output.discomfort_override(), "at {ts}");
        assert_eq!(output.setpoints, SetpointPair::new(66.0, 58.0), "at {ts}");
        assert!(output.diagnostics.is_empty());
    }
}

#[test]
fn test_frustration_cleared_entering_shoulder_season() {
    let start = at(2024, 2, 29, 23, 50);
    let mut sim = Simulation::new(
        &simulation_config(start, 12),
        &tft_occupant(70.0, 100.0),
        reference(always_home(), no_routine()),
    )
    .unwrap();

    let observed: Vec<(bool, Option<f64>)> = timestamps(start, 5, 4)
        .into_iter()
        .map(|ts| {
            let report = sim.step_uniform(&sample(ts, 75.0, 76.0, 68.0)).unwrap();
            let output = &report.outputs[&1];
            (output.present, output.frustration)
        })
        .collect();

    assert_eq!(
        observed,
        vec![
            (true, Some(5.0)),
            (true, Some(10.0)),
            (false, Some(0.0)),
            (false, Some(0.0)),
        ]
    );
}

#[test]
fn test_held_override_released_on_departure() {
    let start = at(2024, 7, 1, 11, 50);
    let mut config = simulation_config(start, 3);
    config.sampling_interval_minutes = 10;
    let mut sim = Simulation::new(
        &config,
        &czt_occupant(70.0),
        reference(leave_and_return(72, 78), no_routine()),
    )
    .unwrap();

    let hot = sim.step_uniform(&sample(start, 76.0, 76.0, 68.0)).unwrap();
    assert!(hot.outputs[&1].discomfort_override());
    assert_eq!(hot.outputs[&1].setpoints, SetpointPair::new(70.0, 62.0));

    let away = sim
        .step_uniform(&sample(at(2024, 7, 1, 12, 0), 76.0, 76.0, 68.0))
        .unwrap();
    assert!(!away.outputs[&1].present);
    assert_eq!(away.outputs[&1].setpoints, SetpointPair::new(76.0, 68.0));
}

#[test]
fn test_routine_changes_fire_on_their_timestamps() {
    let start = at(2024, 7, 2, 0, 0);

    for seed in 0..10 {
        let mut config = simulation_config(start, seed);
        config.occupants_per_home = 3;
        let mut sim = Simulation::new(
            &config,
            &czt_occupant(72.0),
            reference(always_home(), full_routine()),
        )
        .unwrap();

        let expected: Vec<BTreeSet<_>> = sim
            .agents()
            .map(|agent| {
                let events = agent.routine_events().unwrap();
                let schedule = agent.schedule().unwrap();
                assert!(events.events().iter().all(|e| schedule.is_present_at(e.timestamp)));
                events.events().iter().map(|e| e.timestamp).collect()
            })
            .collect();

        let mut fired = vec![BTreeSet::new(); expected.len()];
        for ts in timestamps(start, 5, 288) {
            let report = sim.step_uniform(&sample(ts, 72.0, 76.0, 68.0)).unwrap();
            for (id, output) in &report.outputs {
                if output.override_kind == Some(OverrideKind::Routine) {
                    fired[*id as usize - 1].insert(ts);
                }
            }
        }

        assert_eq!(fired, expected, "seed {seed}");
    }
}

#[test]
fn test_routine_change_applies_cooling_delta() {
    let start = at(2024, 7, 2, 0, 0);
    let mut sim = Simulation::new(
        &simulation_config(start, 17),
        &czt_occupant(72.0),
        reference(always_home(), full_routine()),
    )
    .unwrap();

    let events: Vec<_> = sim
        .agent(1)
        .and_then(|a| a.routine_events())
        .map(|set| set.events().to_vec())
        .unwrap();

    let mut expected = SetpointPair::new(78.0, 66.0);
    for ts in timestamps(start, 5, 288) {
        let report = sim.step_uniform(&sample(ts, 72.0, 78.0, 66.0)).unwrap();
        let output = &report.outputs[&1];
        for event in events.iter().filter(|e| e.timestamp == ts) {
            assert_eq!(event.heating_delta, 0.0);
            expected = expected.adjusted(event.cooling_delta, 0.0);
        }
        assert_eq!(output.setpoints, expected, "at {ts}");
    }
}

#[test]
fn test_shoulder_season_passes_through() {
    let start = at(2024, 4, 10, 8, 0);
    let mut sim = Simulation::new(
        &simulation_config(start, 4),
        &czt_occupant(70.0),
        // Empty bundle: shoulder-season days never read from it
        reference(always_home(), RoutineDistributions::new()),
    )
    .unwrap();

    for ts in timestamps(start, 5, 12) {
        let report = sim.step_uniform(&sample(ts, 90.0, 76.0, 68.0)).unwrap();
        let output = &report.outputs[&1];
        assert!(!output.present);
        assert_eq!(output.override_kind, None);
        assert_eq!(output.setpoints, SetpointPair::new(76.0, 68.0));
    }
}

#[test]
fn test_celsius_round_trip() {
    let start = at(2024, 7, 1, 12, 0);
    let mut config = simulation_config(start, 5);
    config.unit = TemperatureUnit::Celsius;
    let mut occupant = czt_occupant(22.0);
    occupant.deadband = 0.5;
    occupant.discomfort = DiscomfortConfig::Czt {
        upper_threshold: 2.0,
        lower_threshold: -2.0,
    };
    let mut sim = Simulation::new(&config, &occupant, reference(always_home(), no_routine())).unwrap();

    let report = sim.step_uniform(&sample(start, 25.0, 24.0, 20.0)).unwrap();
    let output = &report.outputs[&1];
    assert!(output.discomfort_override());
    assert!((output.comfort_delta - 3.0).abs() < 1e-9);
    assert!((output.setpoints.cooling - 21.0).abs() < 1e-9);
    assert!((output.setpoints.heating - 17.0).abs() < 1e-9);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let start = at(2024, 1, 9, 0, 0);
    let run = |seed| {
        let mut config = simulation_config(start, seed);
        config.occupants_per_home = 2;
        let mut sim = Simulation::new(
            &config,
            &tft_occupant(70.0, 30.0),
            reference(
                TransitionTable::constant(10, 0.2, 0.9),
                full_routine(),
            ),
        )
        .unwrap();
        timestamps(start, 5, 288)
            .into_iter()
            .map(|ts| sim.step_uniform(&sample(ts, 66.0, 76.0, 68.0)).unwrap())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(9), run(9));
}

#[test]
fn test_multi_home_samples_are_routed_by_home() {
    let start = at(2024, 7, 1, 12, 0);
    let mut config = simulation_config(start, 6);
    config.homes = 2;
    let mut sim = Simulation::new(&config, &czt_occupant(70.0), reference(always_home(), no_routine())).unwrap();

    let samples = std::collections::HashMap::from([
        (1, sample(start, 70.0, 76.0, 68.0)),
        (2, sample(start, 80.0, 76.0, 68.0)),
    ]);
    let report = sim.step(&samples).unwrap();

    assert_eq!(report.outputs[&1].override_kind, None);
    assert_eq!(report.outputs[&2].home_id, 2);
    assert!(report.outputs[&2].discomfort_override());
    assert_eq!(report.overrides(), 1);
}
