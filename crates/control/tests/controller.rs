mod common;

use common::{at, fast_config, scripted, ScriptedProbe};
use control::{
    CancelToken, CancellableSettle, ControlError, ControllerConfig, Env, EpisodeController, Event,
    RecordingSink, INFO_INVALID_ACTION,
};
use probe::{ControlVector, HwError, Position, Probe, SimulatedProbe, SpaceBounds, COIL_COUNT};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn nan_action(channel: usize) -> ControlVector {
    let mut currents = [0.5; COIL_COUNT];
    currents[channel] = f64::NAN;
    ControlVector::new(currents)
}

#[test]
fn step_before_reset_is_rejected() {
    let (mut env, _) = scripted(Position::ZERO, &[at(3.0)]);
    assert_eq!(env.step(&ControlVector::ZERO), Err(ControlError::NotReset));
    assert!(env.state().is_none());
}

#[test]
fn reset_senses_position_and_clears_previous_distance() {
    let (mut env, sink) = scripted(Position::ZERO, &[at(8.0)]);
    let start = env.reset().unwrap();
    assert_eq!(start, at(8.0));

    let state = env.state().unwrap();
    assert_eq!(state.current_position, at(8.0));
    assert_eq!(state.goal_position, Position::ZERO);
    assert_eq!(state.previous_distance, None);
    assert_eq!(state.current_distance, 8.0);
    assert_eq!(state.initial_distance, 8.0);
    assert_eq!(state.step_limit, 2500);
    assert_eq!(env.episode(), 1);

    assert!(matches!(
        sink.events().as_slice(),
        [Event::EpisodeStarted { episode: 1, seed: Some(1234), initial_distance, .. }] if *initial_distance == 8.0
    ));
}

#[test]
fn single_step_onto_goal_terminates() {
    let (mut env, _) = scripted(Position::ZERO, &[at(10.0), at(0.0)]);
    env.reset().unwrap();
    let outcome = env.step(&ControlVector::splat(1.0)).unwrap();
    assert_eq!(outcome.reward, 4);
    assert!(outcome.terminated);
    assert_eq!(outcome.observation, Position::ZERO);
    assert!(outcome.info.is_empty());
}

#[test]
fn first_step_compares_against_reset_distance() {
    for (previous, current, expected) in [(6.0, 5.5, 1), (5.5, 6.0, -1), (6.0, 6.0, 0), (10.0, 3.0, 2)] {
        let (mut env, _) = scripted(Position::ZERO, &[at(previous), at(current)]);
        env.reset().unwrap();
        let outcome = env.step(&ControlVector::ZERO).unwrap();
        assert_eq!(outcome.reward, expected, "{previous} -> {current}");
        assert!(!outcome.terminated);

        let state = env.state().unwrap();
        assert_eq!(state.previous_distance, Some(previous));
        assert_eq!(state.current_distance, current);
    }
}

#[test]
fn distances_roll_forward_across_steps() {
    let (mut env, sink) = scripted(Position::ZERO, &[at(9.0), at(8.0), at(8.5), at(8.5), at(0.5)]);
    env.reset().unwrap();
    let rewards: Vec<i32> = (0..4)
        .map(|_| env.step(&ControlVector::ZERO).unwrap().reward)
        .collect();
    assert_eq!(rewards, vec![1, -1, 0, 3]);
    assert_eq!(env.state().unwrap().steps, 4);
    assert_eq!(env.probe().actuations.len(), 4);

    let scored: Vec<(f64, f64)> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::StepScored { previous_distance, distance, .. } => Some((previous_distance, distance)),
            _ => None,
        })
        .collect();
    assert_eq!(scored, vec![(9.0, 8.0), (8.0, 8.5), (8.5, 8.5), (8.5, 0.5)]);
}

#[test]
fn nan_action_skips_actuation_and_keeps_state() {
    let (mut env, sink) = scripted(Position::ZERO, &[at(7.0), at(2.0)]);
    env.reset().unwrap();
    let before = env.state().unwrap().clone();

    let outcome = env.step(&nan_action(5)).unwrap();
    assert_eq!(outcome.observation, at(7.0));
    assert_eq!(outcome.reward, 0);
    assert!(!outcome.terminated);
    assert_eq!(outcome.info.get(INFO_INVALID_ACTION), Some(&serde_json::json!(5)));

    let after = env.state().unwrap();
    assert_eq!(after.current_position, before.current_position);
    assert_eq!(after.current_distance, before.current_distance);
    assert_eq!(after.previous_distance, None);
    assert_eq!(after.steps, 1);
    assert!(env.probe().actuations.is_empty());
    // The queued reading was not consumed.
    assert_eq!(env.probe().readings.len(), 1);
    assert!(sink
        .events()
        .contains(&Event::InvalidAction { episode: 1, step: 1, channel: 5 }));

    // The next valid step still scores against the reset distance.
    let outcome = env.step(&ControlVector::ZERO).unwrap();
    assert_eq!(outcome.reward, 2);
    assert_eq!(env.state().unwrap().previous_distance, Some(7.0));
}

#[test]
fn infinite_component_is_invalid_too() {
    let (mut env, _) = scripted(Position::ZERO, &[at(7.0)]);
    env.reset().unwrap();
    let mut currents = [0.0; COIL_COUNT];
    currents[0] = f64::NEG_INFINITY;
    let outcome = env.step(&ControlVector::new(currents)).unwrap();
    assert_eq!(outcome.info.get(INFO_INVALID_ACTION), Some(&serde_json::json!(0)));
}

#[test]
fn reset_starts_a_fresh_episode() {
    let (mut env, _) = scripted(Position::ZERO, &[at(9.0), at(6.0), at(12.0)]);
    env.reset().unwrap();
    env.step(&ControlVector::ZERO).unwrap();
    assert_eq!(env.state().unwrap().previous_distance, Some(9.0));

    let start = env.reset().unwrap();
    assert_eq!(start, at(12.0));
    let state = env.state().unwrap();
    assert_eq!(state.previous_distance, None);
    assert_eq!(state.current_distance, 12.0);
    assert_eq!(state.steps, 0);
    assert_eq!(env.episode(), 2);
}

#[test]
fn goal_on_start_position_terminates_on_first_step() {
    let (mut env, _) = scripted(at(2.0), &[at(2.0)]);
    env.reset().unwrap();
    assert_eq!(env.state().unwrap().current_distance, 0.0);
    let outcome = env.step(&ControlVector::ZERO).unwrap();
    assert_eq!(outcome.reward, 4);
    assert!(outcome.terminated);
}

#[test]
fn transient_read_failures_are_retried() {
    let (mut env, sink) = scripted(Position::ZERO, &[at(10.0)]);
    env.reset().unwrap();
    env.probe_mut().push_fault(HwError::Sensor("glitch".into()));
    env.probe_mut().push_fault(HwError::Sensor("glitch".into()));
    env.probe_mut().readings.push_back(Ok(at(3.0)));

    let outcome = env.step(&ControlVector::ZERO).unwrap();
    assert_eq!(outcome.reward, 2);
    let retries: Vec<u32> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::HardwareRetry { attempt, .. } => Some(attempt),
            _ => None,
        })
        .collect();
    assert_eq!(retries, vec![1, 2]);
}

#[test]
fn persistent_read_failure_is_surfaced_and_state_kept() {
    let (mut env, _) = scripted(Position::ZERO, &[at(10.0)]);
    env.reset().unwrap();
    for _ in 0..3 {
        env.probe_mut().push_fault(HwError::Disconnected);
    }
    let before = env.state().unwrap().clone();

    let err = env.step(&ControlVector::ZERO).unwrap_err();
    assert_eq!(
        err,
        ControlError::Hardware { attempts: 3, source: HwError::Disconnected }
    );
    assert_eq!(env.state().unwrap(), &before);
}

#[test]
fn persistent_actuation_failure_skips_read_back() {
    let (mut env, _) = scripted(Position::ZERO, &[at(10.0), at(1.5)]);
    env.reset().unwrap();
    env.probe_mut().actuation_faults = 5;

    assert!(matches!(
        env.step(&ControlVector::ZERO),
        Err(ControlError::Hardware { attempts: 3, .. })
    ));
    assert_eq!(env.probe().readings.len(), 1);
    assert_eq!(env.state().unwrap().steps, 0);
}

#[test]
fn zero_retries_fail_fast() {
    let config = ControllerConfig { io_retries: 0, ..fast_config() };
    let mut env = EpisodeController::new(ScriptedProbe::new(Position::ZERO, &[at(1.0)]), config).unwrap();
    env.reset().unwrap();
    env.probe_mut().push_fault(HwError::Disconnected);
    assert!(matches!(
        env.step(&ControlVector::ZERO),
        Err(ControlError::Hardware { attempts: 1, .. })
    ));
}

#[test]
fn failed_reset_keeps_previous_episode() {
    let (mut env, _) = scripted(Position::ZERO, &[at(4.0)]);
    env.reset().unwrap();
    for _ in 0..3 {
        env.probe_mut().push_fault(HwError::Disconnected);
    }
    assert!(env.reset().is_err());
    assert_eq!(env.episode(), 1);
    assert_eq!(env.state().unwrap().current_position, at(4.0));
    assert_eq!(Some(env.state().unwrap().goal_position), env.probe().goal());
}

#[test]
fn failed_reset_read_leaves_rig_goal_and_sampler_alone() {
    let mut env = EpisodeController::new(SimulatedProbe::new(), fast_config()).unwrap();
    let mut reference = EpisodeController::new(SimulatedProbe::new(), fast_config()).unwrap();
    env.reset().unwrap();
    reference.reset().unwrap();
    let goal = env.state().unwrap().goal_position;

    env.probe_mut().fail_next_reads(3);
    assert!(matches!(env.reset(), Err(ControlError::Hardware { attempts: 3, .. })));
    assert_eq!(env.state().unwrap().goal_position, goal);
    assert_eq!(env.probe().goal(), Some(goal));
    assert!(env.step(&ControlVector::ZERO).is_ok());

    env.reset().unwrap();
    reference.reset().unwrap();
    assert_eq!(
        env.state().unwrap().goal_position,
        reference.state().unwrap().goal_position
    );
}

#[test]
fn failed_goal_placement_keeps_episode_when_rig_goal_unchanged() {
    let (mut env, _) = scripted(Position::ZERO, &[at(4.0), at(6.0)]);
    env.reset().unwrap();
    env.probe_mut().goal_faults = 3;

    assert!(env.reset().is_err());
    assert_eq!(env.state().unwrap().goal_position, Position::ZERO);
    assert_eq!(env.probe().goal(), Some(Position::ZERO));
    assert_eq!(env.step(&ControlVector::ZERO).unwrap().reward, -1);
}

#[test]
fn failed_goal_placement_that_moved_rig_goal_drops_episode() {
    let (mut env, _) = scripted(Position::ZERO, &[at(4.0), at(6.0)]);
    env.reset().unwrap();
    env.probe_mut().goal_faults = 3;
    env.probe_mut().next_goal = Some(at(2.0));

    assert!(env.reset().is_err());
    assert!(env.state().is_none());
    assert_eq!(env.step(&ControlVector::ZERO), Err(ControlError::NotReset));

    env.probe_mut().readings.push_back(Ok(at(5.0)));
    assert_eq!(env.reset().unwrap(), at(5.0));
    assert_eq!(env.state().unwrap().goal_position, at(2.0));
    assert_eq!(env.episode(), 2);
}

#[test]
fn cancelled_settle_issues_actuation_but_skips_read_back() {
    let token = CancelToken::new();
    let sink = Arc::new(RecordingSink::new());
    let mut env = EpisodeController::new(
        ScriptedProbe::new(Position::ZERO, &[at(10.0), at(2.0)]),
        ControllerConfig { settle_ms: 60_000, ..fast_config() },
    )
    .unwrap()
    .with_settle(CancellableSettle::new(token.clone()))
    .with_sink(sink.clone());
    env.reset().unwrap();

    token.cancel();
    assert_eq!(env.step(&ControlVector::splat(1.0)), Err(ControlError::Cancelled));
    assert_eq!(env.probe().actuations, vec![ControlVector::splat(1.0)]);
    assert_eq!(env.probe().readings.len(), 1);
    assert_eq!(env.state().unwrap().current_distance, 10.0);
    assert!(sink
        .events()
        .contains(&Event::StepCancelled { episode: 1, step: 1 }));

    token.rearm();
    assert!(!token.is_cancelled());
}

#[test]
fn settle_interval_blocks_between_actuation_and_read() {
    let mut env = EpisodeController::new(
        ScriptedProbe::new(Position::ZERO, &[at(10.0), at(9.0)]),
        ControllerConfig { settle_ms: 30, ..fast_config() },
    )
    .unwrap();
    env.reset().unwrap();
    let start = Instant::now();
    env.step(&ControlVector::ZERO).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn bounds_are_published_and_validated() {
    let env = EpisodeController::new(SimulatedProbe::new(), fast_config()).unwrap();
    assert_eq!(env.observation_bounds(), &SpaceBounds::observation());
    assert_eq!(env.action_bounds().dims(), COIL_COUNT);
    assert_eq!(env.obs_size(), 3);
    assert_eq!(env.action_size(), COIL_COUNT);

    let bad = ControllerConfig {
        action_bounds: SpaceBounds::symmetric(4, 1.0),
        ..fast_config()
    };
    assert!(matches!(
        EpisodeController::new(SimulatedProbe::new(), bad),
        Err(ControlError::Bounds(_))
    ));
}

#[test]
fn probe_distance_matches_controller_distance() {
    let (mut env, _) = scripted(Position::ZERO, &[Position::new(0.0, 3.0, 4.0)]);
    env.reset().unwrap();
    assert_eq!(env.probe_distance_to_goal().unwrap(), 5.0);
    assert_eq!(env.state().unwrap().current_distance, 5.0);
}

#[test]
fn step_limit_is_reported_but_not_enforced() {
    let config = ControllerConfig { step_limit: 2, ..fast_config() };
    let mut env = EpisodeController::new(ScriptedProbe::new(Position::ZERO, &[at(9.0)]), config).unwrap();
    env.reset().unwrap();
    for _ in 0..3 {
        env.step(&ControlVector::ZERO).unwrap();
    }
    assert!(env.is_truncated());
    assert_eq!(env.state().unwrap().steps, 3);
}
