use approx::assert_abs_diff_eq;
use ndarray::array;

use super::{test_hyperparameters, FixedLengthEnv};
use crate::agent::{DqnAgent, EpsilonSchedule};
use crate::error::DqnError;
use crate::types::Transition;

fn agent(seed: u64) -> DqnAgent {
    DqnAgent::new(test_hyperparameters(), 2, 2, seed).unwrap()
}

fn transition(reward: f32, terminated: bool) -> Transition {
    Transition::new(array![0.5, 1.0], 1, array![0.25, -1.0], reward, terminated)
}

#[test]
fn test_agent_creation() {
    let agent = agent(0);
    assert_eq!(agent.policy_network().num_states(), 2);
    assert_eq!(agent.policy_network().num_actions(), 2);
    assert_eq!(agent.policy_network().parameters(), agent.target_network().parameters());
    assert_eq!(agent.epsilon(), 1.0);
    assert_eq!(agent.step_count(), 0);
    assert!(agent.memory().is_empty());
    assert_eq!(agent.memory().capacity(), 100);
}

#[test]
fn test_agent_rejects_empty_spaces() {
    assert!(matches!(
        DqnAgent::new(test_hyperparameters(), 0, 2, 0),
        Err(DqnError::Config { key, .. }) if key == "num_states"
    ));
    assert!(matches!(
        DqnAgent::new(test_hyperparameters(), 2, 0, 0),
        Err(DqnError::Config { key, .. }) if key == "num_actions"
    ));
}

#[test]
fn test_agent_rejects_invalid_hyperparameters() {
    let mut hyperparameters = test_hyperparameters();
    hyperparameters.mini_batch_size = 0;
    assert!(matches!(
        DqnAgent::new(hyperparameters, 2, 2, 0),
        Err(DqnError::Config { key, .. }) if key == "mini_batch_size"
    ));
}

#[test]
fn test_epsilon_schedule_reaches_floor() {
    let mut schedule = EpsilonSchedule::new(1.0, 0.9, 0.05);
    let mut previous = schedule.value();
    for _ in 0..50 {
        let value = schedule.decay();
        assert!(value <= previous);
        assert!(value >= schedule.min());
        previous = value;
    }
    assert_eq!(schedule.min(), 0.05);
    assert_eq!(schedule.value(), schedule.min());
}

#[test]
fn test_epsilon_decays_once_per_training_episode() {
    let mut agent = agent(1);
    let mut env = FixedLengthEnv::new(1);
    agent.run(&mut env, true, Some(50)).unwrap();

    let history = &agent.metrics().metrics().epsilon_history;
    assert_eq!(history.len(), 50);
    assert_abs_diff_eq!(history[0], 0.9, epsilon = 1e-6);
    assert!(history.windows(2).all(|w| w[1] <= w[0]));
    assert_eq!(agent.epsilon(), 0.05);
}

#[test]
fn test_greedy_selection_ignores_epsilon() {
    let mut agent = agent(2);
    let state = array![0.3, -0.7];
    let greedy = agent.greedy_action(state.view()).unwrap();
    for _ in 0..20 {
        assert_eq!(agent.select_action(state.view(), false).unwrap(), greedy);
    }
}

#[test]
fn test_exploration_covers_all_actions() {
    let mut agent = agent(3);
    let state = array![0.3, -0.7];
    let mut seen = [false; 2];
    for _ in 0..100 {
        seen[agent.select_action(state.view(), true).unwrap()] = true;
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn test_select_action_checks_state_width() {
    let mut agent = agent(4);
    let state = array![0.3, -0.7, 0.1];
    assert!(matches!(
        agent.select_action(state.view(), false),
        Err(DqnError::DimensionMismatch { expected: 2, actual: 3 })
    ));
}

#[test]
fn test_terminal_target_is_reward() {
    let mut hyperparameters = test_hyperparameters();
    hyperparameters.discount_factor = 0.99;
    let agent = DqnAgent::new(hyperparameters, 2, 2, 5).unwrap();

    let targets = agent.compute_targets(&[transition(2.5, true)]).unwrap();
    assert_eq!(targets[0], 2.5);
}

#[test]
fn test_non_terminal_target_bootstraps_from_target_network() {
    let agent = agent(6);
    let next_state = array![0.25, -1.0];
    let next_q = agent.target_network().predict(next_state.view()).unwrap();
    let max_next_q = next_q.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

    let targets = agent
        .compute_targets(&[transition(1.0, false), transition(-1.0, true)])
        .unwrap();
    assert_abs_diff_eq!(targets[0], 1.0 + 0.9 * max_next_q, epsilon = 1e-6);
    assert_eq!(targets[1], -1.0);
}

#[test]
fn test_optimize_updates_policy_only() {
    let mut agent = agent(7);
    let target_before = agent.target_network().parameters();
    let policy_before = agent.policy_network().parameters();

    let batch = vec![transition(1.0, false), transition(0.0, true)];
    let loss = agent.optimize(&batch).unwrap();

    assert!(loss.is_finite());
    assert!(loss >= 0.0);
    assert_ne!(agent.policy_network().parameters(), policy_before);
    assert_eq!(agent.target_network().parameters(), target_before);
    assert_eq!(agent.metrics().metrics().losses, vec![loss]);
}

#[test]
fn test_repeated_optimization_reduces_loss() {
    let mut agent = agent(8);
    let batch = vec![transition(1.0, true), Transition::new(array![-0.5, 0.2], 0, array![0.0, 0.0], -1.0, true)];

    let first = agent.optimize(&batch).unwrap();
    let mut last = first;
    for _ in 0..500 {
        last = agent.optimize(&batch).unwrap();
    }
    assert!(last < first * 0.1, "loss went from {} to {}", first, last);
}

#[test]
fn test_optimize_empty_batch() {
    let mut agent = agent(9);
    assert!(matches!(
        agent.optimize(&[]),
        Err(DqnError::InsufficientSamples { requested: 1, available: 0 })
    ));
}

#[test]
fn test_optimize_rejects_non_finite_loss() {
    let mut agent = agent(10);
    let policy_before = agent.policy_network().parameters();
    let result = agent.optimize(&[transition(f32::NAN, true)]);

    assert!(matches!(result, Err(DqnError::Numerical(_))));
    assert_eq!(agent.policy_network().parameters(), policy_before);
    assert!(agent.metrics().metrics().losses.is_empty());
}

#[test]
fn test_sync_copies_policy_into_target() {
    let mut agent = agent(11);
    agent.optimize(&[transition(3.0, true)]).unwrap();
    assert_ne!(agent.policy_network().parameters(), agent.target_network().parameters());

    agent.sync_target_network().unwrap();
    assert_eq!(agent.policy_network().parameters(), agent.target_network().parameters());
    assert_eq!(agent.metrics().metrics().target_syncs, 1);
}

#[test]
fn test_episode_stores_transitions_and_syncs() {
    let mut agent = agent(12);
    let mut env = FixedLengthEnv::new(5);

    let summary = agent.run_episode(&mut env, true).unwrap();
    assert_eq!(summary.steps, 5);
    assert_eq!(agent.memory().len(), 5);
    assert!(summary.loss.is_some());
    assert!(summary.synced);
    assert_eq!(agent.step_count(), 0);
    assert_eq!(agent.policy_network().parameters(), agent.target_network().parameters());
}

#[test]
fn test_target_frozen_between_syncs() {
    let mut hyperparameters = test_hyperparameters();
    hyperparameters.network_sync_rate = 10;
    let mut agent = DqnAgent::new(hyperparameters, 2, 2, 13).unwrap();
    let initial_target = agent.target_network().parameters();
    let mut env = FixedLengthEnv::new(3);

    // 3 stored transitions: no full mini-batch yet.
    let first = agent.run_episode(&mut env, true).unwrap();
    assert!(first.loss.is_none());
    assert!(!first.synced);
    assert_eq!(agent.step_count(), 3);

    // 6 stored: the policy moves, the target does not.
    let second = agent.run_episode(&mut env, true).unwrap();
    assert!(second.loss.is_some());
    assert!(!second.synced);
    assert_eq!(agent.target_network().parameters(), initial_target);
    assert_ne!(agent.policy_network().parameters(), initial_target);

    let third = agent.run_episode(&mut env, true).unwrap();
    assert!(!third.synced);
    assert_eq!(agent.step_count(), 9);

    let fourth = agent.run_episode(&mut env, true).unwrap();
    assert!(fourth.synced);
    assert_eq!(agent.step_count(), 0);
    assert_eq!(agent.policy_network().parameters(), agent.target_network().parameters());
}

#[test]
fn test_evaluation_leaves_state_untouched() {
    let mut agent = agent(14);
    let mut env = FixedLengthEnv::new(3);
    agent.run(&mut env, true, Some(2)).unwrap();

    let memory_len = agent.memory().len();
    let epsilon = agent.epsilon();
    let step_count = agent.step_count();
    let policy = agent.policy_network().parameters();
    let target = agent.target_network().parameters();

    let summary = agent.run_episode(&mut env, false).unwrap();
    assert_eq!(summary.steps, 3);
    assert!(summary.loss.is_none());
    assert!(!summary.synced);
    assert_eq!(summary.epsilon, epsilon);
    assert_eq!(agent.memory().len(), memory_len);
    assert_eq!(agent.epsilon(), epsilon);
    assert_eq!(agent.step_count(), step_count);
    assert_eq!(agent.policy_network().parameters(), policy);
    assert_eq!(agent.target_network().parameters(), target);
}

#[test]
fn test_episode_reward_is_summed() {
    let mut agent = agent(15);
    let mut env = FixedLengthEnv::new(4);
    env.reward = 0.5;

    let summary = agent.run_episode(&mut env, true).unwrap();
    assert_eq!(summary.reward, 2.0);
    assert_eq!(agent.metrics().metrics().rewards_per_episode, vec![2.0]);
    assert_eq!(agent.metrics().metrics().episode_lengths, vec![4]);
}

#[test]
fn test_only_last_step_is_terminal() {
    let mut agent = agent(16);
    let mut env = FixedLengthEnv::new(3);
    agent.run_episode(&mut env, true).unwrap();

    let flags: Vec<bool> = agent.memory().iter().map(|t| t.terminated).collect();
    assert_eq!(flags, vec![false, false, true]);
}

#[test]
fn test_truncated_episode_is_not_terminal() {
    let mut agent = agent(17);
    let mut env = FixedLengthEnv::new(3);
    env.truncate = true;

    let summary = agent.run_episode(&mut env, true).unwrap();
    assert_eq!(summary.steps, 3);
    assert!(agent.memory().iter().all(|t| !t.terminated));
}

#[test]
fn test_stored_transitions_chain() {
    let mut agent = agent(18);
    let mut env = FixedLengthEnv::new(4);
    agent.run_episode(&mut env, true).unwrap();

    let stored: Vec<&Transition> = agent.memory().iter().collect();
    for pair in stored.windows(2) {
        assert_eq!(pair[0].next_state, pair[1].state);
    }
    let actions: Vec<usize> = stored.iter().map(|t| t.action).collect();
    assert_eq!(actions, env.actions);
    assert_eq!(stored[0].state, array![0.0f32, 1.0]);
}

#[test]
fn test_run_limits_episodes() {
    let mut agent = agent(19);
    let mut env = FixedLengthEnv::new(2);

    let summaries = agent.run(&mut env, true, Some(3)).unwrap();
    let indices: Vec<usize> = summaries.iter().map(|s| s.episode).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(env.resets, 3);
    assert_eq!(agent.episodes(), 3);

    assert!(agent.run(&mut env, true, Some(0)).unwrap().is_empty());
    assert_eq!(env.resets, 3);
}

#[test]
fn test_run_until_stops_on_condition() {
    let mut agent = agent(20);
    let mut env = FixedLengthEnv::new(2);

    agent.run_until(&mut env, true, |summary| summary.episode == 4).unwrap();
    assert_eq!(agent.episodes(), 5);
    assert_eq!(agent.metrics().episodes(), 5);
}

#[test]
fn test_environment_dimension_mismatch() {
    let mut agent = agent(21);
    let mut env = FixedLengthEnv::new(2);
    env.obs_dim = 3;

    assert!(matches!(
        agent.run_episode(&mut env, true),
        Err(DqnError::DimensionMismatch { expected: 2, actual: 3 })
    ));
}

#[test]
fn test_same_seed_same_run() {
    let mut a = agent(22);
    let mut b = agent(22);
    let mut env_a = FixedLengthEnv::new(3);
    let mut env_b = FixedLengthEnv::new(3);

    let summaries_a = a.run(&mut env_a, true, Some(5)).unwrap();
    let summaries_b = b.run(&mut env_b, true, Some(5)).unwrap();
    assert_eq!(summaries_a, summaries_b);
    assert_eq!(env_a.actions, env_b.actions);
    assert_eq!(a.policy_network().parameters(), b.policy_network().parameters());
}
