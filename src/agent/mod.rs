//! # DQN Agent Module
//!
//! The agent owns everything the training loop mutates: the policy and target
//! networks, the optimizer, the replay memory, the epsilon schedule and the
//! random generator. Environments are borrowed per call.
//!
//! ## Episode lifecycle
//!
//! 1. Reset the environment.
//! 2. Until the episode terminates or is truncated: pick an action
//!    (epsilon-greedy while training, greedy otherwise), step the environment,
//!    and while training store the transition and count the step.
//! 3. While training, at episode end: decay epsilon and, if the memory holds
//!    a full mini-batch, run one optimization step. After that step the policy
//!    parameters are copied into the target network once `network_sync_rate`
//!    steps were stored since the last sync. Before the first full mini-batch
//!    the step count keeps accumulating.
//!
//! ## Example
//!
//! ```rust,no_run
//! use qtrainer::agent::DqnAgent;
//! use qtrainer::config::Hyperparameters;
//! use qtrainer::environment::EnvRegistry;
//!
//! let hyperparameters = Hyperparameters::load("hyperparameters.toml", "cartpole1").unwrap();
//! let registry = EnvRegistry::with_defaults();
//! let mut env = registry.make(&hyperparameters.env_id, 7).unwrap();
//! let mut agent = DqnAgent::for_environment(hyperparameters, env.as_ref(), 7).unwrap();
//! agent.run(&mut env, true, Some(100)).unwrap();
//! ```

mod dqn;
mod exploration;

pub use dqn::{DqnAgent, EpisodeSummary};
pub use exploration::EpsilonSchedule;
