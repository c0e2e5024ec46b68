//! # qtrainer - Deep Q-Learning training loop
//!
//! qtrainer trains a discrete-action control policy with vanilla DQN: an
//! epsilon-greedy agent interacts with an environment, stores transitions in a
//! fixed-size replay memory, and regresses a small feed-forward value network
//! toward targets bootstrapped from a periodically synced target network.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qtrainer::agent::DqnAgent;
//! use qtrainer::config::Hyperparameters;
//! use qtrainer::environment::EnvRegistry;
//!
//! let hyperparameters = Hyperparameters::load("hyperparameters.toml", "cartpole1")?;
//! let mut env = EnvRegistry::with_defaults().make(&hyperparameters.env_id, 42)?;
//! let mut agent = DqnAgent::for_environment(hyperparameters, env.as_ref(), 42)?;
//! agent.run(&mut env, true, Some(500))?;
//! # Ok::<(), qtrainer::error::DqnError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - ReLU and linear activations
//! - [`agent`] - The DQN agent and its episode loop
//! - [`config`] - Named hyperparameter sets loaded from TOML
//! - [`environment`] - Environment interface, registry, and CartPole
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layer with backpropagation
//! - [`loss`] - Taken-action mean squared error
//! - [`metrics`] - Per-episode training history
//! - [`network`] - The action-value network
//! - [`optimizer`] - Adam and SGD
//! - [`replay_buffer`] - FIFO replay memory
//! - [`types`] - Transitions, states, and actions

pub mod activations;
pub mod agent;
pub mod config;
pub mod environment;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod types;

#[cfg(test)]
mod tests;
