//! # Environment Interface
//!
//! The training loop talks to an environment only through [`Environment`]:
//! `reset`, `step`, and the two static space descriptions. Concrete
//! environments are built by name from an [`EnvRegistry`] that is handed to
//! whoever constructs the loop, so the loop never names a concrete type.

pub mod cartpole;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DqnError, Result};
use crate::types::{Action, State};

pub use cartpole::CartPole;

/// Free-form diagnostics returned alongside observations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Result of advancing the environment by one action.
#[derive(Debug, Clone)]
pub struct Step {
    pub observation: State,
    pub reward: f32,
    /// The episode reached a terminal state; its value is the reward alone.
    pub terminated: bool,
    /// The episode was cut short (e.g. a time limit); the state is not terminal.
    pub truncated: bool,
    pub info: StepInfo,
}

/// Shape of the observation vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationSpace {
    Box { dim: usize },
}

impl ObservationSpace {
    pub fn dim(&self) -> usize {
        match self {
            ObservationSpace::Box { dim } => *dim,
        }
    }
}

/// Set of admissible actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSpace {
    Discrete { n: usize },
}

impl ActionSpace {
    pub fn n(&self) -> usize {
        match self {
            ActionSpace::Discrete { n } => *n,
        }
    }

    /// Uniformly random action.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        rng.gen_range(0..self.n())
    }

    pub fn contains(&self, action: Action) -> bool {
        action < self.n()
    }
}

/// Capability required by the training loop.
pub trait Environment {
    fn observation_space(&self) -> ObservationSpace;

    fn action_space(&self) -> ActionSpace;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Result<(State, StepInfo)>;

    fn step(&mut self, action: Action) -> Result<Step>;
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn observation_space(&self) -> ObservationSpace {
        (**self).observation_space()
    }

    fn action_space(&self) -> ActionSpace {
        (**self).action_space()
    }

    fn reset(&mut self) -> Result<(State, StepInfo)> {
        (**self).reset()
    }

    fn step(&mut self, action: Action) -> Result<Step> {
        (**self).step(action)
    }
}

type EnvConstructor = Box<dyn Fn(u64) -> Result<Box<dyn Environment>>>;

/// Name → constructor table for environments.
///
/// Constructors receive the seed for the environment's own random state.
pub struct EnvRegistry {
    envs: BTreeMap<String, EnvConstructor>,
}

impl EnvRegistry {
    pub fn new() -> Self {
        EnvRegistry {
            envs: BTreeMap::new(),
        }
    }

    /// Registry with the built-in environments.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("CartPole-v1", |seed| Ok(Box::new(CartPole::new(seed)) as Box<dyn Environment>));
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(u64) -> Result<Box<dyn Environment>> + 'static,
    {
        self.envs.insert(name.into(), Box::new(constructor));
    }

    pub fn make(&self, name: &str, seed: u64) -> Result<Box<dyn Environment>> {
        self.envs
            .get(name)
            .ok_or_else(|| DqnError::UnknownEnvironment(name.to_string()))
            .and_then(|constructor| constructor(seed))
    }

    pub fn list(&self) -> Vec<String> {
        self.envs.keys().cloned().collect()
    }
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
