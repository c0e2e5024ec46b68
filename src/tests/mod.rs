pub mod test_agent;

use ndarray::{array, Array1};

use crate::environment::{ActionSpace, Environment, ObservationSpace, Step, StepInfo};
use crate::error::Result;
use crate::types::{Action, State};

/// Deterministic environment with fixed-length episodes.
///
/// The observation is `[step / length, 1.0]`, every step pays `reward`, and
/// the last step either terminates or truncates the episode.
pub struct FixedLengthEnv {
    pub length: usize,
    pub reward: f32,
    pub truncate: bool,
    pub obs_dim: usize,
    pub resets: usize,
    pub actions: Vec<Action>,
    step: usize,
}

impl FixedLengthEnv {
    pub fn new(length: usize) -> Self {
        FixedLengthEnv {
            length,
            reward: 1.0,
            truncate: false,
            obs_dim: 2,
            resets: 0,
            actions: Vec::new(),
            step: 0,
        }
    }

    fn observation(&self) -> State {
        let mut obs = Array1::zeros(self.obs_dim);
        let base = array![self.step as f32 / self.length as f32, 1.0];
        for (dst, src) in obs.iter_mut().zip(base.iter()) {
            *dst = *src;
        }
        obs
    }
}

impl Environment for FixedLengthEnv {
    fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::Box { dim: 2 }
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete { n: 2 }
    }

    fn reset(&mut self) -> Result<(State, StepInfo)> {
        self.step = 0;
        self.resets += 1;
        Ok((self.observation(), StepInfo::default()))
    }

    fn step(&mut self, action: Action) -> Result<Step> {
        self.actions.push(action);
        self.step += 1;
        let last = self.step >= self.length;
        Ok(Step {
            observation: self.observation(),
            reward: self.reward,
            terminated: last && !self.truncate,
            truncated: last && self.truncate,
            info: StepInfo::default(),
        })
    }
}

pub fn test_hyperparameters() -> crate::config::Hyperparameters {
    crate::config::Hyperparameters {
        replay_memory_size: 100,
        mini_batch_size: 4,
        epsilon_init: 1.0,
        epsilon_decay: 0.9,
        epsilon_min: 0.05,
        network_sync_rate: 5,
        learning_rate: 0.01,
        discount_factor: 0.9,
        hidden_dim: 8,
        env_id: "CartPole-v1".to_string(),
        seed: None,
    }
}
