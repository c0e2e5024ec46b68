//! Hyperparameter sets.
//!
//! A configuration file holds any number of named sets, one TOML table each:
//!
//! ```toml
//! [cartpole1]
//! env_id = "CartPole-v1"
//! replay_memory_size = 100000
//! mini_batch_size = 32
//! epsilon_init = 1.0
//! epsilon_decay = 0.9995
//! epsilon_min = 0.05
//! network_sync_rate = 10
//! learning_rate_a = 0.001
//! discount_factor_g = 0.99
//! ```
//!
//! A set is selected by name and validated once, before the agent is built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{DqnError, Result};
use crate::network::DEFAULT_HIDDEN_DIM;

fn default_hidden_dim() -> usize {
    DEFAULT_HIDDEN_DIM
}

fn default_env_id() -> String {
    "CartPole-v1".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hyperparameters {
    pub replay_memory_size: usize,
    pub mini_batch_size: usize,
    pub epsilon_init: f32,
    pub epsilon_decay: f32,
    pub epsilon_min: f32,
    /// Stored transitions between target-network syncs.
    pub network_sync_rate: usize,
    #[serde(rename = "learning_rate_a")]
    pub learning_rate: f32,
    #[serde(rename = "discount_factor_g")]
    pub discount_factor: f32,

    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: usize,
    #[serde(default = "default_env_id")]
    pub env_id: String,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Hyperparameters {
    /// Read `path` and return the validated set named `set_name`.
    pub fn load<P: AsRef<Path>>(path: P, set_name: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content, set_name)
    }

    pub fn from_toml_str(content: &str, set_name: &str) -> Result<Self> {
        let mut sets: BTreeMap<String, toml::Value> = toml::from_str(content)?;
        let raw = sets
            .remove(set_name)
            .ok_or_else(|| DqnError::UnknownHyperparameterSet(set_name.to_string()))?;
        let hyperparameters = raw
            .try_into::<Hyperparameters>()
            .map_err(|e| DqnError::config(set_name, e.to_string()))?;
        hyperparameters.validate()?;
        Ok(hyperparameters)
    }

    /// Names of all sets in a configuration file, sorted.
    pub fn set_names(content: &str) -> Result<Vec<String>> {
        let sets: BTreeMap<String, toml::Value> = toml::from_str(content)?;
        Ok(sets.into_keys().collect())
    }

    pub fn validate(&self) -> Result<()> {
        if self.replay_memory_size == 0 {
            return Err(DqnError::config("replay_memory_size", "must be greater than 0"));
        }
        if self.mini_batch_size == 0 {
            return Err(DqnError::config("mini_batch_size", "must be greater than 0"));
        }
        if self.mini_batch_size > self.replay_memory_size {
            return Err(DqnError::config(
                "mini_batch_size",
                format!("{} exceeds replay_memory_size {}", self.mini_batch_size, self.replay_memory_size),
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon_init) {
            return Err(DqnError::config("epsilon_init", format!("{} is outside [0, 1]", self.epsilon_init)));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay < 1.0) {
            return Err(DqnError::config("epsilon_decay", format!("{} is outside (0, 1)", self.epsilon_decay)));
        }
        if !(self.epsilon_min >= 0.0 && self.epsilon_min <= self.epsilon_init) {
            return Err(DqnError::config(
                "epsilon_min",
                format!("{} is outside [0, epsilon_init = {}]", self.epsilon_min, self.epsilon_init),
            ));
        }
        if self.network_sync_rate == 0 {
            return Err(DqnError::config("network_sync_rate", "must be greater than 0"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(DqnError::config("learning_rate_a", format!("{} must be a positive number", self.learning_rate)));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(DqnError::config("discount_factor_g", format!("{} is outside [0, 1]", self.discount_factor)));
        }
        if self.hidden_dim == 0 {
            return Err(DqnError::config("hidden_dim", "must be greater than 0"));
        }
        Ok(())
    }
}
