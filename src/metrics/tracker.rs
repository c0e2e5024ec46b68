use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Per-episode history of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Total reward of every finished episode
    pub rewards_per_episode: Vec<f32>,

    /// Epsilon after each episode's decay
    pub epsilon_history: Vec<f32>,

    /// Steps taken in every episode
    pub episode_lengths: Vec<usize>,

    /// Loss of every optimization step
    pub losses: Vec<f32>,

    /// Number of target-network syncs
    pub target_syncs: usize,
}

/// Accumulates metrics while the agent runs
#[derive(Debug, Clone, Default)]
pub struct MetricsTracker {
    metrics: TrainingMetrics,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_episode(&mut self, reward: f32, length: usize) {
        self.metrics.rewards_per_episode.push(reward);
        self.metrics.episode_lengths.push(length);
    }

    pub fn record_epsilon(&mut self, epsilon: f32) {
        self.metrics.epsilon_history.push(epsilon);
    }

    pub fn record_loss(&mut self, loss: f32) {
        self.metrics.losses.push(loss);
    }

    pub fn record_target_sync(&mut self) {
        self.metrics.target_syncs += 1;
    }

    pub fn episodes(&self) -> usize {
        self.metrics.rewards_per_episode.len()
    }

    /// Mean reward over the last `n` episodes (fewer if not that many finished).
    pub fn mean_recent_reward(&self, n: usize) -> Option<f32> {
        let rewards = &self.metrics.rewards_per_episode;
        let window = n.min(rewards.len());
        if window == 0 {
            return None;
        }
        let recent = &rewards[rewards.len() - window..];
        Some(recent.iter().sum::<f32>() / window as f32)
    }

    pub fn best_reward(&self) -> Option<f32> {
        self.metrics
            .rewards_per_episode
            .iter()
            .copied()
            .fold(None, |best, r| Some(best.map_or(r, |b: f32| b.max(r))))
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Write the collected metrics as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.metrics)?;
        fs::write(path, json)?;
        Ok(())
    }
}
