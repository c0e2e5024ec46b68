use ndarray::array;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{ActionSpace, Environment, ObservationSpace, Step, StepInfo};
use crate::error::{DqnError, Result};
use crate::types::{Action, State};

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const HALF_LENGTH: f32 = 0.5;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
const X_THRESHOLD: f32 = 2.4;
/// 12 degrees.
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;

/// Classic cart-pole balancing task.
///
/// Observation is `[x, x_dot, theta, theta_dot]`; action 0 pushes left and
/// action 1 pushes right. Every step yields reward 1.0. The episode terminates
/// when the cart leaves the track or the pole tips past 12 degrees, and is
/// truncated after `max_steps` steps.
pub struct CartPole {
    x: f32,
    x_dot: f32,
    theta: f32,
    theta_dot: f32,
    steps: usize,
    max_steps: usize,
    done: bool,
    rng: StdRng,
}

impl CartPole {
    pub const MAX_EPISODE_STEPS: usize = 500;

    pub fn new(seed: u64) -> Self {
        CartPole {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            steps: 0,
            max_steps: Self::MAX_EPISODE_STEPS,
            done: true,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    fn observation(&self) -> State {
        array![self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

impl Environment for CartPole {
    fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::Box { dim: 4 }
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete { n: 2 }
    }

    fn reset(&mut self) -> Result<(State, StepInfo)> {
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
        self.steps = 0;
        self.done = false;
        Ok((self.observation(), StepInfo::default()))
    }

    fn step(&mut self, action: Action) -> Result<Step> {
        if !self.action_space().contains(action) {
            return Err(DqnError::InvalidAction { action, num_actions: 2 });
        }
        if self.done {
            return Err(DqnError::Environment("step() called on a finished episode; call reset() first".to_string()));
        }

        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };
        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();
        let total_mass = MASS_CART + MASS_POLE;
        let pole_mass_length = MASS_POLE * HALF_LENGTH;

        let temp = (force + pole_mass_length * self.theta_dot * self.theta_dot * sin_theta) / total_mass;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (HALF_LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        self.x += TAU * self.x_dot;
        self.x_dot += TAU * x_acc;
        self.theta += TAU * self.theta_dot;
        self.theta_dot += TAU * theta_acc;
        self.steps += 1;

        let terminated = self.x.abs() > X_THRESHOLD || self.theta.abs() > THETA_THRESHOLD;
        let truncated = !terminated && self.steps >= self.max_steps;
        self.done = terminated || truncated;

        Ok(Step {
            observation: self.observation(),
            reward: 1.0,
            terminated,
            truncated,
            info: StepInfo::default(),
        })
    }
}
