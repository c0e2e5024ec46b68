use ndarray::Array1;
use serde::{Serialize, Deserialize};

/// Observation vector; its length is fixed by the environment's observation space.
pub type State = Array1<f32>;

/// Discrete action index in `[0, num_actions)`.
pub type Action = usize;

/// One environment interaction, stored verbatim in replay memory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub next_state: State,
    pub reward: f32,
    pub terminated: bool,
}

impl Transition {
    pub fn new(state: State, action: Action, next_state: State, reward: f32, terminated: bool) -> Self {
        Transition {
            state,
            action,
            next_state,
            reward,
            terminated,
        }
    }
}
