use serde::{Serialize, Deserialize};

/// Multiplicative epsilon decay with a floor.
///
/// Each call to [`EpsilonSchedule::decay`] sets `epsilon = max(epsilon * decay, min)`,
/// so the value never increases and never drops below `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    value: f32,
    decay: f32,
    min: f32,
}

impl EpsilonSchedule {
    pub fn new(init: f32, decay: f32, min: f32) -> Self {
        EpsilonSchedule {
            value: init,
            decay,
            min,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    /// Apply one decay step and return the new value.
    pub fn decay(&mut self) -> f32 {
        self.value = (self.value * self.decay).max(self.min);
        self.value
    }
}
