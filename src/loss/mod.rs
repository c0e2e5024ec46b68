//! Loss over the action-values of the actions actually taken.
//!
//! For a batch of network outputs `Q` (one row per transition), the taken
//! actions `a` and scalar targets `y`, the loss is
//!
//! ```text
//! L = 1/B * sum_i (Q[i, a_i] - y_i)^2
//! ```
//!
//! Only the taken action contributes; every other output has zero gradient.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{DqnError, Result};

/// Mean squared error between the taken-action values and their targets.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mse;

impl Mse {
    /// Pick `Q[i, a_i]` for every row.
    pub fn gather(&self, outputs: ArrayView2<f32>, actions: &[usize]) -> Result<Array1<f32>> {
        check_batch(outputs, actions)?;
        Ok(actions
            .iter()
            .enumerate()
            .map(|(row, &action)| outputs[[row, action]])
            .collect())
    }

    pub fn compute(&self, outputs: ArrayView2<f32>, actions: &[usize], targets: ArrayView1<f32>) -> Result<f32> {
        let predicted = self.gather(outputs, actions)?;
        if predicted.len() != targets.len() {
            return Err(DqnError::dimension_mismatch(predicted.len(), targets.len()));
        }
        if predicted.is_empty() {
            return Ok(0.0);
        }
        let diff = &predicted - &targets;
        Ok(diff.mapv(|x| x * x).sum() / predicted.len() as f32)
    }

    /// Gradient of the loss with respect to the full output matrix.
    pub fn gradient(&self, outputs: ArrayView2<f32>, actions: &[usize], targets: ArrayView1<f32>) -> Result<Array2<f32>> {
        check_batch(outputs, actions)?;
        if actions.len() != targets.len() {
            return Err(DqnError::dimension_mismatch(actions.len(), targets.len()));
        }
        let batch_size = actions.len().max(1) as f32;
        let mut gradient = Array2::zeros(outputs.dim());
        for (row, (&action, &target)) in actions.iter().zip(targets.iter()).enumerate() {
            gradient[[row, action]] = 2.0 * (outputs[[row, action]] - target) / batch_size;
        }
        Ok(gradient)
    }
}

fn check_batch(outputs: ArrayView2<f32>, actions: &[usize]) -> Result<()> {
    if outputs.nrows() != actions.len() {
        return Err(DqnError::dimension_mismatch(outputs.nrows(), actions.len()));
    }
    let num_actions = outputs.ncols();
    if let Some(&action) = actions.iter().find(|&&action| action >= num_actions) {
        return Err(DqnError::InvalidAction { action, num_actions });
    }
    Ok(())
}
