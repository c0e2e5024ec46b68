use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::{DenseLayer, Layer};
use crate::optimizer::Optimizer;

/// Default width of the hidden layer.
pub const DEFAULT_HIDDEN_DIM: usize = 256;

/// Weights and biases of a single layer, detached from any cached activations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerParameters {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// A full snapshot of a network's parameters, in layer order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkParameters {
    pub layers: Vec<LayerParameters>,
}

/// Gradients for every layer, in layer order: `(weight_gradients, bias_gradients)`.
pub type Gradients = Vec<(Array2<f32>, Array1<f32>)>;

/// Feed-forward action-value approximator.
///
/// One hidden layer with ReLU followed by a linear output layer, mapping a
/// state vector of length `num_states` to `num_actions` action-values.
///
/// Two entry points exist for evaluation:
/// - [`QNetwork::predict`] / [`QNetwork::predict_batch`] never touch the layer
///   caches and take `&self`; this is the frozen lookup used for targets.
/// - [`QNetwork::forward_batch`] caches inputs and pre-activations so that a
///   following [`QNetwork::backward_batch`] can compute gradients.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QNetwork {
    pub layers: Vec<DenseLayer>,
}

impl QNetwork {
    pub fn new<R: Rng + ?Sized>(num_states: usize, num_actions: usize, hidden_dim: usize, rng: &mut R) -> Self {
        let layers = vec![
            DenseLayer::new(num_states, hidden_dim, Activation::Relu, rng),
            DenseLayer::new(hidden_dim, num_actions, Activation::Linear, rng),
        ];
        QNetwork { layers }
    }

    /// Build a network from explicit layers, checking that their sizes chain.
    pub fn from_layers(layers: Vec<DenseLayer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(DqnError::config("layers", "network needs at least one layer"));
        }
        for pair in layers.windows(2) {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(DqnError::dimension_mismatch(pair[0].output_size(), pair[1].input_size()));
            }
        }
        Ok(QNetwork { layers })
    }

    pub fn num_states(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.input_size())
    }

    pub fn num_actions(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.output_size())
    }

    /// Action-values for a single state, without gradient bookkeeping.
    pub fn predict(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        let output = self.predict_batch(state.insert_axis(Axis(0)))?;
        Ok(output.index_axis_move(Axis(0), 0))
    }

    /// Action-values for a batch of states (one per row), without gradient bookkeeping.
    pub fn predict_batch(&self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(states.ncols())?;
        let mut current = states.to_owned();
        for layer in &self.layers {
            current = layer.predict_batch(current.view());
        }
        Ok(current)
    }

    /// Forward pass that records activations for a subsequent backward pass.
    pub fn forward_batch(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(states.ncols())?;
        let mut current = states.to_owned();
        for layer in &mut self.layers {
            current = layer.forward_batch(current.view());
        }
        Ok(current)
    }

    /// Backpropagate the gradient of the loss with respect to the network output.
    ///
    /// Must follow a call to [`QNetwork::forward_batch`] on the same batch.
    pub fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Gradients {
        let mut gradients: Gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer.backward_batch(current_error.view());
            gradients.push((weight_gradients, bias_gradients));
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        gradients
    }

    /// Apply one optimizer step with the given per-layer gradients.
    pub fn apply_gradients<O: Optimizer + ?Sized>(&mut self, optimizer: &mut O, gradients: &Gradients) {
        for (index, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            optimizer.update_weights(index, &mut layer.weights, weight_gradients);
            optimizer.update_biases(index, &mut layer.biases, bias_gradients);
        }
        optimizer.step_complete();
    }

    /// Copy of the current parameters.
    pub fn parameters(&self) -> NetworkParameters {
        NetworkParameters {
            layers: self.layers
                .iter()
                .map(|layer| LayerParameters {
                    weights: layer.weights().clone(),
                    biases: layer.biases().clone(),
                })
                .collect(),
        }
    }

    /// Overwrite all parameters with `parameters`. Shapes must match exactly.
    pub fn load_parameters(&mut self, parameters: &NetworkParameters) -> Result<()> {
        if parameters.layers.len() != self.layers.len() {
            return Err(DqnError::dimension_mismatch(self.layers.len(), parameters.layers.len()));
        }
        for (layer, source) in self.layers.iter().zip(&parameters.layers) {
            if layer.weights().dim() != source.weights.dim() {
                return Err(DqnError::dimension_mismatch(layer.weights().len(), source.weights.len()));
            }
            if layer.biases().dim() != source.biases.dim() {
                return Err(DqnError::dimension_mismatch(layer.biases().len(), source.biases.len()));
            }
        }
        for (layer, source) in self.layers.iter_mut().zip(&parameters.layers) {
            layer.weights_mut().assign(&source.weights);
            layer.biases_mut().assign(&source.biases);
        }
        Ok(())
    }

    fn check_input(&self, width: usize) -> Result<()> {
        let expected = self.num_states();
        if width != expected {
            return Err(DqnError::dimension_mismatch(expected, width));
        }
        Ok(())
    }
}

/// Index of the largest value; ties resolve to the first maximal index.
///
/// NaN entries never win against a finite value. Returns `None` for an empty slice.
pub fn argmax(values: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in values.iter().enumerate() {
        match best {
            None => best = Some((index, value)),
            Some((_, current)) if value > current || (current.is_nan() && !value.is_nan()) => {
                best = Some((index, value));
            }
            _ => {}
        }
    }
    best.map(|(index, _)| index)
}
