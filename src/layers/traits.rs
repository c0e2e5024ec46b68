use ndarray::{Array1, Array2, ArrayView2};

/// Trait defining the interface for value-network layers
pub trait Layer {
    /// Forward pass for a batch, caching what backpropagation needs
    fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32>;

    /// Forward pass for a batch without touching the cache
    fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32>;

    /// Backward pass for a batch of output errors.
    ///
    /// Returns `(adjusted_error, weight_gradients, bias_gradients)`, where the
    /// adjusted error is the incoming error multiplied by the activation derivative.
    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> (Array2<f32>, Array2<f32>, Array1<f32>);

    fn weights(&self) -> &Array2<f32>;

    fn biases(&self) -> &Array1<f32>;

    fn weights_mut(&mut self) -> &mut Array2<f32>;

    fn biases_mut(&mut self) -> &mut Array1<f32>;

    fn output_size(&self) -> usize;

    fn input_size(&self) -> usize;
}
