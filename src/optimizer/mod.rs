use ndarray::{Array1, Array2, Zip};
use serde::{Serialize, Deserialize};

/// Gradient-descent update rule applied layer by layer.
///
/// `layer` identifies which layer the parameters belong to so that stateful
/// optimizers can keep separate moment estimates per layer. After every layer
/// of a network has been updated, [`Optimizer::step_complete`] is called once.
pub trait Optimizer {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>);
    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>);
    fn step_complete(&mut self) {}
}

/// Plain stochastic gradient descent.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Sgd {
    pub learning_rate: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Self {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn update_weights(&mut self, _layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>) {
        let lr = self.learning_rate;
        weights.zip_mut_with(gradients, |w, &g| *w -= lr * g);
    }

    fn update_biases(&mut self, _layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>) {
        let lr = self.learning_rate;
        biases.zip_mut_with(gradients, |b, &g| *b -= lr * g);
    }
}

/// First and second moment estimates for one parameter tensor.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct Moments<A> {
    m: A,
    v: A,
}

/// Adam with bias-corrected first and second moment estimates.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// Number of the step currently being applied, starting at 1.
    pub t: u32,
    weight_moments: Vec<Option<Moments<Array2<f32>>>>,
    bias_moments: Vec<Option<Moments<Array1<f32>>>>,
}

impl Adam {
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 1,
            weight_moments: Vec::new(),
            bias_moments: Vec::new(),
        }
    }

    /// Adam with the usual defaults: `beta1 = 0.9`, `beta2 = 0.999`, `epsilon = 1e-8`.
    pub fn with_learning_rate(learning_rate: f32) -> Self {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }

    fn slot<A: Clone>(slots: &mut Vec<Option<Moments<A>>>, layer: usize, zeros: impl Fn() -> A) -> &mut Moments<A> {
        if slots.len() <= layer {
            slots.resize(layer + 1, None);
        }
        slots[layer].get_or_insert_with(|| Moments { m: zeros(), v: zeros() })
    }

    fn corrections(&self) -> (f32, f32) {
        let t = self.t as i32;
        (1.0 - self.beta1.powi(t), 1.0 - self.beta2.powi(t))
    }
}

impl Optimizer for Adam {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>) {
        let (beta1, beta2, eps, lr) = (self.beta1, self.beta2, self.epsilon, self.learning_rate);
        let (c1, c2) = self.corrections();
        let dim = weights.dim();
        let moments = Self::slot(&mut self.weight_moments, layer, || Array2::zeros(dim));

        moments.m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        moments.v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        Zip::from(weights)
            .and(&moments.m)
            .and(&moments.v)
            .for_each(|w, &m, &v| *w -= lr * (m / c1) / ((v / c2).sqrt() + eps));
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>) {
        let (beta1, beta2, eps, lr) = (self.beta1, self.beta2, self.epsilon, self.learning_rate);
        let (c1, c2) = self.corrections();
        let len = biases.len();
        let moments = Self::slot(&mut self.bias_moments, layer, || Array1::zeros(len));

        moments.m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        moments.v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        Zip::from(biases)
            .and(&moments.m)
            .and(&moments.v)
            .for_each(|b, &m, &v| *b -= lr * (m / c1) / ((v / c2).sqrt() + eps));
    }

    fn step_complete(&mut self) {
        self.t += 1;
    }
}
