use std::fmt;

use rand::Rng;

use crate::activation::Activation;
use crate::linear_algebra::{Matrix, Value, Vector};

/// A single neuron: an activation function applied to its input plus a bias.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit {
    pub activation: Activation,
    pub bias: Value,
}

impl Unit {
    pub fn new(activation: Activation) -> Self {
        Self {
            activation,
            bias: 0.0,
        }
    }

    pub fn fire(&self, x: Value) -> Value {
        self.activation.f(x + self.bias)
    }
}

/// A group of units plus the weights connecting their outputs to the next layer.
///
/// Row `j` of the weight matrix holds this layer's influence on unit `j` of the next layer,
/// so the matrix is `next_size × size`. The most recent inputs and unit outputs are kept so
/// that [`Layer::step_back`] can compute gradients for the same example.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    units: Vec<Unit>,
    weights: Matrix,
    inputs: Vector,
    outputs: Vector,
}

impl Layer {
    /// Builds a layer of `nsize` units feeding `wsize` outputs, with weights drawn uniformly
    /// from `[0, 1)`.
    ///
    /// # Panics
    ///
    /// Panics if either size is zero.
    pub fn new(nsize: usize, wsize: usize, activation: Activation, rng: &mut impl Rng) -> Self {
        assert!(nsize > 0 && wsize > 0, "layer sizes must be non-zero");

        Self {
            units: vec![Unit::new(activation); nsize],
            weights: Matrix::from_fn(wsize, nsize, |_, _| rng.gen::<Value>()),
            inputs: Vector::zeros(nsize),
            outputs: Vector::zeros(nsize),
        }
    }

    /// Fires every unit on its input and returns the weighted sums for the next layer.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` does not have one value per unit.
    pub fn activate(&mut self, inputs: &Vector) -> Vector {
        assert_eq!(
            inputs.len(),
            self.size(),
            "layer expects one input per unit",
        );

        self.inputs.copy_from_slice(inputs);
        for ((output, unit), &x) in self.outputs.iter_mut().zip(&self.units).zip(inputs.iter()) {
            *output = unit.fire(x);
        }

        self.weights.mul_vector(&self.outputs)
    }

    /// Applies one gradient descent step using the gradient of the cost with respect to this
    /// layer's outputs, and returns the gradient with respect to this layer's inputs.
    ///
    /// Must follow an [`Layer::activate`] call for the same example; the cached values from
    /// that call are used for the update.
    ///
    /// # Panics
    ///
    /// Panics if `gradient` does not have one value per output.
    pub fn step_back(&mut self, rate: Value, gradient: &Vector) -> Vector {
        assert_eq!(
            gradient.len(),
            self.next_size(),
            "gradient must have one value per layer output",
        );

        // Gradient through the weights, taken before they are updated.
        let mut deltas = self.weights.transpose_mul_vector(gradient);

        for ((delta, unit), &x) in deltas.iter_mut().zip(&self.units).zip(self.inputs.iter()) {
            *delta *= unit.activation.fprime(x + unit.bias);
        }

        self.weights.sub_scaled_outer(rate, gradient, &self.outputs);

        for (unit, &delta) in self.units.iter_mut().zip(deltas.iter()) {
            unit.bias -= rate * delta;
        }

        deltas
    }

    /// The number of units in this layer.
    pub fn size(&self) -> usize {
        self.units.len()
    }

    /// The number of outputs this layer feeds.
    pub fn next_size(&self) -> usize {
        self.weights.rows()
    }

    pub fn activation(&self) -> Activation {
        self.units[0].activation
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [Unit] {
        &mut self.units
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut Matrix {
        &mut self.weights
    }

    /// The inputs from the most recent activation.
    pub fn inputs(&self) -> &Vector {
        &self.inputs
    }

    /// The unit outputs from the most recent activation.
    pub fn outputs(&self) -> &Vector {
        &self.outputs
    }
}

/// The alternate form (`{:#}`) includes the weight matrix.
impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} neurons ({}) -> {} outputs",
            self.size(),
            self.activation(),
            self.next_size(),
        )?;

        if f.alternate() {
            writeln!(f, "Biases: {:?}", self.units.iter().map(|u| u.bias).collect::<Vector>())?;
            writeln!(f, "Weights: {:?}", self.weights)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer(nsize: usize, wsize: usize, activation: Activation) -> Layer {
        Layer::new(nsize, wsize, activation, &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn construction_shape() {
        let layer = layer(4, 3, Activation::Sigmoid);

        assert_eq!(layer.size(), 4);
        assert_eq!(layer.next_size(), 3);
        assert_eq!((layer.weights().rows(), layer.weights().columns()), (3, 4));
        assert!(layer.weights().values().all(|w| (0.0..1.0).contains(w)));
        assert!(layer.units().iter().all(|u| u.bias == 0.0));
    }

    #[test]
    fn seeded_construction_is_reproducible() {
        assert_eq!(layer(5, 2, Activation::Tanh), layer(5, 2, Activation::Tanh));
    }

    #[test]
    fn unit_fires_with_bias() {
        let unit = Unit {
            activation: Activation::Identity,
            bias: 0.25,
        };
        assert_eq!(unit.fire(1.0), 1.25);
        assert_eq!(Unit::new(Activation::Relu).fire(-3.0), 0.0);
    }

    #[test]
    fn activate_is_weighted_sum_of_unit_outputs() {
        let mut layer = layer(2, 3, Activation::Identity);
        *layer.weights_mut() = Matrix::from([[1.0, 0.0], [0.5, 0.5], [2.0, -1.0]]);

        let output = layer.activate(&Vector::from([2.0, 4.0]));

        assert_eq!(output, Vector::from([2.0, 3.0, 0.0]));
        assert_eq!(layer.inputs(), &Vector::from([2.0, 4.0]));
        assert_eq!(layer.outputs(), &Vector::from([2.0, 4.0]));
    }

    #[test]
    fn activate_is_deterministic() {
        let mut layer = layer(3, 4, Activation::Sigmoid);
        let inputs = Vector::from([0.3, -1.2, 2.0]);

        let first = layer.activate(&inputs);
        layer.activate(&Vector::from([9.0, 9.0, 9.0]));
        let second = layer.activate(&inputs);

        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[test]
    #[should_panic(expected = "one input per unit")]
    fn activate_rejects_wrong_length() {
        layer(3, 2, Activation::Sigmoid).activate(&Vector::zeros(2));
    }

    #[test]
    fn step_back_returns_input_gradient() {
        let gradient = Vector::from([0.7, -0.4]);
        let inputs = Vector::from([0.2, -0.5, 1.1]);

        for activation in [Activation::Sigmoid, Activation::Tanh, Activation::Identity] {
            let mut layer = layer(3, 2, activation);
            layer.units_mut()[1].bias = 0.3;

            // d(gradient · activate(x)) / dx, with the weights held fixed.
            let h = 1e-6;
            let numeric: Vec<Value> = (0..inputs.len())
                .map(|i| {
                    let mut probe = layer.clone();
                    let mut plus = inputs.clone();
                    plus[i] += h;
                    let mut minus = inputs.clone();
                    minus[i] -= h;
                    (gradient.dot(&probe.activate(&plus)) - gradient.dot(&probe.activate(&minus)))
                        / (2.0 * h)
                })
                .collect();

            layer.activate(&inputs);
            let analytic = layer.step_back(0.1, &gradient);

            for (n, a) in numeric.iter().zip(analytic.iter()) {
                assert!((n - a).abs() < 1e-6, "{activation}: {n} vs {a}");
            }
        }
    }

    #[test]
    fn step_back_updates_weights_and_biases() {
        let mut layer = layer(2, 1, Activation::Identity);
        *layer.weights_mut() = Matrix::from([[1.0, 2.0]]);

        layer.activate(&Vector::from([3.0, 4.0]));
        let returned = layer.step_back(0.5, &Vector::from([1.0]));

        assert_eq!(layer.weights(), &Matrix::from([[-0.5, 0.0]]));
        assert_eq!(returned, Vector::from([1.0, 2.0]));
        assert_eq!(layer.units()[0].bias, -0.5);
        assert_eq!(layer.units()[1].bias, -1.0);
    }

    #[test]
    fn zero_gradient_changes_nothing() {
        let mut layer = layer(3, 2, Activation::Sigmoid);
        layer.activate(&Vector::from([0.5, 1.5, -2.0]));
        let before = layer.clone();

        let returned = layer.step_back(0.3, &Vector::zeros(2));

        assert_eq!(layer, before);
        assert!(returned.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn display() {
        let layer = layer(3, 2, Activation::Relu);
        assert_eq!(layer.to_string(), "3 neurons (relu) -> 2 outputs\n");
        assert!(format!("{layer:#}").contains("Weights:"));
    }
}
