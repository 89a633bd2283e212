use std::fmt;

use rand::Rng;
use tracing::debug;

use crate::config::Config;
use crate::cost::CostFunction;
use crate::error::ConfigError;
use crate::layer::Layer;
use crate::linear_algebra::{Value, Vector};

/// A fully connected feedforward network: an input layer, any number of hidden layers, and
/// a square output layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    config: Config,
    cost_function: CostFunction,
    input_layer: Layer,
    hidden_layers: Vec<Layer>,
    output_layer: Layer,
}

impl Network {
    /// Builds a network from a layout of layer sizes.
    ///
    /// The input layer connects `layout[0]` units to `layout[1]` outputs, and each hidden
    /// layer `i` connects `layout[i + 1]` to `layout[i + 2]`. The output layer always has
    /// as many outputs as units, sized by the last layout value. A single-value layout gives
    /// a pass-through network whose input and output layers are both that size.
    pub fn new(config: Config, layout: &[usize], rng: &mut impl Rng) -> Result<Self, ConfigError> {
        config.validate()?;

        let (&first, &last) = match (layout.first(), layout.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ConfigError::EmptyLayout),
        };

        if let Some(index) = layout.iter().position(|&size| size == 0) {
            return Err(ConfigError::ZeroLayerSize { index });
        }

        let input_layer = if layout.len() == 1 {
            Layer::new(first, first, config.default_activation, rng)
        } else {
            Layer::new(first, layout[1], config.default_activation, rng)
        };

        let hidden_layers = layout
            .windows(2)
            .skip(1)
            .map(|sizes| Layer::new(sizes[0], sizes[1], config.default_activation, rng))
            .collect();

        let output_layer = Layer::new(last, last, config.output_activation, rng);

        debug!(?layout, cost_function = %config.cost_function, "Built network.");

        Ok(Self {
            cost_function: config.cost_function,
            config,
            input_layer,
            hidden_layers,
            output_layer,
        })
    }

    /// Feeds an input vector through every layer in order, returning the output layer's
    /// result.
    ///
    /// # Panics
    ///
    /// Panics if `input` does not have [`Network::input_size`] values.
    pub fn forward_feed(&mut self, input: &Vector) -> Vector {
        let mut values = self.input_layer.activate(input);
        for layer in &mut self.hidden_layers {
            values = layer.activate(&values);
        }
        self.output_layer.activate(&values)
    }

    /// Propagates the gradient of the cost with respect to the network's output back
    /// through every layer, updating weights and biases along the way.
    ///
    /// # Panics
    ///
    /// Panics if `gradient` does not have [`Network::output_size`] values.
    pub fn backpropagate(&mut self, gradient: &Vector) {
        let rate = self.config.learning_rate;

        let mut gradient = self.output_layer.step_back(rate, gradient);
        for layer in self.hidden_layers.iter_mut().rev() {
            gradient = layer.step_back(rate, &gradient);
        }
        self.input_layer.step_back(rate, &gradient);
    }

    /// Runs one forward and backward pass for a single example, returning the mean of the
    /// per-output cost before the update.
    pub fn train_example(&mut self, input: &Vector, expected: &Vector) -> Value {
        let output = self.forward_feed(input);
        let (cost, gradient) = self.cost_function.cost(&output, expected);
        self.backpropagate(&gradient);
        cost.mean()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cost_function(&self) -> CostFunction {
        self.cost_function
    }

    pub fn input_layer(&self) -> &Layer {
        &self.input_layer
    }

    pub fn hidden_layers(&self) -> &[Layer] {
        &self.hidden_layers
    }

    pub fn output_layer(&self) -> &Layer {
        &self.output_layer
    }

    pub fn output_layer_mut(&mut self) -> &mut Layer {
        &mut self.output_layer
    }

    /// Every layer, from input to output.
    pub fn layers(&self) -> impl DoubleEndedIterator<Item = &Layer> {
        std::iter::once(&self.input_layer)
            .chain(&self.hidden_layers)
            .chain(std::iter::once(&self.output_layer))
    }

    pub fn input_size(&self) -> usize {
        self.input_layer.size()
    }

    pub fn output_size(&self) -> usize {
        self.output_layer.next_size()
    }
}

fn write_values(f: &mut fmt::Formatter<'_>, values: &Vector) -> fmt::Result {
    for x in values {
        write!(f, "{x:1.4}, ")?;
    }
    writeln!(f)
}

/// Renders neuron counts and the most recent network input and output. The alternate form
/// (`{:#}`) also includes every layer's weights.
impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Neural Network:")?;
        writeln!(f, "Input Layer: {} neurons", self.input_size())?;
        writeln!(f, "Output Layer: {} neurons", self.output_size())?;
        writeln!(f, "Hidden Layers: {}", self.hidden_layers.len())?;

        let alternate = f.alternate();
        let section = |f: &mut fmt::Formatter<'_>, name: &str, layer: &Layer| {
            writeln!(f)?;
            writeln!(f, "{name}")?;
            if alternate {
                write!(f, "{layer:#}")
            } else {
                write!(f, "{layer}")
            }
        };

        section(f, "Input Layer", &self.input_layer)?;
        for (i, hidden) in self.hidden_layers.iter().enumerate() {
            section(f, &format!("Layer {i}"), hidden)?;
        }
        section(f, "Output Layer", &self.output_layer)?;

        writeln!(f)?;
        writeln!(f, "Network input [{} inputs]:", self.input_size())?;
        write_values(f, self.input_layer.inputs())?;

        let output = self
            .output_layer
            .weights()
            .mul_vector(self.output_layer.outputs());
        writeln!(f, "Network output:")?;
        write_values(f, &output)
    }
}
