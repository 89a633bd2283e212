use std::ops::Deref;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args as ArgsTrait, Parser, Subcommand};

use ann::{Activation, CostFunction};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Trains a network on the MNIST training set, then evaluates it on the test set.
    Train(TrainConfig),
    /// Builds a network and prints its structure.
    Describe(DescribeConfig),
}

#[derive(ArgsTrait, Clone, Debug)]
pub struct TrainConfig {
    #[command(flatten)]
    pub network: NetworkArgs,

    /// The directory holding the MNIST IDX files.
    #[arg(short, long, default_value = "mnist", verbatim_doc_comment)]
    pub data: PathBuf,

    /// Use at most this many training examples.
    #[arg(long)]
    pub train_limit: Option<usize>,

    /// Use at most this many test examples.
    #[arg(long)]
    pub test_limit: Option<usize>,

    /// Skip evaluating the trained network against the test set.
    #[arg(long)]
    pub skip_evaluation: bool,
}

#[derive(ArgsTrait, Clone, Debug)]
pub struct DescribeConfig {
    #[command(flatten)]
    pub network: NetworkArgs,

    /// Include every layer's weights and biases.
    #[arg(short, long)]
    pub weights: bool,
}

#[derive(ArgsTrait, Clone, Debug)]
pub struct NetworkArgs {
    /// Comma-separated layer sizes, from input to output.
    #[arg(short, long, default_value = "784,100,10")]
    pub layout: Layout,

    /// A JSON file of network settings. Any field may be omitted.
    ///
    /// Fields:
    ///   learning_rate=decimal      - The gradient descent step size.
    ///   max_steps=int              - The maximum number of examples to train on.
    ///   training_condition=decimal - Stop once a chunk's average cost is at or below this.
    ///   default_activation=string  - Input and hidden layer activation.
    ///                                (identity, sigmoid, tanh, relu, or leaky_relu)
    ///   output_activation=string   - Output layer activation.
    ///   cost_function=string       - (mean_squared, quadratic, or cross_entropy)
    ///   chunk_size=int             - The number of examples averaged per chunk.
    #[arg(short, long, verbatim_doc_comment)]
    pub config: Option<PathBuf>,

    /// Overrides the configured learning rate.
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Overrides the configured maximum number of training steps.
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Overrides the configured training condition.
    #[arg(long)]
    pub training_condition: Option<f64>,

    /// Overrides the configured input and hidden layer activation.
    #[arg(long)]
    pub activation: Option<Activation>,

    /// Overrides the configured output layer activation.
    #[arg(long)]
    pub output_activation: Option<Activation>,

    /// Overrides the configured cost function.
    #[arg(long)]
    pub cost_function: Option<CostFunction>,

    /// Overrides the configured chunk size.
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Seed for weight initialization and example shuffling. Random if not given.
    #[arg(short, long)]
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Layout(pub Vec<usize>);

impl Deref for Layout {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(|size| size.trim())
            .filter(|size| !size.is_empty())
            .map(|size| {
                size.parse::<usize>()
                    .map_err(|_| format!("invalid layer size: {size}"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Layout)
    }
}
