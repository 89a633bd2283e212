use std::error::Error;
use std::fmt;

use crate::linear_algebra::Value;

/// Problems with a network's configuration or layout, reported before any network exists.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    EmptyLayout,
    ZeroLayerSize { index: usize },
    InvalidLearningRate(Value),
    ZeroChunkSize,
    UnknownActivation(String),
    UnknownCostFunction(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLayout => write!(f, "no layout given for the network layers"),
            Self::ZeroLayerSize { index } => write!(f, "layer {index} has no units"),
            Self::InvalidLearningRate(rate) => {
                write!(f, "learning rate must be positive and finite, got {rate}")
            }
            Self::ZeroChunkSize => write!(f, "chunk size must be greater than zero"),
            Self::UnknownActivation(name) => write!(f, "unknown activation type: {name}"),
            Self::UnknownCostFunction(name) => write!(f, "unknown cost function: {name}"),
        }
    }
}

impl Error for ConfigError {}

/// Failures that end a training or evaluation pass.
#[derive(Debug, PartialEq)]
pub enum TrainingError<E> {
    Dataset(E),
    InputSize { expected: usize, found: usize },
    LabelOutOfRange { label: usize, outputs: usize },
    Diverged { iteration: usize },
}

impl<E: fmt::Display> fmt::Display for TrainingError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataset(error) => write!(f, "dataset error: {error}"),
            Self::InputSize { expected, found } => write!(
                f,
                "example has {found} features, but the network takes {expected} inputs",
            ),
            Self::LabelOutOfRange { label, outputs } => {
                write!(f, "label {label} is out of range for {outputs} outputs")
            }
            Self::Diverged { iteration } => {
                write!(f, "training cost became non-finite at iteration {iteration}")
            }
        }
    }
}

impl<E: Error + 'static> Error for TrainingError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dataset(error) => Some(error),
            _ => None,
        }
    }
}
