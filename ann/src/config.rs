use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::cost::CostFunction;
use crate::error::ConfigError;
use crate::linear_algebra::Value;

/// Training and topology settings, fixed once a network is built.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub learning_rate: Value,
    /// The maximum number of examples to train on.
    pub max_steps: usize,
    /// Training stops once a chunk's average cost falls to or below this value.
    pub training_condition: Value,
    /// The activation used by the input and hidden layers.
    pub default_activation: Activation,
    pub output_activation: Activation,
    pub cost_function: CostFunction,
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            max_steps: 60_000,
            training_condition: 0.01,
            default_activation: Activation::Sigmoid,
            output_activation: Activation::Sigmoid,
            cost_function: CostFunction::MeanSquared,
            chunk_size: 30,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }

        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn invalid_values() {
        let config = Config {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidLearningRate(0.0)));

        let config = Config {
            chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroChunkSize));
    }

    #[test]
    fn deserialize_partial() {
        let config: Config = serde_json::from_str(
            r#"{ "learning_rate": 0.05, "output_activation": "identity", "cost_function": "quadratic" }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            Config {
                learning_rate: 0.05,
                output_activation: Activation::Identity,
                cost_function: CostFunction::Quadratic,
                ..Default::default()
            },
        );

        assert!(serde_json::from_str::<Config>(r#"{ "cost_function": "hinge" }"#).is_err());
    }
}
