use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::linear_algebra::{Value, Vector};

const CROSS_ENTROPY_EPSILON: Value = 1e-7;

/// Strategies for scoring a network's output against the expected output.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostFunction {
    #[default]
    MeanSquared,
    Quadratic,
    CrossEntropy,
}

impl CostFunction {
    /// Returns the per-output cost and its derivative with respect to each actual output.
    pub fn cost(self, actual: &Vector, expected: &Vector) -> (Vector, Vector) {
        assert_eq!(
            actual.len(),
            expected.len(),
            "actual and expected outputs must be the same length",
        );

        match self {
            Self::MeanSquared => (mse(actual, expected), mse_prime(actual, expected)),
            Self::Quadratic => {
                let error = actual - expected;
                (&error * &error * 0.5, error)
            }
            Self::CrossEntropy => {
                let clamped: Vector = actual
                    .iter()
                    .map(|&a| a.clamp(CROSS_ENTROPY_EPSILON, 1.0 - CROSS_ENTROPY_EPSILON))
                    .collect();

                let cost = clamped
                    .iter()
                    .zip(expected.iter())
                    .map(|(a, e)| -(e * a.ln() + (1.0 - e) * (1.0 - a).ln()))
                    .collect();

                let prime = clamped
                    .iter()
                    .zip(expected.iter())
                    .map(|(a, e)| (a - e) / (a * (1.0 - a)))
                    .collect();

                (cost, prime)
            }
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::MeanSquared => "mean_squared",
            Self::Quadratic => "quadratic",
            Self::CrossEntropy => "cross_entropy",
        }
    }
}

/// Calculates the squared error of each output.
pub fn mse(actual: &Vector, expected: &Vector) -> Vector {
    let error = actual - expected;
    &error * &error
}

/// Calculates the derivative of the squared error of each output.
pub fn mse_prime(actual: &Vector, expected: &Vector) -> Vector {
    (actual - expected) * 2.0
}

impl FromStr for CostFunction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean_squared" => Ok(Self::MeanSquared),
            "quadratic" => Ok(Self::Quadratic),
            "cross_entropy" => Ok(Self::CrossEntropy),
            unknown => Err(ConfigError::UnknownCostFunction(unknown.to_owned())),
        }
    }
}

impl fmt::Display for CostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
