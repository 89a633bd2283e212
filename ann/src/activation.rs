use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::linear_algebra::Value;

const LEAKY_RELU_SLOPE: Value = 0.01;

/// The closed set of activation functions a unit can fire through.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Identity,
    #[default]
    Sigmoid,
    Tanh,
    Relu,
    LeakyRelu,
}

impl Activation {
    pub fn f(self, x: Value) -> Value {
        match self {
            Self::Identity => x,
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Tanh => x.tanh(),
            Self::Relu => x.max(0.0),
            Self::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_RELU_SLOPE * x
                }
            }
        }
    }

    /// The derivative of `f`, evaluated at the pre-activation value `x`.
    pub fn fprime(self, x: Value) -> Value {
        match self {
            Self::Identity => 1.0,
            Self::Sigmoid => {
                let s = self.f(x);
                s * (1.0 - s)
            }
            Self::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            Self::Relu => match x > 0.0 {
                true => 1.0,
                false => 0.0,
            },
            Self::LeakyRelu => match x > 0.0 {
                true => 1.0,
                false => LEAKY_RELU_SLOPE,
            },
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
            Self::Relu => "relu",
            Self::LeakyRelu => "leaky_relu",
        }
    }
}

impl FromStr for Activation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" => Ok(Self::Identity),
            "sigmoid" => Ok(Self::Sigmoid),
            "tanh" => Ok(Self::Tanh),
            "relu" => Ok(Self::Relu),
            "leaky_relu" => Ok(Self::LeakyRelu),
            unknown => Err(ConfigError::UnknownActivation(unknown.to_owned())),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
