//! A small fully connected feedforward neural network, trained one example at a time with
//! plain gradient descent.

pub use self::activation::Activation;
pub use self::config::Config;
pub use self::cost::CostFunction;
pub use self::error::{ConfigError, TrainingError};
pub use self::layer::{Layer, Unit};
pub use self::network::Network;

pub mod cost;
pub mod linear_algebra;
pub mod training;

mod activation;
mod config;
mod error;
mod layer;
mod network;
