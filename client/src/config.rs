use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use ann::Config;

use crate::args::NetworkArgs;

#[derive(Debug)]
pub enum LoadError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl From<io::Error> for LoadError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "could not read config file: {error}"),
            Self::Parse(error) => write!(f, "could not parse config file: {error}"),
        }
    }
}

impl Error for LoadError {}

/// Reads the configuration file, if any, and applies command-line overrides on top of it.
pub fn load_config(args: &NetworkArgs) -> Result<Config, LoadError> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)?;
            serde_json::from_reader(BufReader::new(file))?
        }
        None => Config::default(),
    };

    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }
    if let Some(max_steps) = args.max_steps {
        config.max_steps = max_steps;
    }
    if let Some(training_condition) = args.training_condition {
        config.training_condition = training_condition;
    }
    if let Some(activation) = args.activation {
        config.default_activation = activation;
    }
    if let Some(activation) = args.output_activation {
        config.output_activation = activation;
    }
    if let Some(cost_function) = args.cost_function {
        config.cost_function = cost_function;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }

    Ok(config)
}

/// Seeds from the given value, or picks and logs a random seed so the run can be repeated.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(seed, "Seeding random number generator.");
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use ann::{Activation, CostFunction};

    use super::*;
    use crate::args::{Args, Command};

    fn network_args(extra: &[&str]) -> NetworkArgs {
        let args = Args::try_parse_from(["feedforward", "describe"].iter().chain(extra)).unwrap();
        match args.command {
            Command::Describe(config) => config.network,
            Command::Train(_) => unreachable!(),
        }
    }

    #[test]
    fn defaults_without_file() {
        assert_eq!(load_config(&network_args(&[])).unwrap(), Config::default());
    }

    #[test]
    fn overrides_apply_over_file() {
        let path = std::env::temp_dir().join(format!("feedforward-config-{}.json", std::process::id()));
        let mut file = File::create(&path).unwrap();
        write!(
            file,
            r#"{{ "learning_rate": 0.5, "cost_function": "quadratic", "chunk_size": 12 }}"#
        )
        .unwrap();

        let path_arg = path.to_str().unwrap().to_owned();
        let config = load_config(&network_args(&[
            "--config",
            &path_arg,
            "--chunk-size",
            "4",
            "--output-activation",
            "identity",
        ]))
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.learning_rate, 0.5);
        assert_eq!(config.cost_function, CostFunction::Quadratic);
        assert_eq!(config.chunk_size, 4);
        assert_eq!(config.output_activation, Activation::Identity);
    }

    #[test]
    fn missing_file() {
        let result = load_config(&network_args(&["--config", "/nonexistent/feedforward.json"]));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        assert_eq!(
            seeded_rng(Some(3)).gen::<u64>(),
            seeded_rng(Some(3)).gen::<u64>()
        );
    }
}
