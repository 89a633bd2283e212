use std::process::ExitCode;

use tracing::error;

use ann::Network;

use crate::args::DescribeConfig;
use crate::config::{load_config, seeded_rng};

pub fn run_describe(config: DescribeConfig) -> ExitCode {
    let network_config = match load_config(&config.network) {
        Ok(network_config) => network_config,
        Err(err) => {
            error!(error = %err, "Invalid configuration.");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = seeded_rng(config.network.seed);

    let network = match Network::new(network_config, &config.network.layout, &mut rng) {
        Ok(network) => network,
        Err(err) => {
            error!(error = %err, "Could not build network.");
            return ExitCode::FAILURE;
        }
    };

    if config.weights {
        println!("{network:#}");
    } else {
        println!("{network}");
    }

    ExitCode::SUCCESS
}
