use std::process::ExitCode;
use std::time::Instant;

use tracing::{error, info};

use ann::training::{evaluate, train, Dataset};
use ann::Network;
use mnist::MnistDataset;

use crate::args::TrainConfig;
use crate::config::{load_config, seeded_rng};

pub fn run_training(config: TrainConfig) -> ExitCode {
    let network_config = match load_config(&config.network) {
        Ok(network_config) => network_config,
        Err(err) => {
            error!(error = %err, "Invalid configuration.");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = seeded_rng(config.network.seed);

    let mut network = match Network::new(network_config, &config.network.layout, &mut rng) {
        Ok(network) => network,
        Err(err) => {
            error!(error = %err, "Could not build network.");
            return ExitCode::FAILURE;
        }
    };

    let training_set = match MnistDataset::training_set(&config.data) {
        Ok(dataset) => limit(dataset, config.train_limit),
        Err(err) => {
            error!(error = %err, "Could not load the training set.");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();

    let report = match train(&mut network, &training_set, &mut rng) {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "Training failed.");
            return ExitCode::FAILURE;
        }
    };

    info!(
        seconds = start.elapsed().as_secs_f64(),
        examples = report.iterations,
        stop_reason = ?report.stop_reason,
        "Trained network.",
    );

    if config.skip_evaluation {
        return ExitCode::SUCCESS;
    }

    let test_set = match MnistDataset::test_set(&config.data) {
        Ok(dataset) => limit(dataset, config.test_limit),
        Err(err) => {
            error!(error = %err, "Could not load the test set.");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();

    let evaluation = match evaluate(&mut network, &test_set) {
        Ok(evaluation) => evaluation,
        Err(err) => {
            error!(error = %err, "Evaluation failed.");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "\nTested {} examples in {:.2} seconds\n",
        test_set.len(),
        start.elapsed().as_secs_f64(),
    );
    println!("{evaluation}");

    ExitCode::SUCCESS
}

fn limit(dataset: MnistDataset, count: Option<usize>) -> MnistDataset {
    match count {
        Some(count) => dataset.limit(count),
        None => dataset,
    }
}
