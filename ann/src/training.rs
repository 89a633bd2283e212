//! Chunked, shuffled training over a labeled image dataset, and accuracy evaluation.

use std::convert::Infallible;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, trace, warn};

use crate::error::TrainingError;
use crate::linear_algebra::{Value, Vector};
use crate::network::Network;

/// Raw pixel values are divided by this before being fed to a network.
pub const INPUT_SCALE: Value = 100.0;

const TRAINING_PROGRESS_INTERVAL: usize = 10_000;
const EVALUATION_PROGRESS_INTERVAL: usize = 1_000;

/// A two-dimensional grid of raw pixel intensities, stored row by row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Image {
    rows: usize,
    columns: usize,
    pixels: Vec<u8>,
}

impl Image {
    /// # Panics
    ///
    /// Panics if `pixels` does not hold exactly `rows * columns` values.
    pub fn new(rows: usize, columns: usize, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), rows * columns, "pixel count must match image shape");
        Self {
            rows,
            columns,
            pixels,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn get(&self, row: usize, column: usize) -> u8 {
        self.pixels[row * self.columns + column]
    }

    /// Flattens the image into a network input, scaled by [`INPUT_SCALE`].
    pub fn normalize(&self) -> Vector {
        self.pixels
            .iter()
            .map(|&p| Value::from(p) / INPUT_SCALE)
            .collect()
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHADES: &[u8] = b" .:-=+*#%@";

        for row in self.pixels.chunks(self.columns.max(1)) {
            for &p in row {
                let shade = SHADES[p as usize * SHADES.len() / 256];
                write!(f, "{}", shade as char)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Example {
    pub image: Image,
    pub label: usize,
}

/// Indexed, read-only access to labeled examples.
pub trait Dataset {
    type Error;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn example(&self, index: usize) -> Result<Example, Self::Error>;
}

impl Dataset for Vec<Example> {
    type Error = Infallible;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn example(&self, index: usize) -> Result<Example, Self::Error> {
        Ok(self[index].clone())
    }
}

/// Builds a vector of `size` zeros with a one at `label`.
///
/// # Panics
///
/// Panics if `label` is not less than `size`.
pub fn one_hot(label: usize, size: usize) -> Vector {
    assert!(label < size, "label {label} out of range for size {size}");
    let mut expected = Vector::zeros(size);
    expected[label] = 1.0;
    expected
}

/// Picks the index of the strongest output, along with its value.
pub fn decide(output: &Vector) -> (usize, Value) {
    output.argmax().unwrap_or((0, 0.0))
}

/// A shuffled permutation of example indices, consumed in fixed-size chunks.
#[derive(Clone, Debug)]
pub struct ExampleOrder {
    indices: Vec<usize>,
    chunk_size: usize,
}

impl ExampleOrder {
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn shuffled(count: usize, chunk_size: usize, rng: &mut impl Rng) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");

        let mut indices: Vec<usize> = (0..count).collect();
        indices.shuffle(rng);

        Self {
            indices,
            chunk_size,
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Iterates over the chunks in order. The final chunk is shorter when the example count
    /// isn't a multiple of the chunk size.
    pub fn chunks(&self) -> std::slice::Chunks<'_, usize> {
        self.indices.chunks(self.chunk_size)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopReason {
    /// Every example was trained on.
    Exhausted,
    /// The configured maximum number of training steps was reached.
    MaxSteps,
    /// A chunk's average cost fell to or below the training condition.
    Converged,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingReport {
    /// The number of examples trained on.
    pub iterations: usize,
    pub chunks: usize,
    /// The average cost of the last completed chunk.
    pub average_cost: Option<Value>,
    pub stop_reason: StopReason,
}

/// Trains `network` on `dataset` in shuffled chunks until the examples run out, the step
/// limit is reached, or a chunk's average cost meets the training condition. The stopping
/// conditions are only checked between chunks.
pub fn train<D: Dataset>(
    network: &mut Network,
    dataset: &D,
    rng: &mut impl Rng,
) -> Result<TrainingReport, TrainingError<D::Error>> {
    let config = network.config().clone();
    let order = ExampleOrder::shuffled(dataset.len(), config.chunk_size, rng);

    info!(
        examples = dataset.len(),
        chunk_size = config.chunk_size,
        max_steps = config.max_steps,
        "Training...",
    );

    let mut chunks = order.chunks();
    let mut iteration = 0;
    let mut chunk_count = 0;
    let mut average_cost = None;

    let stop_reason = loop {
        if matches!(average_cost, Some(cost) if cost <= config.training_condition) {
            break StopReason::Converged;
        }

        if iteration >= config.max_steps {
            break StopReason::MaxSteps;
        }

        let Some(chunk) = chunks.next() else {
            break StopReason::Exhausted;
        };

        let mut cost_sum = 0.0;

        for &index in chunk {
            if iteration % TRAINING_PROGRESS_INTERVAL == 0 {
                info!(iteration, "Training examples...");
            }

            let example = dataset.example(index).map_err(TrainingError::Dataset)?;
            let (input, expected) = prepare_example::<D::Error>(network, &example)?;

            cost_sum += network.train_example(&input, &expected);
            iteration += 1;
        }

        let chunk_cost = cost_sum / chunk.len() as Value;
        if !chunk_cost.is_finite() {
            warn!(iteration, cost = chunk_cost, "Training diverged.");
            return Err(TrainingError::Diverged { iteration });
        }

        chunk_count += 1;
        average_cost = Some(chunk_cost);

        debug!(chunk = chunk_count, iteration, average_cost = chunk_cost, "Finished chunk.");
        trace!("\n{network}");
    };

    info!(iteration, chunks = chunk_count, ?average_cost, ?stop_reason, "Training finished.");

    Ok(TrainingReport {
        iterations: iteration,
        chunks: chunk_count,
        average_cost,
        stop_reason,
    })
}

fn prepare_example<E>(
    network: &Network,
    example: &Example,
) -> Result<(Vector, Vector), TrainingError<E>> {
    check_input_size::<E>(network, example)?;

    let outputs = network.output_size();
    if example.label >= outputs {
        return Err(TrainingError::LabelOutOfRange {
            label: example.label,
            outputs,
        });
    }

    Ok((example.image.normalize(), one_hot(example.label, outputs)))
}

fn check_input_size<E>(network: &Network, example: &Example) -> Result<(), TrainingError<E>> {
    let found = example.image.pixels().len();
    let expected = network.input_size();
    if found != expected {
        return Err(TrainingError::InputSize { expected, found });
    }
    Ok(())
}

/// Prediction statistics gathered over a dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluation {
    pub correct: usize,
    pub incorrect: usize,
    /// The sum of the chosen output's value over every prediction.
    pub confidence_sum: Value,
}

impl Evaluation {
    pub fn record(&mut self, correct: bool, confidence: Value) {
        match correct {
            true => self.correct += 1,
            false => self.incorrect += 1,
        }
        self.confidence_sum += confidence;
    }

    pub fn total(&self) -> usize {
        self.correct + self.incorrect
    }

    /// The fraction of correct predictions, or zero if nothing was evaluated.
    pub fn accuracy(&self) -> Value {
        match self.total() {
            0 => 0.0,
            total => self.correct as Value / total as Value,
        }
    }

    pub fn mean_confidence(&self) -> Value {
        match self.total() {
            0 => 0.0,
            total => self.confidence_sum / total as Value,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tested Correct: {}", self.correct)?;
        writeln!(f, "Tested Incorrect: {}", self.incorrect)?;
        writeln!(f, "Percent Correct: {:2.2}", self.accuracy() * 100.0)?;
        write!(f, "Average Certainty: {:1.2}", self.mean_confidence())
    }
}

/// Runs every example in `dataset` through `network` without training, comparing the
/// strongest output against each label.
pub fn evaluate<D: Dataset>(
    network: &mut Network,
    dataset: &D,
) -> Result<Evaluation, TrainingError<D::Error>> {
    let mut evaluation = Evaluation::default();

    for index in 0..dataset.len() {
        let example = dataset.example(index).map_err(TrainingError::Dataset)?;
        check_input_size::<D::Error>(network, &example)?;

        let output = network.forward_feed(&example.image.normalize());
        let (prediction, confidence) = decide(&output);
        evaluation.record(prediction == example.label, confidence);

        if index % EVALUATION_PROGRESS_INTERVAL == 0 {
            info!(index, "Testing examples...");
            debug!(prediction, expected = example.label, ?output, "Sample prediction.");
            trace!("\n{}", example.image);
        }
    }

    info!(
        total = evaluation.total(),
        accuracy = evaluation.accuracy(),
        mean_confidence = evaluation.mean_confidence(),
        "Evaluation finished.",
    );

    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::activation::Activation;
    use crate::config::Config;

    fn dataset(labels: &[usize]) -> Vec<Example> {
        labels
            .iter()
            .enumerate()
            .map(|(i, &label)| Example {
                image: Image::new(1, 2, vec![(i * 10 % 256) as u8, 50]),
                label,
            })
            .collect()
    }

    fn network(config: Config) -> Network {
        Network::new(config, &[2, 3], &mut StdRng::seed_from_u64(5)).unwrap()
    }

    #[test]
    fn one_hot_vector() {
        assert_eq!(
            one_hot(3, 10),
            Vector::from([0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        );
    }

    #[test]
    fn normalize_scales_pixels() {
        let image = Image::new(2, 2, vec![0, 50, 100, 255]);
        assert_eq!(image.normalize(), Vector::from([0.0, 0.5, 1.0, 2.55]));
        assert_eq!(image.get(1, 0), 100);
    }

    #[test]
    fn render_image() {
        let image = Image::new(2, 3, vec![0, 0, 255, 128, 0, 0]);
        assert_eq!(image.to_string(), "  @\n+  \n");
    }

    #[test]
    fn decide_picks_strongest_output() {
        assert_eq!(decide(&Vector::from([0.1, 0.9, 0.3])), (1, 0.9));
        assert_eq!(decide(&Vector::from([-0.4, -0.2])), (1, -0.2));
    }

    #[test]
    fn order_is_a_seeded_permutation() {
        let order = ExampleOrder::shuffled(50, 7, &mut StdRng::seed_from_u64(1));
        let again = ExampleOrder::shuffled(50, 7, &mut StdRng::seed_from_u64(1));
        assert_eq!(order.indices(), again.indices());

        let mut sorted = order.indices().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn order_yields_partial_final_chunk() {
        let order = ExampleOrder::shuffled(10, 4, &mut StdRng::seed_from_u64(1));
        let lengths: Vec<_> = order.chunks().map(|c| c.len()).collect();
        assert_eq!(lengths, [4, 4, 2]);
    }

    #[test]
    fn stops_when_examples_run_out() {
        let mut network = network(Config {
            chunk_size: 2,
            training_condition: -1.0,
            ..Default::default()
        });

        let report = train(&mut network, &dataset(&[0, 1, 2, 1, 0]), &mut StdRng::seed_from_u64(2))
            .unwrap();

        assert_eq!(report.stop_reason, StopReason::Exhausted);
        assert_eq!(report.iterations, 5);
        assert_eq!(report.chunks, 3);
        assert!(report.average_cost.is_some());
    }

    #[test]
    fn stops_at_max_steps_between_chunks() {
        let mut network = network(Config {
            chunk_size: 4,
            max_steps: 10,
            training_condition: -1.0,
            ..Default::default()
        });

        let report = train(&mut network, &dataset(&[1; 40]), &mut StdRng::seed_from_u64(2)).unwrap();

        assert_eq!(report.stop_reason, StopReason::MaxSteps);
        assert_eq!(report.iterations, 12);
        assert_eq!(report.chunks, 3);
    }

    #[test]
    fn stops_when_cost_meets_condition() {
        let mut network = network(Config {
            chunk_size: 3,
            training_condition: Value::MAX,
            ..Default::default()
        });

        let report = train(&mut network, &dataset(&[2; 12]), &mut StdRng::seed_from_u64(2)).unwrap();

        assert_eq!(report.stop_reason, StopReason::Converged);
        assert_eq!(report.iterations, 3);
        assert_eq!(report.chunks, 1);
    }

    #[test]
    fn zero_max_steps_trains_nothing() {
        let mut network = network(Config {
            max_steps: 0,
            ..Default::default()
        });
        let before = network.clone();

        let report = train(&mut network, &dataset(&[0, 1]), &mut StdRng::seed_from_u64(2)).unwrap();

        assert_eq!(report.iterations, 0);
        assert_eq!(report.average_cost, None);
        assert_eq!(network, before);
    }

    #[test]
    fn label_out_of_range() {
        let mut network = network(Config::default());

        assert_eq!(
            train(&mut network, &dataset(&[3]), &mut StdRng::seed_from_u64(2)),
            Err(TrainingError::LabelOutOfRange {
                label: 3,
                outputs: 3
            }),
        );
    }

    #[test]
    fn input_size_mismatch() {
        let mut network = network(Config::default());
        let examples = vec![Example {
            image: Image::new(2, 2, vec![0; 4]),
            label: 0,
        }];

        assert_eq!(
            evaluate(&mut network, &examples),
            Err(TrainingError::InputSize {
                expected: 2,
                found: 4
            }),
        );
    }

    #[test]
    fn dataset_errors_propagate() {
        struct Unreadable;

        impl Dataset for Unreadable {
            type Error = &'static str;

            fn len(&self) -> usize {
                3
            }

            fn example(&self, _index: usize) -> Result<Example, Self::Error> {
                Err("unreadable")
            }
        }

        let mut network = network(Config::default());

        assert_eq!(
            train(&mut network, &Unreadable, &mut StdRng::seed_from_u64(2)),
            Err(TrainingError::Dataset("unreadable")),
        );
        assert_eq!(
            evaluate(&mut network, &Unreadable),
            Err(TrainingError::Dataset("unreadable")),
        );
    }

    #[test]
    fn divergence_is_reported() {
        let mut network = network(Config {
            learning_rate: 1e6,
            chunk_size: 200,
            default_activation: Activation::Identity,
            output_activation: Activation::Identity,
            ..Default::default()
        });

        let result = train(&mut network, &dataset(&[1; 200]), &mut StdRng::seed_from_u64(2));

        assert!(matches!(result, Err(TrainingError::Diverged { .. })));
    }

    #[test]
    fn evaluation_summary() {
        let mut evaluation = Evaluation::default();
        evaluation.record(true, 0.75);
        evaluation.record(false, 0.25);
        evaluation.record(true, 0.5);
        evaluation.record(true, 0.5);

        assert_eq!(evaluation.total(), 4);
        assert_eq!(evaluation.accuracy(), 0.75);
        assert_eq!(evaluation.mean_confidence(), 0.5);
        assert_eq!(
            evaluation.to_string(),
            "Tested Correct: 3\nTested Incorrect: 1\nPercent Correct: 75.00\nAverage Certainty: 0.50",
        );
    }
}
