//! Trains the CNN on CIFAR-10 or Fashion-MNIST and logs progress.
//!
//! ```text
//! train_cnn --config config/cifar10.json
//! RUST_LOG=debug train_cnn --dataset fashion_mnist --data-dir fashion-mnist --epochs 2
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use scratch_cnn::config::{load_config, validate_config, TrainingConfig};
use scratch_cnn::model::CnnModel;
use scratch_cnn::trainer::Trainer;
use scratch_cnn::utils::SeededRng;
use scratch_cnn::viewer::LogViewer;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Train a small CNN from scratch")]
struct Cli {
    /// JSON training configuration; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the dataset files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// "cifar10" or "fashion_mnist"
    #[arg(long)]
    dataset: Option<String>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,
}

fn apply_overrides(mut config: TrainingConfig, cli: Cli) -> TrainingConfig {
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dataset) = cli.dataset {
        config.dataset = dataset;
    }
    if let Some(epochs) = cli.epochs {
        config.epochs = epochs;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let base = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    let config = apply_overrides(base, cli);
    validate_config(&config).context("invalid configuration")?;

    let kind = config.dataset_kind()?;
    info!(dataset = %kind, dir = %config.data_dir.display(), "loading training data");
    let train = kind
        .load_train(&config.data_dir)
        .with_context(|| format!("loading {} training data", kind))?;
    info!(images = train.len(), "training data ready");

    let test = if config.evaluate_test {
        match kind.load_test(&config.data_dir) {
            Ok(test) => Some(test),
            Err(err) => {
                warn!(error = %err, "test split unavailable, skipping evaluation");
                None
            }
        }
    } else {
        None
    };

    let mut init_rng = config
        .seed
        .map(SeededRng::new)
        .unwrap_or_else(SeededRng::from_entropy);
    let mut model = CnnModel::new(train.shape(), &mut init_rng);
    info!(parameters = model.parameter_count(), input = %model.input_shape(), "model built");

    let mut trainer = Trainer::new(config, LogViewer::default());
    let report = trainer.run(&mut model, &train, test.as_ref())?;

    if let Some(last) = report.epochs.last() {
        info!(
            loss = last.average_loss,
            accuracy = %format!("{:.2}%", last.accuracy * 100.0),
            "final epoch"
        );
    }
    if let Some(acc) = report.test_accuracy {
        info!(accuracy = %format!("{:.2}%", acc * 100.0), "test accuracy");
    }
    Ok(())
}
