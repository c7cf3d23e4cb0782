//! Configuration structures for training
//!
//! A run is described by a JSON file deserialized into [`TrainingConfig`]. Every
//! field is optional in the file; missing fields take the defaults listed below.

use crate::data::DatasetKind;
use crate::error::{ConfigError, DataError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one training run.
///
/// | field             | default                  |
/// |-------------------|--------------------------|
/// | `dataset`         | `"cifar10"`              |
/// | `data_dir`        | `"cifar-10-batches-bin"` |
/// | `epochs`          | 8                        |
/// | `learning_rate`   | 0.006                    |
/// | `train_limit`     | 5000                     |
/// | `visual_interval` | 100                      |
/// | `grid_size`       | 100                      |
/// | `grid_columns`    | 10                       |
/// | `grid_scale`      | 2                        |
/// | `seed`            | none (entropy)           |
/// | `evaluate_test`   | false                    |
///
/// # Example
///
/// ```json
/// {
///   "dataset": "fashion_mnist",
///   "data_dir": "fashion-mnist",
///   "epochs": 3,
///   "learning_rate": 0.01,
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// "cifar10" or "fashion_mnist"
    pub dataset: String,

    /// Directory holding the dataset files
    pub data_dir: PathBuf,

    pub epochs: usize,

    /// SGD step size, constant for the whole run
    pub learning_rate: f32,

    /// Samples visited per epoch (the first `train_limit` images, shuffled)
    pub train_limit: usize,

    /// Refresh the sample grid every this many training steps
    pub visual_interval: usize,

    /// Images shown in the sample grid
    pub grid_size: usize,

    pub grid_columns: usize,

    pub grid_scale: usize,

    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,

    /// Measure accuracy on the test split after training
    pub evaluate_test: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetKind::Cifar10.name().to_string(),
            data_dir: PathBuf::from("cifar-10-batches-bin"),
            epochs: 8,
            learning_rate: 0.006,
            train_limit: 5000,
            visual_interval: 100,
            grid_size: 100,
            grid_columns: 10,
            grid_scale: 2,
            seed: None,
            evaluate_test: false,
        }
    }
}

impl TrainingConfig {
    /// Parsed form of `dataset`.
    pub fn dataset_kind(&self) -> Result<DatasetKind, DataError> {
        self.dataset.parse()
    }
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it and runs [`validate_config`].
///
/// # Examples
///
/// ```no_run
/// use scratch_cnn::config::load_config;
///
/// let cfg = load_config("config/fashion_mnist.json").unwrap();
/// assert_eq!(cfg.dataset, "fashion_mnist");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainingConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Rejects values that would make training meaningless or divide by zero.
pub fn validate_config(config: &TrainingConfig) -> Result<(), ConfigError> {
    if !config.learning_rate.is_finite() || config.learning_rate <= 0.0 {
        return Err(ConfigError::Invalid(format!(
            "learning_rate must be positive and finite, got {}",
            config.learning_rate
        )));
    }

    if config.epochs == 0 {
        return Err(ConfigError::Invalid("epochs must be at least 1".into()));
    }

    if config.visual_interval == 0 {
        return Err(ConfigError::Invalid(
            "visual_interval must be at least 1".into(),
        ));
    }

    if config.grid_columns == 0 {
        return Err(ConfigError::Invalid("grid_columns must be at least 1".into()));
    }

    if config.grid_scale == 0 {
        return Err(ConfigError::Invalid("grid_scale must be at least 1".into()));
    }

    config
        .dataset_kind()
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

    Ok(())
}
