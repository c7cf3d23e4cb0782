//! Per-sample SGD training loop.
//!
//! Each epoch visits the first `train_limit` images of the training set in a
//! fresh random order, running forward, loss, and backward for one sample at a
//! time. The viewer receives a new random sample grid every `visual_interval`
//! steps and after every epoch.

use crate::config::TrainingConfig;
use crate::data::{image_to_tensor, Dataset};
use crate::error::Result;
use crate::model::CnnModel;
use crate::utils::{argmax, SeededRng};
use crate::viewer::{SampleGrid, Viewer};
use tracing::{info, trace};

/// Summary of one training epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    pub epoch: usize,
    pub average_loss: f32,
    /// Fraction of samples whose pre-update prediction was correct.
    pub accuracy: f32,
    pub samples: usize,
}

/// Result of [`Trainer::run`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainingReport {
    pub epochs: Vec<EpochStats>,
    pub test_accuracy: Option<f32>,
}

/// Drives a [`CnnModel`] over a [`Dataset`] and reports to a [`Viewer`].
pub struct Trainer<V: Viewer> {
    config: TrainingConfig,
    rng: SeededRng,
    viewer: V,
}

/// ChaCha stream used for shuffling and grid sampling. Weight initialisation
/// uses stream 0 of the same seed.
pub const SAMPLING_STREAM: u64 = 1;

impl<V: Viewer> Trainer<V> {
    /// Seeds the trainer's RNG from `config.seed` on [`SAMPLING_STREAM`], or
    /// from entropy when unset.
    pub fn new(config: TrainingConfig, viewer: V) -> Self {
        let rng = config
            .seed
            .map(|seed| SeededRng::with_stream(seed, SAMPLING_STREAM))
            .unwrap_or_else(SeededRng::from_entropy);
        Self::with_rng(config, rng, viewer)
    }

    pub fn with_rng(config: TrainingConfig, rng: SeededRng, viewer: V) -> Self {
        Self {
            config,
            rng,
            viewer,
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    pub fn into_viewer(self) -> V {
        self.viewer
    }

    /// Trains `model` for one epoch and returns loss and accuracy.
    ///
    /// Progress is reported as `(epoch + step / count) / total_epochs`.
    pub fn train_epoch(
        &mut self,
        model: &mut CnnModel,
        dataset: &Dataset,
        epoch: usize,
        total_epochs: usize,
    ) -> Result<EpochStats> {
        let count = dataset.len().min(self.config.train_limit);
        let mut indices: Vec<usize> = (0..count).collect();
        self.rng.shuffle(&mut indices);

        let learning_rate = self.config.learning_rate;
        let interval = self.config.visual_interval.max(1);
        let total_epochs = total_epochs.max(1) as f32;
        let mut total_loss = 0.0f32;
        let mut correct = 0usize;

        for (step, &idx) in indices.iter().enumerate() {
            let input = dataset.tensor(idx)?;
            let label = dataset.label(idx);
            let target = dataset.one_hot(idx);

            let probs = model.forward(&input)?;
            model.set_target(&target);
            let loss = model.compute_loss(&target)?;
            total_loss += loss;
            model.backward(learning_rate)?;

            if argmax(&probs) == label {
                correct += 1;
            }
            trace!(step, label, loss, "trained sample");

            if step % interval == 0 {
                info!(epoch = epoch + 1, step, "refreshing sample view");
                self.show_random_samples(model, dataset)?;
            }

            let within = step as f32 / count as f32;
            self.viewer
                .set_progress((epoch as f32 + within) / total_epochs);
        }

        let stats = if count == 0 {
            EpochStats {
                epoch,
                average_loss: 0.0,
                accuracy: 0.0,
                samples: 0,
            }
        } else {
            EpochStats {
                epoch,
                average_loss: total_loss / count as f32,
                accuracy: correct as f32 / count as f32,
                samples: count,
            }
        };

        info!(
            epoch = epoch + 1,
            loss = stats.average_loss,
            accuracy = %format!("{:.2}%", stats.accuracy * 100.0),
            samples = stats.samples,
            "epoch complete"
        );
        Ok(stats)
    }

    /// Predicts `grid_size` randomly drawn images (with replacement).
    pub fn sample_grid(&mut self, model: &mut CnnModel, dataset: &Dataset) -> Result<SampleGrid> {
        let count = if dataset.is_empty() {
            0
        } else {
            self.config.grid_size
        };
        let picks = self.rng.sample_indices(count, dataset.len());

        let mut grid = SampleGrid {
            images: Vec::with_capacity(count),
            ground_truth: Vec::with_capacity(count),
            predictions: Vec::with_capacity(count),
            correct: Vec::with_capacity(count),
            image_shape: dataset.shape(),
            columns: self.config.grid_columns,
            scale: self.config.grid_scale,
        };

        for idx in picks {
            let truth = dataset.label(idx);
            let prediction = model.predict(&dataset.tensor(idx)?)?;
            grid.images.push(dataset.image(idx).to_vec());
            grid.ground_truth.push(truth);
            grid.predictions.push(prediction);
            grid.correct.push(prediction == truth);
        }
        Ok(grid)
    }

    /// Pushes a fresh sample grid and the ranking of its first image to the viewer.
    pub fn show_random_samples(&mut self, model: &mut CnnModel, dataset: &Dataset) -> Result<()> {
        let grid = self.sample_grid(model, dataset)?;
        self.viewer.show_grid(&grid);

        if let Some(first) = grid.images.first() {
            let input = image_to_tensor(grid.image_shape, first)?;
            let ranking = model.top_k(&input)?;
            self.viewer
                .show_detail(first, &ranking, dataset.kind().class_names());
        }
        Ok(())
    }

    /// Fraction of `dataset` classified correctly. Parameters are left untouched.
    pub fn evaluate(&mut self, model: &mut CnnModel, dataset: &Dataset) -> Result<f32> {
        if dataset.is_empty() {
            return Ok(0.0);
        }
        let mut correct = 0usize;
        for idx in 0..dataset.len() {
            if model.predict(&dataset.tensor(idx)?)? == dataset.label(idx) {
                correct += 1;
            }
        }
        let accuracy = correct as f32 / dataset.len() as f32;
        info!(
            samples = dataset.len(),
            accuracy = %format!("{:.2}%", accuracy * 100.0),
            "evaluation complete"
        );
        Ok(accuracy)
    }

    /// Full run: initial grid, `epochs` epochs each followed by a grid refresh,
    /// a final refresh, then optional test evaluation.
    pub fn run(
        &mut self,
        model: &mut CnnModel,
        train: &Dataset,
        test: Option<&Dataset>,
    ) -> Result<TrainingReport> {
        let epochs = self.config.epochs;
        info!(
            epochs,
            learning_rate = self.config.learning_rate,
            train_samples = train.len().min(self.config.train_limit),
            "starting training"
        );

        self.show_random_samples(model, train)?;

        let mut report = TrainingReport::default();
        for epoch in 0..epochs {
            report
                .epochs
                .push(self.train_epoch(model, train, epoch, epochs)?);
            self.show_random_samples(model, train)?;
        }

        info!("training finished");
        self.viewer.set_progress(1.0);
        self.show_random_samples(model, train)?;

        if self.config.evaluate_test {
            if let Some(test) = test {
                report.test_accuracy = Some(self.evaluate(model, test)?);
            }
        }
        Ok(report)
    }
}
