//! Dense (fully connected) layer implementation
//!
//! This module provides a DenseLayer that maps a feature vector to
//! `output[o] = bias[o] + Σ_i weight[o][i] * input[i]`.

use crate::error::{CnnError, Result};
use crate::utils::SeededRng;
use tracing::debug;

/// Dense (fully connected) layer with weights and biases.
///
/// Works on plain feature vectors, which is what the flatten stage hands over.
///
/// # Fields
///
/// * `input_size` - Number of input features
/// * `output_size` - Number of output features
/// * `weights` - Weight matrix stored row-major as (output_neuron, input_neuron)
/// * `biases` - Bias vector (output_size)
/// * `last_input` - Input vector of the most recent forward pass
///
/// # Example
///
/// ```
/// use scratch_cnn::layers::DenseLayer;
/// use scratch_cnn::utils::SeededRng;
///
/// let mut rng = SeededRng::new(42);
/// let mut layer = DenseLayer::new(784, 128, &mut rng);
/// assert_eq!(layer.input_size(), 784);
/// assert_eq!(layer.forward(&vec![0.0; 784]).unwrap(), vec![0.0; 128]);
/// ```
#[derive(Debug, Clone)]
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
    last_input: Vec<f32>,
}

impl DenseLayer {
    /// Create a new DenseLayer with He initialization.
    ///
    /// Weights are drawn from N(0, sqrt(2 / input_size)); biases start at zero.
    ///
    /// # Panics
    ///
    /// Panics if either size is zero.
    pub fn new(input_size: usize, output_size: usize, rng: &mut SeededRng) -> Self {
        assert!(
            input_size > 0 && output_size > 0,
            "dense layer sizes must be positive"
        );

        let weights: Vec<f32> = (0..input_size * output_size)
            .map(|_| rng.he_normal(input_size))
            .collect();

        debug!(input_size, output_size, "initialised dense layer");

        Self {
            input_size,
            output_size,
            weights,
            biases: vec![0.0f32; output_size],
            last_input: vec![0.0f32; input_size],
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Returns input_size × output_size (weights) + output_size (biases).
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    fn check_len(&self, context: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(CnnError::ShapeMismatch {
                context,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Affine transform of `input`; the input is cached for `backward`.
    pub fn forward(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.check_len("dense forward", self.input_size, input.len())?;
        self.last_input.clear();
        self.last_input.extend_from_slice(input);

        let output = self
            .weights
            .chunks_exact(self.input_size)
            .zip(&self.biases)
            .map(|(row, &bias)| bias + row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>())
            .collect();
        Ok(output)
    }

    /// Returns dL/d input and applies the SGD update to weights and biases.
    ///
    /// The input gradient is fully accumulated before any parameter changes, so it
    /// always reflects the weights used by the matching `forward`.
    pub fn backward(&mut self, grad_output: &[f32], learning_rate: f32) -> Result<Vec<f32>> {
        self.check_len("dense backward", self.output_size, grad_output.len())?;

        let mut grad_input = vec![0.0f32; self.input_size];
        for (row, &g) in self.weights.chunks_exact(self.input_size).zip(grad_output) {
            for (gi, &w) in grad_input.iter_mut().zip(row) {
                *gi += g * w;
            }
        }

        for ((row, bias), &g) in self
            .weights
            .chunks_exact_mut(self.input_size)
            .zip(self.biases.iter_mut())
            .zip(grad_output)
        {
            *bias -= learning_rate * g;
            for (w, &x) in row.iter_mut().zip(&self.last_input) {
                *w -= learning_rate * g * x;
            }
        }

        Ok(grad_input)
    }
}
