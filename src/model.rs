//! Fixed-topology convolutional classifier.
//!
//! ```text
//! input (H×W×C)
//!   → Conv(8, 3×3) → ReLU → MaxPool(2×2)
//!   → Conv(16, 3×3) → ReLU → MaxPool(2×2)
//!   → Flatten → Dense(128) → ReLU → Dense(10) → Softmax
//! ```
//!
//! One sample is in flight at a time. `forward` caches every intermediate
//! activation; `backward` consumes those caches together with the target set by
//! `set_target`, so calling `forward` twice before `backward` discards the first
//! sample's state. Calling `backward` without a preceding `forward` trains on
//! stale activations; that ordering is the caller's responsibility.

use crate::error::{CnnError, Result};
use crate::layers::{Conv2DLayer, DenseLayer, FlattenLayer, Layer, MaxPoolLayer, ReluLayer};
use crate::tensor::{Shape, Tensor3D};
use crate::utils::{argmax, cross_entropy, relu_inplace, softmax, SeededRng};
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Number of output classes.
pub const NUM_CLASSES: usize = 10;
/// Feature maps produced by the first convolution.
pub const CONV1_CHANNELS: usize = 8;
/// Feature maps produced by the second convolution.
pub const CONV2_CHANNELS: usize = 16;
/// Side of both convolution kernels.
pub const KERNEL_SIZE: usize = 3;
/// Side (and stride) of both pooling windows.
pub const POOL_SIZE: usize = 2;
/// Width of the hidden dense layer.
pub const HIDDEN_UNITS: usize = 128;

/// Convolutional classifier trained one sample at a time with plain SGD.
///
/// # Example
///
/// ```
/// use scratch_cnn::model::CnnModel;
/// use scratch_cnn::tensor::{Shape, Tensor3D};
/// use scratch_cnn::utils::{one_hot, SeededRng};
///
/// let mut rng = SeededRng::new(7);
/// let mut model = CnnModel::new(Shape::new(28, 28, 1), &mut rng);
/// let image = Tensor3D::filled(Shape::new(28, 28, 1), 0.5);
///
/// let probs = model.forward(&image).unwrap();
/// assert_eq!(probs.len(), 10);
///
/// let target = one_hot(3, 10);
/// model.set_target(&target);
/// let loss = model.compute_loss(&target).unwrap();
/// assert!(loss.is_finite());
/// model.backward(0.01).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct CnnModel {
    input_shape: Shape,

    conv1: Conv2DLayer,
    relu1: ReluLayer,
    pool1: MaxPoolLayer,
    conv2: Conv2DLayer,
    relu2: ReluLayer,
    pool2: MaxPoolLayer,
    flatten: FlattenLayer,
    dense1: DenseLayer,
    dense2: DenseLayer,

    conv1_output: Tensor3D,
    pool1_output: Tensor3D,
    conv2_output: Tensor3D,
    pool2_output: Tensor3D,
    hidden: Vec<f32>,
    probabilities: Vec<f32>,
    target: Vec<f32>,
}

impl CnnModel {
    /// Builds the network for inputs of `input_shape`.
    ///
    /// 28×28×1 flattens to 7·7·16 = 784 features, 32×32×3 to 8·8·16 = 1024.
    ///
    /// # Panics
    ///
    /// Panics if the input has no channels or is too small to survive both poolings.
    pub fn new(input_shape: Shape, rng: &mut SeededRng) -> Self {
        let min_side = POOL_SIZE * POOL_SIZE;
        assert!(
            input_shape.height >= min_side && input_shape.width >= min_side,
            "input {} is smaller than {}x{}",
            input_shape,
            min_side,
            min_side
        );
        assert!(input_shape.channels > 0, "input must have at least one channel");

        let conv1 = Conv2DLayer::new(
            input_shape.channels,
            CONV1_CHANNELS,
            KERNEL_SIZE,
            input_shape.height,
            input_shape.width,
            rng,
        );
        let pool1 = MaxPoolLayer::new(POOL_SIZE);
        let pool1_shape = pool1.output_shape(conv1.output_shape(input_shape));

        let conv2 = Conv2DLayer::new(
            CONV1_CHANNELS,
            CONV2_CHANNELS,
            KERNEL_SIZE,
            pool1_shape.height,
            pool1_shape.width,
            rng,
        );
        let pool2 = MaxPoolLayer::new(POOL_SIZE);
        let pool2_shape = pool2.output_shape(conv2.output_shape(pool1_shape));

        let flat_size = pool2_shape.len();
        let dense1 = DenseLayer::new(flat_size, HIDDEN_UNITS, rng);
        let dense2 = DenseLayer::new(HIDDEN_UNITS, NUM_CLASSES, rng);

        debug!(
            input = %input_shape,
            pool1 = %pool1_shape,
            pool2 = %pool2_shape,
            flat_size,
            "built cnn model"
        );

        Self {
            input_shape,
            conv1,
            relu1: ReluLayer::new(),
            pool1,
            conv2,
            relu2: ReluLayer::new(),
            pool2,
            flatten: FlattenLayer::new(),
            dense1,
            dense2,
            conv1_output: Tensor3D::zeros(Shape::new(
                input_shape.height,
                input_shape.width,
                CONV1_CHANNELS,
            )),
            pool1_output: Tensor3D::zeros(pool1_shape),
            conv2_output: Tensor3D::zeros(Shape::new(
                pool1_shape.height,
                pool1_shape.width,
                CONV2_CHANNELS,
            )),
            pool2_output: Tensor3D::zeros(pool2_shape),
            hidden: vec![0.0; HIDDEN_UNITS],
            probabilities: vec![0.0; NUM_CLASSES],
            target: vec![0.0; NUM_CLASSES],
        }
    }

    pub fn input_shape(&self) -> Shape {
        self.input_shape
    }

    /// Length of the feature vector between the convolutional and dense stages.
    pub fn flattened_size(&self) -> usize {
        self.pool2_output.len()
    }

    pub fn parameter_count(&self) -> usize {
        self.conv1.parameter_count()
            + self.conv2.parameter_count()
            + self.dense1.parameter_count()
            + self.dense2.parameter_count()
    }

    /// Softmax output of the most recent forward pass.
    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }

    /// Post-ReLU hidden activations of the most recent forward pass.
    pub fn hidden_activations(&self) -> &[f32] {
        &self.hidden
    }

    pub fn conv1_output(&self) -> &Tensor3D {
        &self.conv1_output
    }

    pub fn conv2_output(&self) -> &Tensor3D {
        &self.conv2_output
    }

    pub fn pool1_output(&self) -> &Tensor3D {
        &self.pool1_output
    }

    pub fn pool2_output(&self) -> &Tensor3D {
        &self.pool2_output
    }

    pub fn target(&self) -> &[f32] {
        &self.target
    }

    /// Runs the full pipeline and returns the class probabilities.
    pub fn forward(&mut self, input: &Tensor3D) -> Result<Vec<f32>> {
        self.conv1_output = self.conv1.forward(input)?;
        let relu1_output = self.relu1.forward(&self.conv1_output)?;
        self.pool1_output = self.pool1.forward(&relu1_output)?;

        self.conv2_output = self.conv2.forward(&self.pool1_output)?;
        let relu2_output = self.relu2.forward(&self.conv2_output)?;
        self.pool2_output = self.pool2.forward(&relu2_output)?;

        self.flatten.forward(&self.pool2_output)?;
        let mut hidden = self.dense1.forward(self.flatten.flat_output())?;
        relu_inplace(&mut hidden);
        self.hidden = hidden;

        let logits = self.dense2.forward(&self.hidden)?;
        self.probabilities = softmax(&logits);
        Ok(self.probabilities.clone())
    }

    /// Stores the one-hot target consumed by the next `backward`.
    pub fn set_target(&mut self, target: &[f32]) {
        self.target = target.to_vec();
    }

    /// Cross-entropy between the last forward output and `target`.
    pub fn compute_loss(&self, target: &[f32]) -> Result<f32> {
        if target.len() != self.probabilities.len() {
            return Err(CnnError::ShapeMismatch {
                context: "loss target",
                expected: self.probabilities.len(),
                actual: target.len(),
            });
        }
        Ok(cross_entropy(&self.probabilities, target))
    }

    /// Backpropagates from the softmax/cross-entropy head and updates every layer.
    ///
    /// The combined softmax + cross-entropy gradient at the logits is
    /// `probabilities - target`.
    pub fn backward(&mut self, learning_rate: f32) -> Result<()> {
        if self.target.len() != NUM_CLASSES {
            return Err(CnnError::ShapeMismatch {
                context: "backward target",
                expected: NUM_CLASSES,
                actual: self.target.len(),
            });
        }

        let grad_logits: Vec<f32> = self
            .probabilities
            .iter()
            .zip(&self.target)
            .map(|(p, t)| p - t)
            .collect();

        let mut grad_hidden = self.dense2.backward(&grad_logits, learning_rate)?;
        for (g, &h) in grad_hidden.iter_mut().zip(&self.hidden) {
            if h <= 0.0 {
                *g = 0.0;
            }
        }

        let grad_flat = self.dense1.backward(&grad_hidden, learning_rate)?;
        let grad_pool2 = self
            .flatten
            .backward(&Tensor3D::vector(grad_flat), learning_rate)?;

        let grad_relu2 = self.pool2.backward(&grad_pool2, learning_rate)?;
        let grad_conv2 = self.relu2.backward(&grad_relu2, learning_rate)?;
        let grad_pool1 = self.conv2.backward(&grad_conv2, learning_rate)?;

        let grad_relu1 = self.pool1.backward(&grad_pool1, learning_rate)?;
        let grad_conv1 = self.relu1.backward(&grad_relu1, learning_rate)?;
        self.conv1.backward(&grad_conv1, learning_rate)?;

        trace!(learning_rate, "backward pass complete");
        Ok(())
    }

    /// Index of the most probable class.
    pub fn predict(&mut self, input: &Tensor3D) -> Result<usize> {
        let probs = self.forward(input)?;
        Ok(argmax(&probs))
    }

    /// Full probability vector for `input`.
    pub fn predict_proba(&mut self, input: &Tensor3D) -> Result<Vec<f32>> {
        self.forward(input)
    }

    /// Every class paired with its probability, most probable first.
    ///
    /// The sort is stable, so equal probabilities keep ascending class order.
    pub fn top_k(&mut self, input: &Tensor3D) -> Result<Vec<(usize, f32)>> {
        let probs = self.forward(input)?;
        let mut ranking: Vec<(usize, f32)> = probs.into_iter().enumerate().collect();
        ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        Ok(ranking)
    }

    /// The first `k` entries of [`CnnModel::top_k`].
    pub fn top_k_limited(&mut self, input: &Tensor3D, k: usize) -> Result<Vec<(usize, f32)>> {
        let mut ranking = self.top_k(input)?;
        ranking.truncate(k);
        Ok(ranking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::one_hot;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_flattened_size_for_supported_inputs() {
        let mut rng = SeededRng::new(1);
        assert_eq!(CnnModel::new(Shape::new(28, 28, 1), &mut rng).flattened_size(), 784);
        assert_eq!(CnnModel::new(Shape::new(32, 32, 3), &mut rng).flattened_size(), 1024);
    }

    #[test]
    fn test_parameter_count() {
        let model = CnnModel::new(Shape::new(28, 28, 1), &mut SeededRng::new(1));
        let conv1 = 8 * 9 + 8;
        let conv2 = 16 * 8 * 9 + 16;
        let dense1 = 784 * 128 + 128;
        let dense2 = 128 * 10 + 10;
        assert_eq!(model.parameter_count(), conv1 + conv2 + dense1 + dense2);
    }

    #[test]
    #[should_panic(expected = "smaller than")]
    fn test_too_small_input_rejected() {
        CnnModel::new(Shape::new(3, 8, 1), &mut SeededRng::new(1));
    }

    #[test]
    fn test_forward_caches_intermediates() {
        let mut model = CnnModel::new(Shape::new(16, 16, 3), &mut SeededRng::new(2));
        model.forward(&Tensor3D::filled(Shape::new(16, 16, 3), 0.5)).unwrap();
        assert_eq!(model.conv1_output().shape(), Shape::new(16, 16, 8));
        assert_eq!(model.pool1_output().shape(), Shape::new(8, 8, 8));
        assert_eq!(model.conv2_output().shape(), Shape::new(8, 8, 16));
        assert_eq!(model.pool2_output().shape(), Shape::new(4, 4, 16));
        assert_eq!(model.hidden_activations().len(), HIDDEN_UNITS);
        assert!(model.hidden_activations().iter().all(|&h| h >= 0.0));
    }

    #[test]
    fn test_zero_input_gives_uniform_distribution() {
        let mut model = CnnModel::new(Shape::new(28, 28, 1), &mut SeededRng::new(3));
        let probs = model.forward(&Tensor3D::new(28, 28, 1)).unwrap();
        for p in probs {
            assert_abs_diff_eq!(p, 0.1, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_backward_requires_full_target() {
        let mut model = CnnModel::new(Shape::new(8, 8, 1), &mut SeededRng::new(4));
        model.forward(&Tensor3D::new(8, 8, 1)).unwrap();
        model.set_target(&[1.0, 0.0]);
        assert_eq!(model.target(), &[1.0, 0.0]);
        assert!(matches!(
            model.backward(0.1),
            Err(CnnError::ShapeMismatch { expected: 10, actual: 2, .. })
        ));
    }

    #[test]
    fn test_compute_loss_rejects_wrong_length() {
        let mut model = CnnModel::new(Shape::new(8, 8, 1), &mut SeededRng::new(4));
        model.forward(&Tensor3D::new(8, 8, 1)).unwrap();
        assert!(model.compute_loss(&[1.0; 3]).is_err());
    }

    #[test]
    fn test_wrong_input_shape_is_error() {
        let mut model = CnnModel::new(Shape::new(28, 28, 1), &mut SeededRng::new(5));
        assert!(model.forward(&Tensor3D::new(32, 32, 3)).is_err());
    }

    #[test]
    fn test_top_k_is_sorted_permutation() {
        let mut model = CnnModel::new(Shape::new(12, 12, 3), &mut SeededRng::new(6));
        let input = Tensor3D::filled(Shape::new(12, 12, 3), 0.3);
        let ranking = model.top_k(&input).unwrap();

        assert_eq!(ranking.len(), NUM_CLASSES);
        for pair in ranking.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        let mut classes: Vec<usize> = ranking.iter().map(|&(c, _)| c).collect();
        classes.sort();
        assert_eq!(classes, (0..NUM_CLASSES).collect::<Vec<_>>());
        assert_eq!(ranking[0].0, model.predict(&input).unwrap());
    }

    #[test]
    fn test_top_k_ties_keep_class_order() {
        let mut model = CnnModel::new(Shape::new(8, 8, 1), &mut SeededRng::new(6));
        let ranking = model.top_k(&Tensor3D::new(8, 8, 1)).unwrap();
        let classes: Vec<usize> = ranking.iter().map(|&(c, _)| c).collect();
        assert_eq!(classes, (0..NUM_CLASSES).collect::<Vec<_>>());
    }

    #[test]
    fn test_top_k_limited_truncates() {
        let mut model = CnnModel::new(Shape::new(8, 8, 1), &mut SeededRng::new(6));
        let input = Tensor3D::filled(Shape::new(8, 8, 1), 0.7);
        assert_eq!(model.top_k_limited(&input, 3).unwrap().len(), 3);
        assert_eq!(model.top_k_limited(&input, 50).unwrap().len(), NUM_CLASSES);
    }

    #[test]
    fn test_training_step_lowers_loss() {
        let mut model = CnnModel::new(Shape::new(8, 8, 1), &mut SeededRng::new(10));
        let input = Tensor3D::filled(Shape::new(8, 8, 1), 0.5);
        let target = one_hot(0, NUM_CLASSES);

        model.forward(&input).unwrap();
        model.set_target(&target);
        let first = model.compute_loss(&target).unwrap();
        model.backward(0.01).unwrap();

        model.forward(&input).unwrap();
        let second = model.compute_loss(&target).unwrap();
        assert!(second <= first, "loss went from {} to {}", first, second);
    }
}
