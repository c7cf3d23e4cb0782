//! Layer trait definition for tensor-to-tensor layers
//!
//! Convolution, pooling, rectifier and flatten stages all implement this trait.
//! Each layer keeps a single-slot cache of whatever its most recent `forward`
//! needs, so exactly one forward/backward pair may be in flight at a time.

use crate::error::Result;
use crate::tensor::{Shape, Tensor3D};

/// Core trait for layers operating on [`Tensor3D`] values.
///
/// `backward` must be called after the `forward` whose cached state it consumes.
/// A second `forward` overwrites that state.
///
/// # Example
///
/// ```
/// use scratch_cnn::layers::{Layer, ReluLayer};
/// use scratch_cnn::tensor::{Shape, Tensor3D};
///
/// let mut relu = ReluLayer::new();
/// let input = Tensor3D::from_vec(Shape::new(1, 1, 2), vec![-1.0, 2.0]).unwrap();
/// let out = relu.forward(&input).unwrap();
/// assert_eq!(out.as_slice(), &[0.0, 2.0]);
///
/// let grad = Tensor3D::filled(Shape::new(1, 1, 2), 1.0);
/// let grad_in = relu.backward(&grad, 0.01).unwrap();
/// assert_eq!(grad_in.as_slice(), &[0.0, 1.0]);
/// ```
pub trait Layer {
    /// Computes the layer output and caches what `backward` needs.
    fn forward(&mut self, input: &Tensor3D) -> Result<Tensor3D>;

    /// Propagates `grad_output` (dL/d output) to dL/d input.
    ///
    /// Layers with parameters also apply the gradient-descent update
    /// `param -= learning_rate * grad` before returning. The input gradient is
    /// always computed against the parameters as they were during `forward`.
    fn backward(&mut self, grad_output: &Tensor3D, learning_rate: f32) -> Result<Tensor3D>;

    /// Shape produced by `forward` for an input of shape `input`.
    fn output_shape(&self, input: Shape) -> Shape;

    /// Number of trainable weights and biases.
    fn parameter_count(&self) -> usize {
        0
    }
}
