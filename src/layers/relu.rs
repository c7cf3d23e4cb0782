//! Elementwise rectifier stage for feature maps.

use crate::error::{CnnError, Result};
use crate::layers::Layer;
use crate::tensor::{Shape, Tensor3D};

/// `y = max(0, x)`; the gradient passes only where the cached input was strictly positive.
#[derive(Debug, Clone, Default)]
pub struct ReluLayer {
    last_input: Tensor3D,
}

impl ReluLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for ReluLayer {
    fn forward(&mut self, input: &Tensor3D) -> Result<Tensor3D> {
        self.last_input = input.clone();
        let data = input.as_slice().iter().map(|&v| v.max(0.0)).collect();
        Tensor3D::from_vec(input.shape(), data)
    }

    fn backward(&mut self, grad_output: &Tensor3D, _learning_rate: f32) -> Result<Tensor3D> {
        if grad_output.shape() != self.last_input.shape() {
            return Err(CnnError::ShapeMismatch {
                context: "relu backward",
                expected: self.last_input.len(),
                actual: grad_output.len(),
            });
        }
        let data = grad_output
            .as_slice()
            .iter()
            .zip(self.last_input.as_slice())
            .map(|(&g, &x)| if x > 0.0 { g } else { 0.0 })
            .collect();
        Tensor3D::from_vec(grad_output.shape(), data)
    }

    fn output_shape(&self, input: Shape) -> Shape {
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_clamps_negatives() {
        let mut relu = ReluLayer::new();
        let input = Tensor3D::from_vec(Shape::new(1, 2, 2), vec![-1.0, 0.0, 0.5, 3.0]).unwrap();
        let out = relu.forward(&input).unwrap();
        assert_eq!(out.as_slice(), &[0.0, 0.0, 0.5, 3.0]);
    }

    #[test]
    fn test_backward_masks_non_positive_inputs() {
        let mut relu = ReluLayer::new();
        let input = Tensor3D::from_vec(Shape::new(2, 2, 1), vec![-2.0, 0.0, 1e-3, 4.0]).unwrap();
        relu.forward(&input).unwrap();
        let grad = Tensor3D::from_vec(Shape::new(2, 2, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let grad_in = relu.backward(&grad, 0.1).unwrap();
        // zero input counts as inactive
        assert_eq!(grad_in.as_slice(), &[0.0, 0.0, 3.0, 4.0]);
    }

    #[test]
    fn test_backward_shape_mismatch() {
        let mut relu = ReluLayer::new();
        relu.forward(&Tensor3D::new(2, 2, 1)).unwrap();
        assert!(relu.backward(&Tensor3D::new(1, 1, 1), 0.1).is_err());
    }
}
