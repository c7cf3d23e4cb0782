//! Bridge between the convolutional and dense stages.
//!
//! Forward linearises an (H, W, C) tensor row by row, column by column, channel
//! innermost, which is exactly the tensor's storage order. Backward must use the
//! same ordering or gradients are silently scrambled.

use crate::error::{CnnError, Result};
use crate::layers::Layer;
use crate::tensor::{Shape, Tensor3D};

/// Reshapes (H, W, C) to (1, 1, H·W·C) and back.
#[derive(Debug, Clone, Default)]
pub struct FlattenLayer {
    input_shape: Shape,
    flat_output: Vec<f32>,
}

impl FlattenLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feature vector produced by the most recent forward pass.
    pub fn flat_output(&self) -> &[f32] {
        &self.flat_output
    }

    /// Input shape cached by the most recent forward pass.
    pub fn input_shape(&self) -> Shape {
        self.input_shape
    }
}

impl Layer for FlattenLayer {
    fn forward(&mut self, input: &Tensor3D) -> Result<Tensor3D> {
        let shape = input.shape();
        self.input_shape = shape;

        let mut flat = Vec::with_capacity(shape.len());
        for row in 0..shape.height {
            for col in 0..shape.width {
                for ch in 0..shape.channels {
                    flat.push(input.get(row, col, ch)?);
                }
            }
        }
        self.flat_output = flat.clone();
        Ok(Tensor3D::vector(flat))
    }

    fn backward(&mut self, grad_output: &Tensor3D, _learning_rate: f32) -> Result<Tensor3D> {
        let shape = self.input_shape;
        let g = grad_output.shape();
        if g.height != 1 || g.width != 1 || g.channels != shape.len() {
            return Err(CnnError::ShapeMismatch {
                context: "flatten backward",
                expected: shape.len(),
                actual: g.len(),
            });
        }

        let mut grad_input = Tensor3D::zeros(shape);
        let mut idx = 0usize;
        for row in 0..shape.height {
            for col in 0..shape.width {
                for ch in 0..shape.channels {
                    grad_input.set(row, col, ch, grad_output.get(0, 0, idx)?)?;
                    idx += 1;
                }
            }
        }
        Ok(grad_input)
    }

    fn output_shape(&self, input: Shape) -> Shape {
        Shape::new(1, 1, input.len())
    }
}
