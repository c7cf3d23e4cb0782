//! Non-overlapping max pooling.
//!
//! The window size doubles as the stride. Backward does not remember argmax
//! indices; it re-scans each window and routes the gradient to every position
//! whose cached input equals the cached maximum within [`TIE_TOLERANCE`].

use crate::error::{CnnError, Result};
use crate::layers::Layer;
use crate::tensor::{Shape, Tensor3D};

/// Two window values closer than this both count as the maximum.
pub const TIE_TOLERANCE: f32 = 1e-6;

/// Parameter-free max-pooling layer with a square `pool_size` window.
#[derive(Debug, Clone)]
pub struct MaxPoolLayer {
    pool_size: usize,
    last_input: Tensor3D,
    last_output: Tensor3D,
}

impl MaxPoolLayer {
    /// # Panics
    ///
    /// Panics if `pool_size` is zero.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be positive");
        Self {
            pool_size,
            last_input: Tensor3D::default(),
            last_output: Tensor3D::default(),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }
}

impl Layer for MaxPoolLayer {
    fn forward(&mut self, input: &Tensor3D) -> Result<Tensor3D> {
        let out_shape = self.output_shape(input.shape());
        let mut output = Tensor3D::zeros(out_shape);

        for c in 0..out_shape.channels {
            for oy in 0..out_shape.height {
                for ox in 0..out_shape.width {
                    let mut best = f32::NEG_INFINITY;
                    for dy in 0..self.pool_size {
                        for dx in 0..self.pool_size {
                            let v = input.get(oy * self.pool_size + dy, ox * self.pool_size + dx, c)?;
                            if v > best {
                                best = v;
                            }
                        }
                    }
                    output.set(oy, ox, c, best)?;
                }
            }
        }

        self.last_input = input.clone();
        self.last_output = output.clone();
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Tensor3D, _learning_rate: f32) -> Result<Tensor3D> {
        let out_shape = self.last_output.shape();
        if grad_output.shape() != out_shape {
            return Err(CnnError::ShapeMismatch {
                context: "max pool backward",
                expected: out_shape.len(),
                actual: grad_output.len(),
            });
        }

        let mut grad_input = Tensor3D::zeros(self.last_input.shape());
        for c in 0..out_shape.channels {
            for oy in 0..out_shape.height {
                for ox in 0..out_shape.width {
                    let max_value = self.last_output.get(oy, ox, c)?;
                    let g = grad_output.get(oy, ox, c)?;
                    for dy in 0..self.pool_size {
                        for dx in 0..self.pool_size {
                            let iy = oy * self.pool_size + dy;
                            let ix = ox * self.pool_size + dx;
                            if (self.last_input.get(iy, ix, c)? - max_value).abs() < TIE_TOLERANCE {
                                grad_input.add(iy, ix, c, g)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(grad_input)
    }

    fn output_shape(&self, input: Shape) -> Shape {
        Shape::new(
            input.height / self.pool_size,
            input.width / self.pool_size,
            input.channels,
        )
    }
}
