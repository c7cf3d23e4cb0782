//! 2D convolutional layer implementation
//!
//! This module provides a Conv2DLayer performing "same" convolution: stride 1 and
//! padding `(kernel_size - 1) / 2`, so the output keeps the input's spatial size.
//! Padding is never materialised; kernel taps that land outside the input are skipped.

use crate::error::{CnnError, Result};
use crate::layers::Layer;
use crate::tensor::{Shape, Tensor3D};
use crate::utils::SeededRng;
use tracing::debug;

/// 2D convolutional layer with learnable filters.
///
/// # Fields
///
/// * `in_channels` - Number of input channels (1 for grayscale, 3 for RGB)
/// * `out_channels` - Number of output feature maps (number of filters)
/// * `kernel_size` - Side of the square kernel, must be odd
/// * `padding` - `(kernel_size - 1) / 2`
/// * `input_height`, `input_width` - Spatial size of the input feature map
/// * `weights` - Filters laid out (out_channel, in_channel, kernel_row, kernel_col)
/// * `biases` - One bias per output channel
/// * `last_input` - Input of the most recent forward pass
///
/// # Example
///
/// ```
/// use scratch_cnn::layers::{Conv2DLayer, Layer};
/// use scratch_cnn::tensor::Tensor3D;
/// use scratch_cnn::utils::SeededRng;
///
/// let mut rng = SeededRng::new(42);
/// let mut layer = Conv2DLayer::new(1, 8, 3, 28, 28, &mut rng);
/// let out = layer.forward(&Tensor3D::new(28, 28, 1)).unwrap();
/// assert_eq!((out.height(), out.width(), out.channels()), (28, 28, 8));
/// ```
#[derive(Debug, Clone)]
pub struct Conv2DLayer {
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    padding: usize,
    input_height: usize,
    input_width: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
    last_input: Tensor3D,
}

impl Conv2DLayer {
    /// Create a new Conv2DLayer with He initialization.
    ///
    /// Weights are drawn from N(0, sqrt(2 / fan_in)) with
    /// fan_in = in_channels × kernel_size². Biases start at zero.
    ///
    /// # Panics
    ///
    /// Panics if any size is zero or `kernel_size` is even.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        input_height: usize,
        input_width: usize,
        rng: &mut SeededRng,
    ) -> Self {
        assert!(
            in_channels > 0 && out_channels > 0,
            "channel counts must be positive"
        );
        assert!(
            kernel_size % 2 == 1,
            "kernel_size must be odd to preserve spatial size, got {}",
            kernel_size
        );

        let fan_in = in_channels * kernel_size * kernel_size;
        let weight_count = out_channels * fan_in;
        let weights: Vec<f32> = (0..weight_count).map(|_| rng.he_normal(fan_in)).collect();

        debug!(
            in_channels,
            out_channels,
            kernel_size,
            input_height,
            input_width,
            "initialised conv layer"
        );

        Self {
            in_channels,
            out_channels,
            kernel_size,
            padding: (kernel_size - 1) / 2,
            input_height,
            input_width,
            weights,
            biases: vec![0.0f32; out_channels],
            last_input: Tensor3D::new(input_height, input_width, in_channels),
        }
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn input_shape(&self) -> Shape {
        Shape::new(self.input_height, self.input_width, self.in_channels)
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    fn weight_index(&self, out_channel: usize, in_channel: usize, ky: usize, kx: usize) -> usize {
        ((out_channel * self.in_channels + in_channel) * self.kernel_size + ky) * self.kernel_size
            + kx
    }

    /// Input coordinate read by kernel tap (ky, kx) at output (oy, ox), or None in the padding.
    fn source(&self, oy: usize, ox: usize, ky: usize, kx: usize) -> Option<(usize, usize)> {
        let iy = (oy + ky).checked_sub(self.padding)?;
        let ix = (ox + kx).checked_sub(self.padding)?;
        if iy < self.input_height && ix < self.input_width {
            Some((iy, ix))
        } else {
            None
        }
    }

    fn check_shape(&self, context: &'static str, expected: Shape, actual: Shape) -> Result<()> {
        if expected != actual {
            return Err(CnnError::ShapeMismatch {
                context,
                expected: expected.len(),
                actual: actual.len(),
            });
        }
        Ok(())
    }
}

impl Layer for Conv2DLayer {
    fn forward(&mut self, input: &Tensor3D) -> Result<Tensor3D> {
        self.check_shape("conv forward", self.input_shape(), input.shape())?;
        self.last_input = input.clone();

        let mut output = Tensor3D::new(self.input_height, self.input_width, self.out_channels);
        for oy in 0..self.input_height {
            for ox in 0..self.input_width {
                for oc in 0..self.out_channels {
                    let mut sum = self.biases[oc];
                    for ky in 0..self.kernel_size {
                        for kx in 0..self.kernel_size {
                            let Some((iy, ix)) = self.source(oy, ox, ky, kx) else {
                                continue;
                            };
                            for ic in 0..self.in_channels {
                                let w = self.weights[self.weight_index(oc, ic, ky, kx)];
                                sum += input.get(iy, ix, ic)? * w;
                            }
                        }
                    }
                    output.set(oy, ox, oc, sum)?;
                }
            }
        }
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Tensor3D, learning_rate: f32) -> Result<Tensor3D> {
        self.check_shape(
            "conv backward",
            Shape::new(self.input_height, self.input_width, self.out_channels),
            grad_output.shape(),
        )?;

        let mut grad_input = Tensor3D::zeros(self.input_shape());
        let mut grad_weights = vec![0.0f32; self.weights.len()];
        let mut grad_biases = vec![0.0f32; self.out_channels];

        // Accumulate everything against the forward-time weights first.
        for oy in 0..self.input_height {
            for ox in 0..self.input_width {
                for oc in 0..self.out_channels {
                    let g = grad_output.get(oy, ox, oc)?;
                    grad_biases[oc] += g;
                    for ky in 0..self.kernel_size {
                        for kx in 0..self.kernel_size {
                            let Some((iy, ix)) = self.source(oy, ox, ky, kx) else {
                                continue;
                            };
                            for ic in 0..self.in_channels {
                                let idx = self.weight_index(oc, ic, ky, kx);
                                grad_weights[idx] += g * self.last_input.get(iy, ix, ic)?;
                                grad_input.add(iy, ix, ic, g * self.weights[idx])?;
                            }
                        }
                    }
                }
            }
        }

        for (w, g) in self.weights.iter_mut().zip(&grad_weights) {
            *w -= learning_rate * g;
        }
        for (b, g) in self.biases.iter_mut().zip(&grad_biases) {
            *b -= learning_rate * g;
        }

        Ok(grad_input)
    }

    fn output_shape(&self, input: Shape) -> Shape {
        Shape::new(input.height, input.width, self.out_channels)
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}
