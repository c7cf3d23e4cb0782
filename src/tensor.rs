//! Dense three-axis tensor used by every layer.
//!
//! Elements are addressed by (row, column, channel) and stored contiguously with
//! channels innermost: `index = (row * width + col) * channels + channel`.

use crate::error::{CnnError, Result};
use std::fmt;

/// Extents of a [`Tensor3D`]: height × width × channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl Shape {
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Total number of elements described by this shape.
    pub const fn len(&self) -> usize {
        self.height * self.width * self.channels
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// Zero-initialised, fixed-shape buffer of `f32` values.
///
/// Element access is bounds-checked on all three axes and reports violations as
/// [`CnnError::Index`]. Reshaping means building a new tensor and copying.
///
/// # Example
///
/// ```
/// use scratch_cnn::tensor::Tensor3D;
///
/// let mut t = Tensor3D::new(2, 3, 4);
/// t.set(1, 2, 3, 0.5).unwrap();
/// assert_eq!(t.get(1, 2, 3).unwrap(), 0.5);
/// assert!(t.get(2, 0, 0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tensor3D {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor3D {
    /// Creates a zero-filled tensor of `height * width * channels` elements.
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self::zeros(Shape::new(height, width, channels))
    }

    pub fn zeros(shape: Shape) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.len()],
        }
    }

    /// Creates a tensor of `shape` with every element set to `value`.
    pub fn filled(shape: Shape, value: f32) -> Self {
        Self {
            shape,
            data: vec![value; shape.len()],
        }
    }

    /// Wraps an existing buffer laid out row, then column, then channel.
    pub fn from_vec(shape: Shape, data: Vec<f32>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(CnnError::ShapeMismatch {
                context: "tensor construction",
                expected: shape.len(),
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Wraps a feature vector as a 1 × 1 × N tensor.
    pub fn vector(data: Vec<f32>) -> Self {
        Self {
            shape: Shape::new(1, 1, data.len()),
            data,
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn height(&self) -> usize {
        self.shape.height
    }

    pub fn width(&self) -> usize {
        self.shape.width
    }

    pub fn channels(&self) -> usize {
        self.shape.channels
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn offset(&self, row: usize, col: usize, channel: usize) -> Result<usize> {
        if row >= self.shape.height || col >= self.shape.width || channel >= self.shape.channels {
            return Err(CnnError::Index {
                row,
                col,
                channel,
                shape: self.shape,
            });
        }
        Ok((row * self.shape.width + col) * self.shape.channels + channel)
    }

    /// Reads the element at (row, col, channel).
    pub fn get(&self, row: usize, col: usize, channel: usize) -> Result<f32> {
        let idx = self.offset(row, col, channel)?;
        Ok(self.data[idx])
    }

    /// Overwrites the element at (row, col, channel).
    pub fn set(&mut self, row: usize, col: usize, channel: usize, value: f32) -> Result<()> {
        let idx = self.offset(row, col, channel)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Adds `value` to the element at (row, col, channel).
    pub fn add(&mut self, row: usize, col: usize, channel: usize, value: f32) -> Result<()> {
        let idx = self.offset(row, col, channel)?;
        self.data[idx] += value;
        Ok(())
    }

    /// Resets every element to zero in place.
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Raw elements in storage order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}
