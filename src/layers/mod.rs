//! Layer abstractions for the convolutional network
//!
//! Tensor-to-tensor stages (convolution, pooling, rectifier, flatten) implement
//! the [`Layer`] trait. The dense layer works on the flattened feature vector.

mod r#trait;
pub mod conv2d;
pub mod dense;
pub mod flatten;
pub mod maxpool;
pub mod relu;

// Re-export the Layer trait for convenience
pub use r#trait::Layer;
pub use conv2d::Conv2DLayer;
pub use dense::DenseLayer;
pub use flatten::FlattenLayer;
pub use maxpool::MaxPoolLayer;
pub use relu::ReluLayer;
