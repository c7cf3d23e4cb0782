//! Small convolutional network trained from scratch with per-sample SGD.
//!
//! The engine has no external math dependency: tensors are plain `Vec<f32>`
//! buffers and every layer computes its own forward and backward pass.
//!
//! # Modules
//!
//! - `tensor`: Three-axis tensor with bounds-checked access
//! - `layers`: Layer trait and implementations (Conv2D, MaxPool, ReLU, Flatten, Dense)
//! - `model`: Fixed conv/pool/dense classifier with softmax + cross-entropy
//! - `utils`: Seeded RNG and activation helpers
//! - `data`: CIFAR-10 and Fashion-MNIST loaders
//! - `config`: Training configuration structures
//! - `trainer`: Training loop and evaluation
//! - `viewer`: Display seam for training progress
//! - `error`: Error types

pub mod config;
pub mod data;
pub mod error;
pub mod layers;
pub mod model;
pub mod tensor;
pub mod trainer;
pub mod utils;
pub mod viewer;

pub use error::{CnnError, Result};
pub use model::CnnModel;
pub use tensor::{Shape, Tensor3D};
