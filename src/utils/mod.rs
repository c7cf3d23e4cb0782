//! Shared helpers: the injected random source and activation/loss functions.

pub mod activations;
pub mod rng;

pub use activations::{argmax, cross_entropy, one_hot, relu_inplace, softmax};
pub use rng::SeededRng;
