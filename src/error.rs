//! Error types for the engine, the dataset readers and configuration loading.
//!
//! The core only ever produces [`CnnError`]. Loader and configuration failures have
//! their own enums so the engine stays free of I/O concerns.

use crate::tensor::Shape;
use thiserror::Error;

/// Failures raised by tensors, layers and the model.
///
/// Neither variant is recovered internally: both indicate that a caller handed the
/// engine inconsistent coordinates or shapes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CnnError {
    /// A tensor coordinate fell outside the tensor's extents.
    #[error("tensor index ({row}, {col}, {channel}) out of bounds for shape {shape}")]
    Index {
        row: usize,
        col: usize,
        channel: usize,
        shape: Shape,
    },

    /// A buffer's element count disagrees with the shape the layer expects.
    #[error("shape mismatch in {context}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, CnnError>;

/// Failures while reading CIFAR-10 or IDX dataset files.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bad magic number in {what}: expected {expected}, found {found}")]
    BadMagic {
        what: &'static str,
        expected: u32,
        found: u32,
    },

    #[error("{what} is truncated: needed {needed} bytes, only {available} available")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("{what} has an invalid header: {reason}")]
    BadHeader {
        what: &'static str,
        reason: &'static str,
    },

    #[error("image count {images} does not match label count {labels}")]
    CountMismatch { images: usize, labels: usize },

    #[error("label {label} of image {index} is outside 0..{classes}")]
    LabelOutOfRange {
        index: usize,
        label: u8,
        classes: usize,
    },

    #[error("unknown dataset '{0}' (expected \"cifar10\" or \"fashion_mnist\")")]
    UnknownDataset(String),
}

/// Failures while loading or validating a training configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
