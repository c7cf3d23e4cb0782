//! Dataset loading for the two supported image sets.
//!
//! - `cifar10`: CIFAR-10 binary batches (32×32 RGB)
//! - `idx`: Fashion-MNIST IDX files (28×28 grayscale)
//!
//! Both loaders produce a [`Dataset`] of raw `u8` pixels with channels interleaved
//! per pixel, the same layout [`Tensor3D`] uses.

pub mod cifar10;
pub mod idx;

use crate::error::{DataError, Result};
use crate::model::NUM_CLASSES;
use crate::tensor::{Shape, Tensor3D};
use crate::utils::one_hot;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const CIFAR10_CLASSES: [&str; NUM_CLASSES] = [
    "airplane",
    "automobile",
    "bird",
    "cat",
    "deer",
    "dog",
    "frog",
    "horse",
    "ship",
    "truck",
];

const FASHION_MNIST_CLASSES: [&str; NUM_CLASSES] = [
    "T-shirt/top",
    "Trouser",
    "Pullover",
    "Dress",
    "Coat",
    "Sandal",
    "Shirt",
    "Sneaker",
    "Bag",
    "Ankle boot",
];

/// Which image set a [`Dataset`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Cifar10,
    FashionMnist,
}

impl DatasetKind {
    /// Name used in configuration files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Cifar10 => "cifar10",
            DatasetKind::FashionMnist => "fashion_mnist",
        }
    }

    pub fn class_names(&self) -> &'static [&'static str] {
        match self {
            DatasetKind::Cifar10 => &CIFAR10_CLASSES,
            DatasetKind::FashionMnist => &FASHION_MNIST_CLASSES,
        }
    }

    /// Human-readable label for `class_id`, or `"unknown"` when out of range.
    pub fn class_name(&self, class_id: usize) -> &'static str {
        self.class_names().get(class_id).copied().unwrap_or("unknown")
    }

    /// Shape of one image as fed to the model.
    pub fn input_shape(&self) -> Shape {
        match self {
            DatasetKind::Cifar10 => Shape::new(
                cifar10::IMAGE_SIDE,
                cifar10::IMAGE_SIDE,
                cifar10::CHANNELS,
            ),
            DatasetKind::FashionMnist => Shape::new(28, 28, 1),
        }
    }

    /// Loads the training split found under `dir`.
    pub fn load_train(&self, dir: &Path) -> std::result::Result<Dataset, DataError> {
        match self {
            DatasetKind::Cifar10 => cifar10::load_train(dir),
            DatasetKind::FashionMnist => idx::load_train(dir),
        }
    }

    /// Loads the test split found under `dir`.
    pub fn load_test(&self, dir: &Path) -> std::result::Result<Dataset, DataError> {
        match self {
            DatasetKind::Cifar10 => cifar10::load_test(dir),
            DatasetKind::FashionMnist => idx::load_test(dir),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = DataError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cifar10" | "cifar-10" => Ok(DatasetKind::Cifar10),
            "fashion_mnist" | "fashion-mnist" => Ok(DatasetKind::FashionMnist),
            _ => Err(DataError::UnknownDataset(s.to_string())),
        }
    }
}

/// Labelled images held as raw bytes.
///
/// Every image has exactly `shape.len()` bytes, interleaved per pixel.
#[derive(Debug, Clone)]
pub struct Dataset {
    kind: DatasetKind,
    shape: Shape,
    images: Vec<Vec<u8>>,
    labels: Vec<u8>,
}

impl Dataset {
    /// Builds a dataset after checking counts, per-image sizes and that every
    /// label names one of the ten classes.
    pub fn new(
        kind: DatasetKind,
        shape: Shape,
        images: Vec<Vec<u8>>,
        labels: Vec<u8>,
    ) -> std::result::Result<Self, DataError> {
        if images.len() != labels.len() {
            return Err(DataError::CountMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }
        if let Some(short) = images.iter().find(|img| img.len() != shape.len()) {
            return Err(DataError::Truncated {
                what: "image",
                needed: shape.len(),
                available: short.len(),
            });
        }
        if let Some((index, &label)) = labels
            .iter()
            .enumerate()
            .find(|&(_, &label)| label as usize >= NUM_CLASSES)
        {
            return Err(DataError::LabelOutOfRange {
                index,
                label,
                classes: NUM_CLASSES,
            });
        }
        Ok(Self {
            kind,
            shape,
            images,
            labels,
        })
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[Vec<u8>] {
        &self.images
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Raw bytes of image `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn image(&self, index: usize) -> &[u8] {
        &self.images[index]
    }

    pub fn label(&self, index: usize) -> usize {
        self.labels[index] as usize
    }

    /// Image `index` with pixels scaled from 0..=255 to [0, 1].
    pub fn tensor(&self, index: usize) -> Result<Tensor3D> {
        image_to_tensor(self.shape, &self.images[index])
    }

    /// One-hot target for image `index`.
    ///
    /// # Panics
    ///
    /// Panics if the stored label is not below the class count.
    pub fn one_hot(&self, index: usize) -> Vec<f32> {
        one_hot(self.label(index), NUM_CLASSES)
    }

    /// Appends another dataset of the same kind and shape.
    pub fn extend(&mut self, other: Dataset) -> std::result::Result<(), DataError> {
        if other.shape != self.shape {
            return Err(DataError::Truncated {
                what: "image",
                needed: self.shape.len(),
                available: other.shape.len(),
            });
        }
        self.images.extend(other.images);
        self.labels.extend(other.labels);
        Ok(())
    }
}

/// Scales raw pixels of an image of `shape` into a [0, 1] tensor.
pub fn image_to_tensor(shape: Shape, image: &[u8]) -> Result<Tensor3D> {
    let data = image.iter().map(|&px| f32::from(px) / 255.0).collect();
    Tensor3D::from_vec(shape, data)
}

pub(crate) fn read_file(path: &Path) -> std::result::Result<Vec<u8>, DataError> {
    fs::read(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })
}
