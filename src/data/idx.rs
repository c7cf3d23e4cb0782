//! IDX reader for Fashion-MNIST.
//!
//! Headers are big-endian u32s. Image files start with magic 2051, the image
//! count, rows and columns; label files with magic 2049 and the label count.

use super::{read_file, Dataset, DatasetKind};
use crate::error::DataError;
use crate::tensor::Shape;
use std::path::Path;
use tracing::info;

pub const IMAGES_MAGIC: u32 = 2051;
pub const LABELS_MAGIC: u32 = 2049;

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

// Read a big-endian u32 and advance the byte offset.
fn read_be_u32(data: &[u8], offset: &mut usize, what: &'static str) -> Result<u32, DataError> {
    let end = offset.saturating_add(4);
    let bytes = data.get(*offset..end).ok_or(DataError::Truncated {
        what,
        needed: end,
        available: data.len(),
    })?;
    *offset = end;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn expect_magic(found: u32, expected: u32, what: &'static str) -> Result<(), DataError> {
    if found != expected {
        return Err(DataError::BadMagic {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

/// Parses an IDX3 image file into per-image byte vectors and the image shape.
pub fn parse_images(data: &[u8]) -> Result<(Vec<Vec<u8>>, Shape), DataError> {
    const WHAT: &str = "IDX image file";
    let mut offset = 0usize;
    let magic = read_be_u32(data, &mut offset, WHAT)?;
    expect_magic(magic, IMAGES_MAGIC, WHAT)?;
    let count = read_be_u32(data, &mut offset, WHAT)? as usize;
    let rows = read_be_u32(data, &mut offset, WHAT)? as usize;
    let cols = read_be_u32(data, &mut offset, WHAT)? as usize;

    if rows == 0 || cols == 0 {
        return Err(DataError::BadHeader {
            what: WHAT,
            reason: "image has zero rows or columns",
        });
    }
    let image_size = rows.checked_mul(cols).ok_or(DataError::BadHeader {
        what: WHAT,
        reason: "rows * cols overflows",
    })?;
    let needed = count
        .checked_mul(image_size)
        .and_then(|pixels| pixels.checked_add(offset))
        .ok_or(DataError::BadHeader {
            what: WHAT,
            reason: "image count * image size overflows",
        })?;
    if data.len() < needed {
        return Err(DataError::Truncated {
            what: WHAT,
            needed,
            available: data.len(),
        });
    }

    let images = data[offset..needed]
        .chunks_exact(image_size)
        .map(<[u8]>::to_vec)
        .collect();
    Ok((images, Shape::new(rows, cols, 1)))
}

/// Parses an IDX1 label file.
pub fn parse_labels(data: &[u8]) -> Result<Vec<u8>, DataError> {
    const WHAT: &str = "IDX label file";
    let mut offset = 0usize;
    let magic = read_be_u32(data, &mut offset, WHAT)?;
    expect_magic(magic, LABELS_MAGIC, WHAT)?;
    let count = read_be_u32(data, &mut offset, WHAT)? as usize;

    let needed = offset.saturating_add(count);
    if data.len() < needed {
        return Err(DataError::Truncated {
            what: WHAT,
            needed,
            available: data.len(),
        });
    }
    Ok(data[offset..needed].to_vec())
}

/// Reads a matching image/label file pair.
pub fn load(images_path: &Path, labels_path: &Path) -> Result<Dataset, DataError> {
    let (images, shape) = parse_images(&read_file(images_path)?)?;
    let labels = parse_labels(&read_file(labels_path)?)?;
    Dataset::new(DatasetKind::FashionMnist, shape, images, labels)
}

/// Reads the training pair from `dir`.
pub fn load_train(dir: &Path) -> Result<Dataset, DataError> {
    let dataset = load(&dir.join(TRAIN_IMAGES), &dir.join(TRAIN_LABELS))?;
    info!(images = dataset.len(), "loaded Fashion-MNIST training split");
    Ok(dataset)
}

/// Reads the test pair from `dir`.
pub fn load_test(dir: &Path) -> Result<Dataset, DataError> {
    let dataset = load(&dir.join(TEST_IMAGES), &dir.join(TEST_LABELS))?;
    info!(images = dataset.len(), "loaded Fashion-MNIST test split");
    Ok(dataset)
}
