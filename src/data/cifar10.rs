//! CIFAR-10 binary batch reader.
//!
//! Each record is one label byte followed by 3072 pixel bytes stored as three
//! 32×32 planes (red, then green, then blue). Records are converted to the
//! interleaved RGBRGB... layout on load.

use super::{read_file, Dataset, DatasetKind};
use crate::error::DataError;
use std::path::Path;
use tracing::{debug, info};

pub const IMAGE_SIDE: usize = 32;
pub const CHANNELS: usize = 3;
const PLANE_BYTES: usize = IMAGE_SIDE * IMAGE_SIDE;
pub const IMAGE_BYTES: usize = PLANE_BYTES * CHANNELS;
pub const RECORD_BYTES: usize = 1 + IMAGE_BYTES;

/// Number of `data_batch_N.bin` files in the training split.
pub const TRAIN_BATCHES: usize = 5;

/// Splits a batch file into interleaved images and labels.
///
/// Any trailing bytes that do not form a whole record are reported as truncation.
pub fn parse_batch(bytes: &[u8]) -> Result<(Vec<Vec<u8>>, Vec<u8>), DataError> {
    let remainder = bytes.len() % RECORD_BYTES;
    if remainder != 0 {
        return Err(DataError::Truncated {
            what: "CIFAR-10 batch",
            needed: bytes.len() - remainder + RECORD_BYTES,
            available: bytes.len(),
        });
    }

    let count = bytes.len() / RECORD_BYTES;
    let mut images = Vec::with_capacity(count);
    let mut labels = Vec::with_capacity(count);

    for record in bytes.chunks_exact(RECORD_BYTES) {
        labels.push(record[0]);
        let planes = &record[1..];
        let mut image = vec![0u8; IMAGE_BYTES];
        for pixel in 0..PLANE_BYTES {
            for ch in 0..CHANNELS {
                image[pixel * CHANNELS + ch] = planes[ch * PLANE_BYTES + pixel];
            }
        }
        images.push(image);
    }

    Ok((images, labels))
}

/// Reads one batch file.
pub fn load_batch(path: &Path) -> Result<Dataset, DataError> {
    let bytes = read_file(path)?;
    let (images, labels) = parse_batch(&bytes)?;
    debug!(path = %path.display(), records = images.len(), "read CIFAR-10 batch");
    Dataset::new(
        DatasetKind::Cifar10,
        DatasetKind::Cifar10.input_shape(),
        images,
        labels,
    )
}

/// Reads `data_batch_1.bin` through `data_batch_5.bin` from `dir`.
pub fn load_train(dir: &Path) -> Result<Dataset, DataError> {
    let mut dataset = load_batch(&dir.join("data_batch_1.bin"))?;
    for batch in 2..=TRAIN_BATCHES {
        dataset.extend(load_batch(&dir.join(format!("data_batch_{}.bin", batch)))?)?;
    }
    info!(images = dataset.len(), "loaded CIFAR-10 training split");
    Ok(dataset)
}

/// Reads `test_batch.bin` from `dir`.
pub fn load_test(dir: &Path) -> Result<Dataset, DataError> {
    let dataset = load_batch(&dir.join("test_batch.bin"))?;
    info!(images = dataset.len(), "loaded CIFAR-10 test split");
    Ok(dataset)
}
