//! Loader tests against synthetic dataset files
//!
//! - CIFAR-10 batch directories (train and test splits)
//! - Fashion-MNIST IDX pairs
//! - Error reporting for missing, truncated and inconsistent files

use scratch_cnn::data::cifar10::{self, IMAGE_BYTES, RECORD_BYTES};
use scratch_cnn::data::idx::{self, IMAGES_MAGIC, LABELS_MAGIC};
use scratch_cnn::data::DatasetKind;
use scratch_cnn::error::DataError;
use scratch_cnn::tensor::Shape;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cifar_record(label: u8, fill: u8) -> Vec<u8> {
    let mut rec = vec![label];
    // red plane = fill, green = fill + 1, blue = fill + 2
    for ch in 0..3u8 {
        rec.extend(std::iter::repeat(fill.wrapping_add(ch)).take(IMAGE_BYTES / 3));
    }
    rec
}

fn write_cifar_batch(dir: &Path, name: &str, labels: &[u8]) {
    let bytes: Vec<u8> = labels
        .iter()
        .enumerate()
        .flat_map(|(i, &l)| cifar_record(l, i as u8 * 10))
        .collect();
    fs::write(dir.join(name), bytes).unwrap();
}

fn idx_images(count: u32, rows: u32, cols: u32) -> Vec<u8> {
    let mut bytes: Vec<u8> = [IMAGES_MAGIC, count, rows, cols]
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect();
    bytes.extend((0..count * rows * cols).map(|i| (i % 256) as u8));
    bytes
}

fn idx_labels(labels: &[u8]) -> Vec<u8> {
    let mut bytes: Vec<u8> = [LABELS_MAGIC, labels.len() as u32]
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect();
    bytes.extend_from_slice(labels);
    bytes
}

// ============================================================================
// CIFAR-10 Tests
// ============================================================================

mod cifar10_tests {
    use super::*;

    #[test]
    fn test_load_train_concatenates_five_batches() {
        let dir = TempDir::new().unwrap();
        for batch in 1..=5u8 {
            write_cifar_batch(dir.path(), &format!("data_batch_{}.bin", batch), &[batch, 0]);
        }

        let data = cifar10::load_train(dir.path()).unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(data.kind(), DatasetKind::Cifar10);
        assert_eq!(data.shape(), Shape::new(32, 32, 3));
        assert_eq!(data.labels(), &[1, 0, 2, 0, 3, 0, 4, 0, 5, 0]);
    }

    #[test]
    fn test_load_test_split_interleaves_channels() {
        let dir = TempDir::new().unwrap();
        write_cifar_batch(dir.path(), "test_batch.bin", &[6, 2]);

        let data = DatasetKind::Cifar10.load_test(dir.path()).unwrap();
        assert_eq!(data.len(), 2);
        // second record was filled with 10, 11, 12
        assert_eq!(&data.image(1)[..3], &[10, 11, 12]);

        let t = data.tensor(1).unwrap();
        assert_eq!(t.get(31, 31, 2).unwrap(), 12.0 / 255.0);
    }

    #[test]
    fn test_missing_batch_is_io_error() {
        let dir = TempDir::new().unwrap();
        for batch in 1..=4u8 {
            write_cifar_batch(dir.path(), &format!("data_batch_{}.bin", batch), &[0]);
        }
        let err = cifar10::load_train(dir.path()).unwrap_err();
        match err {
            DataError::Io { path, .. } => assert!(path.ends_with("data_batch_5.bin")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_label_outside_classes_rejected() {
        let dir = TempDir::new().unwrap();
        write_cifar_batch(dir.path(), "test_batch.bin", &[3, 12, 4]);

        match cifar10::load_test(dir.path()).unwrap_err() {
            DataError::LabelOutOfRange { index, label, .. } => {
                assert_eq!(index, 1);
                assert_eq!(label, 12);
            }
            other => panic!("expected LabelOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_batch_file() {
        let dir = TempDir::new().unwrap();
        let mut bytes = cifar_record(1, 0);
        bytes.truncate(RECORD_BYTES - 100);
        fs::write(dir.path().join("test_batch.bin"), bytes).unwrap();

        assert!(matches!(
            cifar10::load_test(dir.path()),
            Err(DataError::Truncated { .. })
        ));
    }
}

// ============================================================================
// Fashion-MNIST Tests
// ============================================================================

mod idx_tests {
    use super::*;

    #[test]
    fn test_load_train_pair() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(idx::TRAIN_IMAGES), idx_images(3, 28, 28)).unwrap();
        fs::write(dir.path().join(idx::TRAIN_LABELS), idx_labels(&[9, 0, 4])).unwrap();

        let data = DatasetKind::FashionMnist.load_train(dir.path()).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.shape(), Shape::new(28, 28, 1));
        assert_eq!(data.label(0), 9);
        assert_eq!(data.kind().class_name(data.label(0)), "Ankle boot");
        // image 1 starts at pixel index 784, 784 % 256 = 16
        assert_eq!(data.image(1)[0], 16);
    }

    #[test]
    fn test_load_test_pair() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(idx::TEST_IMAGES), idx_images(2, 28, 28)).unwrap();
        fs::write(dir.path().join(idx::TEST_LABELS), idx_labels(&[1, 2])).unwrap();

        let data = idx::load_test(dir.path()).unwrap();
        assert_eq!(data.labels(), &[1, 2]);
        assert_eq!(data.images().len(), 2);
        assert!(data.images().iter().all(|img| img.len() == 784));
    }

    #[test]
    fn test_label_byte_outside_classes_rejected() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("imgs");
        let labels = dir.path().join("lbls");
        fs::write(&images, idx_images(2, 4, 4)).unwrap();
        fs::write(&labels, idx_labels(&[0, 255])).unwrap();

        assert!(matches!(
            idx::load(&images, &labels),
            Err(DataError::LabelOutOfRange { index: 1, label: 255, .. })
        ));
    }

    #[test]
    fn test_overflowing_dimensions_are_an_error() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("imgs");
        let labels = dir.path().join("lbls");
        let header: Vec<u8> = [IMAGES_MAGIC, 2, u32::MAX, u32::MAX]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect();
        fs::write(&images, header).unwrap();
        fs::write(&labels, idx_labels(&[0, 1])).unwrap();

        assert!(matches!(
            idx::load(&images, &labels),
            Err(DataError::BadHeader { .. })
        ));
    }

    #[test]
    fn test_count_mismatch() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("imgs");
        let labels = dir.path().join("lbls");
        fs::write(&images, idx_images(3, 4, 4)).unwrap();
        fs::write(&labels, idx_labels(&[1, 2])).unwrap();

        assert!(matches!(
            idx::load(&images, &labels),
            Err(DataError::CountMismatch { images: 3, labels: 2 })
        ));
    }

    #[test]
    fn test_swapped_files_fail_magic_check() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("imgs");
        let labels = dir.path().join("lbls");
        fs::write(&images, idx_images(1, 2, 2)).unwrap();
        fs::write(&labels, idx_labels(&[1])).unwrap();

        assert!(matches!(
            idx::load(&labels, &images),
            Err(DataError::BadMagic { .. })
        ));
    }
}
