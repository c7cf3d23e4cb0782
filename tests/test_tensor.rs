//! Tests for the Tensor3D container
//!
//! - Zero initialisation and shape reporting
//! - Bounds checking on every axis
//! - Storage order

use scratch_cnn::error::CnnError;
use scratch_cnn::tensor::{Shape, Tensor3D};

// ============================================================================
// Construction Tests
// ============================================================================

mod construction_tests {
    use super::*;

    #[test]
    fn test_new_reports_dimensions() {
        let t = Tensor3D::new(28, 28, 1);
        assert_eq!(t.height(), 28);
        assert_eq!(t.width(), 28);
        assert_eq!(t.channels(), 1);
        assert_eq!(t.len(), 784);
    }

    #[test]
    fn test_every_element_starts_at_zero() {
        let t = Tensor3D::new(4, 5, 3);
        for r in 0..4 {
            for c in 0..5 {
                for ch in 0..3 {
                    assert_eq!(t.get(r, c, ch).unwrap(), 0.0);
                }
            }
        }
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(Shape::new(32, 32, 3).to_string(), "32x32x3");
    }

    #[test]
    fn test_from_vec_keeps_order() {
        let t = Tensor3D::from_vec(Shape::new(1, 2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(t.get(0, 0, 1).unwrap(), 2.0);
        assert_eq!(t.get(0, 1, 0).unwrap(), 3.0);
        assert_eq!(t.into_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }
}

// ============================================================================
// Access Tests
// ============================================================================

mod access_tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let mut t = Tensor3D::new(3, 3, 2);
        t.set(2, 1, 1, -4.5).unwrap();
        assert_eq!(t.get(2, 1, 1).unwrap(), -4.5);
        assert_eq!(t.get(2, 1, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_out_of_range_set_is_error_and_leaves_tensor_untouched() {
        let mut t = Tensor3D::new(2, 2, 1);
        let before = t.clone();
        let err = t.set(0, 0, 1, 9.0).unwrap_err();
        assert_eq!(
            err,
            CnnError::Index {
                row: 0,
                col: 0,
                channel: 1,
                shape: Shape::new(2, 2, 1),
            }
        );
        assert_eq!(t, before);
    }

    #[test]
    fn test_last_valid_index() {
        let mut t = Tensor3D::new(7, 7, 16);
        t.set(6, 6, 15, 1.0).unwrap();
        assert_eq!(t.as_slice()[t.len() - 1], 1.0);
        assert!(t.get(7, 6, 15).is_err());
    }
}
