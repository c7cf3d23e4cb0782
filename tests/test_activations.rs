//! Tests for activation and loss helpers
//!
//! This file tests:
//! - ReLU (in place)
//! - Softmax normalisation and stability
//! - Cross-entropy including the epsilon guard
//! - argmax / one_hot helpers

use approx::{assert_abs_diff_eq, assert_relative_eq};
use scratch_cnn::utils::activations::CROSS_ENTROPY_EPSILON;
use scratch_cnn::utils::{argmax, cross_entropy, one_hot, relu_inplace, softmax};

// ============================================================================
// ReLU Tests
// ============================================================================

mod relu_tests {
    use super::*;

    #[test]
    fn test_relu_all_negative() {
        let mut data = vec![-3.0, -0.5, -1e-7];
        relu_inplace(&mut data);
        assert_eq!(data, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_relu_all_positive() {
        let mut data = vec![0.5, 3.0, 1e-7];
        relu_inplace(&mut data);
        assert_eq!(data, vec![0.5, 3.0, 1e-7]);
    }
}

// ============================================================================
// Softmax Tests
// ============================================================================

mod softmax_tests {
    use super::*;

    #[test]
    fn test_softmax_known_values() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let denom = 1.0f32.exp() + 2.0f32.exp() + 3.0f32.exp();
        assert_relative_eq!(probs[0], 1.0f32.exp() / denom, epsilon = 1e-6);
        assert_relative_eq!(probs[2], 3.0f32.exp() / denom, epsilon = 1e-6);
    }

    #[test]
    fn test_softmax_shift_invariant() {
        let a = softmax(&[0.1, -0.4, 2.0, 0.0]);
        let b = softmax(&[100.1, 99.6, 102.0, 100.0]);
        for (x, y) in a.iter().zip(&b) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_softmax_large_negative_values() {
        let probs = softmax(&[-1000.0, -1000.0]);
        assert_abs_diff_eq!(probs[0], 0.5, epsilon = 1e-6);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_softmax_ten_zero_logits() {
        for p in softmax(&[0.0; 10]) {
            assert_abs_diff_eq!(p, 0.1, epsilon = 1e-7);
        }
    }
}

// ============================================================================
// Cross-Entropy Tests
// ============================================================================

mod cross_entropy_tests {
    use super::*;

    #[test]
    fn test_cross_entropy_picks_target_class() {
        let loss = cross_entropy(&[0.2, 0.5, 0.3], &[0.0, 1.0, 0.0]);
        assert_abs_diff_eq!(loss, -(0.5f32 + CROSS_ENTROPY_EPSILON).ln(), epsilon = 1e-6);
    }

    #[test]
    fn test_cross_entropy_zero_probability_is_bounded() {
        let loss = cross_entropy(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(loss.is_finite());
        assert_abs_diff_eq!(loss, -(CROSS_ENTROPY_EPSILON).ln(), epsilon = 1e-3);
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_cross_entropy_length_mismatch_panics() {
        cross_entropy(&[0.5, 0.5], &[1.0]);
    }
}

// ============================================================================
// Helper Tests
// ============================================================================

mod helper_tests {
    use super::*;

    #[test]
    fn test_argmax_first_of_ties() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), 1);
        assert_eq!(argmax(&[]), 0);
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), 1);
    }

    #[test]
    fn test_one_hot() {
        assert_eq!(one_hot(2, 4), vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_one_hot_out_of_range() {
        one_hot(10, 10);
    }
}
