//! Activation and loss helpers used by the model head.
//!
//! - ReLU applied in place on feature vectors
//! - Softmax with max-subtraction for numerical stability
//! - Categorical cross-entropy with an epsilon guard inside the log

/// Added inside the logarithm so a zero probability yields a finite loss.
pub const CROSS_ENTROPY_EPSILON: f32 = 1e-9;

/// ReLU applied in-place: negative values become 0.0.
pub fn relu_inplace(data: &mut [f32]) {
    for value in data.iter_mut() {
        if *value < 0.0 {
            *value = 0.0;
        }
    }
}

/// Converts logits to a probability vector.
///
/// The maximum logit is subtracted before exponentiating so large-magnitude
/// logits cannot overflow. Returns an empty vector for empty input.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let Some(&first) = logits.first() else {
        return Vec::new();
    };
    let max_value = logits.iter().skip(1).fold(first, |m, &v| if v > m { v } else { m });

    let mut exps: Vec<f32> = logits.iter().map(|&v| (v - max_value).exp()).collect();
    let sum: f32 = exps.iter().sum();
    let inv_sum = 1.0f32 / sum;
    for value in exps.iter_mut() {
        *value *= inv_sum;
    }
    exps
}

/// Categorical cross-entropy: `-Σ t[i] * ln(p[i] + ε)`.
///
/// # Panics
///
/// Panics if the two slices differ in length.
pub fn cross_entropy(probabilities: &[f32], target: &[f32]) -> f32 {
    assert_eq!(
        probabilities.len(),
        target.len(),
        "probabilities and target must have the same length"
    );
    probabilities
        .iter()
        .zip(target)
        .map(|(&p, &t)| -t * (p + CROSS_ENTROPY_EPSILON).ln())
        .sum()
}

/// Index of the largest value; the first one wins on ties. Returns 0 for empty input.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0usize;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// One-hot vector of length `classes` with a 1.0 at `label`.
///
/// # Panics
///
/// Panics if `label >= classes`.
pub fn one_hot(label: usize, classes: usize) -> Vec<f32> {
    assert!(label < classes, "label {} out of range for {} classes", label, classes);
    let mut v = vec![0.0f32; classes];
    v[label] = 1.0;
    v
}
