//! Classification metrics for evaluating model performance.
//!
//! Provides accuracy, precision, recall, F1-score, and confusion matrix
//! computation for multi-class classification tasks.

use crate::primitives::Matrix;

/// Averaging strategy for multi-class metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Average {
    /// Calculate metrics for each label, return unweighted mean.
    Macro,
    /// Calculate metrics globally by counting total TP, FP, FN.
    Micro,
    /// Weighted mean by support (number of true instances per label).
    Weighted,
}

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use trayecto::metrics::accuracy;
///
/// let y_true = vec![0, 1, 2, 0, 1, 2];
/// let y_pred = vec![0, 2, 1, 0, 0, 1];
/// let acc = accuracy(&y_pred, &y_true);
/// assert!((acc - 0.333333).abs() < 0.001);
/// ```
#[must_use]
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(p, t)| p == t)
        .count();

    correct as f32 / y_true.len() as f32
}

/// Compute precision score.
///
/// precision = TP / (TP + FP)
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn precision(y_pred: &[usize], y_true: &[usize], average: Average) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let n_classes = class_count(y_pred, y_true);
    if n_classes == 0 {
        return 0.0;
    }

    let counts = ClassCounts::tally(y_pred, y_true, n_classes);
    let per_class: Vec<f32> = (0..n_classes)
        .map(|i| ratio(counts.tp[i], counts.tp[i] + counts.fp[i]))
        .collect();

    match average {
        Average::Micro => {
            let total_tp: usize = counts.tp.iter().sum();
            let total_fp: usize = counts.fp.iter().sum();
            ratio(total_tp, total_tp + total_fp)
        }
        Average::Macro => mean(&per_class),
        Average::Weighted => weighted_mean(&per_class, &counts.support),
    }
}

/// Compute recall score.
///
/// recall = TP / (TP + FN)
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn recall(y_pred: &[usize], y_true: &[usize], average: Average) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let n_classes = class_count(y_pred, y_true);
    if n_classes == 0 {
        return 0.0;
    }

    let counts = ClassCounts::tally(y_pred, y_true, n_classes);
    let per_class: Vec<f32> = (0..n_classes)
        .map(|i| ratio(counts.tp[i], counts.tp[i] + counts.fn_[i]))
        .collect();

    match average {
        Average::Micro => {
            let total_tp: usize = counts.tp.iter().sum();
            let total_fn: usize = counts.fn_.iter().sum();
            ratio(total_tp, total_tp + total_fn)
        }
        Average::Macro => mean(&per_class),
        Average::Weighted => weighted_mean(&per_class, &counts.support),
    }
}

/// Compute F1 score, the harmonic mean of precision and recall.
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use trayecto::metrics::{f1_score, Average};
///
/// let y_true = vec![0, 1, 0, 1];
/// let y_pred = vec![0, 1, 0, 1];
/// let f1 = f1_score(&y_pred, &y_true, Average::Macro);
/// assert!((f1 - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn f1_score(y_pred: &[usize], y_true: &[usize], average: Average) -> f32 {
    let p = precision(y_pred, y_true, average);
    let r = recall(y_pred, y_true, average);
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

/// Compute the confusion matrix.
///
/// Entry `(i, j)` counts samples of true class `i` predicted as class `j`.
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use trayecto::metrics::confusion_matrix;
///
/// let y_true = vec![0, 1, 1];
/// let y_pred = vec![0, 1, 0];
/// let cm = confusion_matrix(&y_pred, &y_true);
/// assert_eq!(cm.get(0, 0), 1);
/// assert_eq!(cm.get(1, 0), 1);
/// assert_eq!(cm.get(1, 1), 1);
/// ```
#[must_use]
pub fn confusion_matrix(y_pred: &[usize], y_true: &[usize]) -> Matrix<usize> {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let n_classes = class_count(y_pred, y_true);
    let mut cells = vec![0usize; n_classes * n_classes];
    for (&p, &t) in y_pred.iter().zip(y_true.iter()) {
        cells[t * n_classes + p] += 1;
    }
    Matrix::from_vec(n_classes, n_classes, cells).expect("square matrix of n_classes^2 cells")
}

/// Number of classes implied by the label vectors.
fn class_count(y_pred: &[usize], y_true: &[usize]) -> usize {
    y_true
        .iter()
        .chain(y_pred.iter())
        .max()
        .map_or(0, |&m| m + 1)
}

/// Per-class true positive / false positive / false negative tallies.
struct ClassCounts {
    tp: Vec<usize>,
    fp: Vec<usize>,
    fn_: Vec<usize>,
    support: Vec<usize>,
}

impl ClassCounts {
    fn tally(y_pred: &[usize], y_true: &[usize], n_classes: usize) -> Self {
        let mut tp = vec![0usize; n_classes];
        let mut fp = vec![0usize; n_classes];
        let mut fn_ = vec![0usize; n_classes];
        let mut support = vec![0usize; n_classes];

        for (&p, &t) in y_pred.iter().zip(y_true.iter()) {
            support[t] += 1;
            if p == t {
                tp[t] += 1;
            } else {
                fp[p] += 1;
                fn_[t] += 1;
            }
        }

        Self {
            tp,
            fp,
            fn_,
            support,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f32 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f32 / denominator as f32
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

fn weighted_mean(values: &[f32], weights: &[usize]) -> f32 {
    let total: usize = weights.iter().sum();
    if total == 0 {
        return 0.0;
    }
    values
        .iter()
        .zip(weights.iter())
        .map(|(&v, &w)| v * w as f32)
        .sum::<f32>()
        / total as f32
}
