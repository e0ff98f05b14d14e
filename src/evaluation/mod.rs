//! The reportable result of evaluating a model.
//!
//! An [`Evaluation`] is constructed from a model's identifying summary, the
//! evaluated data, and the prediction sequence; it is read-only after
//! construction. The report math lives in [`crate::metrics`].

use std::fmt;

use crate::dataset::Samples;
use crate::metrics::{accuracy, confusion_matrix, f1_score, precision, recall, Average};
use crate::model::Summary;
use crate::primitives::Matrix;

/// A model evaluation over a dataset.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use trayecto::evaluation::Evaluation;
/// use trayecto::dataset::TrajectoryDataset;
/// use trayecto::trajectory::Trajectory;
///
/// let trajectories = vec![
///     Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, 1.0, 0.0)]).expect("points"),
///     Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, 0.0, 1.0)]).expect("points"),
/// ];
/// let dataset = TrajectoryDataset::new(trajectories, vec![0, 1]).expect("dataset");
///
/// let evaluation = Evaluation::new(BTreeMap::new(), &dataset, vec![0, 0]);
/// assert!((evaluation.accuracy() - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct Evaluation {
    summary: Summary,
    y_true: Vec<usize>,
    y_pred: Vec<usize>,
    class_names: Vec<String>,
}

impl Evaluation {
    /// Builds an evaluation from a model summary, the evaluated data, and
    /// the prediction sequence.
    ///
    /// The prediction sequence is expected to hold one label per sample in
    /// input order; the reporting operations assume it.
    #[must_use]
    pub fn new(summary: Summary, data: &dyn Samples, predictions: Vec<usize>) -> Self {
        let y_true = data.labels();
        let n_classes = data
            .class_count()
            .max(predictions.iter().copied().max().map_or(0, |m| m + 1));
        let class_names = (0..n_classes)
            .map(|label| {
                data.class_name(label)
                    .map_or_else(|| format!("class {label}"), str::to_string)
            })
            .collect();

        Self {
            summary,
            y_true,
            y_pred: predictions,
            class_names,
        }
    }

    /// The identifying summary of the evaluated model.
    #[must_use]
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// True labels, in sample order.
    #[must_use]
    pub fn true_labels(&self) -> &[usize] {
        &self.y_true
    }

    /// Predicted labels, in sample order.
    #[must_use]
    pub fn predictions(&self) -> &[usize] {
        &self.y_pred
    }

    /// Classification accuracy.
    ///
    /// # Panics
    ///
    /// Panics if the prediction sequence length doesn't match the sample
    /// count or the evaluation is empty.
    #[must_use]
    pub fn accuracy(&self) -> f32 {
        accuracy(&self.y_pred, &self.y_true)
    }

    /// Precision under the given averaging strategy.
    #[must_use]
    pub fn precision(&self, average: Average) -> f32 {
        precision(&self.y_pred, &self.y_true, average)
    }

    /// Recall under the given averaging strategy.
    #[must_use]
    pub fn recall(&self, average: Average) -> f32 {
        recall(&self.y_pred, &self.y_true, average)
    }

    /// F1 score under the given averaging strategy.
    #[must_use]
    pub fn f1_score(&self, average: Average) -> f32 {
        f1_score(&self.y_pred, &self.y_true, average)
    }

    /// Confusion matrix; entry `(i, j)` counts samples of true class `i`
    /// predicted as class `j`.
    #[must_use]
    pub fn confusion_matrix(&self) -> Matrix<usize> {
        confusion_matrix(&self.y_pred, &self.y_true)
    }

    /// Prints the evaluation report to stdout.
    pub fn show(&self) {
        println!("{self}");
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evaluation")?;
        for (key, value) in &self.summary {
            writeln!(f, "  {key}: {value}")?;
        }
        writeln!(f, "  samples: {}", self.y_true.len())?;
        writeln!(f, "  accuracy: {:.4}", self.accuracy())?;
        writeln!(f, "  f1 (macro): {:.4}", self.f1_score(Average::Macro))?;

        let cm = self.confusion_matrix();
        writeln!(f, "  confusion matrix (rows = true class):")?;
        for i in 0..cm.n_rows() {
            let name = self
                .class_names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("class {i}"));
            write!(f, "    {name:>12}")?;
            for j in 0..cm.n_cols() {
                write!(f, " {:>5}", cm.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
