//! K-Nearest Neighbors model variant.

use crate::dataset::Samples;
use crate::error::{Result, TrayectoError};
use crate::features::Featurizer;
use crate::model::{Model, ModelCore};
use crate::model_selection::KFold;
use crate::primitives::Matrix;

use super::record_fold_scores;

/// Distance metric for neighbor search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance.
    Euclidean,
    /// Manhattan (L1) distance.
    Manhattan,
}

impl DistanceMetric {
    fn between(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(&x, &y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            DistanceMetric::Manhattan => {
                a.iter().zip(b.iter()).map(|(&x, &y)| (x - y).abs()).sum()
            }
        }
    }

    fn label(self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Manhattan => "manhattan",
        }
    }
}

/// K-Nearest Neighbors over featurized trajectories.
///
/// A lazy learner: `fit` extracts and stores the training feature matrix,
/// prediction finds the k closest training samples and votes. Does not
/// support persistence, so `save` keeps the contract default.
///
/// # Examples
///
/// ```
/// use trayecto::prelude::*;
/// use trayecto::trajectory::Trajectory;
///
/// let trajectories: Vec<_> = (0..4)
///     .map(|i| {
///         let reach = if i % 2 == 0 { 1.0 } else { 8.0 };
///         Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, reach, 0.0)]).expect("points")
///     })
///     .collect();
/// let dataset = TrajectoryDataset::new(trajectories, vec![0, 1, 0, 1]).expect("dataset");
///
/// let mut model = KNeighborsModel::new(KinematicFeaturizer::new(), 1);
/// model.train(&dataset, 0).expect("training succeeds");
/// let predictions = model.predict(&dataset).expect("trained model predicts");
/// assert_eq!(predictions, vec![0, 1, 0, 1]);
/// ```
pub struct KNeighborsModel {
    core: ModelCore,
    featurizer: Box<dyn Featurizer>,
    k: usize,
    metric: DistanceMetric,
    weights: bool,
    x_train: Option<Matrix<f32>>,
    y_train: Option<Vec<usize>>,
}

impl KNeighborsModel {
    /// Creates an untrained k-NN model.
    ///
    /// # Arguments
    ///
    /// * `featurizer` - Feature extraction collaborator
    /// * `k` - Number of neighbors to use for voting
    pub fn new(featurizer: impl Featurizer + 'static, k: usize) -> Self {
        let mut core = ModelCore::new("k_neighbors");
        core.record("k", k);
        core.record("metric", DistanceMetric::Euclidean.label());
        core.record("weighted", false);
        Self {
            core,
            featurizer: Box::new(featurizer),
            k,
            metric: DistanceMetric::Euclidean,
            weights: false,
            x_train: None,
            y_train: None,
        }
    }

    /// Sets the distance metric.
    #[must_use]
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self.core.record("metric", metric.label());
        self
    }

    /// Enables inverse-distance weighted voting.
    #[must_use]
    pub fn with_weights(mut self, weights: bool) -> Self {
        self.weights = weights;
        self.core.record("weighted", weights);
        self
    }

    /// Predicts labels for `x` rows against the given training data.
    fn vote_rows(
        &self,
        x_train: &Matrix<f32>,
        y_train: &[usize],
        x: &Matrix<f32>,
    ) -> Vec<usize> {
        // A fold can shrink the training side below k.
        let k = self.k.min(y_train.len());
        let mut predictions = Vec::with_capacity(x.n_rows());

        for i in 0..x.n_rows() {
            let row = x.row(i);
            let mut distances: Vec<(f32, usize)> = y_train
                .iter()
                .enumerate()
                .map(|(j, &label)| (self.metric.between(row, x_train.row(j)), label))
                .collect();
            distances
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            let k_nearest = &distances[..k];

            let predicted = if self.weights {
                weighted_vote(k_nearest)
            } else {
                majority_vote(k_nearest)
            };
            predictions.push(predicted);
        }

        predictions
    }

    fn cross_validate(&mut self, x: &Matrix<f32>, y: &[usize], folds: usize) -> Result<()> {
        if folds < 2 || folds > y.len() {
            return Err(TrayectoError::InvalidHyperparameter {
                param: "cross_validation".to_string(),
                value: folds.to_string(),
                constraint: format!("between 2 and {} (the sample count)", y.len()),
            });
        }

        let kfold = KFold::new(folds);
        let mut scores = Vec::with_capacity(folds);
        for (train_idx, test_idx) in kfold.split(y.len()) {
            let x_fold = x.select_rows(&train_idx);
            let y_fold: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();
            let x_test = x.select_rows(&test_idx);
            let y_test: Vec<usize> = test_idx.iter().map(|&i| y[i]).collect();

            let predictions = self.vote_rows(&x_fold, &y_fold, &x_test);
            scores.push(crate::metrics::accuracy(&predictions, &y_test));
        }

        record_fold_scores(&mut self.core, folds, &scores);
        Ok(())
    }
}

impl Model for KNeighborsModel {
    fn core(&self) -> &ModelCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModelCore {
        &mut self.core
    }

    fn fit(&mut self, data: &dyn Samples, cross_validation: usize) -> Result<()> {
        let x = self.featurizer.features(data)?;
        let y = data.labels();

        if self.k == 0 || self.k > y.len() {
            return Err(TrayectoError::InvalidHyperparameter {
                param: "k".to_string(),
                value: self.k.to_string(),
                constraint: format!("between 1 and {} (the sample count)", y.len()),
            });
        }

        if cross_validation > 0 {
            self.cross_validate(&x, &y, cross_validation)?;
        }

        self.core.record("n_samples", y.len());
        self.core.record("n_features", x.n_cols());
        self.x_train = Some(x);
        self.y_train = Some(y);
        Ok(())
    }

    fn predict(&self, data: &dyn Samples) -> Result<Vec<usize>> {
        let x_train = self.x_train.as_ref().ok_or_else(|| TrayectoError::NotTrained {
            model: self.core.name().to_string(),
        })?;
        let y_train = self.y_train.as_ref().ok_or_else(|| TrayectoError::NotTrained {
            model: self.core.name().to_string(),
        })?;

        let x = self.featurizer.features(data)?;
        if x.n_cols() != x_train.n_cols() {
            return Err(TrayectoError::DimensionMismatch {
                expected: format!("{} features", x_train.n_cols()),
                actual: format!("{} features", x.n_cols()),
            });
        }

        Ok(self.vote_rows(x_train, y_train, &x))
    }
}

/// Majority vote over `(distance, label)` neighbors; ties break toward the
/// closer neighbor because insertion order follows distance order.
fn majority_vote(neighbors: &[(f32, usize)]) -> usize {
    let mut counts: Vec<(usize, usize)> = Vec::new(); // (label, count)
    for &(_, label) in neighbors {
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }
    counts
        .iter()
        .max_by_key(|&&(_, count)| count)
        .map(|&(label, _)| label)
        .unwrap_or(0)
}

/// Inverse-distance weighted vote over `(distance, label)` neighbors.
fn weighted_vote(neighbors: &[(f32, usize)]) -> usize {
    let mut weights: Vec<(usize, f32)> = Vec::new(); // (label, weight)
    for &(distance, label) in neighbors {
        let weight = 1.0 / (distance + 1e-8);
        match weights.iter_mut().find(|(l, _)| *l == label) {
            Some((_, w)) => *w += weight,
            None => weights.push((label, weight)),
        }
    }
    weights
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|&(label, _)| label)
        .unwrap_or(0)
}
