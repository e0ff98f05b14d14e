//! Random forest model variant.
//!
//! Bagged gini decision trees over featurized trajectories with per-split
//! feature subsampling and majority voting across trees. Supports
//! persistence through a JSON payload of the fitted trees.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::dataset::Samples;
use crate::error::{Result, TrayectoError};
use crate::features::Featurizer;
use crate::metrics::accuracy;
use crate::model::{Model, ModelCore};
use crate::model_selection::KFold;
use crate::primitives::Matrix;

use super::record_fold_scores;

/// A single decision tree node.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        label: usize,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, row: &[f32]) -> usize {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { label, .. } => return *label,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Serialized form of a fitted forest.
#[derive(Serialize, Deserialize)]
struct ForestPayload {
    name: String,
    n_estimators: usize,
    max_depth: Option<usize>,
    max_features: Option<usize>,
    bootstrap: bool,
    warm_start: bool,
    random_state: Option<u64>,
    n_features: usize,
    trees: Vec<TreeNode>,
}

/// Random forest classifier over featurized trajectories.
///
/// # Examples
///
/// ```
/// use trayecto::prelude::*;
/// use trayecto::trajectory::Trajectory;
///
/// let mut trajectories = Vec::new();
/// let mut labels = Vec::new();
/// for i in 0..8 {
///     let reach = if i % 2 == 0 { 1.0 } else { 15.0 };
///     trajectories.push(
///         Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, reach + i as f32 * 0.1, 0.0)])
///             .expect("points"),
///     );
///     labels.push(i % 2);
/// }
/// let dataset = TrajectoryDataset::new(trajectories, labels).expect("dataset");
///
/// let mut model = RandomForestModel::new(KinematicFeaturizer::new())
///     .with_n_estimators(10)
///     .with_random_state(0);
/// model.train(&dataset, 0).expect("training succeeds");
///
/// let evaluation = model.evaluate(&dataset).expect("evaluation succeeds");
/// assert!(evaluation.accuracy() > 0.9);
/// ```
pub struct RandomForestModel {
    core: ModelCore,
    featurizer: Box<dyn Featurizer>,
    n_estimators: usize,
    max_depth: Option<usize>,
    max_features: Option<usize>,
    bootstrap: bool,
    warm_start: bool,
    random_state: Option<u64>,
    n_features: Option<usize>,
    trees: Vec<TreeNode>,
}

impl RandomForestModel {
    /// Creates an untrained forest with default hyperparameters
    /// (100 estimators, bootstrap sampling, sqrt feature subsampling,
    /// unlimited depth).
    pub fn new(featurizer: impl Featurizer + 'static) -> Self {
        let mut core = ModelCore::new("random_forest");
        core.record("n_estimators", 100usize);
        core.record("bootstrap", true);
        Self {
            core,
            featurizer: Box::new(featurizer),
            n_estimators: 100,
            max_depth: None,
            max_features: None,
            bootstrap: true,
            warm_start: false,
            random_state: None,
            n_features: None,
            trees: Vec::new(),
        }
    }

    /// Sets the number of trees.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self.core.record("n_estimators", n_estimators);
        self
    }

    /// Limits tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self.core.record("max_depth", max_depth);
        self
    }

    /// Sets the number of candidate features tried per split.
    ///
    /// Defaults to the square root of the feature count.
    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self.core.record("max_features", max_features);
        self
    }

    /// Enables or disables bootstrap sampling per tree.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self.core.record("bootstrap", bootstrap);
        self
    }

    /// Enables warm starting.
    ///
    /// A warm retrain keeps the already fitted trees and grows the forest
    /// up to `n_estimators`, so raising the estimator count between train
    /// calls adds trees instead of refitting from scratch.
    #[must_use]
    pub fn with_warm_start(mut self, warm_start: bool) -> Self {
        self.warm_start = warm_start;
        self.core.record("warm_start", warm_start);
        self
    }

    /// Sets the random seed for reproducible forests.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self.core.record("random_state", random_state as i64);
        self
    }

    /// Number of fitted trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Loads a fitted forest persisted by [`Model::save`].
    ///
    /// The featurizer is not part of the payload and must be supplied
    /// again. The loaded model counts as trained.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the payload doesn't
    /// parse, or the featurizer's width differs from the one the forest
    /// was fitted with.
    pub fn load(path: &Path, featurizer: impl Featurizer + 'static) -> Result<Self> {
        let file = File::open(path)?;
        let payload: ForestPayload = serde_json::from_reader(BufReader::new(file))?;
        if payload.name != "random_forest" {
            return Err(TrayectoError::Serialization(format!(
                "payload belongs to model '{}', not a random forest",
                payload.name
            )));
        }
        if featurizer.n_features() != payload.n_features {
            return Err(TrayectoError::DimensionMismatch {
                expected: format!("{} features", payload.n_features),
                actual: format!("{} features", featurizer.n_features()),
            });
        }

        let mut model = Self::new(featurizer)
            .with_n_estimators(payload.n_estimators)
            .with_bootstrap(payload.bootstrap)
            .with_warm_start(payload.warm_start);
        if let Some(depth) = payload.max_depth {
            model = model.with_max_depth(depth);
        }
        if let Some(features) = payload.max_features {
            model = model.with_max_features(features);
        }
        if let Some(seed) = payload.random_state {
            model = model.with_random_state(seed);
        }
        model.trees = payload.trees;
        model.n_features = Some(payload.n_features);
        model.core_mut().trained = true;
        Ok(model)
    }

    fn make_rng(&self) -> StdRng {
        match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn feature_pool_size(&self, n_features: usize) -> usize {
        self.max_features
            .unwrap_or_else(|| (n_features as f32).sqrt().ceil() as usize)
            .clamp(1, n_features)
    }

    fn fit_trees(
        &self,
        x: &Matrix<f32>,
        y: &[usize],
        count: usize,
        rng: &mut StdRng,
    ) -> Vec<TreeNode> {
        let n_samples = y.len();
        let pool = self.feature_pool_size(x.n_cols());

        (0..count)
            .map(|_| {
                let indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                build_tree(x, y, indices, 0, self.max_depth, pool, rng)
            })
            .collect()
    }

    fn vote_rows(trees: &[TreeNode], x: &Matrix<f32>) -> Vec<usize> {
        (0..x.n_rows())
            .map(|i| {
                let row = x.row(i);
                let mut counts: Vec<(usize, usize)> = Vec::new();
                for tree in trees {
                    let label = tree.predict(row);
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
            })
            .collect()
    }

    fn cross_validate(
        &mut self,
        x: &Matrix<f32>,
        y: &[usize],
        folds: usize,
        rng: &mut StdRng,
    ) -> Result<()> {
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

            let trees = self.fit_trees(&x_fold, &y_fold, self.n_estimators, rng);
            let predictions = Self::vote_rows(&trees, &x_test);
            scores.push(accuracy(&predictions, &y_test));
        }

        record_fold_scores(&mut self.core, folds, &scores);
        Ok(())
    }
}

impl Model for RandomForestModel {
    fn core(&self) -> &ModelCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModelCore {
        &mut self.core
    }

    fn fit(&mut self, data: &dyn Samples, cross_validation: usize) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(TrayectoError::InvalidHyperparameter {
                param: "n_estimators".to_string(),
                value: "0".to_string(),
                constraint: "at least 1".to_string(),
            });
        }

        let x = self.featurizer.features(data)?;
        let y = data.labels();
        let mut rng = self.make_rng();

        if cross_validation > 0 {
            self.cross_validate(&x, &y, cross_validation, &mut rng)?;
        }

        if self.warm_start {
            if self.n_estimators < self.trees.len() {
                return Err(TrayectoError::InvalidHyperparameter {
                    param: "n_estimators".to_string(),
                    value: self.n_estimators.to_string(),
                    constraint: format!(
                        "at least {} (the fitted tree count) on a warm retrain",
                        self.trees.len()
                    ),
                });
            }
        } else {
            self.trees.clear();
        }
        let grown = self.fit_trees(&x, &y, self.n_estimators - self.trees.len(), &mut rng);
        self.trees.extend(grown);

        self.n_features = Some(x.n_cols());
        self.core.record("n_samples", y.len());
        self.core.record("n_features", x.n_cols());
        Ok(())
    }

    fn predict(&self, data: &dyn Samples) -> Result<Vec<usize>> {
        if self.trees.is_empty() {
            return Err(TrayectoError::NotTrained {
                model: self.core.name().to_string(),
            });
        }

        let x = self.featurizer.features(data)?;
        if let Some(expected) = self.n_features {
            if x.n_cols() != expected {
                return Err(TrayectoError::DimensionMismatch {
                    expected: format!("{expected} features"),
                    actual: format!("{} features", x.n_cols()),
                });
            }
        }
        Ok(Self::vote_rows(&self.trees, &x))
    }

    fn save(&self, path: &Path) -> Result<()> {
        let Some(n_features) = self.n_features else {
            return Err(TrayectoError::NotTrained {
                model: self.core.name().to_string(),
            });
        };
        if self.trees.is_empty() {
            return Err(TrayectoError::NotTrained {
                model: self.core.name().to_string(),
            });
        }

        let payload = ForestPayload {
            name: self.core.name().to_string(),
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            max_features: self.max_features,
            bootstrap: self.bootstrap,
            warm_start: self.warm_start,
            random_state: self.random_state,
            n_features,
            trees: self.trees.clone(),
        };

        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), &payload)?;
        Ok(())
    }
}

/// Gini impurity of a label multiset.
fn gini_impurity(labels: &[usize]) -> f32 {
    if labels.is_empty() {
        return 0.0;
    }

    let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut counts = vec![0usize; n_classes];
    for &label in labels {
        counts[label] += 1;
    }

    let total = labels.len() as f32;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f32 / total;
            p * p
        })
        .sum::<f32>()
}

/// Weighted gini impurity of a two-way split.
fn gini_split(left: &[usize], right: &[usize]) -> f32 {
    let n_left = left.len() as f32;
    let n_right = right.len() as f32;
    let n_total = n_left + n_right;
    if n_total == 0.0 {
        return 0.0;
    }
    (n_left / n_total) * gini_impurity(left) + (n_right / n_total) * gini_impurity(right)
}

/// Most frequent label; ties break toward the lower label.
fn majority_class(labels: &[usize]) -> usize {
    let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut counts = vec![0usize; n_classes];
    for &label in labels {
        counts[label] += 1;
    }
    counts
        .iter()
        .enumerate()
        .max_by_key(|&(label, &count)| (count, std::cmp::Reverse(label)))
        .map_or(0, |(label, _)| label)
}

/// Finds the best `(threshold, weighted_impurity)` for one feature over the
/// node's samples, trying midpoints between consecutive unique values.
fn best_threshold_for_feature(
    x: &Matrix<f32>,
    y: &[usize],
    indices: &[usize],
    feature: usize,
) -> Option<(f32, f32)> {
    let mut values: Vec<f32> = indices.iter().map(|&i| x.get(i, feature)).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values.dedup_by(|a, b| (*a - *b).abs() < 1e-10);
    if values.len() < 2 {
        return None;
    }

    let mut best: Option<(f32, f32)> = None;
    for pair in values.windows(2) {
        let threshold = (pair[0] + pair[1]) / 2.0;

        let mut left = Vec::new();
        let mut right = Vec::new();
        for &i in indices {
            if x.get(i, feature) <= threshold {
                left.push(y[i]);
            } else {
                right.push(y[i]);
            }
        }
        if left.is_empty() || right.is_empty() {
            continue;
        }

        let impurity = gini_split(&left, &right);
        if best.map_or(true, |(_, best_impurity)| impurity < best_impurity) {
            best = Some((threshold, impurity));
        }
    }
    best
}

/// Recursively builds a tree over the given sample indices.
fn build_tree(
    x: &Matrix<f32>,
    y: &[usize],
    indices: Vec<usize>,
    depth: usize,
    max_depth: Option<usize>,
    feature_pool: usize,
    rng: &mut StdRng,
) -> TreeNode {
    let labels: Vec<usize> = indices.iter().map(|&i| y[i]).collect();
    let parent_impurity = gini_impurity(&labels);

    let depth_reached = max_depth.is_some_and(|limit| depth >= limit);
    if parent_impurity == 0.0 || labels.len() < 2 || depth_reached {
        return TreeNode::Leaf {
            label: majority_class(&labels),
            n_samples: labels.len(),
        };
    }

    // Random feature subset for this split.
    let all_features: Vec<usize> = (0..x.n_cols()).collect();
    let candidates: Vec<usize> = all_features
        .choose_multiple(rng, feature_pool)
        .copied()
        .collect();

    let mut best: Option<(usize, f32, f32)> = None; // (feature, threshold, impurity)
    for &feature in &candidates {
        if let Some((threshold, impurity)) = best_threshold_for_feature(x, y, &indices, feature)
        {
            if best.map_or(true, |(_, _, best_impurity)| impurity < best_impurity) {
                best = Some((feature, threshold, impurity));
            }
        }
    }

    let Some((feature, threshold, impurity)) = best else {
        return TreeNode::Leaf {
            label: majority_class(&labels),
            n_samples: labels.len(),
        };
    };

    // No impurity reduction, stop here.
    if impurity >= parent_impurity {
        return TreeNode::Leaf {
            label: majority_class(&labels),
            n_samples: labels.len(),
        };
    }

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| x.get(i, feature) <= threshold);

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(build_tree(
            x,
            y,
            left_indices,
            depth + 1,
            max_depth,
            feature_pool,
            rng,
        )),
        right: Box::new(build_tree(
            x,
            y,
            right_indices,
            depth + 1,
            max_depth,
            feature_pool,
            rng,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TrajectoryDataset;
    use crate::features::KinematicFeaturizer;
    use crate::model::SummaryValue;
    use crate::trajectory::Trajectory;

    fn two_speed_dataset(n_per_class: usize) -> TrajectoryDataset {
        let mut trajectories = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n_per_class {
            let jitter = i as f32 * 0.1;
            trajectories.push(
                Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, 1.0 + jitter, 0.0)])
                    .expect("points"),
            );
            labels.push(0);
            trajectories.push(
                Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, 25.0 + jitter, 0.0)])
                    .expect("points"),
            );
            labels.push(1);
        }
        TrajectoryDataset::new(trajectories, labels).expect("dataset")
    }

    fn small_forest() -> RandomForestModel {
        RandomForestModel::new(KinematicFeaturizer::new())
            .with_n_estimators(15)
            .with_random_state(42)
    }

    /// Single-feature featurizer, deliberately narrower than the kinematic one.
    struct PathLengthFeaturizer;

    impl Featurizer for PathLengthFeaturizer {
        fn n_features(&self) -> usize {
            1
        }

        fn features(&self, data: &dyn Samples) -> Result<Matrix<f32>> {
            let cells: Vec<f32> = (0..data.len())
                .map(|i| data.trajectory(i).path_length())
                .collect();
            Matrix::from_vec(data.len(), 1, cells)
                .map_err(|e| TrayectoError::Other(e.to_string()))
        }
    }

    #[test]
    fn test_fit_predict_separable_classes() {
        let dataset = two_speed_dataset(6);
        let mut model = small_forest();
        model.train(&dataset, 0).expect("training succeeds");

        let predictions = model.predict(&dataset).expect("trained model predicts");
        assert_eq!(predictions, dataset.labels());
    }

    #[test]
    fn test_seeded_forest_is_reproducible() {
        let dataset = two_speed_dataset(6);
        let mut a = small_forest();
        let mut b = small_forest();
        a.train(&dataset, 0).expect("training succeeds");
        b.train(&dataset, 0).expect("training succeeds");
        assert_eq!(
            a.predict(&dataset).expect("predict"),
            b.predict(&dataset).expect("predict")
        );
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let dataset = two_speed_dataset(3);
        let model = small_forest();
        assert!(matches!(
            model.predict(&dataset),
            Err(TrayectoError::NotTrained { .. })
        ));
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let dataset = two_speed_dataset(3);
        let mut model = RandomForestModel::new(KinematicFeaturizer::new()).with_n_estimators(0);
        assert!(model.train(&dataset, 0).is_err());
        assert!(!model.trained());
    }

    #[test]
    fn test_cross_validation_records_scores() {
        let dataset = two_speed_dataset(6);
        let mut model = small_forest();
        model.train(&dataset, 3).expect("training succeeds");
        assert_eq!(
            model.summary().get("cv_folds"),
            Some(&SummaryValue::Int(3))
        );
        assert!(model.summary().contains_key("cv_accuracy_mean"));
    }

    #[test]
    fn test_save_load_round_trip_preserves_predictions() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("forest.json");

        let dataset = two_speed_dataset(6);
        let mut model = small_forest();
        model.train(&dataset, 0).expect("training succeeds");
        model.save(&path).expect("save succeeds");

        let loaded =
            RandomForestModel::load(&path, KinematicFeaturizer::new()).expect("load succeeds");
        assert!(loaded.trained());
        assert_eq!(
            loaded.predict(&dataset).expect("predict"),
            model.predict(&dataset).expect("predict")
        );
    }

    #[test]
    fn test_load_rejects_narrower_featurizer() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("forest.json");

        let dataset = two_speed_dataset(6);
        let mut model = small_forest();
        model.train(&dataset, 0).expect("training succeeds");
        model.save(&path).expect("save succeeds");

        let result = RandomForestModel::load(&path, PathLengthFeaturizer);
        assert!(matches!(
            result,
            Err(TrayectoError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_warm_start_grows_forest() {
        let dataset = two_speed_dataset(6);
        let mut model = RandomForestModel::new(KinematicFeaturizer::new())
            .with_n_estimators(5)
            .with_warm_start(true)
            .with_random_state(42);
        model.train(&dataset, 0).expect("training succeeds");
        assert_eq!(model.n_trees(), 5);

        let mut model = model.with_n_estimators(12);
        model.train(&dataset, 0).expect("warm retrain succeeds");
        assert_eq!(model.n_trees(), 12);
        let predictions = model.predict(&dataset).expect("predict");
        assert_eq!(predictions, dataset.labels());
    }

    #[test]
    fn test_warm_start_rejects_shrinking_estimators() {
        let dataset = two_speed_dataset(6);
        let mut model = RandomForestModel::new(KinematicFeaturizer::new())
            .with_n_estimators(10)
            .with_warm_start(true)
            .with_random_state(42);
        model.train(&dataset, 0).expect("training succeeds");

        let mut model = model.with_n_estimators(4);
        assert!(matches!(
            model.train(&dataset, 0),
            Err(TrayectoError::InvalidHyperparameter { .. })
        ));
        // The fitted forest survives the rejected retrain.
        assert_eq!(model.n_trees(), 10);
    }

    #[test]
    fn test_cold_retrain_replaces_trees() {
        let dataset = two_speed_dataset(6);
        let mut model = small_forest();
        model.train(&dataset, 0).expect("training succeeds");
        let mut model = model.with_n_estimators(7);
        model.train(&dataset, 0).expect("retraining succeeds");
        assert_eq!(model.n_trees(), 7);
    }

    #[test]
    fn test_save_untrained_fails_without_io() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("untrained.json");
        let model = small_forest();
        assert!(matches!(
            model.save(&path),
            Err(TrayectoError::NotTrained { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_gini_impurity_pure_and_mixed() {
        assert_eq!(gini_impurity(&[1, 1, 1]), 0.0);
        assert!((gini_impurity(&[0, 1]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_majority_class_tie_breaks_low() {
        assert_eq!(majority_class(&[0, 1]), 0);
        assert_eq!(majority_class(&[2, 2, 1]), 2);
    }

    #[test]
    fn test_max_depth_one_produces_stumps() {
        let dataset = two_speed_dataset(6);
        let mut model = RandomForestModel::new(KinematicFeaturizer::new())
            .with_n_estimators(5)
            .with_max_depth(1)
            .with_random_state(7);
        model.train(&dataset, 0).expect("training succeeds");
        // Classes are separable on a single threshold, so stumps suffice.
        let predictions = model.predict(&dataset).expect("predict");
        assert_eq!(predictions, dataset.labels());
    }
}
