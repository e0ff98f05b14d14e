//! Concrete model variants.
//!
//! Each variant embeds a [`crate::model::ModelCore`] and implements the
//! [`crate::model::Model`] hooks (`fit`/`predict`) over featurized
//! trajectories.

mod forest;
mod knn;

pub use forest::RandomForestModel;
pub use knn::{DistanceMetric, KNeighborsModel};

use crate::model::ModelCore;

/// Records cross-validation fold scores into a model core.
pub(crate) fn record_fold_scores(core: &mut ModelCore, folds: usize, scores: &[f32]) {
    let mean = scores.iter().sum::<f32>() / scores.len() as f32;
    let variance =
        scores.iter().map(|&s| (s - mean).powi(2)).sum::<f32>() / scores.len() as f32;
    core.record("cv_folds", folds);
    core.record("cv_accuracy_mean", mean);
    core.record("cv_accuracy_std", variance.sqrt());
}
