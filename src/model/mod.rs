//! The model lifecycle contract.
//!
//! Every estimator in this crate satisfies one polymorphic contract: it is
//! constructed untrained, moves to the trained state exactly once through a
//! successful [`Model::train`] call, serves predictions, and hands those
//! predictions off to [`Evaluation`] through [`Model::evaluate`]. Callers
//! swap variants without changing calling code.
//!
//! `train` is a template method: it emits the lifecycle record, delegates to
//! the variant's [`Model::fit`] hook, and flips the `trained` flag on the
//! success path only. Variants implement `fit` and `predict`; everything
//! else comes with the trait.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::Samples;
use crate::error::{Result, TrayectoError};
use crate::evaluation::Evaluation;

/// A scalar value recorded in a model's summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SummaryValue {
    /// Integer-valued entry (counts, fold numbers).
    Int(i64),
    /// Float-valued entry (scores, rates).
    Float(f64),
    /// Text entry (names, metric identifiers).
    Text(String),
    /// Boolean entry (switches).
    Bool(bool),
}

impl fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryValue::Int(v) => write!(f, "{v}"),
            SummaryValue::Float(v) => write!(f, "{v:.4}"),
            SummaryValue::Text(v) => write!(f, "{v}"),
            SummaryValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for SummaryValue {
    fn from(v: i64) -> Self {
        SummaryValue::Int(v)
    }
}

impl From<usize> for SummaryValue {
    fn from(v: usize) -> Self {
        SummaryValue::Int(v as i64)
    }
}

impl From<f64> for SummaryValue {
    fn from(v: f64) -> Self {
        SummaryValue::Float(v)
    }
}

impl From<f32> for SummaryValue {
    fn from(v: f32) -> Self {
        SummaryValue::Float(f64::from(v))
    }
}

impl From<&str> for SummaryValue {
    fn from(v: &str) -> Self {
        SummaryValue::Text(v.to_string())
    }
}

impl From<String> for SummaryValue {
    fn from(v: String) -> Self {
        SummaryValue::Text(v)
    }
}

impl From<bool> for SummaryValue {
    fn from(v: bool) -> Self {
        SummaryValue::Bool(v)
    }
}

/// A model's identifying summary: an ordered string-keyed record seeded with
/// the model name, extended by variants with hyperparameters and fit
/// statistics.
pub type Summary = BTreeMap<String, SummaryValue>;

/// Policy for the guarded prediction path.
///
/// Decides whether predictions may be served from an untrained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardPolicy {
    /// Predictions are only served from a trained model; the guarded path
    /// returns [`TrayectoError::NotTrained`] otherwise.
    Strict,
    /// No trained-state check. For variants whose state comes from
    /// somewhere other than `train` (e.g., loaded from disk).
    Permissive,
}

/// Lifecycle state shared by every model variant.
///
/// Owns the `name`, the [`Summary`] record, and the `trained` flag. Each
/// variant embeds one `ModelCore` and exposes it through
/// [`Model::core`]/[`Model::core_mut`]; no other component writes to it.
#[derive(Debug, Clone)]
pub struct ModelCore {
    pub(crate) name: String,
    pub(crate) summary: Summary,
    pub(crate) trained: bool,
    pub(crate) guard: GuardPolicy,
}

impl ModelCore {
    /// Creates untrained lifecycle state with a summary seeded with `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut summary = Summary::new();
        summary.insert("name".to_string(), SummaryValue::Text(name.clone()));
        Self {
            name,
            summary,
            trained: false,
            guard: GuardPolicy::Strict,
        }
    }

    /// Sets the guard policy for the prediction path.
    #[must_use]
    pub fn with_guard(mut self, guard: GuardPolicy) -> Self {
        self.guard = guard;
        self
    }

    /// The model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The summary record.
    #[must_use]
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Whether `train` has completed successfully at least once.
    #[must_use]
    pub fn trained(&self) -> bool {
        self.trained
    }

    /// Records a summary entry. Intended for variants adding
    /// hyperparameters and fit statistics after construction.
    pub fn record(&mut self, key: &str, value: impl Into<SummaryValue>) {
        self.summary.insert(key.to_string(), value.into());
    }
}

/// The contract every model variant satisfies.
///
/// Variants implement the two hooks ([`fit`](Model::fit) and
/// [`predict`](Model::predict)) plus the state accessors; `train`,
/// `checked_predict`, `evaluate`, and the default `save` are provided by
/// the trait and are not meant to be overridden (except `save`, which
/// variants supporting persistence replace).
///
/// A single instance is not synchronized; callers keep one instance per
/// logical experiment.
///
/// # Examples
///
/// ```
/// use trayecto::prelude::*;
/// use trayecto::trajectory::Trajectory;
///
/// let trajectories: Vec<_> = (0..6)
///     .map(|i| {
///         let reach = if i % 2 == 0 { 1.0 } else { 10.0 };
///         Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, reach, 0.0)]).expect("points")
///     })
///     .collect();
/// let dataset = TrajectoryDataset::new(trajectories, vec![0, 1, 0, 1, 0, 1])
///     .expect("dataset");
///
/// let mut model = KNeighborsModel::new(KinematicFeaturizer::new(), 1);
/// model.train(&dataset, 0).expect("training succeeds");
/// assert!(model.trained());
///
/// let evaluation = model.evaluate(&dataset).expect("evaluation succeeds");
/// assert!((evaluation.accuracy() - 1.0).abs() < 1e-6);
/// ```
pub trait Model {
    /// The shared lifecycle state.
    fn core(&self) -> &ModelCore;

    /// Mutable access to the shared lifecycle state.
    fn core_mut(&mut self) -> &mut ModelCore;

    /// Variant training logic.
    ///
    /// `cross_validation` is the number of internal validation folds
    /// (0 trains directly, without folding). Implementations must not touch
    /// the `trained` flag; [`Model::train`] owns that transition.
    ///
    /// # Errors
    ///
    /// Variant-specific; errors propagate to the caller unchanged.
    fn fit(&mut self, data: &dyn Samples, cross_validation: usize) -> Result<()>;

    /// Predicts one class label per sample, in input order.
    ///
    /// Must be pure with respect to model state.
    ///
    /// # Errors
    ///
    /// Variant-specific; errors propagate to the caller unchanged.
    fn predict(&self, data: &dyn Samples) -> Result<Vec<usize>>;

    /// Trains the model on `data`.
    ///
    /// Emits the lifecycle record, delegates to [`Model::fit`], and marks
    /// the model trained on the success path only. A failing `fit` leaves
    /// the `trained` flag at its prior value and propagates verbatim.
    ///
    /// Do not override.
    ///
    /// # Errors
    ///
    /// Whatever the variant's `fit` raises.
    fn train(&mut self, data: &dyn Samples, cross_validation: usize) -> Result<()> {
        tracing::info!(
            model = %self.core().name,
            samples = data.len(),
            cross_validation,
            "training model"
        );
        self.fit(data, cross_validation)?;
        self.core_mut().trained = true;
        Ok(())
    }

    /// The guarded prediction path: applies the core's [`GuardPolicy`],
    /// then delegates to [`Model::predict`].
    ///
    /// # Errors
    ///
    /// Returns [`TrayectoError::NotTrained`] under the strict policy when
    /// the model is untrained; otherwise whatever `predict` raises.
    fn checked_predict(&self, data: &dyn Samples) -> Result<Vec<usize>> {
        let core = self.core();
        if core.guard == GuardPolicy::Strict && !core.trained {
            return Err(TrayectoError::NotTrained {
                model: core.name.clone(),
            });
        }
        self.predict(data)
    }

    /// Evaluates the model on `data`.
    ///
    /// Obtains predictions through the guarded path and wraps them,
    /// together with the model's summary and the data's labels, into an
    /// [`Evaluation`]. Exactly the composition
    /// `Evaluation::new(summary, data, predict(data))`; nothing is
    /// re-derived.
    ///
    /// Do not override.
    ///
    /// # Errors
    ///
    /// Whatever the guarded prediction path raises.
    fn evaluate(&self, data: &dyn Samples) -> Result<Evaluation> {
        tracing::info!(
            model = %self.core().name,
            samples = data.len(),
            "evaluating model"
        );
        let predictions = self.checked_predict(data)?;
        Ok(Evaluation::new(
            self.core().summary.clone(),
            data,
            predictions,
        ))
    }

    /// Persists the model to `path`.
    ///
    /// The default signals that the variant does not support persistence
    /// and performs no I/O.
    ///
    /// # Errors
    ///
    /// [`TrayectoError::Unsupported`] unless the variant overrides this.
    fn save(&self, _path: &Path) -> Result<()> {
        Err(TrayectoError::Unsupported {
            operation: "save".to_string(),
            model: self.core().name.clone(),
        })
    }

    /// The model name.
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Whether `train` has completed successfully at least once.
    fn trained(&self) -> bool {
        self.core().trained()
    }

    /// The model's summary record.
    fn summary(&self) -> &Summary {
        self.core().summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TrajectoryDataset;
    use crate::trajectory::Trajectory;

    // Echoes each trajectory's starting x coordinate as the predicted label;
    // training is a no-op.
    struct EchoModel {
        core: ModelCore,
    }

    impl EchoModel {
        fn new() -> Self {
            Self {
                core: ModelCore::new("echo"),
            }
        }

        fn permissive() -> Self {
            Self {
                core: ModelCore::new("echo").with_guard(GuardPolicy::Permissive),
            }
        }
    }

    impl Model for EchoModel {
        fn core(&self) -> &ModelCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ModelCore {
            &mut self.core
        }

        fn fit(&mut self, _data: &dyn Samples, _cross_validation: usize) -> Result<()> {
            Ok(())
        }

        fn predict(&self, data: &dyn Samples) -> Result<Vec<usize>> {
            Ok((0..data.len())
                .map(|i| data.trajectory(i).point(0).1 as usize)
                .collect())
        }
    }

    // Always fails to fit.
    struct BrokenModel {
        core: ModelCore,
    }

    impl Model for BrokenModel {
        fn core(&self) -> &ModelCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ModelCore {
            &mut self.core
        }

        fn fit(&mut self, _data: &dyn Samples, _cross_validation: usize) -> Result<()> {
            Err(TrayectoError::Other("deliberate fit failure".to_string()))
        }

        fn predict(&self, data: &dyn Samples) -> Result<Vec<usize>> {
            Ok(vec![0; data.len()])
        }
    }

    fn echo_dataset() -> TrajectoryDataset {
        // Starting x coordinates 1, 2, 3 double as the expected labels.
        let trajectories = vec![
            Trajectory::from_points(&[(0.0, 1.0, 0.0), (1.0, 1.5, 0.0)]).expect("points"),
            Trajectory::from_points(&[(0.0, 2.0, 0.0), (1.0, 2.5, 0.0)]).expect("points"),
            Trajectory::from_points(&[(0.0, 3.0, 0.0), (1.0, 3.5, 0.0)]).expect("points"),
        ];
        TrajectoryDataset::new(trajectories, vec![1, 2, 3]).expect("dataset")
    }

    #[test]
    fn test_model_starts_untrained() {
        let model = EchoModel::new();
        assert!(!model.trained());
        assert_eq!(model.name(), "echo");
    }

    #[test]
    fn test_summary_seeded_with_name() {
        let model = EchoModel::new();
        assert_eq!(
            model.summary().get("name"),
            Some(&SummaryValue::Text("echo".to_string()))
        );
    }

    #[test]
    fn test_successful_train_sets_trained() {
        let mut model = EchoModel::new();
        let data = echo_dataset();
        assert!(!model.trained());
        model.train(&data, 0).expect("no-op fit succeeds");
        assert!(model.trained());
    }

    #[test]
    fn test_failed_train_leaves_untrained() {
        let mut model = BrokenModel {
            core: ModelCore::new("broken"),
        };
        let data = echo_dataset();
        let result = model.train(&data, 0);
        assert!(result.is_err());
        assert!(!model.trained());
    }

    #[test]
    fn test_failed_train_error_propagates_verbatim() {
        let mut model = BrokenModel {
            core: ModelCore::new("broken"),
        };
        let data = echo_dataset();
        let err = model.train(&data, 0).expect_err("fit always fails");
        assert_eq!(err.to_string(), "deliberate fit failure");
    }

    #[test]
    fn test_strict_guard_blocks_untrained_predict() {
        let model = EchoModel::new();
        let data = echo_dataset();
        let result = model.checked_predict(&data);
        assert!(matches!(result, Err(TrayectoError::NotTrained { .. })));
    }

    #[test]
    fn test_strict_guard_blocks_untrained_evaluate() {
        let model = EchoModel::new();
        let data = echo_dataset();
        assert!(matches!(
            model.evaluate(&data),
            Err(TrayectoError::NotTrained { .. })
        ));
    }

    #[test]
    fn test_permissive_guard_allows_untrained_predict() {
        let model = EchoModel::permissive();
        let data = echo_dataset();
        let predictions = model
            .checked_predict(&data)
            .expect("permissive guard lets the call through");
        assert_eq!(predictions, vec![1, 2, 3]);
    }

    #[test]
    fn test_evaluate_wraps_predictions() {
        let mut model = EchoModel::new();
        let data = echo_dataset();
        model.train(&data, 0).expect("training succeeds");

        let evaluation = model.evaluate(&data).expect("evaluation succeeds");
        assert_eq!(evaluation.predictions(), &[1, 2, 3]);
        assert_eq!(evaluation.true_labels(), &[1, 2, 3]);
        assert_eq!(
            evaluation.summary().get("name"),
            Some(&SummaryValue::Text("echo".to_string()))
        );
    }

    #[test]
    fn test_evaluate_matches_direct_composition() {
        let mut model = EchoModel::new();
        let data = echo_dataset();
        model.train(&data, 0).expect("training succeeds");

        let via_evaluate = model.evaluate(&data).expect("evaluation succeeds");
        let direct = Evaluation::new(
            model.summary().clone(),
            &data,
            model.predict(&data).expect("predict succeeds"),
        );
        assert_eq!(via_evaluate.predictions(), direct.predictions());
        assert_eq!(via_evaluate.true_labels(), direct.true_labels());
        assert_eq!(via_evaluate.summary(), direct.summary());
    }

    #[test]
    fn test_predict_leaves_state_unchanged() {
        let mut model = EchoModel::new();
        let data = echo_dataset();
        model.train(&data, 0).expect("training succeeds");

        let summary_before = model.summary().clone();
        let trained_before = model.trained();
        model.predict(&data).expect("predict succeeds");
        assert_eq!(model.summary(), &summary_before);
        assert_eq!(model.trained(), trained_before);
    }

    #[test]
    fn test_prediction_length_matches_sample_count() {
        let mut model = EchoModel::new();
        let data = echo_dataset();
        model.train(&data, 0).expect("training succeeds");
        let predictions = model.predict(&data).expect("predict succeeds");
        assert_eq!(predictions.len(), data.len());
    }

    #[test]
    fn test_default_save_is_unsupported() {
        let model = EchoModel::new();
        let result = model.save(Path::new("/tmp/echo.json"));
        assert!(matches!(result, Err(TrayectoError::Unsupported { .. })));
        assert!(!Path::new("/tmp/echo.json").exists());
    }

    #[test]
    fn test_model_is_object_safe() {
        let mut model: Box<dyn Model> = Box::new(EchoModel::new());
        let data = echo_dataset();
        model.train(&data, 0).expect("training succeeds");
        assert!(model.trained());
    }

    #[test]
    fn test_record_appends_to_summary() {
        let mut core = ModelCore::new("m");
        core.record("k", 5usize);
        core.record("score", 0.5f64);
        assert_eq!(core.summary().get("k"), Some(&SummaryValue::Int(5)));
        assert_eq!(core.summary().get("score"), Some(&SummaryValue::Float(0.5)));
    }

    #[test]
    fn test_summary_value_display() {
        assert_eq!(SummaryValue::Int(3).to_string(), "3");
        assert_eq!(SummaryValue::Float(0.25).to_string(), "0.2500");
        assert_eq!(SummaryValue::Text("knn".to_string()).to_string(), "knn");
        assert_eq!(SummaryValue::Bool(true).to_string(), "true");
    }
}
