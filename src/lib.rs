//! Trayecto: trajectory classification with a uniform model lifecycle.
//!
//! Trayecto standardizes how a statistical model over trajectory data moves
//! through its lifecycle: constructed → trained → used for prediction →
//! evaluated. Every estimator satisfies the same [`model::Model`] contract,
//! so callers swap implementations without changing calling code.
//!
//! # Quick Start
//!
//! ```
//! use trayecto::prelude::*;
//! use trayecto::trajectory::Trajectory;
//!
//! // Two movement classes: short hops and long sprints.
//! let mut trajectories = Vec::new();
//! let mut labels = Vec::new();
//! for i in 0..10 {
//!     let reach = if i % 2 == 0 { 1.0 } else { 12.0 };
//!     trajectories.push(
//!         Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, reach + i as f32 * 0.1, 0.0)])
//!             .expect("points"),
//!     );
//!     labels.push(i % 2);
//! }
//! let dataset = TrajectoryDataset::new(trajectories, labels).expect("dataset");
//!
//! // Split, train, evaluate.
//! let (train, test) = dataset.split(0.2, Some(0)).expect("valid split");
//! let mut model = KNeighborsModel::new(KinematicFeaturizer::new(), 1);
//! model.train(&train, 0).expect("training succeeds");
//! assert!(model.trained());
//!
//! let evaluation = model.evaluate(&test).expect("evaluation succeeds");
//! assert!((evaluation.accuracy() - 1.0).abs() < 1e-6);
//! ```
//!
//! # Modules
//!
//! - [`model`]: The model lifecycle contract (the core of the crate)
//! - [`models`]: Concrete model variants (random forest, k-NN)
//! - [`dataset`]: Labeled trajectory datasets and train/test splitting
//! - [`trajectory`]: The trajectory sample type
//! - [`features`]: Feature extraction collaborators
//! - [`evaluation`]: Reportable evaluation results
//! - [`metrics`]: Classification metrics
//! - [`model_selection`]: Cross-validation fold assignment
//! - [`primitives`]: The feature matrix type
//! - [`error`]: Error types

pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod metrics;
pub mod model;
pub mod model_selection;
pub mod models;
pub mod prelude;
pub mod primitives;
pub mod trajectory;
