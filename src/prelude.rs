//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use trayecto::prelude::*;
//! ```

pub use crate::dataset::{DatasetSlice, Samples, TrajectoryDataset};
pub use crate::error::{Result, TrayectoError};
pub use crate::evaluation::Evaluation;
pub use crate::features::{Featurizer, KinematicFeaturizer};
pub use crate::model::{GuardPolicy, Model, ModelCore, Summary, SummaryValue};
pub use crate::models::{DistanceMetric, KNeighborsModel, RandomForestModel};
pub use crate::primitives::Matrix;
