//! Feature extraction collaborators.
//!
//! Models don't consume raw trajectories directly; a [`Featurizer`] turns a
//! sample collection into a fixed-width feature matrix, one row per sample.
//! The variants in [`crate::models`] accept any implementation.

use crate::dataset::Samples;
use crate::error::{Result, TrayectoError};
use crate::primitives::Matrix;
use crate::trajectory::Trajectory;

/// Turns an ordered sample collection into a feature matrix.
pub trait Featurizer {
    /// Width of the produced feature rows.
    fn n_features(&self) -> usize;

    /// Extracts one feature row per sample, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is empty.
    fn features(&self, data: &dyn Samples) -> Result<Matrix<f32>>;
}

/// Standard per-trajectory kinematic statistics.
///
/// Six features per trajectory: duration, path length, net displacement,
/// straightness (net displacement over path length), mean speed, and speed
/// standard deviation.
///
/// # Examples
///
/// ```
/// use trayecto::features::{Featurizer, KinematicFeaturizer};
/// use trayecto::dataset::TrajectoryDataset;
/// use trayecto::trajectory::Trajectory;
///
/// let trajectories = vec![
///     Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, 1.0, 0.0), (2.0, 2.0, 0.0)])
///         .expect("points"),
/// ];
/// let dataset = TrajectoryDataset::new(trajectories, vec![0]).expect("dataset");
///
/// let featurizer = KinematicFeaturizer::new();
/// let features = featurizer.features(&dataset).expect("non-empty data");
/// assert_eq!(features.shape(), (1, 6));
/// ```
#[derive(Debug, Clone, Default)]
pub struct KinematicFeaturizer;

impl KinematicFeaturizer {
    /// Creates the featurizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn row(trajectory: &Trajectory) -> [f32; 6] {
        let duration = trajectory.duration();
        let path_length = trajectory.path_length();
        let net_displacement = trajectory.net_displacement();
        let straightness = if path_length > 0.0 {
            net_displacement / path_length
        } else {
            1.0
        };

        let speeds = trajectory.speeds();
        let (mean_speed, std_speed) = if speeds.is_empty() {
            (0.0, 0.0)
        } else {
            let mean = speeds.iter().sum::<f32>() / speeds.len() as f32;
            let variance = speeds.iter().map(|&s| (s - mean).powi(2)).sum::<f32>()
                / speeds.len() as f32;
            (mean, variance.sqrt())
        };

        [
            duration,
            path_length,
            net_displacement,
            straightness,
            mean_speed,
            std_speed,
        ]
    }
}

impl Featurizer for KinematicFeaturizer {
    fn n_features(&self) -> usize {
        6
    }

    fn features(&self, data: &dyn Samples) -> Result<Matrix<f32>> {
        if data.is_empty() {
            return Err(TrayectoError::EmptyDataset);
        }

        let n_samples = data.len();
        let mut cells = Vec::with_capacity(n_samples * self.n_features());
        for i in 0..n_samples {
            cells.extend_from_slice(&Self::row(data.trajectory(i)));
        }

        Matrix::from_vec(n_samples, self.n_features(), cells)
            .map_err(|e| TrayectoError::Other(e.to_string()))
    }
}
