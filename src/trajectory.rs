//! Trajectory sample type.
//!
//! A trajectory is an ordered sequence of timestamped planar positions.
//! Parallel `t`/`x`/`y` storage keeps per-axis access contiguous for the
//! kinematic computations downstream.

use serde::{Deserialize, Serialize};

/// An ordered sequence of `(t, x, y)` points.
///
/// # Examples
///
/// ```
/// use trayecto::trajectory::Trajectory;
///
/// let traj = Trajectory::new(
///     vec![0.0, 1.0, 2.0],
///     vec![0.0, 1.0, 2.0],
///     vec![0.0, 0.0, 0.0],
/// ).expect("equal-length coordinate vectors");
/// assert_eq!(traj.len(), 3);
/// assert!((traj.path_length() - 2.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    t: Vec<f32>,
    x: Vec<f32>,
    y: Vec<f32>,
}

impl Trajectory {
    /// Creates a trajectory from parallel coordinate vectors.
    ///
    /// # Errors
    ///
    /// Returns an error if the vectors have differing lengths or are empty.
    pub fn new(t: Vec<f32>, x: Vec<f32>, y: Vec<f32>) -> Result<Self, &'static str> {
        if t.len() != x.len() || t.len() != y.len() {
            return Err("t, x and y must have the same length");
        }
        if t.is_empty() {
            return Err("Trajectory must contain at least one point");
        }
        Ok(Self { t, x, y })
    }

    /// Creates a trajectory from `(t, x, y)` tuples.
    ///
    /// # Errors
    ///
    /// Returns an error if `points` is empty.
    pub fn from_points(points: &[(f32, f32, f32)]) -> Result<Self, &'static str> {
        let t = points.iter().map(|p| p.0).collect();
        let x = points.iter().map(|p| p.1).collect();
        let y = points.iter().map(|p| p.2).collect();
        Self::new(t, x, y)
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// Returns true if the trajectory has no points.
    ///
    /// Always false for constructed trajectories; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Returns the point at `index` as `(t, x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn point(&self, index: usize) -> (f32, f32, f32) {
        (self.t[index], self.x[index], self.y[index])
    }

    /// Elapsed time between the first and last point.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.t[self.t.len() - 1] - self.t[0]
    }

    /// Sum of the Euclidean step displacements.
    #[must_use]
    pub fn path_length(&self) -> f32 {
        self.step_displacements().sum()
    }

    /// Straight-line distance between the first and last point.
    #[must_use]
    pub fn net_displacement(&self) -> f32 {
        let dx = self.x[self.x.len() - 1] - self.x[0];
        let dy = self.y[self.y.len() - 1] - self.y[0];
        (dx * dx + dy * dy).sqrt()
    }

    /// Per-step speeds (displacement over time delta).
    ///
    /// Steps with a non-positive time delta are skipped.
    #[must_use]
    pub fn speeds(&self) -> Vec<f32> {
        let mut speeds = Vec::with_capacity(self.len().saturating_sub(1));
        for i in 1..self.len() {
            let dt = self.t[i] - self.t[i - 1];
            if dt > 0.0 {
                let dx = self.x[i] - self.x[i - 1];
                let dy = self.y[i] - self.y[i - 1];
                speeds.push((dx * dx + dy * dy).sqrt() / dt);
            }
        }
        speeds
    }

    fn step_displacements(&self) -> impl Iterator<Item = f32> + '_ {
        (1..self.len()).map(move |i| {
            let dx = self.x[i] - self.x[i - 1];
            let dy = self.y[i] - self.y[i - 1];
            (dx * dx + dy * dy).sqrt()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagonal() -> Trajectory {
        Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, 3.0, 4.0)]).expect("two points")
    }

    #[test]
    fn test_new_rejects_mismatched_lengths() {
        let result = Trajectory::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_empty() {
        let result = Trajectory::new(vec![], vec![], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_path_length_and_net_displacement() {
        let traj = diagonal();
        // 3-4-5 triangle step
        assert!((traj.path_length() - 5.0).abs() < 1e-6);
        assert!((traj.net_displacement() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_duration() {
        let traj =
            Trajectory::from_points(&[(1.0, 0.0, 0.0), (4.5, 1.0, 1.0)]).expect("two points");
        assert!((traj.duration() - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_speeds_skips_zero_dt() {
        let traj = Trajectory::from_points(&[
            (0.0, 0.0, 0.0),
            (0.0, 1.0, 0.0), // zero time delta
            (1.0, 2.0, 0.0),
        ])
        .expect("three points");
        let speeds = traj.speeds();
        assert_eq!(speeds.len(), 1);
        assert!((speeds[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_point_trajectory() {
        let traj = Trajectory::from_points(&[(0.0, 1.0, 1.0)]).expect("single point");
        assert_eq!(traj.len(), 1);
        assert_eq!(traj.path_length(), 0.0);
        assert_eq!(traj.net_displacement(), 0.0);
        assert!(traj.speeds().is_empty());
    }
}
