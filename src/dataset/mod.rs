//! Labeled trajectory datasets and train/test splitting.
//!
//! The [`Samples`] trait is the single polymorphic input type every model
//! operation takes: anything exposing an ordered sequence of labeled
//! trajectories. Both [`TrajectoryDataset`] (owned) and [`DatasetSlice`]
//! (a borrowed view over a subset) satisfy it, so splitting a dataset never
//! copies trajectories.

use crate::error::{Result, TrayectoError};
use crate::trajectory::Trajectory;

/// An ordered sequence of labeled trajectory samples.
///
/// Object-safe so models can take `&dyn Samples` and callers can pass a
/// full dataset or any slice of one interchangeably.
pub trait Samples {
    /// Number of samples.
    fn len(&self) -> usize;

    /// Returns true if there are no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The trajectory at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    fn trajectory(&self, index: usize) -> &Trajectory;

    /// The class label at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    fn label(&self, index: usize) -> usize;

    /// Number of distinct classes in the underlying dataset.
    fn class_count(&self) -> usize;

    /// Human-readable name for a class label, when the dataset carries one.
    fn class_name(&self, label: usize) -> Option<&str>;

    /// All labels in sample order.
    fn labels(&self) -> Vec<usize> {
        (0..self.len()).map(|i| self.label(i)).collect()
    }
}

/// An owned collection of labeled trajectories.
///
/// # Examples
///
/// ```
/// use trayecto::dataset::{Samples, TrajectoryDataset};
/// use trayecto::trajectory::Trajectory;
///
/// let trajectories = vec![
///     Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, 1.0, 0.0)]).expect("points"),
///     Trajectory::from_points(&[(0.0, 0.0, 0.0), (1.0, 0.0, 1.0)]).expect("points"),
/// ];
/// let dataset = TrajectoryDataset::new(trajectories, vec![0, 1]).expect("matching labels");
/// assert_eq!(dataset.len(), 2);
/// assert_eq!(dataset.class_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TrajectoryDataset {
    trajectories: Vec<Trajectory>,
    labels: Vec<usize>,
    class_names: Option<Vec<String>>,
}

impl TrajectoryDataset {
    /// Creates a dataset from trajectories and parallel class labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset is empty or the label count doesn't
    /// match the trajectory count.
    pub fn new(trajectories: Vec<Trajectory>, labels: Vec<usize>) -> Result<Self> {
        if trajectories.is_empty() {
            return Err(TrayectoError::EmptyDataset);
        }
        if trajectories.len() != labels.len() {
            return Err(TrayectoError::DimensionMismatch {
                expected: format!("{} labels", trajectories.len()),
                actual: format!("{} labels", labels.len()),
            });
        }
        Ok(Self {
            trajectories,
            labels,
            class_names: None,
        })
    }

    /// Attaches human-readable class names.
    ///
    /// # Errors
    ///
    /// Returns an error if a label in the dataset has no corresponding name.
    pub fn with_class_names(mut self, names: Vec<String>) -> Result<Self> {
        let max_label = self.labels.iter().copied().max().unwrap_or(0);
        if max_label >= names.len() {
            return Err(TrayectoError::DimensionMismatch {
                expected: format!("at least {} class names", max_label + 1),
                actual: format!("{} class names", names.len()),
            });
        }
        self.class_names = Some(names);
        Ok(self)
    }

    /// Borrows a view over the given sample indices, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if any index is out of bounds.
    pub fn slice(&self, indices: Vec<usize>) -> Result<DatasetSlice<'_>> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(TrayectoError::DimensionMismatch {
                expected: format!("indices below {}", self.len()),
                actual: format!("index {bad}"),
            });
        }
        Ok(DatasetSlice {
            dataset: self,
            indices,
        })
    }

    /// Splits the dataset into disjoint train and test views.
    ///
    /// Samples are shuffled before splitting; passing `random_state` makes
    /// the shuffle reproducible.
    ///
    /// # Arguments
    ///
    /// * `test_size` - Proportion of samples for the test view (0.0 to 1.0)
    /// * `random_state` - Optional random seed for reproducibility
    ///
    /// # Errors
    ///
    /// Returns an error if `test_size` is out of range or either side of
    /// the split would be empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use trayecto::dataset::{Samples, TrajectoryDataset};
    /// use trayecto::trajectory::Trajectory;
    ///
    /// let trajectories: Vec<_> = (0..10)
    ///     .map(|i| {
    ///         Trajectory::from_points(&[(0.0, i as f32, 0.0), (1.0, i as f32, 1.0)])
    ///             .expect("points")
    ///     })
    ///     .collect();
    /// let dataset = TrajectoryDataset::new(trajectories, vec![0; 10]).expect("dataset");
    ///
    /// let (train, test) = dataset.split(0.2, Some(42)).expect("valid split");
    /// assert_eq!(train.len(), 8);
    /// assert_eq!(test.len(), 2);
    /// ```
    pub fn split(
        &self,
        test_size: f32,
        random_state: Option<u64>,
    ) -> Result<(DatasetSlice<'_>, DatasetSlice<'_>)> {
        let (n_train, _) = self.validate_split(test_size)?;

        let indices = shuffle_indices(self.len(), random_state);
        let train = self.slice(indices[..n_train].to_vec())?;
        let test = self.slice(indices[n_train..].to_vec())?;
        Ok((train, test))
    }

    fn validate_split(&self, test_size: f32) -> Result<(usize, usize)> {
        if test_size <= 0.0 || test_size >= 1.0 {
            return Err(TrayectoError::InvalidSplit {
                message: format!("test_size must be between 0 and 1, got {test_size}"),
            });
        }

        let n_samples = self.len();
        let n_test = (n_samples as f32 * test_size).round() as usize;
        let n_train = n_samples - n_test;

        if n_test == 0 || n_train == 0 {
            return Err(TrayectoError::InvalidSplit {
                message: format!(
                    "split would leave an empty side (n_train={n_train}, n_test={n_test})"
                ),
            });
        }

        Ok((n_train, n_test))
    }
}

impl Samples for TrajectoryDataset {
    fn len(&self) -> usize {
        self.trajectories.len()
    }

    fn trajectory(&self, index: usize) -> &Trajectory {
        &self.trajectories[index]
    }

    fn label(&self, index: usize) -> usize {
        self.labels[index]
    }

    fn class_count(&self) -> usize {
        match &self.class_names {
            Some(names) => names.len(),
            None => self.labels.iter().copied().max().map_or(0, |m| m + 1),
        }
    }

    fn class_name(&self, label: usize) -> Option<&str> {
        self.class_names
            .as_ref()
            .and_then(|names| names.get(label))
            .map(String::as_str)
    }
}

/// A borrowed view over a subset of a dataset's samples.
///
/// Produced by [`TrajectoryDataset::split`] and [`TrajectoryDataset::slice`];
/// shares the class space of its parent dataset.
#[derive(Debug, Clone)]
pub struct DatasetSlice<'a> {
    dataset: &'a TrajectoryDataset,
    indices: Vec<usize>,
}

impl DatasetSlice<'_> {
    /// Indices into the parent dataset, in view order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl Samples for DatasetSlice<'_> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn trajectory(&self, index: usize) -> &Trajectory {
        self.dataset.trajectory(self.indices[index])
    }

    fn label(&self, index: usize) -> usize {
        self.dataset.label(self.indices[index])
    }

    fn class_count(&self) -> usize {
        self.dataset.class_count()
    }

    fn class_name(&self, label: usize) -> Option<&str> {
        self.dataset.class_name(label)
    }
}

/// Shuffles indices with optional random seed.
fn shuffle_indices(n_samples: usize, random_state: Option<u64>) -> Vec<usize> {
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    let mut indices: Vec<usize> = (0..n_samples).collect();

    if let Some(seed) = random_state {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
    } else {
        let mut rng = rand::thread_rng();
        indices.shuffle(&mut rng);
    }

    indices
}
