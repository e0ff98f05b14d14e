//! Cross-validation fold assignment.
//!
//! Model variants consume [`KFold`] when `train` is called with a non-zero
//! `cross_validation` fold count: the training data is folded, per-fold
//! accuracy is recorded into the model summary, and the final fit runs on
//! the full data.

/// K-Fold cross-validator.
///
/// Splits sample indices into K consecutive folds. Each fold is used once
/// as the validation set while the remaining K-1 folds form the training
/// set.
///
/// # Examples
///
/// ```
/// use trayecto::model_selection::KFold;
///
/// let kfold = KFold::new(5).with_random_state(42);
/// let folds = kfold.split(10);
/// assert_eq!(folds.len(), 5);
/// for (train_idx, test_idx) in &folds {
///     assert_eq!(train_idx.len() + test_idx.len(), 10);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    random_state: Option<u64>,
}

impl KFold {
    /// Creates a cross-validator over `n_splits` consecutive folds.
    ///
    /// `n_splits` must be at least 2.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: None,
        }
    }

    /// Shuffles the indices with the given seed before folding.
    ///
    /// Unseeded folds stay consecutive.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Generates train/test indices for each fold.
    ///
    /// The remainder when `n_samples` doesn't divide evenly is spread over
    /// the leading folds.
    #[must_use]
    pub fn split(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if let Some(seed) = self.random_state {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
        }

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut start = 0;
        (0..self.n_splits)
            .map(|fold| {
                let end = start + base + usize::from(fold < remainder);
                let test = indices[start..end].to_vec();
                let train = indices[..start]
                    .iter()
                    .chain(&indices[end..])
                    .copied()
                    .collect();
                start = end;
                (train, test)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_index_is_a_test_index_exactly_once() {
        let kfold = KFold::new(4);
        let folds = kfold.split(10);

        let mut test_indices: Vec<usize> =
            folds.iter().flat_map(|(_, test)| test.clone()).collect();
        test_indices.sort_unstable();
        assert_eq!(test_indices, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_train_and_test_are_disjoint() {
        let kfold = KFold::new(3);
        for (train, test) in kfold.split(9) {
            for idx in &test {
                assert!(!train.contains(idx));
            }
        }
    }

    #[test]
    fn test_remainder_spread_over_leading_folds() {
        let kfold = KFold::new(3);
        let folds = kfold.split(10);
        let sizes: Vec<usize> = folds.iter().map(|(_, test)| test.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn test_seeded_split_is_reproducible() {
        let a = KFold::new(5).with_random_state(42).split(20);
        let b = KFold::new(5).with_random_state(42).split(20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unshuffled_split_is_consecutive() {
        let folds = KFold::new(2).split(4);
        assert_eq!(folds[0].1, vec![0, 1]);
        assert_eq!(folds[1].1, vec![2, 3]);
    }
}
