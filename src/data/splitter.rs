// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Splits samples into three consecutive partitions:
//   - Training set:   first 70%
//   - Validation set: next 15%
//   - Test set:       the remainder
//
// The split is positional: whatever order the dataset file has
// decides which elements land where. Callers that want a mixed
// split can shuffle first with a fixed seed via
// `shuffle_then_split`, which uses the Fisher-Yates shuffle from
// rand::seq::SliceRandom.
//
// Boundaries are floor(N * 70 / 100) and floor(N * 85 / 100),
// computed on integers so no float rounding moves a sample.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Percentage of samples used for training
pub const TRAIN_PERCENT: usize = 70;

/// Percentage of samples used for validation
pub const VALIDATION_PERCENT: usize = 15;

/// The three disjoint, ordered partitions of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Partitions<T> {
    pub train:      Vec<T>,
    pub validation: Vec<T>,
    pub test:       Vec<T>,
}

#[cfg(test)]
impl<T> Partitions<T> {
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

/// Index boundaries `(train_end, validation_end)` for `total` samples.
pub fn split_points(total: usize) -> (usize, usize) {
    let train_end      = total * TRAIN_PERCENT / 100;
    let validation_end = total * (TRAIN_PERCENT + VALIDATION_PERCENT) / 100;
    (train_end, validation_end)
}

/// Split `samples` in their current order.
///
/// # Example
/// ```ignore
/// let parts = split_positional((0..20).collect::<Vec<_>>());
/// assert_eq!(parts.train, (0..14).collect::<Vec<_>>());
/// ```
pub fn split_positional<T>(mut samples: Vec<T>) -> Partitions<T> {
    let total = samples.len();
    let (train_end, validation_end) = split_points(total);

    // split_off(n) keeps [0..n) in place and returns [n..)
    let test       = samples.split_off(validation_end);
    let validation = samples.split_off(train_end);

    tracing::debug!(
        "Dataset split: {} train, {} validation, {} test",
        samples.len(),
        validation.len(),
        test.len(),
    );

    Partitions { train: samples, validation, test }
}

/// Shuffle with a seeded RNG, then split positionally.
/// The same seed always produces the same partitions.
pub fn shuffle_then_split<T>(mut samples: Vec<T>, seed: u64) -> Partitions<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);
    tracing::debug!("Shuffled {} samples with seed {}", samples.len(), seed);
    split_positional(samples)
}
