// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles a dataset with a fixed seed and splits it into two
// index ranges:
//   - Training set:   used to update model weights
//   - Validation set: used to measure performance on unseen data
//
// The split is lazy — no samples are materialised. Two
// ShuffledDataset views are built over the same underlying
// dataset with the same seed, so both see the identical
// permutation and the two PartialDataset ranges are disjoint
// and together cover every index exactly once.
//
// Split ratio: 80% training, 20% validation (configurable)
//
// Reference: Burn Book §4 (Dataset transforms)

use burn::data::dataset::transform::{PartialDataset, ShuffledDataset};
use burn::data::dataset::Dataset;

/// A seeded shuffle of `D` restricted to an index range.
pub type SplitDataset<D, I> = PartialDataset<ShuffledDataset<D, I>, I>;

/// Shuffle `dataset` with `seed` and split into (train, validation).
///
/// # Arguments
/// * `dataset`        - The full dataset (cloned into both views)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `seed`           - Shuffle seed; the same seed on both views
///                      keeps the ranges disjoint
pub fn split_train_val<D, I>(
    dataset:        &D,
    train_fraction: f64,
    seed:           u64,
) -> (SplitDataset<D, I>, SplitDataset<D, I>)
where
    D: Dataset<I> + Clone,
    I: Clone + Send + Sync,
{
    let total    = dataset.len();
    let split_at = (((total as f64) * train_fraction).round() as usize).min(total);

    let train = PartialDataset::new(
        ShuffledDataset::with_seed(dataset.clone(), seed),
        0,
        split_at,
    );
    let val = PartialDataset::new(
        ShuffledDataset::with_seed(dataset.clone(), seed),
        split_at,
        total,
    );

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        train.len(),
        val.len(),
    );

    (train, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal identity dataset: index i yields item i.
    #[derive(Clone)]
    struct RangeDataset(usize);

    impl Dataset<usize> for RangeDataset {
        fn get(&self, index: usize) -> Option<usize> {
            (index < self.0).then_some(index)
        }
        fn len(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn test_correct_split_sizes() {
        let (train, val) = split_train_val(&RangeDataset(100), 0.8, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_all_items_covered_exactly_once() {
        // The same permutation backs both halves, so together they
        // must cover every item exactly once.
        let (train, val) = split_train_val(&RangeDataset(50), 0.7, 7);

        let mut seen: Vec<usize> = (0..train.len())
            .map(|i| train.get(i).unwrap())
            .chain((0..val.len()).map(|i| val.get(i).unwrap()))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let (train_a, _) = split_train_val(&RangeDataset(30), 0.8, 13);
        let (train_b, _) = split_train_val(&RangeDataset(30), 0.8, 13);
        for i in 0..train_a.len() {
            assert_eq!(train_a.get(i), train_b.get(i));
        }
    }

    #[test]
    fn test_full_training_split() {
        let (train, val) = split_train_val(&RangeDataset(10), 1.0, 0);
        assert_eq!(train.len(), 10);
        assert_eq!(val.len(),   0);
    }
}
