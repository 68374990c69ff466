use std::sync::Arc;

use burn::data::dataset::Dataset;

use crate::domain::errors::PipelineError;
use crate::domain::table::SensorTable;
use crate::domain::traits::WindowPolicy;

/// One resolved window: L contiguous feature rows of a single unit,
/// flattened row-major, plus the RUL target at the window's final cycle.
#[derive(Debug, Clone)]
pub struct SequenceSample {
    pub unit_id:     u32,
    /// Cycle of the window's last row (the cycle the target refers to)
    pub last_cycle:  u32,
    /// Flattened L x F feature matrix, row-major
    pub features:    Vec<f32>,
    pub seq_len:     usize,
    pub feature_dim: usize,
    pub target:      f32,
}

/// Wraps a normalized table, its per-row RUL labels, and a window
/// policy; resolves window indices into (feature matrix, target) pairs
/// on demand. Windows are ephemeral: built per request, not stored.
pub struct SequenceDataset<P: WindowPolicy> {
    table:   Arc<SensorTable>,
    labels:  Arc<Vec<f32>>,
    indexer: Arc<P>,
    seq_len: usize,
}

// Derived Clone would require P: Clone; the Arc fields are what is cloned.
impl<P: WindowPolicy> Clone for SequenceDataset<P> {
    fn clone(&self) -> Self {
        Self {
            table:   Arc::clone(&self.table),
            labels:  Arc::clone(&self.labels),
            indexer: Arc::clone(&self.indexer),
            seq_len: self.seq_len,
        }
    }
}

impl<P: WindowPolicy> SequenceDataset<P> {
    pub fn new(
        table:   Arc<SensorTable>,
        labels:  Arc<Vec<f32>>,
        indexer: P,
        seq_len: usize,
    ) -> Result<Self, PipelineError> {
        if labels.len() != table.row_count() {
            return Err(PipelineError::Schema(format!(
                "{} labels for {} table rows",
                labels.len(),
                table.row_count()
            )));
        }
        Ok(Self { table, labels, indexer: Arc::new(indexer), seq_len })
    }

    /// Resolve one window. Fails with `IndexOutOfRange` outside
    /// `[0, len())`; slicing past a unit's end cannot happen for an
    /// index the policy accepted.
    pub fn sample(&self, index: usize) -> Result<SequenceSample, PipelineError> {
        let win = self.indexer.locate(index)?;

        let rows        = &self.table.rows()[win.start_row..win.start_row + self.seq_len];
        let feature_dim = self.table.feature_count();

        let mut features = Vec::with_capacity(self.seq_len * feature_dim);
        for row in rows {
            features.extend_from_slice(&row.settings);
            features.extend_from_slice(&row.sensors);
        }

        let last_row = win.start_row + self.seq_len - 1;
        Ok(SequenceSample {
            unit_id:    win.unit_id,
            last_cycle: rows[self.seq_len - 1].cycle,
            features,
            seq_len:    self.seq_len,
            feature_dim,
            target:     self.labels[last_row],
        })
    }
}

impl<P: WindowPolicy + Send + Sync> Dataset<SequenceSample> for SequenceDataset<P> {
    fn get(&self, index: usize) -> Option<SequenceSample> {
        self.sample(index).ok()
    }

    fn len(&self) -> usize {
        self.indexer.num_windows()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::indexer::EnumerateIndexer;
    use crate::domain::table::RawRecord;

    fn tiny_table() -> SensorTable {
        // One unit, 5 cycles; sensor_1 carries the cycle number so a
        // window's content is easy to assert on.
        let rows = (1..=5u32)
            .map(|cycle| {
                let mut sensors = vec![0.0f32; 21];
                sensors[0] = cycle as f32;
                RawRecord { unit_id: 1, cycle, settings: vec![0.0; 3], sensors }
            })
            .collect();
        SensorTable::new(rows).unwrap()
    }

    #[test]
    fn test_sample_slices_contiguous_rows_and_target() {
        let table  = Arc::new(tiny_table());
        let labels = Arc::new(vec![4.0, 3.0, 2.0, 1.0, 0.0]);
        let idx    = EnumerateIndexer::new(&table, 3).unwrap();
        let ds     = SequenceDataset::new(table, labels, idx, 3).unwrap();

        assert_eq!(ds.len(), 3);

        // Window starting at cycle 2 covers cycles 2..4; target is the
        // label of the final row (cycle 4 → RUL 1).
        let s = ds.sample(1).unwrap();
        assert_eq!(s.unit_id, 1);
        assert_eq!(s.last_cycle, 4);
        assert_eq!(s.target, 1.0);
        assert_eq!(s.features.len(), 3 * 24);
        // sensor_1 is feature column 3 of each 24-wide row
        assert_eq!(s.features[3], 2.0);
        assert_eq!(s.features[24 + 3], 3.0);
        assert_eq!(s.features[48 + 3], 4.0);
    }

    #[test]
    fn test_out_of_range_sample() {
        let table  = Arc::new(tiny_table());
        let labels = Arc::new(vec![0.0; 5]);
        let idx    = EnumerateIndexer::new(&table, 3).unwrap();
        let ds     = SequenceDataset::new(table, labels, idx, 3).unwrap();

        assert!(matches!(
            ds.sample(3),
            Err(PipelineError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(ds.get(3).is_none());
    }

    #[test]
    fn test_label_row_count_mismatch_rejected() {
        let table  = Arc::new(tiny_table());
        let labels = Arc::new(vec![0.0; 4]);
        let idx    = EnumerateIndexer::new(&table, 3).unwrap();
        assert!(matches!(
            SequenceDataset::new(table, labels, idx, 3),
            Err(PipelineError::Schema(_))
        ));
    }
}
