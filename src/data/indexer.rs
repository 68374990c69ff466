// ============================================================
// Layer 4 — Window Indexers
// ============================================================
// Two policies map a global window index to a (unit, start-row)
// pair; both honour the same window invariants (L contiguous
// rows of one unit) but address windows differently:
//
//   Wrap policy (training)
//     The unit contributing window i is chosen at random, then
//     start = i mod (N_unit - L + 1). Short units are oversampled
//     relative to their length; that sampling shape is intentional
//     and preserved. Every unit choice is drawn up front from the
//     injected seeded RNG, so locate(i) is a pure lookup: worker
//     threads may fetch windows in any order without changing
//     any window's content.
//
//   Enumerate-valid policy (testing)
//     Every admissible start of every eligible unit, ordered by
//     unit order in the table then ascending start cycle. Stable
//     and deterministic, so every test window is scored exactly
//     once and the per-cycle prediction trace is reproducible.
//
// Units shorter than L are excluded up front (warned, not fatal);
// a table where no unit is long enough is fatal for both policies.

use rand::Rng;

use crate::domain::errors::PipelineError;
use crate::domain::table::{SensorTable, UnitSpan};
use crate::domain::traits::{WindowPolicy, WindowRef};

// ─── Wrap policy (training) ───────────────────────────────────────────────────

pub struct WrapIndexer {
    /// Units with at least `seq_len` rows
    eligible:     Vec<UnitSpan>,
    /// Pre-drawn unit choice (index into `eligible`) per window index
    unit_choices: Vec<usize>,
    seq_len:      usize,
}

impl WrapIndexer {
    /// Build a wrap indexer with `num_windows` logical windows,
    /// drawing every unit choice from the caller's seeded RNG.
    pub fn new<R: Rng>(
        table:       &SensorTable,
        seq_len:     usize,
        num_windows: usize,
        rng:         &mut R,
    ) -> Result<Self, PipelineError> {
        let eligible = eligible_units(table, seq_len)?;

        let unit_choices = (0..num_windows)
            .map(|_| rng.gen_range(0..eligible.len()))
            .collect();

        Ok(Self { eligible, unit_choices, seq_len })
    }
}

impl WindowPolicy for WrapIndexer {
    fn num_windows(&self) -> usize {
        self.unit_choices.len()
    }

    fn locate(&self, index: usize) -> Result<WindowRef, PipelineError> {
        let &choice = self.unit_choices.get(index).ok_or(PipelineError::IndexOutOfRange {
            index,
            len: self.unit_choices.len(),
        })?;
        let span = self.eligible[choice];

        // Defensive re-check of the eligibility invariant: a unit shorter
        // than the window length must never be wrapped with a bogus modulus.
        if span.len < self.seq_len {
            return Err(PipelineError::InsufficientLength(format!(
                "unit {} has {} rows, shorter than window length {}",
                span.unit_id, span.len, self.seq_len
            )));
        }

        let valid_starts = span.len - self.seq_len + 1;
        let offset = index % valid_starts;
        Ok(WindowRef {
            unit_id:   span.unit_id,
            start_row: span.start_row + offset,
        })
    }
}

// ─── Enumerate-valid policy (testing) ─────────────────────────────────────────

pub struct EnumerateIndexer {
    windows: Vec<WindowRef>,
}

impl EnumerateIndexer {
    /// Enumerate every admissible window: table unit order, then
    /// ascending start cycle within each unit.
    pub fn new(table: &SensorTable, seq_len: usize) -> Result<Self, PipelineError> {
        let eligible = eligible_units(table, seq_len)?;

        let mut windows = Vec::new();
        for span in &eligible {
            let valid_starts = span.len - seq_len + 1;
            for offset in 0..valid_starts {
                windows.push(WindowRef {
                    unit_id:   span.unit_id,
                    start_row: span.start_row + offset,
                });
            }
        }

        Ok(Self { windows })
    }
}

impl WindowPolicy for EnumerateIndexer {
    fn num_windows(&self) -> usize {
        self.windows.len()
    }

    fn locate(&self, index: usize) -> Result<WindowRef, PipelineError> {
        self.windows
            .get(index)
            .copied()
            .ok_or(PipelineError::IndexOutOfRange { index, len: self.windows.len() })
    }
}

/// Units with at least `seq_len` rows. Short units are excluded with a
/// warning; a table where every unit is short cannot produce windows.
fn eligible_units(table: &SensorTable, seq_len: usize) -> Result<Vec<UnitSpan>, PipelineError> {
    let mut eligible = Vec::with_capacity(table.unit_count());
    for span in table.units() {
        if span.len >= seq_len {
            eligible.push(*span);
        } else {
            tracing::warn!(
                "Excluding unit {}: {} rows < window length {}",
                span.unit_id,
                span.len,
                seq_len
            );
        }
    }

    if eligible.is_empty() {
        return Err(PipelineError::InsufficientLength(format!(
            "no unit has at least {} rows; cannot build windows",
            seq_len
        )));
    }
    Ok(eligible)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::RawRecord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table_with_units(lengths: &[usize]) -> SensorTable {
        let mut rows = Vec::new();
        for (u, &len) in lengths.iter().enumerate() {
            for c in 1..=len {
                rows.push(RawRecord {
                    unit_id:  (u + 1) as u32,
                    cycle:    c as u32,
                    settings: vec![0.0; 3],
                    sensors:  vec![0.0; 21],
                });
            }
        }
        SensorTable::new(rows).unwrap()
    }

    #[test]
    fn test_enumerate_counts_and_order() {
        // Units of 5 and 7 rows, L=4 → 2 + 4 windows
        let table = table_with_units(&[5, 7]);
        let idx   = EnumerateIndexer::new(&table, 4).unwrap();
        assert_eq!(idx.num_windows(), 2 + 4);

        // Unit order, then ascending start
        let located: Vec<WindowRef> = (0..idx.num_windows())
            .map(|i| idx.locate(i).unwrap())
            .collect();
        assert_eq!(located[0], WindowRef { unit_id: 1, start_row: 0 });
        assert_eq!(located[1], WindowRef { unit_id: 1, start_row: 1 });
        assert_eq!(located[2], WindowRef { unit_id: 2, start_row: 5 });
        assert_eq!(located[5], WindowRef { unit_id: 2, start_row: 8 });
    }

    #[test]
    fn test_enumerate_excludes_short_units() {
        // The 3-row unit contributes zero windows, without error
        let table = table_with_units(&[3, 6]);
        let idx   = EnumerateIndexer::new(&table, 4).unwrap();
        assert_eq!(idx.num_windows(), 3);
        for i in 0..idx.num_windows() {
            assert_eq!(idx.locate(i).unwrap().unit_id, 2);
        }
    }

    #[test]
    fn test_all_units_short_is_fatal() {
        let table = table_with_units(&[3, 2]);
        assert!(matches!(
            EnumerateIndexer::new(&table, 4),
            Err(PipelineError::InsufficientLength(_))
        ));

        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            WrapIndexer::new(&table, 4, 10, &mut rng),
            Err(PipelineError::InsufficientLength(_))
        ));
    }

    #[test]
    fn test_wrap_start_is_index_modulo_span() {
        // One unit of 6 rows, L=4 → 3 valid starts; start = i mod 3
        let table   = table_with_units(&[6]);
        let mut rng = StdRng::seed_from_u64(3);
        let idx     = WrapIndexer::new(&table, 4, 9, &mut rng).unwrap();

        for i in 0..9 {
            let win = idx.locate(i).unwrap();
            assert_eq!(win.unit_id, 1);
            assert_eq!(win.start_row, i % 3);
        }
    }

    #[test]
    fn test_wrap_is_deterministic_under_seed() {
        let table = table_with_units(&[10, 20, 30]);

        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = WrapIndexer::new(&table, 5, 40, &mut rng_a).unwrap();
        let b = WrapIndexer::new(&table, 5, 40, &mut rng_b).unwrap();

        for i in 0..40 {
            assert_eq!(a.locate(i).unwrap(), b.locate(i).unwrap());
        }
    }

    #[test]
    fn test_wrap_skips_short_units_in_choices() {
        // Unit 1 is too short; every located window must come from unit 2
        let table   = table_with_units(&[2, 8]);
        let mut rng = StdRng::seed_from_u64(7);
        let idx     = WrapIndexer::new(&table, 4, 25, &mut rng).unwrap();

        for i in 0..25 {
            assert_eq!(idx.locate(i).unwrap().unit_id, 2);
        }
    }

    #[test]
    fn test_out_of_range_index() {
        let table   = table_with_units(&[6]);
        let mut rng = StdRng::seed_from_u64(0);
        let wrap    = WrapIndexer::new(&table, 4, 5, &mut rng).unwrap();
        let en      = EnumerateIndexer::new(&table, 4).unwrap();

        assert!(matches!(
            wrap.locate(5),
            Err(PipelineError::IndexOutOfRange { index: 5, len: 5 })
        ));
        assert!(matches!(
            en.locate(99),
            Err(PipelineError::IndexOutOfRange { index: 99, len: 3 })
        ));
    }
}
