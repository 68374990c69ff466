// ============================================================
// Layer 3 — RUL Label Reconstruction
// ============================================================
// Remaining useful life is not stored in the sensor logs; it is
// reconstructed per row:
//
//   Training units ran to failure, so
//     RUL(unit, cycle) = max_cycle(unit) - cycle
//   and the label reaches 0 exactly at the unit's last cycle.
//
//   Test units were cut off early; a terminal-RUL file supplies
//   the cycles remaining beyond each unit's last logged cycle:
//     RUL(unit, cycle) = max_cycle(unit) + final_rul(unit) - cycle
//   so at the last logged cycle the label equals final_rul(unit).

use crate::domain::errors::PipelineError;
use crate::domain::table::SensorTable;

/// RUL labels for run-to-failure training units, one per table row.
/// Monotonically non-increasing within a unit, 0 at the final cycle.
pub fn training_labels(table: &SensorTable) -> Vec<f32> {
    let mut labels = vec![0.0f32; table.row_count()];
    for span in table.units() {
        let max_cycle = span.max_cycle();
        for offset in 0..span.len {
            let row = &table.rows()[span.start_row + offset];
            labels[span.start_row + offset] = (max_cycle - row.cycle) as f32;
        }
    }
    labels
}

/// RUL labels for truncated test units. `final_rul` holds one terminal
/// value per unit, aligned with the table's unit order.
pub fn test_labels(table: &SensorTable, final_rul: &[f32]) -> Result<Vec<f32>, PipelineError> {
    if final_rul.len() != table.unit_count() {
        return Err(PipelineError::Schema(format!(
            "terminal-RUL file has {} entries but the table has {} units",
            final_rul.len(),
            table.unit_count()
        )));
    }

    let mut labels = vec![0.0f32; table.row_count()];
    for (span, &terminal) in table.units().iter().zip(final_rul) {
        let max_cycle = span.max_cycle() as f32;
        for offset in 0..span.len {
            let row = &table.rows()[span.start_row + offset];
            labels[span.start_row + offset] = max_cycle + terminal - row.cycle as f32;
        }
    }
    Ok(labels)
}
