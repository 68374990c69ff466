// ============================================================
// Layer 4 — Min-Max Normalization
// ============================================================
// Fits per-column (min, max) on the training table's feature
// columns and rescales every value to (x - min) / (max - min).
//
// The contract that makes train/test behave identically:
//   - parameters are fit ONCE, on the training table only
//   - transform requires the table's feature columns to match
//     the fitted columns exactly (names and order)
//   - persist/load round-trips min/max bit-for-bit, so a
//     reloaded scaler rescales exactly like the original
//
// A column whose max equals its min (a flat sensor) transforms
// to 0 for every row rather than dividing by zero.

use serde::{Deserialize, Serialize};

use crate::domain::errors::PipelineError;
use crate::domain::table::{RawRecord, SensorTable, SETTING_COLUMNS};

/// Fitted range of one feature column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRange {
    pub name: String,
    pub min:  f32,
    pub max:  f32,
}

/// Per-column min-max parameters, immutable once fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationParams {
    columns: Vec<ColumnRange>,
}

impl NormalizationParams {
    /// Compute per-column min/max over all rows of `table` for the
    /// requested `feature_columns`.
    pub fn fit(table: &SensorTable, feature_columns: &[String]) -> Result<Self, PipelineError> {
        if table.row_count() == 0 {
            return Err(PipelineError::EmptyTable);
        }

        let table_columns = crate::domain::table::feature_names();
        let mut indices = Vec::with_capacity(feature_columns.len());
        for name in feature_columns {
            let idx = table_columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| {
                    PipelineError::ColumnMismatch(format!("unknown feature column '{name}'"))
                })?;
            indices.push(idx);
        }

        let mut columns = Vec::with_capacity(indices.len());
        for (&idx, name) in indices.iter().zip(feature_columns) {
            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            for row in table.rows() {
                let v = row.feature(idx);
                min = min.min(v);
                max = max.max(v);
            }
            columns.push(ColumnRange { name: name.clone(), min, max });
        }

        Ok(Self { columns })
    }

    /// Rescale every feature column of `table` into a new table.
    /// The table's feature columns must be exactly the fitted ones.
    pub fn transform(&self, table: &SensorTable) -> Result<SensorTable, PipelineError> {
        let table_columns = crate::domain::table::feature_names();
        let fitted: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        if fitted != table_columns.iter().map(String::as_str).collect::<Vec<_>>() {
            return Err(PipelineError::ColumnMismatch(format!(
                "table columns {:?}... do not match fitted columns {:?}...",
                table_columns.first(),
                fitted.first()
            )));
        }

        let rows = table
            .rows()
            .iter()
            .map(|row| {
                let settings = row
                    .settings
                    .iter()
                    .zip(&self.columns[..SETTING_COLUMNS])
                    .map(|(&v, c)| scale(v, c.min, c.max))
                    .collect();
                let sensors = row
                    .sensors
                    .iter()
                    .zip(&self.columns[SETTING_COLUMNS..])
                    .map(|(&v, c)| scale(v, c.min, c.max))
                    .collect();
                RawRecord {
                    unit_id: row.unit_id,
                    cycle:   row.cycle,
                    settings,
                    sensors,
                }
            })
            .collect();

        SensorTable::new(rows)
    }

    /// Serialise the fitted parameters to an opaque blob.
    pub fn persist(&self) -> Result<Vec<u8>, PipelineError> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| PipelineError::persistence("normalization blob", e))
    }

    /// Restore parameters from a blob produced by `persist`.
    /// Min/max values round-trip with exact floating-point equality.
    pub fn load(blob: &[u8]) -> Result<Self, PipelineError> {
        serde_json::from_slice(blob)
            .map_err(|e| PipelineError::persistence("normalization blob", e))
    }

    pub fn columns(&self) -> &[ColumnRange] {
        &self.columns
    }
}

/// Degenerate ranges (max == min) map to 0 instead of dividing by zero.
fn scale(x: f32, min: f32, max: f32) -> f32 {
    if max == min {
        0.0
    } else {
        (x - min) / (max - min)
    }
}
