// ============================================================
// Layer 3 — Sensor Table Domain Type
// ============================================================
// The in-memory representation of one C-MAPSS sensor log:
// one row per (unit, cycle), with three operational settings
// and twenty-one sensor measurements per row.
//
// Invariants enforced at construction:
//   - rows of a unit are stored contiguously (a unit id never
//     reappears after another unit has started)
//   - within a unit, cycles start at 1 and increase by exactly 1
//
// Reference: Saxena & Goebel (2008), C-MAPSS turbofan dataset

use crate::domain::errors::PipelineError;

/// Number of operational-setting columns in the input format.
pub const SETTING_COLUMNS: usize = 3;

/// Number of sensor-measurement columns in the input format.
pub const SENSOR_COLUMNS: usize = 21;

/// Total whitespace-delimited columns per input line:
/// unit id, cycle, settings, sensors.
pub const TABLE_COLUMNS: usize = 2 + SETTING_COLUMNS + SENSOR_COLUMNS;

/// Ordered names of the normalizable feature columns
/// (`setting_1..setting_3`, `sensor_1..sensor_21`).
pub fn feature_names() -> Vec<String> {
    let mut names = Vec::with_capacity(SETTING_COLUMNS + SENSOR_COLUMNS);
    for i in 1..=SETTING_COLUMNS {
        names.push(format!("setting_{i}"));
    }
    for i in 1..=SENSOR_COLUMNS {
        names.push(format!("sensor_{i}"));
    }
    names
}

/// One logged flight cycle of one engine unit.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Stable engine identifier
    pub unit_id: u32,

    /// 1-based cycle counter, contiguous within a unit
    pub cycle: u32,

    /// Operational settings (altitude, mach, throttle), in column order
    pub settings: Vec<f32>,

    /// Sensor measurements, in column order
    pub sensors: Vec<f32>,
}

impl RawRecord {
    /// Number of feature columns (settings followed by sensors).
    pub fn feature_count(&self) -> usize {
        self.settings.len() + self.sensors.len()
    }

    /// Feature value by flat column index: settings first, then sensors.
    pub fn feature(&self, idx: usize) -> f32 {
        if idx < self.settings.len() {
            self.settings[idx]
        } else {
            self.sensors[idx - self.settings.len()]
        }
    }
}

/// A contiguous block of rows belonging to one unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitSpan {
    pub unit_id:   u32,
    /// Index of the unit's first row in the table
    pub start_row: usize,
    /// Number of rows (= number of logged cycles)
    pub len:       usize,
}

impl UnitSpan {
    /// Last cycle recorded for this unit.
    /// Cycles start at 1, so this equals the row count.
    pub fn max_cycle(&self) -> u32 {
        self.len as u32
    }
}

/// A validated sensor table: rows plus the per-unit grouping.
#[derive(Debug, Clone)]
pub struct SensorTable {
    rows:  Vec<RawRecord>,
    units: Vec<UnitSpan>,
}

impl SensorTable {
    /// Group rows into unit spans and validate the cycle invariants.
    pub fn new(rows: Vec<RawRecord>) -> Result<Self, PipelineError> {
        let mut units: Vec<UnitSpan> = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            match units.last_mut() {
                Some(span) if span.unit_id == row.unit_id => {
                    let expected = (span.len + 1) as u32;
                    if row.cycle != expected {
                        return Err(PipelineError::Schema(format!(
                            "unit {} row {}: expected cycle {}, found {}",
                            row.unit_id, i + 1, expected, row.cycle
                        )));
                    }
                    span.len += 1;
                }
                _ => {
                    // A unit id must not reappear after its block has ended
                    if units.iter().any(|s| s.unit_id == row.unit_id) {
                        return Err(PipelineError::Schema(format!(
                            "unit {} appears in non-contiguous blocks (row {})",
                            row.unit_id, i + 1
                        )));
                    }
                    if row.cycle != 1 {
                        return Err(PipelineError::Schema(format!(
                            "unit {} starts at cycle {}, expected 1",
                            row.unit_id, row.cycle
                        )));
                    }
                    units.push(UnitSpan { unit_id: row.unit_id, start_row: i, len: 1 });
                }
            }
        }

        Ok(Self { rows, units })
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn units(&self) -> &[UnitSpan] {
        &self.units
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Feature column count, 0 for an empty table.
    pub fn feature_count(&self) -> usize {
        self.rows.first().map(RawRecord::feature_count).unwrap_or(0)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn record(unit_id: u32, cycle: u32) -> RawRecord {
        RawRecord {
            unit_id,
            cycle,
            settings: vec![0.0; SETTING_COLUMNS],
            sensors:  vec![0.0; SENSOR_COLUMNS],
        }
    }

    #[test]
    fn test_groups_contiguous_units() {
        let rows = vec![record(1, 1), record(1, 2), record(2, 1)];
        let table = SensorTable::new(rows).unwrap();
        assert_eq!(table.unit_count(), 2);
        assert_eq!(table.units()[0].len, 2);
        assert_eq!(table.units()[1].start_row, 2);
        assert_eq!(table.units()[0].max_cycle(), 2);
    }

    #[test]
    fn test_rejects_cycle_gap() {
        let rows = vec![record(1, 1), record(1, 3)];
        assert!(matches!(
            SensorTable::new(rows),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_rejects_first_cycle_not_one() {
        let rows = vec![record(1, 2)];
        assert!(matches!(
            SensorTable::new(rows),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_rejects_reappearing_unit() {
        let rows = vec![record(1, 1), record(2, 1), record(1, 1)];
        assert!(matches!(
            SensorTable::new(rows),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_empty_table_is_valid() {
        let table = SensorTable::new(Vec::new()).unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.feature_count(), 0);
    }

    #[test]
    fn test_feature_indexing_spans_settings_and_sensors() {
        let mut r = record(1, 1);
        r.settings = vec![1.0, 2.0, 3.0];
        r.sensors[0] = 4.0;
        assert_eq!(r.feature(0), 1.0);
        assert_eq!(r.feature(2), 3.0);
        assert_eq!(r.feature(3), 4.0);
        assert_eq!(r.feature_count(), 24);
    }

    #[test]
    fn test_feature_names_order() {
        let names = feature_names();
        assert_eq!(names.len(), 24);
        assert_eq!(names[0], "setting_1");
        assert_eq!(names[3], "sensor_1");
        assert_eq!(names[23], "sensor_21");
    }
}
