// ============================================================
// Layer 4 — Sensor Log Loader
// ============================================================
// Parses the whitespace-delimited C-MAPSS text format.
//
// Each line of a sensor log has exactly 26 positional columns:
//   unit_id  cycle  setting_1..setting_3  sensor_1..sensor_21
//
// The terminal-RUL file has a single column, one value per test
// unit, aligned with the unit order of the test table.
//
// Column count and order are part of the contract: any deviation
// is a Schema error carrying the 1-based line number. Parsing
// never skips a bad line; a malformed file is fatal.

use std::fs;
use std::path::Path;

use crate::domain::errors::PipelineError;
use crate::domain::table::{RawRecord, SensorTable, SENSOR_COLUMNS, SETTING_COLUMNS, TABLE_COLUMNS};

/// Load and validate a train or test sensor table.
pub fn load_sensor_table(path: &Path) -> Result<SensorTable, PipelineError> {
    let text = fs::read_to_string(path)
        .map_err(|e| PipelineError::persistence(path.display().to_string(), e))?;

    let mut rows = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != TABLE_COLUMNS {
            return Err(PipelineError::Schema(format!(
                "{}: line {}: expected {} columns, found {}",
                path.display(),
                line_no + 1,
                TABLE_COLUMNS,
                fields.len()
            )));
        }

        let unit_id = parse_int(fields[0], path, line_no, "unit id")?;
        let cycle   = parse_int(fields[1], path, line_no, "cycle")?;

        let mut settings = Vec::with_capacity(SETTING_COLUMNS);
        for field in &fields[2..2 + SETTING_COLUMNS] {
            settings.push(parse_float(field, path, line_no)?);
        }
        let mut sensors = Vec::with_capacity(SENSOR_COLUMNS);
        for field in &fields[2 + SETTING_COLUMNS..] {
            sensors.push(parse_float(field, path, line_no)?);
        }

        rows.push(RawRecord { unit_id, cycle, settings, sensors });
    }

    tracing::info!("Loaded {} rows from '{}'", rows.len(), path.display());
    SensorTable::new(rows)
}

/// Load the single-column terminal-RUL file for test units.
pub fn load_final_rul(path: &Path) -> Result<Vec<f32>, PipelineError> {
    let text = fs::read_to_string(path)
        .map_err(|e| PipelineError::persistence(path.display().to_string(), e))?;

    let mut values = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 1 {
            return Err(PipelineError::Schema(format!(
                "{}: line {}: expected 1 column, found {}",
                path.display(),
                line_no + 1,
                fields.len()
            )));
        }
        values.push(parse_float(fields[0], path, line_no)?);
    }

    tracing::info!("Loaded {} terminal RUL values from '{}'", values.len(), path.display());
    Ok(values)
}

fn parse_int(field: &str, path: &Path, line_no: usize, what: &str) -> Result<u32, PipelineError> {
    field.parse::<u32>().map_err(|_| {
        PipelineError::Schema(format!(
            "{}: line {}: invalid {} '{}'",
            path.display(),
            line_no + 1,
            what,
            field
        ))
    })
}

fn parse_float(field: &str, path: &Path, line_no: usize) -> Result<f32, PipelineError> {
    field.parse::<f32>().map_err(|_| {
        PipelineError::Schema(format!(
            "{}: line {}: invalid numeric value '{}'",
            path.display(),
            line_no + 1,
            field
        ))
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn line(unit: u32, cycle: u32) -> String {
        let features: Vec<String> = (0..24).map(|i| format!("{}.0", i)).collect();
        format!("{} {} {}", unit, cycle, features.join(" "))
    }

    #[test]
    fn test_parses_well_formed_table() {
        let content = format!("{}\n{}\n{}\n", line(1, 1), line(1, 2), line(2, 1));
        let f = write_temp(&content);
        let table = load_sensor_table(f.path()).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.unit_count(), 2);
        assert_eq!(table.feature_count(), 24);
    }

    #[test]
    fn test_rejects_wrong_column_count() {
        let f = write_temp("1 1 0.0 0.0\n");
        assert!(matches!(
            load_sensor_table(f.path()),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_rejects_non_numeric_field() {
        let bad = line(1, 1).replace("3.0", "abc");
        let f = write_temp(&bad);
        assert!(matches!(
            load_sensor_table(f.path()),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_missing_file_is_persistence_error() {
        let err = load_sensor_table(Path::new("/no/such/file.txt")).unwrap_err();
        assert!(matches!(err, PipelineError::Persistence { .. }));
    }

    #[test]
    fn test_final_rul_single_column() {
        let f = write_temp("112\n98\n69\n");
        assert_eq!(load_final_rul(f.path()).unwrap(), vec![112.0, 98.0, 69.0]);
    }

    #[test]
    fn test_final_rul_rejects_extra_columns() {
        let f = write_temp("112 7\n");
        assert!(matches!(
            load_final_rul(f.path()),
            Err(PipelineError::Schema(_))
        ));
    }
}
