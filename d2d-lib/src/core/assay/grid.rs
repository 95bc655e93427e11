use serde::{Deserialize, Serialize};

use crate::error::CureError;

/// A spreadsheet as rows of cells. Rows may differ in length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssayGrid {
    pub rows: Vec<Vec<String>>,
}

impl AssayGrid {
    pub fn parse(bytes: &[u8]) -> Result<Self, CureError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);
        let mut rows = vec![];
        for record in reader.records() {
            let record = record.map_err(|e| CureError::Validation(format!("Invalid CSV: {}", e)))?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }
        if rows.is_empty() {
            return Err(CureError::Validation("The CSV file is empty".into()));
        }
        Ok(AssayGrid { rows })
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, CureError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(vec![]);
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| CureError::Validation(format!("CSV serialization failed: {}", e)))?;
        }
        writer
            .into_inner()
            .map_err(|e| CureError::Validation(format!("CSV serialization failed: {}", e)))
    }

    /// Cell text, "" when outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.trim())
            .unwrap_or("")
    }

    pub fn set(&mut self, row: usize, col: usize, value: &str) {
        if self.rows.len() <= row {
            self.rows.resize(row + 1, vec![]);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.to_string();
    }

    /// A date cell. Spreadsheet overflow markers (`#####`) count as missing.
    pub fn date_cell(&self, row: usize, col: usize) -> Option<String> {
        let value = self.cell(row, col);
        if value.is_empty() || value.contains('#') {
            None
        } else {
            Some(value.to_string())
        }
    }

    pub fn number_cell(&self, row: usize, col: usize) -> Option<f64> {
        self.cell(row, col)
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "BglB kinetic assay,,,,\n,,,,(1/min),,(mg/mL)\n,,Row,,,,,100,01/10/24,01/15/24\n";

    #[test]
    fn unmodified_round_trip_keeps_populated_cells() {
        let grid = AssayGrid::parse(SAMPLE.as_bytes()).unwrap();
        let again = AssayGrid::parse(&grid.to_csv().unwrap()).unwrap();
        for (r, row) in grid.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if !cell.is_empty() {
                    assert_eq!(again.cell(r, c), cell.trim());
                }
            }
        }
        assert_eq!(grid, again);
    }

    #[test]
    fn ragged_rows_and_bom_are_accepted() {
        let grid = AssayGrid::parse("\u{feff}a,b\nc\n".as_bytes()).unwrap();
        assert_eq!(grid.cell(0, 0), "a");
        assert_eq!(grid.cell(1, 0), "c");
        assert_eq!(grid.cell(1, 5), "");
        assert_eq!(grid.cell(9, 0), "");
    }

    #[test]
    fn dates_with_overflow_marker_are_missing() {
        let mut grid = AssayGrid::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(grid.date_cell(2, 8).as_deref(), Some("01/10/24"));
        grid.set(2, 8, "########");
        assert_eq!(grid.date_cell(2, 8), None);
        assert_eq!(grid.number_cell(2, 7), Some(100.0));
    }

    #[test]
    fn set_grows_the_grid() {
        let mut grid = AssayGrid::default();
        grid.set(3, 2, "0.5");
        assert_eq!(grid.rows.len(), 4);
        assert_eq!(grid.cell(3, 2), "0.5");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(AssayGrid::parse(b"").is_err());
    }
}
