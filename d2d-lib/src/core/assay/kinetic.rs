use std::ops::Range;

use d2d_database::types::{KineticSlopeUnits, YieldUnits};
use serde::{Deserialize, Serialize};

use super::grid::AssayGrid;
use crate::error::CureError;

/// Rows A-H of the replicate window.
pub const DATA_ROWS: Range<usize> = 4..12;
/// The three replicate columns.
pub const DATA_COLS: Range<usize> = 2..5;

/// Substrate concentration (mM) of each replicate row.
pub const SUBSTRATE_MM: [&str; 8] = ["75.00", "25.00", "8.33", "2.78", "0.93", "0.31", "0.10", "0.03"];

const SLOPE_UNITS: (usize, usize) = (1, 4);
const YIELD_UNITS: (usize, usize) = (1, 6);
const DILUTION: (usize, usize) = (2, 7);
const PURIFICATION_DATE: (usize, usize) = (2, 8);
const ASSAY_DATE: (usize, usize) = (2, 9);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticMetadata {
    pub slope_units: Option<KineticSlopeUnits>,
    pub yield_units: Option<YieldUnits>,
    pub dilution: Option<f64>,
    pub purification_date: Option<String>,
    pub assay_date: Option<String>,
}

/// The editable part of a kinetic template plus the metadata around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticSheet {
    pub grid: AssayGrid,
    pub metadata: KineticMetadata,
    /// `[row][replicate]`, 8 x 3.
    pub replicates: Vec<Vec<String>>,
}

impl KineticSheet {
    pub fn from_grid(grid: AssayGrid) -> Result<Self, CureError> {
        if grid.rows.len() < DATA_ROWS.end {
            return Err(CureError::Validation(format!(
                "Kinetic template needs at least {} rows, found {}",
                DATA_ROWS.end,
                grid.rows.len()
            )));
        }
        let metadata = KineticMetadata {
            slope_units: KineticSlopeUnits::from_template_label(grid.cell(SLOPE_UNITS.0, SLOPE_UNITS.1)),
            yield_units: YieldUnits::from_template_label(grid.cell(YIELD_UNITS.0, YIELD_UNITS.1)),
            dilution: grid.number_cell(DILUTION.0, DILUTION.1),
            purification_date: grid.date_cell(PURIFICATION_DATE.0, PURIFICATION_DATE.1),
            assay_date: grid.date_cell(ASSAY_DATE.0, ASSAY_DATE.1),
        };
        if metadata.slope_units.is_none() {
            log::warn!(
                "Unrecognized slope units '{}' in kinetic template",
                grid.cell(SLOPE_UNITS.0, SLOPE_UNITS.1)
            );
        }
        let replicates = DATA_ROWS
            .map(|r| DATA_COLS.map(|c| grid.cell(r, c).to_string()).collect())
            .collect();
        Ok(KineticSheet {
            grid,
            metadata,
            replicates,
        })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, CureError> {
        Self::from_grid(AssayGrid::parse(bytes)?)
    }

    /// Replace a replicate value. `row` and `replicate` index the window, not the grid.
    pub fn edit(&mut self, row: usize, replicate: usize, value: &str) -> Result<(), CureError> {
        let cell = self
            .replicates
            .get_mut(row)
            .and_then(|r| r.get_mut(replicate))
            .ok_or_else(|| {
                CureError::Validation(format!("No replicate cell at row {}, column {}", row, replicate))
            })?;
        *cell = value.trim().to_string();
        Ok(())
    }

    /// The original grid with the edited window written back in.
    pub fn rebuild(&self) -> AssayGrid {
        let mut grid = self.grid.clone();
        for (i, row) in self.replicates.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                grid.set(DATA_ROWS.start + i, DATA_COLS.start + j, value);
            }
        }
        grid
    }

    /// Rows paired with their substrate label, for display.
    pub fn labelled_rows(&self) -> Vec<(&'static str, &[String])> {
        SUBSTRATE_MM
            .iter()
            .zip(self.replicates.iter())
            .map(|(label, row)| (*label, row.as_slice()))
            .collect()
    }
}
