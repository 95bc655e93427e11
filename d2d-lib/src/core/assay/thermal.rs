use d2d_database::types::TempSlopeUnits;
use serde::Serialize;

use super::grid::AssayGrid;
use crate::error::CureError;
use crate::helpers::{mean_and_sd, upper_median};

pub const EMPTY_GROUP_WARNING: &str =
    "Warning: Some rows/columns are completely empty. Please ensure data is provided.";
pub const NEGATIVE_WARNING: &str = "Negative values were detected and converted to zero.";
pub const OUTLIER_WARNING: &str = "Outliers were detected and removed using the MAD method.";

/// Temperatures of the vertical template, used when a label cell is unreadable.
pub const DEFAULT_TEMPERATURES: [f64; 8] = [50.0, 48.3, 45.7, 42.4, 37.7, 33.6, 31.3, 30.0];

/// Relative standard deviation (%) above which outliers are looked for.
const PRECISION_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalLayout {
    /// Temperatures down column A, three replicates per row.
    Vertical,
    /// Temperatures across row 2, two replicates per column.
    Horizontal,
}

impl ThermalLayout {
    pub fn detect(grid: &AssayGrid) -> Self {
        if grid.cell(2, 1) == "Row" {
            ThermalLayout::Vertical
        } else {
            ThermalLayout::Horizontal
        }
    }

    fn purification_date_cell(&self) -> (usize, usize) {
        match self {
            ThermalLayout::Vertical => (2, 6),
            ThermalLayout::Horizontal => (7, 1),
        }
    }

    fn assay_date_cell(&self) -> (usize, usize) {
        match self {
            ThermalLayout::Vertical => (2, 7),
            ThermalLayout::Horizontal => (8, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermalMetadata {
    pub slope_units: Option<TempSlopeUnits>,
    pub purification_date: Option<String>,
    pub assay_date: Option<String>,
}

/// A thermostability template, one replicate group per temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermalSheet {
    pub grid: AssayGrid,
    pub layout: ThermalLayout,
    pub metadata: ThermalMetadata,
    pub temperatures: Vec<f64>,
    pub replicates: Vec<Vec<String>>,
    #[serde(skip)]
    positions: Vec<Vec<(usize, usize)>>,
}

fn vertical_groups(grid: &AssayGrid) -> (Vec<f64>, Vec<Vec<(usize, usize)>>) {
    (4..12)
        .enumerate()
        .map(|(i, row)| {
            let temperature = grid.number_cell(row, 0).unwrap_or(DEFAULT_TEMPERATURES[i]);
            (temperature, (2..5).map(|col| (row, col)).collect())
        })
        .unzip()
}

fn horizontal_groups(grid: &AssayGrid) -> (Vec<f64>, Vec<Vec<(usize, usize)>>) {
    (3..15)
        .filter(|col| !grid.cell(1, *col).is_empty())
        .filter_map(|col| match grid.number_cell(1, col) {
            Some(temperature) => Some((temperature, vec![(4, col), (5, col)])),
            None => {
                log::warn!("Ignoring column {} with temperature '{}'", col, grid.cell(1, col));
                None
            }
        })
        .unzip()
}

impl ThermalSheet {
    pub fn from_grid(grid: AssayGrid) -> Result<Self, CureError> {
        let layout = ThermalLayout::detect(&grid);
        let (temperatures, positions) = match layout {
            ThermalLayout::Vertical => vertical_groups(&grid),
            ThermalLayout::Horizontal => horizontal_groups(&grid),
        };
        if positions.is_empty() {
            return Err(CureError::Validation(
                "No temperatures found in the thermostability template".into(),
            ));
        }
        let (p_row, p_col) = layout.purification_date_cell();
        let (a_row, a_col) = layout.assay_date_cell();
        let metadata = ThermalMetadata {
            slope_units: TempSlopeUnits::from_template_label(grid.cell(1, 4)),
            purification_date: grid.date_cell(p_row, p_col),
            assay_date: grid.date_cell(a_row, a_col),
        };
        let replicates = positions
            .iter()
            .map(|group| group.iter().map(|(r, c)| grid.cell(*r, *c).to_string()).collect())
            .collect();
        Ok(ThermalSheet {
            grid,
            layout,
            metadata,
            temperatures,
            replicates,
            positions,
        })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, CureError> {
        Self::from_grid(AssayGrid::parse(bytes)?)
    }

    pub fn edit(&mut self, group: usize, replicate: usize, value: &str) -> Result<(), CureError> {
        let cell = self
            .replicates
            .get_mut(group)
            .and_then(|g| g.get_mut(replicate))
            .ok_or_else(|| {
                CureError::Validation(format!("No replicate cell at {}, {}", group, replicate))
            })?;
        *cell = value.trim().to_string();
        if let Some((row, col)) = self.positions.get(group).and_then(|g| g.get(replicate)) {
            self.grid.set(*row, *col, cell);
        }
        Ok(())
    }

    /**
     * Clean every replicate group in place. Negative readings become zero, and
     * when a group is imprecise its values outside median ± 3·MAD are blanked.
     * The cleaned values are written back into `grid`.
     *
     * # Returns
     * @return Vec<String> - One message per kind of change made, in a fixed order
     */
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut empty = false;
        let mut negatives = false;
        let mut outliers = false;
        for group in self.replicates.iter_mut() {
            if group.iter().all(|v| v.trim().is_empty()) {
                empty = true;
            }
            negatives |= zero_negatives(group);
            outliers |= blank_outliers(group);
        }
        self.grid = self.rebuild();

        let mut warnings = vec![];
        if empty {
            warnings.push(EMPTY_GROUP_WARNING.to_string());
        }
        if negatives {
            warnings.push(NEGATIVE_WARNING.to_string());
        }
        if outliers {
            warnings.push(OUTLIER_WARNING.to_string());
        }
        warnings
    }

    /// The original grid with the (edited or sanitized) replicates written back in.
    pub fn rebuild(&self) -> AssayGrid {
        let mut grid = self.grid.clone();
        for (group, values) in self.positions.iter().zip(self.replicates.iter()) {
            for ((row, col), value) in group.iter().zip(values.iter()) {
                grid.set(*row, *col, value);
            }
        }
        grid
    }
}

fn zero_negatives(group: &mut [String]) -> bool {
    let mut changed = false;
    for value in group.iter_mut() {
        if matches!(value.trim().parse::<f64>(), Ok(v) if v < 0.0) {
            *value = "0".to_string();
            changed = true;
        }
    }
    changed
}

fn blank_outliers(group: &mut [String]) -> bool {
    let numbers: Vec<f64> = group
        .iter()
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect();
    let Some((mean, sd)) = mean_and_sd(&numbers) else {
        return false;
    };
    // NaN (zero mean) falls through to the MAD check
    if sd / mean * 100.0 <= PRECISION_THRESHOLD {
        return false;
    }
    let Some(median) = upper_median(&numbers) else {
        return false;
    };
    let deviations: Vec<f64> = numbers.iter().map(|v| (v - median).abs()).collect();
    let Some(mad) = upper_median(&deviations) else {
        return false;
    };
    let (low, high) = (median - 3.0 * mad, median + 3.0 * mad);

    let mut changed = false;
    for value in group.iter_mut() {
        if let Ok(v) = value.trim().parse::<f64>() {
            if v < low || v > high {
                value.clear();
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn vertical_template() -> String {
        let mut lines = vec![
            "BglB thermostability,,,,,,,".to_string(),
            ",,,,(1/min),,,".to_string(),
            ",Row,,,,,01/10/24,########".to_string(),
            "T (C),,rep1,rep2,rep3".to_string(),
        ];
        for (i, t) in DEFAULT_TEMPERATURES.iter().enumerate() {
            lines.push(format!("{},{},0.8,0.82,0.81", t, (b'A' + i as u8) as char));
        }
        lines.join("\n")
    }

    fn horizontal_template() -> String {
        [
            "BglB thermostability,,,,,,",
            ",,,30,(1/s),,40",
            ",,,,,,",
            ",,,,,,",
            "A,,,0.9,1.0,,0.5",
            "B,,,0.91,-0.2,,0.52",
            ",,,,,,",
            ",01/10/24,,,,,",
            ",#####,,,,,",
        ]
        .join("\n")
    }

    #[test]
    fn vertical_layout_is_detected_by_the_row_marker() {
        let sheet = ThermalSheet::parse(vertical_template().as_bytes()).unwrap();
        assert_eq!(sheet.layout, ThermalLayout::Vertical);
        assert_eq!(sheet.temperatures, DEFAULT_TEMPERATURES.to_vec());
        assert_eq!(sheet.replicates.len(), 8);
        assert_eq!(sheet.replicates[3], vec!["0.8", "0.82", "0.81"]);
        assert_eq!(sheet.metadata.slope_units, Some(TempSlopeUnits::PerMinute));
        assert_eq!(sheet.metadata.purification_date.as_deref(), Some("01/10/24"));
        assert_eq!(sheet.metadata.assay_date, None);
    }

    #[test]
    fn horizontal_layout_reads_temperature_columns() {
        let sheet = ThermalSheet::parse(horizontal_template().as_bytes()).unwrap();
        assert_eq!(sheet.layout, ThermalLayout::Horizontal);
        // column E carries the units label, not a temperature
        assert_eq!(sheet.temperatures, vec![30.0, 40.0]);
        assert_eq!(sheet.replicates, vec![vec!["0.9", "0.91"], vec!["0.5", "0.52"]]);
        assert_eq!(sheet.metadata.purification_date.as_deref(), Some("01/10/24"));
        assert_eq!(sheet.metadata.assay_date, None);
    }

    #[test]
    fn sanitize_zeroes_negatives_and_reports_empty_groups() {
        let mut sheet = ThermalSheet::parse(vertical_template().as_bytes()).unwrap();
        sheet.edit(0, 1, "-0.3").unwrap();
        for rep in 0..3 {
            sheet.edit(7, rep, "").unwrap();
        }
        let warnings = sheet.sanitize();
        assert_eq!(warnings, vec![EMPTY_GROUP_WARNING, NEGATIVE_WARNING, OUTLIER_WARNING]);
        assert_eq!(sheet.replicates[0][1], "");
        assert_eq!(sheet.rebuild().cell(4, 3), "");
    }

    #[test]
    fn sanitized_values_land_in_the_grid() {
        let mut sheet = ThermalSheet::parse(vertical_template().as_bytes()).unwrap();
        sheet.edit(0, 0, "-0.5").unwrap();
        assert_eq!(sheet.grid.cell(4, 2), "-0.5");
        sheet.edit(0, 1, "1.0").unwrap();
        sheet.edit(0, 2, "1.0").unwrap();
        sheet.sanitize();
        assert_eq!(sheet.replicates[0], vec!["", "1.0", "1.0"]);
        assert_eq!(sheet.grid.cell(4, 2), "");

        let reparsed = ThermalSheet::from_grid(sheet.grid.clone()).unwrap();
        assert_eq!(reparsed.replicates, sheet.replicates);
    }

    #[test]
    fn precise_groups_keep_their_values() {
        let mut group = vec!["1.0".to_string(), "1.1".to_string(), "0.95".to_string()];
        assert!(!blank_outliers(&mut group));
        assert_eq!(group[2], "0.95");
    }

    #[test]
    fn imprecise_groups_lose_values_outside_three_mads() {
        let mut group: Vec<String> = ["1.0", "1.02", "0.99", "1.01", "9.0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(blank_outliers(&mut group));
        assert_eq!(group, vec!["1.0", "1.02", "0.99", "1.01", ""]);
    }

    #[test]
    fn rebuild_writes_edits_to_their_cells() {
        let mut sheet = ThermalSheet::parse(horizontal_template().as_bytes()).unwrap();
        sheet.edit(1, 0, "0.55").unwrap();
        let grid = sheet.rebuild();
        assert_eq!(grid.cell(4, 6), "0.55");
        assert_eq!(grid.cell(1, 4), "(1/s)");
    }
}
