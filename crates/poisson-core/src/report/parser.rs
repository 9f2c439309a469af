use crate::domain::{ParserResult, SweepError};

pub(super) const REQUIRED_COLUMNS: [&str; 7] = [
    "Y (ang)",
    "Ec (eV)",
    "Ev (eV)",
    "E (V/cm)",
    "Ef (eV)",
    "n (cm-3)",
    "p (cm-3)",
];
pub(super) const EIGEN_ENERGY_COLUMN: usize = 8;
pub(super) const EIGEN_ENERGY_LABEL: &str = "el eval 1 (eV)";

/// Cells of one data row, keyed by ordinal position.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ReportRow {
    pub(super) line_number: usize,
    pub(super) required: [f64; 7],
    pub(super) eigen_energy: Option<f64>,
}

/// Yields the data rows of a report: blank lines are ignored and the first
/// remaining line is the header/units row, which is skipped unread.
pub(super) fn data_rows(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
        .skip(1)
}

pub(super) fn parse_row(origin: &str, line_number: usize, line: &str) -> ParserResult<ReportRow> {
    let cells = line.split('\t').collect::<Vec<_>>();
    let mut required = [0.0; 7];

    for (column, label) in REQUIRED_COLUMNS.iter().enumerate() {
        let cell = cells.get(column).map(|cell| cell.trim()).unwrap_or("");
        if cell.is_empty() {
            return Err(report_error(
                origin,
                line_number,
                format!("missing required column {} '{}'", column + 1, label),
            ));
        }
        required[column] = parse_numeric_cell(cell).ok_or_else(|| {
            report_error(
                origin,
                line_number,
                format!(
                    "column {} '{}' is not numeric: '{}'",
                    column + 1,
                    label,
                    cell
                ),
            )
        })?;
    }

    let eigen_energy = match cells
        .get(EIGEN_ENERGY_COLUMN)
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
    {
        Some(cell) => Some(parse_numeric_cell(cell).ok_or_else(|| {
            report_error(
                origin,
                line_number,
                format!("'{}' is not numeric: '{}'", EIGEN_ENERGY_LABEL, cell),
            )
        })?),
        None => None,
    };

    Ok(ReportRow {
        line_number,
        required,
        eigen_energy,
    })
}

/// Parses a numeric cell, accepting Fortran `D` exponents.
pub(super) fn parse_numeric_cell(cell: &str) -> Option<f64> {
    if let Ok(value) = cell.parse::<f64>() {
        return Some(value);
    }
    let normalized = cell.replace(['D', 'd'], "E");
    normalized.parse::<f64>().ok()
}

fn report_error(origin: &str, line_number: usize, message: impl Into<String>) -> SweepError {
    SweepError::malformed_report(
        "REPORT.MALFORMED_ROW",
        format!("{} line {}: {}", origin, line_number, message.into()),
    )
}
