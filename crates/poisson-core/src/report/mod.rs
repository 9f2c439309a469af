mod parser;

use crate::domain::{ParserResult, SweepError};
use serde::Serialize;
use std::fs;
use std::path::Path;

use parser::{ReportRow, data_rows, parse_row};

/// The simulator reports positions in ångström; series are kept in nm.
pub const ANGSTROM_PER_NANOMETER: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroundState {
    /// Eigen-energy in eV.
    pub energy: f64,
    /// Position in nm of the row that reported the eigen-energy.
    pub position: f64,
}

/// Parsed `{identifier}_Out.txt` report of one simulator run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationReport {
    position: Vec<f64>,
    energy_conduction: Vec<f64>,
    energy_valence: Vec<f64>,
    electric_field: Vec<f64>,
    energy_fermi: Vec<f64>,
    density_electron: Vec<f64>,
    density_hole: Vec<f64>,
    ground_state: Option<GroundState>,
}

impl SimulationReport {
    pub fn parse(path: &Path) -> ParserResult<Self> {
        let source = fs::read_to_string(path)
            .map_err(|source| SweepError::io_at("IO.REPORT_READ", "read report", path, source))?;
        Self::parse_named(&path.display().to_string(), &source)
    }

    pub fn parse_str(source: &str) -> ParserResult<Self> {
        Self::parse_named("report", source)
    }

    fn parse_named(origin: &str, source: &str) -> ParserResult<Self> {
        let mut report = Self::default();
        let mut ground_state = GroundStateRule::default();

        for (line_number, line) in data_rows(source) {
            let row = parse_row(origin, line_number, line)?;
            ground_state.observe(&row);
            report.push(&row);
        }

        report.ground_state = ground_state.finish();
        Ok(report)
    }

    fn push(&mut self, row: &ReportRow) {
        let [y, ec, ev, field, ef, n, p] = row.required;
        self.position.push(y / ANGSTROM_PER_NANOMETER);
        self.energy_conduction.push(ec);
        self.energy_valence.push(ev);
        self.electric_field.push(field);
        self.energy_fermi.push(ef);
        self.density_electron.push(n);
        self.density_hole.push(p);
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Node positions in nm.
    pub fn position(&self) -> &[f64] {
        &self.position
    }

    /// Conduction-band edge in eV.
    pub fn energy_conduction(&self) -> &[f64] {
        &self.energy_conduction
    }

    /// Valence-band edge in eV.
    pub fn energy_valence(&self) -> &[f64] {
        &self.energy_valence
    }

    /// Electric field in V/cm.
    pub fn electric_field(&self) -> &[f64] {
        &self.electric_field
    }

    /// Fermi level in eV.
    pub fn energy_fermi(&self) -> &[f64] {
        &self.energy_fermi
    }

    /// Electron density in cm^-3.
    pub fn density_electron(&self) -> &[f64] {
        &self.density_electron
    }

    /// Hole density in cm^-3.
    pub fn density_hole(&self) -> &[f64] {
        &self.density_hole
    }

    pub fn ground_state(&self) -> Option<GroundState> {
        self.ground_state
    }

    pub fn energy_ground_state(&self) -> Option<f64> {
        self.ground_state.map(|state| state.energy)
    }

    pub fn position_ground_state(&self) -> Option<f64> {
        self.ground_state.map(|state| state.position)
    }
}

/// First-occurrence-wins selection of the ground state: the first row with a
/// populated eigen-energy cell fixes the pair, later rows are ignored.
#[derive(Debug, Default)]
struct GroundStateRule {
    selected: Option<GroundState>,
}

impl GroundStateRule {
    fn observe(&mut self, row: &ReportRow) {
        if self.selected.is_some() {
            return;
        }
        if let Some(energy) = row.eigen_energy {
            tracing::trace!(line = row.line_number, energy, "ground state row");
            self.selected = Some(GroundState {
                energy,
                position: row.required[0] / ANGSTROM_PER_NANOMETER,
            });
        }
    }

    fn finish(self) -> Option<GroundState> {
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::{GroundState, SimulationReport};
    use crate::domain::SweepErrorCategory;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Y (ang)\tEc (eV)\tEv (eV)\tE (V/cm)\tEf (eV)\tn (cm-3)\tp (cm-3)\tNd - Na (cm-3)\tel eval 1 (eV)";

    fn report_source(rows: &[&str]) -> String {
        let mut source = String::from(HEADER);
        for row in rows {
            source.push('\n');
            source.push_str(row);
        }
        source.push('\n');
        source
    }

    #[test]
    fn three_rows_produce_three_length_series_with_nm_positions() {
        let source = report_source(&[
            "0\t1.5\t-0.1\t100\t0\t1E+18\t10\t1E+18\t",
            "50\t1.4\t-0.2\t200\t0\t2E+18\t20\t1E+18\t",
            "100\t1.3\t-0.3\t300\t0\t3E+18\t30\t1E+18\t",
        ]);
        let report = SimulationReport::parse_str(&source).expect("report should parse");

        assert_eq!(report.len(), 3);
        assert_eq!(report.position(), &[0.0, 5.0, 10.0]);
        assert_eq!(report.energy_conduction(), &[1.5, 1.4, 1.3]);
        assert_eq!(report.energy_valence(), &[-0.1, -0.2, -0.3]);
        assert_eq!(report.electric_field(), &[100.0, 200.0, 300.0]);
        assert_eq!(report.energy_fermi(), &[0.0, 0.0, 0.0]);
        assert_eq!(report.density_electron(), &[1.0e18, 2.0e18, 3.0e18]);
        assert_eq!(report.density_hole(), &[10.0, 20.0, 30.0]);
        assert_eq!(report.ground_state(), None);
    }

    #[test]
    fn header_row_is_never_interpreted() {
        let source = "garbage\theader\tthat is not numeric\n25\t1\t2\t3\t4\t5\t6\n";
        let report = SimulationReport::parse_str(source).expect("header should be skipped");
        assert_eq!(report.position(), &[2.5]);
    }

    #[test]
    fn first_populated_eigen_energy_wins() {
        let source = report_source(&[
            "0\t1.5\t-0.1\t100\t0\t1\t1\t1\t",
            "20\t1.4\t-0.2\t200\t0\t1\t1\t1\t0.045",
            "40\t1.3\t-0.3\t300\t0\t1\t1\t1\t0.120",
            "60\t1.2\t-0.4\t400\t0\t1\t1\t1",
        ]);
        let report = SimulationReport::parse_str(&source).expect("report should parse");

        assert_eq!(
            report.ground_state(),
            Some(GroundState {
                energy: 0.045,
                position: 2.0,
            })
        );
        assert_eq!(report.energy_ground_state(), Some(0.045));
        assert_eq!(report.position_ground_state(), Some(2.0));
        assert_eq!(report.len(), 4);
    }

    #[test]
    fn header_only_report_is_empty() {
        let report = SimulationReport::parse_str(HEADER).expect("header-only report");
        assert!(report.is_empty());
        assert_eq!(report.ground_state(), None);
    }

    #[test]
    fn malformed_rows_fail_with_line_numbers() {
        let source = report_source(&["0\t1\t2\t3\t4\t5\t6", "oops\t1\t2\t3\t4\t5\t6"]);
        let error = SimulationReport::parse_str(&source).expect_err("row 3 is malformed");
        assert_eq!(error.category(), SweepErrorCategory::MalformedReportError);
        assert!(error.message().contains("line 3"), "{}", error.message());
    }

    #[test]
    fn parse_reads_from_disk_and_reports_missing_files() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("V(0.0)_Out.txt");
        fs::write(&path, report_source(&["10\t1\t2\t3\t4\t5\t6\t7\t-0.5"]))
            .expect("report should be written");

        let report = SimulationReport::parse(&path).expect("report should parse");
        assert_eq!(report.energy_ground_state(), Some(-0.5));
        assert_eq!(report.position_ground_state(), Some(1.0));

        let error = SimulationReport::parse(&temp.path().join("missing_Out.txt"))
            .expect_err("missing file should fail");
        assert_eq!(error.category(), SweepErrorCategory::IoError);
    }
}
