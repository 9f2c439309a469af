use super::PointRecord;
use crate::domain::{SweepError, SweepResult};
use crate::params::ParameterSpace;
use ndarray::{Array1, ArrayD, IxDyn};
use ndarray_npy::write_npy;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const ENERGIES_FILE: &str = "energies_ground_states.npy";
pub const POSITIONS_FILE: &str = "positions_ground_states.npy";
pub const SUMMARY_FILE: &str = "sweep_summary.json";

/// Lays per-rank results out in C order with the given shape; `None` becomes
/// NaN. An empty shape yields a 0-dimensional array of one element.
pub fn reshape_results(shape: &[usize], values: &[Option<f64>]) -> SweepResult<ArrayD<f64>> {
    let flat = values
        .iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect::<Vec<_>>();
    ArrayD::from_shape_vec(IxDyn(shape), flat).map_err(|error| {
        SweepError::io(
            "IO.RESULT_SHAPE",
            format!(
                "{} results do not fit shape {:?}: {}",
                values.len(),
                shape,
                error
            ),
        )
    })
}

pub fn write_variable_array(path: &Path, values: &[f64]) -> SweepResult<()> {
    let array = Array1::from_vec(values.to_vec());
    write_npy(path, &array).map_err(|error| npy_error(path, error))
}

pub fn write_result_array(path: &Path, array: &ArrayD<f64>) -> SweepResult<()> {
    write_npy(path, array).map_err(|error| npy_error(path, error))
}

fn npy_error(path: &Path, error: ndarray_npy::WriteNpyError) -> SweepError {
    SweepError::io(
        "IO.ARRAY_WRITE",
        format!("failed to write array '{}': {}", path.display(), error),
    )
}

#[derive(Debug, Serialize)]
struct ConstantSummary<'a> {
    name: &'a str,
    value: f64,
}

#[derive(Debug, Serialize)]
struct VariableSummary<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    values: &'a [f64],
}

#[derive(Debug, Serialize)]
struct SweepSummary<'a> {
    constants: Vec<ConstantSummary<'a>>,
    variables: Vec<VariableSummary<'a>>,
    shape: &'a [usize],
    points: &'a [PointRecord],
    skipped: usize,
}

pub fn write_summary(
    path: &Path,
    space: &ParameterSpace,
    records: &[PointRecord],
) -> SweepResult<()> {
    let summary = SweepSummary {
        constants: space
            .constants()
            .iter()
            .map(|constant| ConstantSummary {
                name: &constant.name,
                value: constant.value,
            })
            .collect(),
        variables: space
            .variables()
            .iter()
            .map(|variable| VariableSummary {
                name: &variable.name,
                format: variable.format.as_ref().map(|format| format.source()),
                values: &variable.values,
            })
            .collect(),
        shape: space.shape(),
        points: records,
        skipped: records.iter().filter(|record| record.is_skipped()).count(),
    };

    let file = File::create(path)
        .map_err(|source| SweepError::io_at("IO.SUMMARY_WRITE", "create summary", path, source))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &summary).map_err(|error| {
        SweepError::io(
            "IO.SUMMARY_WRITE",
            format!("failed to serialize summary '{}': {}", path.display(), error),
        )
    })?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|source| SweepError::io_at("IO.SUMMARY_WRITE", "write summary", path, source))
}

/// Writes every sweep artifact under `output_root` and returns their paths in
/// write order: variable arrays, ground-state arrays, then the summary.
pub fn persist_sweep(
    output_root: &Path,
    space: &ParameterSpace,
    energies: &ArrayD<f64>,
    positions: &ArrayD<f64>,
    records: &[PointRecord],
) -> SweepResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(space.variables().len() + 3);

    for variable in space.variables() {
        let path = output_root.join(format!("{}.npy", variable.name));
        write_variable_array(&path, &variable.values)?;
        written.push(path);
    }

    let path = output_root.join(ENERGIES_FILE);
    write_result_array(&path, energies)?;
    written.push(path);

    let path = output_root.join(POSITIONS_FILE);
    write_result_array(&path, positions)?;
    written.push(path);

    let path = output_root.join(SUMMARY_FILE);
    write_summary(&path, space, records)?;
    written.push(path);

    Ok(written)
}
