//! Cartesian parameter space over declared constants and variables.
//!
//! Iteration order is row-major over variables in declaration order: the
//! last-declared variable varies fastest. [`ParameterSpace::flat_index`] and
//! [`ParameterSpace::multi_index`] implement the same rule, and result arrays
//! are reshaped in C order, so the `k`-th yielded point always lands at flat
//! position `k` of every result buffer.

mod format;
mod range;

pub use format::ValueFormat;
pub use range::RangeSpec;

use crate::domain::{Constant, SweepError, SweepResult, SweepShape, VariableSpec};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::iter::FusedIterator;

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpace {
    constants: Vec<Constant>,
    variables: Vec<VariableSpec>,
    shape: SweepShape,
}

impl ParameterSpace {
    pub fn build(constants: Vec<Constant>, variables: Vec<VariableSpec>) -> SweepResult<Self> {
        let mut seen = HashSet::new();
        let declared = constants
            .iter()
            .map(|constant| (constant.name.as_str(), "constant"))
            .chain(
                variables
                    .iter()
                    .map(|variable| (variable.name.as_str(), "variable")),
            );

        for (name, kind) in declared {
            validate_name(name, kind)?;
            if !seen.insert(name) {
                return Err(SweepError::config(
                    "CONFIG.DUPLICATE_NAME",
                    format!("{} name '{}' is already declared", kind, name),
                ));
            }
        }

        for constant in &constants {
            if !constant.value.is_finite() {
                return Err(SweepError::config(
                    "CONFIG.NON_FINITE_VALUE",
                    format!(
                        "constant '{}' has non-finite value {}",
                        constant.name, constant.value
                    ),
                ));
            }
        }

        for variable in &variables {
            if variable.is_empty() {
                return Err(SweepError::config(
                    "CONFIG.EMPTY_VARIABLE",
                    format!("variable '{}' has no values to sweep", variable.name),
                ));
            }
            if let Some(value) = variable.values.iter().find(|value| !value.is_finite()) {
                return Err(SweepError::config(
                    "CONFIG.NON_FINITE_VALUE",
                    format!(
                        "variable '{}' has non-finite value {}",
                        variable.name, value
                    ),
                ));
            }
        }

        let shape = variables.iter().map(VariableSpec::len).collect::<SweepShape>();
        let total = shape
            .iter()
            .try_fold(1_usize, |total, extent| total.checked_mul(*extent));
        if total.is_none() {
            return Err(SweepError::config(
                "CONFIG.SPACE_TOO_LARGE",
                format!("sweep shape {:?} has more points than can be addressed", shape),
            ));
        }

        for variable in &variables {
            validate_variable_name(&variable.name)?;
            validate_segments(variable)?;
        }

        Ok(Self {
            constants,
            variables,
            shape,
        })
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn variables(&self) -> &[VariableSpec] {
        &self.variables
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of points; 1 when no variables are declared.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iterate(&self) -> Points<'_> {
        Points {
            space: self,
            next_rank: 0,
            end_rank: self.len(),
        }
    }

    pub fn point(&self, rank: usize) -> Option<ParameterPoint<'_>> {
        (rank < self.len()).then(|| ParameterPoint {
            space: self,
            rank,
            multi_index: self.multi_index(rank),
        })
    }

    /// Row-major rank of a multi-index, or `None` when out of bounds.
    pub fn flat_index(&self, multi_index: &[usize]) -> Option<usize> {
        if multi_index.len() != self.shape.len() {
            return None;
        }
        multi_index
            .iter()
            .zip(&self.shape)
            .try_fold(0, |rank, (index, extent)| {
                (index < extent).then_some(rank * extent + index)
            })
    }

    pub fn multi_index(&self, rank: usize) -> Vec<usize> {
        let mut remainder = rank;
        let mut multi_index = vec![0; self.shape.len()];
        for (slot, extent) in multi_index.iter_mut().zip(&self.shape).rev() {
            *slot = remainder % extent;
            remainder /= extent;
        }
        multi_index
    }
}

/// Variable names that would collide with the persisted result arrays.
pub(crate) const RESERVED_VARIABLE_NAMES: [&str; 2] =
    ["energies_ground_states", "positions_ground_states"];

fn validate_variable_name(name: &str) -> SweepResult<()> {
    if RESERVED_VARIABLE_NAMES.contains(&name) {
        return Err(SweepError::config(
            "CONFIG.RESERVED_NAME",
            format!("variable name '{}' is reserved for sweep results", name),
        ));
    }
    Ok(())
}

/// Formatted values become part of directory and file names: they must be
/// distinct within a variable and free of path separators.
fn validate_segments(variable: &VariableSpec) -> SweepResult<()> {
    let mut seen = HashMap::with_capacity(variable.len());
    for value in &variable.values {
        let segment = variable.display_value(*value);
        if segment.contains(['/', '\\']) {
            return Err(SweepError::config(
                "CONFIG.INVALID_NAME",
                format!(
                    "variable '{}' formats {} as '{}', which contains a path separator",
                    variable.name, value, segment
                ),
            ));
        }
        if let Some(previous) = seen.insert(segment.clone(), *value) {
            return Err(SweepError::config(
                "CONFIG.IDENTIFIER_COLLISION",
                format!(
                    "variable '{}' formats both {} and {} as '{}'",
                    variable.name, previous, value, segment
                ),
            ));
        }
    }
    Ok(())
}

fn validate_name(name: &str, kind: &str) -> SweepResult<()> {
    if name.trim().is_empty() {
        return Err(SweepError::config(
            "CONFIG.EMPTY_NAME",
            format!("{} name cannot be empty", kind),
        ));
    }
    if name.contains(['/', '\\']) {
        return Err(SweepError::config(
            "CONFIG.INVALID_NAME",
            format!("{} name '{}' cannot contain path separators", kind, name),
        ));
    }
    Ok(())
}

/// One concrete assignment of all constants and variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterPoint<'a> {
    space: &'a ParameterSpace,
    rank: usize,
    multi_index: Vec<usize>,
}

impl<'a> ParameterPoint<'a> {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn multi_index(&self) -> &[usize] {
        &self.multi_index
    }

    pub fn constants(&self) -> impl Iterator<Item = (&'a str, f64)> + '_ {
        self.space
            .constants
            .iter()
            .map(|constant| (constant.name.as_str(), constant.value))
    }

    /// Variable values of this point in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = (&'a VariableSpec, f64)> + '_ {
        self.space
            .variables
            .iter()
            .zip(&self.multi_index)
            .map(|(variable, index)| (variable, variable.values[*index]))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.constants()
            .find(|(constant, _)| *constant == name)
            .map(|(_, value)| value)
            .or_else(|| {
                self.variables()
                    .find(|(variable, _)| variable.name == name)
                    .map(|(_, value)| value)
            })
    }

    /// Constants merged with this point's variable values.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.constants()
            .map(|(name, value)| (name.to_string(), value))
            .chain(
                self.variables()
                    .map(|(variable, value)| (variable.name.clone(), value)),
            )
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Points<'a> {
    space: &'a ParameterSpace,
    next_rank: usize,
    end_rank: usize,
}

impl<'a> Iterator for Points<'a> {
    type Item = ParameterPoint<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_rank >= self.end_rank {
            return None;
        }
        let point = self.space.point(self.next_rank);
        self.next_rank += 1;
        point
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end_rank.saturating_sub(self.next_rank);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Points<'_> {}

impl FusedIterator for Points<'_> {}
