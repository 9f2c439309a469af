pub mod errors;

pub use errors::{ParserResult, SweepError, SweepErrorCategory, SweepResult};

use crate::params::{RangeSpec, ValueFormat};

/// Per-variable value counts in declaration order.
pub type SweepShape = Vec<usize>;

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub value: f64,
}

impl Constant {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A swept parameter with its materialized values.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    pub name: String,
    pub values: Vec<f64>,
    pub format: Option<ValueFormat>,
}

impl VariableSpec {
    pub fn list(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            format: None,
        }
    }

    pub fn range(name: impl Into<String>, range: RangeSpec) -> SweepResult<Self> {
        let name = name.into();
        let values = range.values().map_err(|error| {
            SweepError::config(
                error.placeholder(),
                format!("variable '{}': {}", name, error.message()),
            )
        })?;
        Ok(Self {
            name,
            values,
            format: None,
        })
    }

    pub fn with_format(mut self, format: &str) -> SweepResult<Self> {
        self.format = Some(ValueFormat::parse(format)?);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renders one value for use in artifact names.
    pub fn display_value(&self, value: f64) -> String {
        match &self.format {
            Some(format) => format.apply(value),
            None => ValueFormat::default_display(value),
        }
    }
}
