use crate::domain::{Constant, SweepError, SweepResult, VariableSpec};
use crate::params::{ParameterSpace, RangeSpec};
use crate::sweep::FailurePolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// YAML run configuration.
///
/// Relative paths resolve against the current directory; `path_1d_poisson`
/// is made absolute at load time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub file_template: PathBuf,
    pub dir_output: PathBuf,
    pub path_1d_poisson: PathBuf,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub variables: Vec<VariableConfig>,
    #[serde(default)]
    pub constants: Vec<ConstantConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableConfig {
    pub name: String,
    pub value: ValueSpec,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Scalar(f64),
    List(Vec<f64>),
    Range(RangeSpec),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstantConfig {
    pub name: String,
    pub value: f64,
}

impl SimulationConfig {
    pub fn load(path: &Path) -> SweepResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| {
            SweepError::config(
                "CONFIG.READ",
                format!("failed to read config '{}': {}", path.display(), source),
            )
        })?;
        Self::from_yaml_named(&path.display().to_string(), &source)
    }

    pub fn from_yaml(source: &str) -> SweepResult<Self> {
        Self::from_yaml_named("config", source)
    }

    fn from_yaml_named(origin: &str, source: &str) -> SweepResult<Self> {
        let mut config: Self = serde_yaml::from_str(source).map_err(|error| {
            SweepError::config("CONFIG.PARSE", format!("{}: {}", origin, error))
        })?;
        config.path_1d_poisson = std::path::absolute(&config.path_1d_poisson).map_err(|source| {
            SweepError::config(
                "CONFIG.SIMULATOR_PATH",
                format!(
                    "{}: cannot resolve path_1d_poisson '{}': {}",
                    origin,
                    config.path_1d_poisson.display(),
                    source
                ),
            )
        })?;
        Ok(config)
    }

    /// Materializes the declared constants and variables.
    pub fn parameter_space(&self) -> SweepResult<ParameterSpace> {
        let constants = self
            .constants
            .iter()
            .map(|constant| Constant::new(constant.name.clone(), constant.value))
            .collect();
        let variables = self
            .variables
            .iter()
            .map(VariableConfig::to_spec)
            .collect::<SweepResult<Vec<_>>>()?;
        ParameterSpace::build(constants, variables)
    }
}

impl VariableConfig {
    pub fn to_spec(&self) -> SweepResult<VariableSpec> {
        let spec = match &self.value {
            ValueSpec::Scalar(value) => VariableSpec::list(self.name.clone(), vec![*value]),
            ValueSpec::List(values) => VariableSpec::list(self.name.clone(), values.clone()),
            ValueSpec::Range(range) => VariableSpec::range(self.name.clone(), *range)?,
        };
        match &self.format {
            Some(format) => spec.with_format(format).map_err(|error| {
                SweepError::config(
                    error.placeholder(),
                    format!("variable '{}': {}", self.name, error.message()),
                )
            }),
            None => Ok(spec),
        }
    }
}
