//! Sequential sweep driver.
//!
//! Each point moves through [`PointStage`] in order; a failure at any stage
//! ends that point and is handled according to the runner's
//! [`FailurePolicy`]. Results are buffered by rank and persisted only after
//! the last point.

mod artifacts;
mod identifier;
mod persist;
mod simulator;
mod template;

pub use artifacts::{
    CollectedArtifacts, INPUT_SUFFIX, OUTPUT_SUFFIX, STATUS_SUFFIX, WAVE_SUFFIX,
    clear_stale_outputs, collect, input_path,
};
pub use identifier::{CONSTANTS_ONLY_IDENTIFIER, point_identifier};
pub use persist::{
    ENERGIES_FILE, POSITIONS_FILE, SUMMARY_FILE, persist_sweep, reshape_results,
    write_result_array, write_summary, write_variable_array,
};
pub use simulator::{ExternalSimulator, Simulator};
pub use template::InputTemplate;

use crate::config::SimulationConfig;
use crate::domain::{SweepError, SweepResult, SweepShape};
use crate::params::{ParameterPoint, ParameterSpace};
use crate::report::{GroundState, SimulationReport};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What happens to the sweep when one point fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Propagate the first error; nothing is persisted.
    #[default]
    Abort,
    /// Log the error, record NaN for the point and continue.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointStage {
    Pending,
    Rendered,
    Invoked,
    Collected,
    Parsed,
    Recorded,
}

impl PointStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Rendered => "rendered",
            Self::Invoked => "invoked",
            Self::Collected => "collected",
            Self::Parsed => "parsed",
            Self::Recorded => "recorded",
        }
    }
}

impl Display for PointStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointRecord {
    pub rank: usize,
    pub identifier: String,
    pub variables: BTreeMap<String, f64>,
    pub ground_state: Option<GroundState>,
    /// Set when the point was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PointRecord {
    pub fn is_skipped(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub output_root: PathBuf,
    pub shape: SweepShape,
    pub energies: ArrayD<f64>,
    pub positions: ArrayD<f64>,
    pub records: Vec<PointRecord>,
    /// Persisted files in write order.
    pub artifacts: Vec<PathBuf>,
}

impl SweepOutcome {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &PointRecord> {
        self.records.iter().filter(|record| record.is_skipped())
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }
}

pub struct SweepRunner<S> {
    space: ParameterSpace,
    template: InputTemplate,
    simulator: S,
    output_root: PathBuf,
    policy: FailurePolicy,
}

impl SweepRunner<ExternalSimulator> {
    pub fn from_config(config: &SimulationConfig) -> SweepResult<Self> {
        let space = config.parameter_space()?;
        let template = InputTemplate::from_file(&config.file_template)?;
        let simulator = ExternalSimulator::new(&config.path_1d_poisson)?;
        Ok(Self::new(space, template, simulator, config.dir_output.clone())
            .with_policy(config.failure_policy))
    }
}

impl<S: Simulator> SweepRunner<S> {
    pub fn new(
        space: ParameterSpace,
        template: InputTemplate,
        simulator: S,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            space,
            template,
            simulator,
            output_root: output_root.into(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn run(&self) -> SweepResult<SweepOutcome> {
        fs::create_dir_all(&self.output_root).map_err(|source| {
            SweepError::io_at(
                "IO.OUTPUT_ROOT",
                "create output directory",
                &self.output_root,
                source,
            )
        })?;
        self.log_plan();

        let total = self.space.len();
        let mut energies = vec![None; total];
        let mut positions = vec![None; total];
        let mut records = Vec::with_capacity(total);

        for point in self.space.iterate() {
            let identifier = point_identifier(&point);
            info!(point = point.rank() + 1, total, %identifier, "running point");

            let (ground_state, error) = match self.run_point(&point, &identifier) {
                Ok(ground_state) => (ground_state, None),
                Err(error) if self.policy == FailurePolicy::Skip => {
                    warn!(%identifier, %error, "skipping point");
                    (None, Some(error.to_string()))
                }
                Err(error) => return Err(error),
            };

            if let Some(state) = ground_state {
                energies[point.rank()] = Some(state.energy);
                positions[point.rank()] = Some(state.position);
            }
            records.push(PointRecord {
                rank: point.rank(),
                identifier,
                variables: point
                    .variables()
                    .map(|(variable, value)| (variable.name.clone(), value))
                    .collect(),
                ground_state,
                error,
            });
        }

        let energies = reshape_results(self.space.shape(), &energies)?;
        let positions = reshape_results(self.space.shape(), &positions)?;
        let artifacts = persist_sweep(
            &self.output_root,
            &self.space,
            &energies,
            &positions,
            &records,
        )?;
        info!(
            points = records.len(),
            skipped = records.iter().filter(|record| record.is_skipped()).count(),
            output = %self.output_root.display(),
            "sweep finished"
        );

        Ok(SweepOutcome {
            output_root: self.output_root.clone(),
            shape: self.space.shape().to_vec(),
            energies,
            positions,
            records,
            artifacts,
        })
    }

    fn log_plan(&self) {
        info!(
            combinations = self.space.len(),
            shape = ?self.space.shape(),
            "starting sweep"
        );
        for variable in self.space.variables() {
            info!(name = %variable.name, values = ?variable.values, "variable");
        }
        for constant in self.space.constants() {
            info!(name = %constant.name, value = constant.value, "constant");
        }
    }

    fn run_point(
        &self,
        point: &ParameterPoint<'_>,
        identifier: &str,
    ) -> SweepResult<Option<GroundState>> {
        log_stage(identifier, PointStage::Pending);

        let deck = self.template.render(&point.to_map())?;
        clear_stale_outputs(self.simulator.working_dir(), identifier)?;
        let input = input_path(self.simulator.working_dir(), identifier);
        fs::write(&input, deck)
            .map_err(|source| SweepError::io_at("IO.INPUT_WRITE", "write input", &input, source))?;
        log_stage(identifier, PointStage::Rendered);

        self.simulator.invoke(identifier)?;
        log_stage(identifier, PointStage::Invoked);

        let collected = collect(self.simulator.working_dir(), &self.output_root, identifier)?;
        log_stage(identifier, PointStage::Collected);

        let report = SimulationReport::parse(&collected.output)?;
        log_stage(identifier, PointStage::Parsed);

        let ground_state = report.ground_state();
        if ground_state.is_none() {
            warn!(identifier, "report has no ground state");
        }
        log_stage(identifier, PointStage::Recorded);
        Ok(ground_state)
    }
}

fn log_stage(identifier: &str, stage: PointStage) {
    debug!(identifier, %stage, "point stage");
}

#[cfg(test)]
mod tests {
    use super::{FailurePolicy, PointRecord, PointStage};
    use std::collections::BTreeMap;

    #[derive(serde::Deserialize)]
    struct PolicyHolder {
        policy: FailurePolicy,
    }

    #[test]
    fn failure_policy_defaults_to_abort_and_parses_lowercase() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Abort);
        let holder: PolicyHolder = serde_yaml::from_str("policy: skip").expect("policy");
        assert_eq!(holder.policy, FailurePolicy::Skip);
        assert!(serde_yaml::from_str::<PolicyHolder>("policy: retry").is_err());
    }

    #[test]
    fn skipped_records_serialize_their_error() {
        let record = PointRecord {
            rank: 1,
            identifier: "V(0.5)".to_string(),
            variables: BTreeMap::from([("V".to_string(), 0.5)]),
            ground_state: None,
            error: Some("InvocationError [RUN.SIMULATOR_EXIT] exit 1".to_string()),
        };
        assert!(record.is_skipped());

        let json = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(json["ground_state"], serde_json::Value::Null);
        assert_eq!(json["variables"]["V"], 0.5);
        assert!(json["error"].as_str().is_some_and(|error| error.contains("RUN.SIMULATOR_EXIT")));
    }

    #[test]
    fn stages_display_lowercase() {
        assert_eq!(PointStage::Collected.to_string(), "collected");
    }
}
