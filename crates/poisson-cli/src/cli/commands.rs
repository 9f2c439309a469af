use super::logging::setup_logging;
use super::{Cli, CliError};
use poisson_core::config::SimulationConfig;
use poisson_core::sweep::{FailurePolicy, SweepOutcome, SweepRunner};

/// Exit status of a sweep that finished but skipped at least one point.
pub(super) const EXIT_SKIPPED_POINTS: i32 = 1;

pub(super) fn run_sweep_command(cli: Cli) -> Result<i32, CliError> {
    let mut config = SimulationConfig::load(&cli.config_file)?;
    if cli.keep_going {
        config.failure_policy = FailurePolicy::Skip;
    }
    setup_logging(cli.verbose, cli.quiet, config.log_file.as_deref())?;
    tracing::info!(
        config = %cli.config_file.display(),
        policy = ?config.failure_policy,
        simulator = %config.path_1d_poisson.display(),
        "loaded configuration"
    );

    let runner = SweepRunner::from_config(&config)?;
    let outcome = runner.run()?;
    println!("{}", render_human_summary(&outcome));

    if outcome.skipped_count() > 0 {
        Ok(EXIT_SKIPPED_POINTS)
    } else {
        Ok(0)
    }
}

pub(super) fn render_human_summary(outcome: &SweepOutcome) -> String {
    let mut lines = Vec::new();
    let status = if outcome.skipped_count() == 0 {
        "COMPLETE"
    } else {
        "COMPLETE WITH SKIPS"
    };
    lines.push(format!("Sweep status: {}", status));
    lines.push(format!(
        "Points: {} total ({} recorded, {} skipped)",
        outcome.len(),
        outcome.len() - outcome.skipped_count(),
        outcome.skipped_count()
    ));
    lines.push(format!("Shape: {:?}", outcome.shape));
    for record in outcome.skipped() {
        lines.push(format!(
            "Skipped {}: {}",
            record.identifier,
            record.error.as_deref().unwrap_or("unknown error")
        ));
    }
    lines.push(format!("Output: {}", outcome.output_root.display()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::render_human_summary;
    use ndarray::{ArrayD, IxDyn};
    use poisson_core::report::GroundState;
    use poisson_core::sweep::{PointRecord, SweepOutcome};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn record(rank: usize, identifier: &str, error: Option<&str>) -> PointRecord {
        PointRecord {
            rank,
            identifier: identifier.to_string(),
            variables: BTreeMap::new(),
            ground_state: error.is_none().then_some(GroundState {
                energy: 0.1,
                position: 2.0,
            }),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn summary_lists_skipped_points() {
        let outcome = SweepOutcome {
            output_root: PathBuf::from("results"),
            shape: vec![2],
            energies: ArrayD::zeros(IxDyn(&[2])),
            positions: ArrayD::zeros(IxDyn(&[2])),
            records: vec![
                record(0, "V(0.0)", None),
                record(1, "V(0.5)", Some("simulator exited with 1")),
            ],
            artifacts: Vec::new(),
        };

        let summary = render_human_summary(&outcome);
        assert!(summary.starts_with("Sweep status: COMPLETE WITH SKIPS"));
        assert!(summary.contains("Points: 2 total (1 recorded, 1 skipped)"));
        assert!(summary.contains("Shape: [2]"));
        assert!(summary.contains("Skipped V(0.5): simulator exited with 1"));
        assert!(summary.ends_with("Output: results"));
    }
}
