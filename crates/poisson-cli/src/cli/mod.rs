mod commands;
mod logging;

use clap::Parser;
use poisson_core::domain::SweepError;
use std::path::PathBuf;

pub fn run_from_env() -> i32 {
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let sweep_error = error.as_sweep_error();
            eprintln!("{}", sweep_error.diagnostic_line());
            sweep_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("poisson1d-ex".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => commands::run_sweep_command(cli),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "poisson1d-ex",
    version,
    about = "Run 1D Poisson simulations over a parameter sweep"
)]
struct Cli {
    /// YAML configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config_file: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Skip failed points instead of aborting the sweep
    #[arg(long)]
    keep_going: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Sweep(SweepError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<SweepError> for CliError {
    fn from(error: SweepError) -> Self {
        Self::Sweep(error)
    }
}

impl CliError {
    fn as_sweep_error(&self) -> SweepError {
        match self {
            Self::Usage(message) => {
                SweepError::config("CONFIG.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Sweep(error) => error.clone(),
            Self::Internal(error) => SweepError::io("IO.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, CliError, run};
    use clap::Parser;
    use poisson_core::domain::{SweepError, SweepErrorCategory};

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from(["poisson1d-ex", "sweep.yaml", "-vv", "--keep-going"])
            .expect("arguments should parse");
        assert_eq!(cli.config_file.to_str(), Some("sweep.yaml"));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert!(cli.keep_going);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["poisson1d-ex", "sweep.yaml", "-q", "-v"]).is_err());
    }

    #[test]
    fn help_exits_cleanly() {
        assert_eq!(run(["--help"]).expect("help"), 0);
    }

    #[test]
    fn missing_argument_is_a_usage_error() {
        let error = run(Vec::<String>::new()).expect_err("config file is required");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(error.as_sweep_error().exit_code(), 2);
    }

    #[test]
    fn sweep_errors_keep_their_category() {
        let error = CliError::from(SweepError::template("TEMPLATE.RENDER", "undefined 'Vg'"));
        let sweep_error = error.as_sweep_error();
        assert_eq!(sweep_error.category(), SweepErrorCategory::TemplateError);
        assert_eq!(sweep_error.diagnostic_line(), "ERROR: [TEMPLATE.RENDER] undefined 'Vg'");
    }
}
