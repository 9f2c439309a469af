use anyhow::Context;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    fmt::{self},
    prelude::*,
};

/// Level used when `RUST_LOG` is unset.
pub(super) fn default_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::WARN;
    }
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn build_filter(verbosity: u8, quiet: bool) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level(verbosity, quiet).into())
        .from_env_lossy()
}

/// Installs the global subscriber. Events go to `log_file` when given,
/// otherwise to stderr.
pub(super) fn setup_logging(
    verbosity: u8,
    quiet: bool,
    log_file: Option<&Path>,
) -> anyhow::Result<()> {
    let filter = build_filter(verbosity, quiet);

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file '{}'", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        None => None,
    };
    let stderr_layer = file_layer.is_none().then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::default_level;
    use std::fs::File;
    use std::sync::Arc;
    use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_level(0, false), LevelFilter::INFO);
        assert_eq!(default_level(1, false), LevelFilter::DEBUG);
        assert_eq!(default_level(5, false), LevelFilter::TRACE);
        assert_eq!(default_level(2, true), LevelFilter::WARN);
    }

    #[test]
    fn file_layer_writes_without_ansi() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("sweep.log");
        let file = File::create(&path).expect("log file should be created");
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(identifier = "V(0.0)", "running point");
        });

        let content = std::fs::read_to_string(&path).expect("log should be readable");
        assert!(content.contains("running point"));
        assert!(content.contains("INFO"));
        assert!(!content.contains('\u{1b}'));
    }
}
