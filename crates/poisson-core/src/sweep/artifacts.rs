use crate::domain::{SweepError, SweepResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const INPUT_SUFFIX: &str = ".txt";
pub const OUTPUT_SUFFIX: &str = "_Out.txt";
pub const STATUS_SUFFIX: &str = "_Status.txt";
pub const WAVE_SUFFIX: &str = "_Wave.txt";

const SIMULATOR_OUTPUTS: [&str; 3] = [OUTPUT_SUFFIX, STATUS_SUFFIX, WAVE_SUFFIX];

pub fn input_path(working_dir: &Path, identifier: &str) -> PathBuf {
    working_dir.join(format!("{identifier}{INPUT_SUFFIX}"))
}

/// Removes simulator outputs of `identifier` left in `working_dir` by an
/// earlier run, so only files written by the next invocation get collected.
pub fn clear_stale_outputs(working_dir: &Path, identifier: &str) -> SweepResult<()> {
    for suffix in SIMULATOR_OUTPUTS {
        let path = working_dir.join(format!("{identifier}{suffix}"));
        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed stale output"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                return Err(SweepError::io_at(
                    "IO.STALE_ARTIFACT",
                    "remove stale output",
                    &path,
                    error,
                ));
            }
        }
    }
    Ok(())
}

/// Files of one point after they were moved into its output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedArtifacts {
    pub directory: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: PathBuf,
    pub wave: PathBuf,
}

/// Moves the input deck and the three simulator outputs of `identifier` from
/// `working_dir` into a fresh `output_root/identifier` directory.
///
/// Every expected file is checked before anything is created or moved.
pub fn collect(
    working_dir: &Path,
    output_root: &Path,
    identifier: &str,
) -> SweepResult<CollectedArtifacts> {
    let input = input_path(working_dir, identifier);
    if !input.is_file() {
        return Err(missing(&input, identifier));
    }
    let outputs = SIMULATOR_OUTPUTS.map(|suffix| working_dir.join(format!("{identifier}{suffix}")));
    if let Some(absent) = outputs.iter().find(|path| !path.is_file()) {
        return Err(missing(absent, identifier));
    }

    let directory = output_root.join(identifier);
    fs::create_dir(&directory).map_err(|source| {
        SweepError::io_at(
            "IO.POINT_DIRECTORY",
            "create point directory",
            &directory,
            source,
        )
    })?;

    let input = relocate(&input, &directory)?;
    let [output, status, wave] = outputs;
    Ok(CollectedArtifacts {
        output: relocate(&output, &directory)?,
        status: relocate(&status, &directory)?,
        wave: relocate(&wave, &directory)?,
        input,
        directory,
    })
}

fn missing(path: &Path, identifier: &str) -> SweepError {
    SweepError::invocation(
        "RUN.MISSING_ARTIFACT",
        format!(
            "simulator did not produce '{}' for '{}'",
            path.display(),
            identifier
        ),
    )
}

fn relocate(source: &Path, directory: &Path) -> SweepResult<PathBuf> {
    let Some(file_name) = source.file_name() else {
        return Err(SweepError::io(
            "IO.ARTIFACT_MOVE",
            format!("artifact path '{}' has no file name", source.display()),
        ));
    };
    let target = directory.join(file_name);
    move_file(source, &target)
        .map_err(|error| SweepError::io_at("IO.ARTIFACT_MOVE", "move artifact", source, error))?;
    Ok(target)
}

fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, target)?;
            fs::remove_file(source)
        }
    }
}
