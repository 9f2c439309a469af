use crate::domain::{SweepError, SweepResult};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Black-box simulator consuming `{identifier}.txt` in its working directory
/// and writing `{identifier}_Out.txt`, `_Status.txt` and `_Wave.txt` there.
pub trait Simulator {
    fn working_dir(&self) -> &Path;

    /// Runs one point to completion. Blocks until the simulator exits.
    fn invoke(&self, identifier: &str) -> SweepResult<()>;
}

/// The external 1D Poisson executable, run from its own directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSimulator {
    executable: PathBuf,
    working_dir: PathBuf,
}

impl ExternalSimulator {
    pub fn new(executable: impl Into<PathBuf>) -> SweepResult<Self> {
        let executable = executable.into();
        let working_dir = executable
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                SweepError::config(
                    "CONFIG.SIMULATOR_PATH",
                    format!(
                        "simulator path '{}' has no parent directory",
                        executable.display()
                    ),
                )
            })?;
        Ok(Self {
            executable,
            working_dir,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl Simulator for ExternalSimulator {
    fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn invoke(&self, identifier: &str) -> SweepResult<()> {
        debug!(
            executable = %self.executable.display(),
            cwd = %self.working_dir.display(),
            identifier,
            "spawning simulator"
        );

        let output = Command::new(&self.executable)
            .arg(identifier)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|source| {
                SweepError::invocation(
                    "RUN.SIMULATOR_SPAWN",
                    format!(
                        "failed to start simulator '{}': {}",
                        self.executable.display(),
                        source
                    ),
                )
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(identifier, "simulator: {}", line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            warn!(identifier, "simulator stderr: {}", line);
        }

        if !output.status.success() {
            return Err(SweepError::invocation(
                "RUN.SIMULATOR_EXIT",
                format!(
                    "simulator '{}' exited with {} for '{}'",
                    self.executable.display(),
                    output.status,
                    identifier
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ExternalSimulator, Simulator};
    use crate::domain::SweepErrorCategory;
    use std::path::Path;

    #[test]
    fn working_dir_is_the_executable_directory() {
        let simulator = ExternalSimulator::new("/opt/poisson/1D Poisson.exe").expect("simulator");
        assert_eq!(simulator.working_dir(), Path::new("/opt/poisson"));
        assert_eq!(simulator.executable(), Path::new("/opt/poisson/1D Poisson.exe"));
    }

    #[test]
    fn bare_file_names_are_rejected() {
        let error = ExternalSimulator::new("poisson").expect_err("no parent directory");
        assert_eq!(error.category(), SweepErrorCategory::ConfigError);
    }

    #[test]
    fn missing_executable_is_an_invocation_error() {
        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let simulator =
            ExternalSimulator::new(temp.path().join("does-not-exist")).expect("simulator");
        let error = simulator.invoke("V(0.0)").expect_err("spawn should fail");
        assert_eq!(error.category(), SweepErrorCategory::InvocationError);
        assert_eq!(error.placeholder(), "RUN.SIMULATOR_SPAWN");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_invocation_error() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().expect("tempdir should be created");
        let script = temp.path().join("fail.sh");
        fs::write(&script, "#!/bin/sh\necho \"bad input $1\" >&2\nexit 3\n")
            .expect("script should be written");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .expect("script should be executable");

        let simulator = ExternalSimulator::new(&script).expect("simulator");
        let error = simulator.invoke("V(0.5)").expect_err("exit 3 should fail");
        assert_eq!(error.placeholder(), "RUN.SIMULATOR_EXIT");
        assert!(error.message().contains("V(0.5)"));
    }
}
