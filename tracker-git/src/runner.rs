//! Process seam between the publisher and the git executable.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a spawned git process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepExit {
    /// Exit code; `None` when killed by a signal or by the timeout.
    pub code: Option<i32>,
    pub timed_out: bool,
}

impl StepExit {
    pub fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            timed_out: false,
        }
    }

    pub fn timed_out() -> Self {
        Self {
            code: None,
            timed_out: true,
        }
    }

    pub fn success(&self) -> bool {
        !self.timed_out && self.code == Some(0)
    }
}

impl From<ExitStatus> for StepExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            timed_out: false,
        }
    }
}

/// Runs one git invocation to completion.
///
/// `Err` means the process could not be launched. A process that launched and
/// exited badly is `Ok` with a non-success [`StepExit`].
pub trait GitRunner: Send + Sync {
    /// Executable shown in logs and spawn errors.
    fn program(&self) -> &Path;

    fn run(&self, args: &[OsString]) -> io::Result<StepExit>;
}

/// Spawns the real git binary, inheriting stdout and stderr.
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemGit {
    /// `git` from `PATH`, no timeout.
    pub fn new() -> Self {
        Self::with_program("git")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill any step still running after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl GitRunner for SystemGit {
    fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, args: &[OsString]) -> io::Result<StepExit> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()?;

        let Some(timeout) = self.timeout else {
            return child.wait().map(StepExit::from);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status.into());
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    program = %self.program.display(),
                    timeout_ms = timeout.as_millis() as u64,
                    "git step timed out; killing it",
                );
                // The child may exit between try_wait and kill.
                let _ = child.kill();
                let _ = child.wait();
                return Ok(StepExit::timed_out());
            }
            sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let git = SystemGit::with_program("/nonexistent/bin/git-does-not-exist");
        let err = git.run(&["--version".into()]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported_not_raised() {
        let runner = SystemGit::with_program("false");
        let exit = runner.run(&[]).expect("spawn false");
        assert!(!exit.success());
        assert_eq!(exit.code, Some(1));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_a_hung_step() {
        let runner =
            SystemGit::with_program("sleep").with_timeout(Some(Duration::from_millis(100)));
        let started = Instant::now();
        let exit = runner.run(&["5".into()]).expect("spawn sleep");
        assert!(exit.timed_out);
        assert!(!exit.success());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn fast_step_finishes_inside_timeout() {
        let runner = SystemGit::with_program("true").with_timeout(Some(Duration::from_secs(5)));
        let exit = runner.run(&[]).expect("spawn true");
        assert!(exit.success());
    }
}
