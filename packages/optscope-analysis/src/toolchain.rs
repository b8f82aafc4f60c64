/*
 * Toolchain Port - the external compiler and the binaries it produces
 *
 * Domain code only talks to `Toolchain`; `ClangToolchain` is the
 * production adapter. Tests substitute scripted implementations.
 */

use crate::flags::OptFlag;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: String,
        stderr: String,
    },
}

impl ToolchainError {
    pub fn non_zero_exit(
        program: impl Into<String>,
        status: impl ToString,
        stderr: impl Into<String>,
    ) -> Self {
        Self::NonZeroExit {
            program: program.into(),
            status: status.to_string(),
            stderr: stderr.into(),
        }
    }
}

/// How a benchmarked binary finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Process exited; `None` when terminated by a signal
    Exited(Option<i32>),
    /// Killed after the deadline passed
    TimedOut,
    /// Could not be started or waited on
    LaunchFailed(String),
}

/// Wall-clock duration and final status of one binary run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub elapsed: Duration,
    pub status: RunStatus,
}

/// Port: external compiler + program runner
pub trait Toolchain: Send + Sync {
    /// Syntax-only JSON AST dump of `source` (raw stdout).
    fn dump_ast(&self, source: &Path) -> Result<Vec<u8>, ToolchainError>;

    /// Compile `source` with exactly one optimization flag into `output`.
    fn compile(&self, source: &Path, flag: OptFlag, output: &Path) -> Result<(), ToolchainError>;

    /// Run `binary` once with no arguments and discarded stdio.
    ///
    /// `timeout = None` waits without bound.
    fn execute(&self, binary: &Path, timeout: Option<Duration>) -> RunOutcome {
        let start = Instant::now();
        let spawned = Command::new(binary)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let (status, finished) = match spawned {
            Ok(child) => wait_with_deadline(child, timeout.map(|t| start + t)),
            Err(e) => (RunStatus::LaunchFailed(e.to_string()), Instant::now()),
        };

        RunOutcome {
            elapsed: finished.duration_since(start),
            status,
        }
    }
}

/// Wait for `child`, killing it once `deadline` passes.
///
/// Returns the final status and the instant the exit was observed. With a
/// deadline, a helper thread blocks on `wait` and reports back over a channel
/// so the exit is seen as soon as it happens.
fn wait_with_deadline(mut child: Child, deadline: Option<Instant>) -> (RunStatus, Instant) {
    let Some(deadline) = deadline else {
        let status = exit_status(child.wait());
        return (status, Instant::now());
    };

    let pid = child.id();
    let (tx, rx) = mpsc::channel();
    let waiter = thread::Builder::new()
        .name(format!("optscope-wait-{}", pid))
        .spawn(move || {
            let status = exit_status(child.wait());
            let _ = tx.send((status, Instant::now()));
        });
    if let Err(e) = waiter {
        return (RunStatus::LaunchFailed(e.to_string()), Instant::now());
    }

    let timeout = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(timeout) {
        Ok(done) => done,
        Err(RecvTimeoutError::Timeout) => {
            // Once the waiter has reaped the child its pid may be reused
            if let Ok(done) = rx.try_recv() {
                return done;
            }
            if let Err(e) = kill_process(pid) {
                warn!("Failed to kill timed-out process {}: {}", pid, e);
            }
            match rx.recv() {
                // Exited on its own right at the deadline
                Ok(done @ (RunStatus::Exited(Some(_)), _)) => done,
                _ => (RunStatus::TimedOut, Instant::now()),
            }
        }
        Err(RecvTimeoutError::Disconnected) => (
            RunStatus::LaunchFailed("waiter thread exited without a status".to_string()),
            Instant::now(),
        ),
    }
}

fn exit_status(result: io::Result<std::process::ExitStatus>) -> RunStatus {
    match result {
        Ok(status) => RunStatus::Exited(status.code()),
        Err(e) => RunStatus::LaunchFailed(e.to_string()),
    }
}

/// Send SIGKILL to `pid`.
#[cfg(unix)]
fn kill_process(pid: u32) -> io::Result<()> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGKILL) };
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(not(unix))]
fn kill_process(pid: u32) -> io::Result<()> {
    let status = Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("taskkill exited with {}", status),
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_compiler_is_spawn_error() {
        let toolchain = ClangToolchain::new("/nonexistent/optscope-clang");
        let err = toolchain
            .dump_ast(Path::new("program_1.c"))
            .expect_err("compiler does not exist");
        assert!(matches!(err, ToolchainError::Spawn { .. }));
    }

    #[test]
    fn test_execute_reports_exit_code() {
        let toolchain = ClangToolchain::default();
        let outcome = toolchain.execute(Path::new("/bin/true"), None);
        assert_eq!(outcome.status, RunStatus::Exited(Some(0)));

        let outcome = toolchain.execute(Path::new("/bin/false"), Some(Duration::from_secs(5)));
        assert_eq!(outcome.status, RunStatus::Exited(Some(1)));
    }

    #[test]
    fn test_execute_missing_binary_is_launch_failure() {
        let toolchain = ClangToolchain::default();
        let outcome = toolchain.execute(Path::new("/nonexistent/program_1_-O0.exe"), None);
        assert!(matches!(outcome.status, RunStatus::LaunchFailed(_)));
    }

    #[test]
    fn test_execute_kills_hung_binary() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hang.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let toolchain = ClangToolchain::default();
        let outcome = toolchain.execute(&script, Some(Duration::from_millis(200)));

        assert_eq!(outcome.status, RunStatus::TimedOut);
        assert!(outcome.elapsed >= Duration::from_millis(200));
        assert!(outcome.elapsed < Duration::from_secs(10));
    }

    #[test]
    fn test_timed_run_reports_exit_without_waiting_for_deadline() {
        let toolchain = ClangToolchain::default();
        let outcome = toolchain.execute(Path::new("/bin/true"), Some(Duration::from_secs(30)));

        assert_eq!(outcome.status, RunStatus::Exited(Some(0)));
        assert!(outcome.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_timed_and_untimed_runs_measure_alike() {
        let toolchain = ClangToolchain::default();
        let median = |timeout: Option<Duration>| {
            let mut runs: Vec<Duration> = (0..15)
                .map(|_| toolchain.execute(Path::new("/bin/true"), timeout).elapsed)
                .collect();
            runs.sort();
            runs[runs.len() / 2]
        };

        let untimed = median(None);
        let timed = median(Some(Duration::from_secs(30)));
        // Exit is observed as it happens, not at a polling tick
        assert!(
            timed < untimed * 3 + Duration::from_millis(5),
            "timed {:?} vs untimed {:?}",
            timed,
            untimed
        );
    }
}
