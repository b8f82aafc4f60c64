//! Execution Benchmarker
//!
//! Compiles one source file under every [`OptFlag`] in fixed order, runs each
//! binary once and keeps the wall-clock time. Compiled artifacts stay on disk.

use crate::flags::OptFlag;
use crate::model::{FlagMeasurements, Measurement};
use crate::toolchain::{RunStatus, Toolchain};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Benchmarker settings
#[derive(Debug, Clone, Default)]
pub struct BenchmarkOptions {
    /// Where binaries go (default: next to the source file)
    pub artifact_dir: Option<PathBuf>,
    /// Kill a binary after this long (None = wait forever)
    pub run_timeout: Option<Duration>,
}

/// Flag-specific binary path: `<dir>/<stem>_<flag>.exe`.
pub fn artifact_path(source: &Path, flag: OptFlag, artifact_dir: Option<&Path>) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "a".to_string());
    let dir = artifact_dir
        .map(Path::to_path_buf)
        .or_else(|| source.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    dir.join(format!("{}_{}.exe", stem, flag.as_arg()))
}

/// Fastest flag among completed runs; the earlier flag wins a tie.
pub fn select_best_flag(measurements: &FlagMeasurements) -> Option<OptFlag> {
    let mut best: Option<OptFlag> = None;
    let mut best_seconds = f64::INFINITY;

    for (flag, measurement) in measurements.iter() {
        if let Some(seconds) = measurement.seconds() {
            if seconds < best_seconds {
                best_seconds = seconds;
                best = Some(flag);
            }
        }
    }

    best
}

pub struct ExecutionBenchmarker<'a> {
    toolchain: &'a dyn Toolchain,
    options: &'a BenchmarkOptions,
}

impl<'a> ExecutionBenchmarker<'a> {
    pub fn new(toolchain: &'a dyn Toolchain, options: &'a BenchmarkOptions) -> Self {
        Self { toolchain, options }
    }

    /// Measure every flag, then pick the best one.
    pub fn benchmark(&self, source: &Path) -> (FlagMeasurements, Option<OptFlag>) {
        let mut measurements = FlagMeasurements::all_compile_failed();

        for flag in OptFlag::ALL {
            measurements.set(flag, self.measure(source, flag));
        }

        let best = select_best_flag(&measurements);
        (measurements, best)
    }

    fn measure(&self, source: &Path, flag: OptFlag) -> Measurement {
        let binary = artifact_path(source, flag, self.options.artifact_dir.as_deref());

        if let Err(e) = self.toolchain.compile(source, flag, &binary) {
            debug!("{} does not compile with {}: {}", source.display(), flag, e);
            return Measurement::CompileFailed;
        }

        let outcome = self.toolchain.execute(&binary, self.options.run_timeout);
        match outcome.status {
            RunStatus::Exited(Some(0)) => Measurement::Completed(outcome.elapsed),
            RunStatus::Exited(code) => {
                debug!(
                    "{} exited with {:?} after {:?}",
                    binary.display(),
                    code,
                    outcome.elapsed
                );
                Measurement::ExitFailure(code)
            }
            RunStatus::TimedOut => {
                warn!(
                    "{} timed out after {:?} and was killed",
                    binary.display(),
                    outcome.elapsed
                );
                Measurement::TimedOut
            }
            RunStatus::LaunchFailed(reason) => {
                warn!("Failed to run {}: {}", binary.display(), reason);
                Measurement::ExitFailure(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn completed(ms: u64) -> Measurement {
        Measurement::Completed(Duration::from_millis(ms))
    }

    #[test]
    fn test_artifact_path_next_to_source() {
        let path = artifact_path(Path::new("random_c_programs/program_3.c"), OptFlag::O2, None);
        assert_eq!(path, PathBuf::from("random_c_programs/program_3_-O2.exe"));
    }

    #[test]
    fn test_artifact_path_in_artifact_dir() {
        let path = artifact_path(
            Path::new("random_c_programs/program_3.c"),
            OptFlag::Ofast,
            Some(Path::new("/tmp/bins")),
        );
        assert_eq!(path, PathBuf::from("/tmp/bins/program_3_-Ofast.exe"));
    }

    #[test]
    fn test_artifact_paths_do_not_collide_across_flags() {
        let source = Path::new("program_1.c");
        let paths: HashSet<_> = OptFlag::ALL
            .iter()
            .map(|f| artifact_path(source, *f, None))
            .collect();
        assert_eq!(paths.len(), OptFlag::ALL.len());
    }

    #[test]
    fn test_best_flag_none_when_nothing_compiled() {
        assert_eq!(select_best_flag(&FlagMeasurements::all_compile_failed()), None);
    }

    #[test]
    fn test_best_flag_single_compiled_flag_wins_regardless_of_time() {
        let mut m = FlagMeasurements::all_compile_failed();
        m.set(OptFlag::O3, completed(90_000));
        assert_eq!(select_best_flag(&m), Some(OptFlag::O3));
    }

    #[test]
    fn test_best_flag_tie_goes_to_earlier_flag() {
        let m = FlagMeasurements::new([
            completed(50),
            completed(50),
            Measurement::CompileFailed,
            completed(80),
            Measurement::CompileFailed,
        ]);
        assert_eq!(select_best_flag(&m), Some(OptFlag::O0));
    }

    #[test]
    fn test_best_flag_ignores_timeouts_and_failures() {
        let m = FlagMeasurements::new([
            completed(400),
            Measurement::TimedOut,
            Measurement::ExitFailure(Some(139)),
            completed(120),
            completed(121),
        ]);
        assert_eq!(select_best_flag(&m), Some(OptFlag::O3));
    }

    #[test]
    fn test_best_flag_zero_duration() {
        let m = FlagMeasurements::new([
            completed(3),
            completed(0),
            completed(0),
            Measurement::CompileFailed,
            Measurement::CompileFailed,
        ]);
        assert_eq!(select_best_flag(&m), Some(OptFlag::O1));
    }
}
