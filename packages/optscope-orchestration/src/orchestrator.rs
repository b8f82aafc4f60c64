//! Parallel Orchestrator
//!
//! Tasks are submitted to a fixed-size rayon pool in numeric filename order
//! and reported in completion order. Because heavier programs take longer to
//! build and run, the result table is not in filename order; sort it
//! downstream if order matters.

use crate::config::PipelineConfig;
use crate::discovery::discover_sources;
use crate::error::{PipelineError, Result};
use crate::pipeline::{process_file, RunContext};
use optscope_analysis::{BenchmarkResult, ClangToolchain, Toolchain};
use optscope_storage::ResultTable;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Outcome of one task, as seen by the collector
struct TaskReport {
    filename: String,
    outcome: Result<Option<BenchmarkResult>>,
}

/// Aggregated outcome of one pipeline run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Recognized files found in the input directory
    pub total: usize,
    /// Filenames in submission order
    pub submitted: Vec<String>,
    /// Filenames in completion order (also the row order of this run)
    pub completed: Vec<String>,
    pub rows_written: usize,
    pub skipped: usize,
    /// `(filename, error)` for tasks whose row could not be recorded
    pub failed: Vec<(String, String)>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Orchestrator {
    config: PipelineConfig,
    toolchain: Arc<dyn Toolchain>,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig, toolchain: Arc<dyn Toolchain>) -> Self {
        Self { config, toolchain }
    }

    /// Orchestrator using the configured clang.
    pub fn with_clang(config: PipelineConfig) -> Self {
        let toolchain = Arc::new(ClangToolchain::new(config.compiler.clone()));
        Self::new(config, toolchain)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline.
    ///
    /// Fails only when the config is invalid, the table cannot be initialized
    /// or the input directory cannot be listed. Per-file failures end up in
    /// [`RunSummary::failed`].
    pub fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        self.config.validate()?;

        let table = ResultTable::initialize(&self.config.output_csv)
            .map_err(PipelineError::TableInit)?;
        if let Some(dir) = &self.config.artifact_dir {
            fs::create_dir_all(dir).map_err(|source| PipelineError::ArtifactDir {
                path: dir.clone(),
                source,
            })?;
        }
        let files = discover_sources(&self.config.input_dir, &self.config.source_extension)?;
        let total = files.len();
        let workers = self.config.worker_count();

        info!(
            "Processing {} files from {} with {} workers",
            total,
            self.config.input_dir.display(),
            workers
        );

        let ctx = Arc::new(RunContext::new(
            self.config.clone(),
            Arc::clone(&self.toolchain),
            Arc::new(table),
        ));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("optscope-worker-{}", i))
            .build()
            .map_err(PipelineError::worker_pool)?;

        let (tx, rx) = mpsc::channel::<TaskReport>();
        for filename in &files {
            let ctx = Arc::clone(&ctx);
            let tx = tx.clone();
            let filename = filename.clone();

            // FIFO keeps submission order equal to discovery order
            pool.spawn_fifo(move || {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| process_file(&ctx, &filename)))
                        .unwrap_or_else(|payload| {
                            Err(PipelineError::TaskPanicked {
                                filename: filename.clone(),
                                message: panic_message(payload.as_ref()),
                            })
                        });
                // The collector only goes away once every sender is dropped
                let _ = tx.send(TaskReport { filename, outcome });
            });
        }
        drop(tx);

        let mut summary = RunSummary {
            total,
            submitted: files,
            ..Default::default()
        };

        for (done, report) in rx.iter().enumerate() {
            match report.outcome {
                Ok(Some(result)) => {
                    println!("Processed {}: {}", report.filename, result);
                    summary.rows_written += 1;
                }
                Ok(None) => {
                    debug!("Skipped {}", report.filename);
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!("Failed to process {}: {}", report.filename, e);
                    summary.failed.push((report.filename.clone(), e.to_string()));
                }
            }
            summary.completed.push(report.filename);
            println!("Progress: {}/{} files completed", done + 1, total);
        }

        summary.duration = start.elapsed();
        info!(
            "Run finished in {:?}: {} rows written, {} skipped, {} failed",
            summary.duration,
            summary.rows_written,
            summary.skipped,
            summary.failed.len()
        );

        Ok(summary)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(boxed.as_ref()), "owned message");

        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }

    #[test]
    fn test_unwritable_table_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let config = PipelineConfig {
            input_dir: dir.path().to_path_buf(),
            output_csv: blocker.join("features.csv"),
            ..Default::default()
        };

        let err = Orchestrator::with_clang(config).run().unwrap_err();
        assert!(matches!(err, PipelineError::TableInit(_)));
    }

    #[test]
    fn test_blocked_artifact_dir_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let config = PipelineConfig {
            input_dir: dir.path().to_path_buf(),
            output_csv: dir.path().join("features.csv"),
            artifact_dir: Some(blocker.join("build")),
            ..Default::default()
        };

        let err = Orchestrator::with_clang(config).run().unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactDir { .. }));
    }

    #[test]
    fn test_invalid_config_aborts_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("features.csv");
        let config = PipelineConfig {
            input_dir: dir.path().to_path_buf(),
            output_csv: output.clone(),
            workers: Some(0),
            ..Default::default()
        };

        let err = Orchestrator::with_clang(config).run().unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_empty_input_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("random_c_programs");
        std::fs::create_dir(&input).unwrap();

        let config = PipelineConfig {
            input_dir: input,
            output_csv: dir.path().join("features.csv"),
            ..Default::default()
        };

        let summary = Orchestrator::with_clang(config).run().unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.completed.is_empty());
        assert!(summary.is_success());
        assert!(dir.path().join("features.csv").exists());
    }
}
