//! Pipeline configuration (YAML)
//!
//! Every field has a default, so an empty file (or no file) is a valid config.
//!
//! ```yaml
//! input_dir: random_c_programs
//! output_csv: features.csv
//! source_extension: c
//! compiler: clang
//! workers: 8              # default: number of CPUs
//! run_timeout_secs: 30    # null or 0 waits forever
//! artifact_dir: build/    # default: next to each source file
//! ```

use crate::error::{PipelineError, Result};
use optscope_analysis::BenchmarkOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory scanned (non-recursively) for source files
    pub input_dir: PathBuf,

    /// Result table path
    pub output_csv: PathBuf,

    /// Recognized source extension, without the dot
    pub source_extension: String,

    /// Compiler program used for AST dumps and builds
    pub compiler: PathBuf,

    /// Worker pool size (default: number of CPUs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Per-run timeout for benchmarked binaries
    pub run_timeout_secs: Option<u64>,

    /// Directory for compiled binaries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("random_c_programs"),
            output_csv: PathBuf::from("features.csv"),
            source_extension: "c".to_string(),
            compiler: PathBuf::from("clang"),
            workers: None,
            run_timeout_secs: Some(30),
            artifact_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(PipelineError::config("workers must be at least 1"));
        }
        if self.source_extension.is_empty() || self.source_extension.starts_with('.') {
            return Err(PipelineError::config(format!(
                "source_extension must be a bare extension like 'c', got '{}'",
                self.source_extension
            )));
        }
        if self.compiler.as_os_str().is_empty() {
            return Err(PipelineError::config("compiler must not be empty"));
        }
        Ok(())
    }

    /// Pool size: configured value or one worker per CPU.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn benchmark_options(&self) -> BenchmarkOptions {
        BenchmarkOptions {
            artifact_dir: self.artifact_dir.clone(),
            run_timeout: self.run_timeout(),
        }
    }
}
