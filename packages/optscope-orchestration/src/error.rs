use optscope_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Cannot initialize result table: {0}")]
    TableInit(#[source] StorageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cannot create artifact directory {path}: {source}")]
    ArtifactDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot list input directory {path}: {source}")]
    InputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Task panicked while processing {filename}: {message}")]
    TaskPanicked { filename: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn worker_pool<E: std::fmt::Display>(e: E) -> Self {
        Self::WorkerPool(e.to_string())
    }

    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Self::Config(e.to_string())
    }

    /// Whether this error ends the whole run rather than one file.
    pub fn severity(&self) -> Severity {
        match self {
            PipelineError::TaskPanicked { .. } => Severity::PerFile,
            // A failed append only loses that file's row
            PipelineError::Storage(_) => Severity::PerFile,
            _ => Severity::Fatal,
        }
    }
}

/// Scope of an error's impact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Abort the run (bad config, unwritable table, unreadable input directory)
    Fatal,
    /// Only the current file is affected; other tasks keep running
    PerFile,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::PerFile => "per_file",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
