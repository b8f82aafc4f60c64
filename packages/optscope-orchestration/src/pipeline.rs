use crate::config::PipelineConfig;
use crate::discovery::has_source_extension;
use crate::error::Result;
use optscope_analysis::{
    BenchmarkOptions, BenchmarkResult, ClangToolchain, ExecutionBenchmarker, StaticAnalyzer,
    Toolchain,
};
use optscope_storage::ResultTable;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Per-run state handed to every task.
///
/// Everything a task touches comes through here; tasks share nothing else.
#[derive(Clone)]
pub struct RunContext {
    pub config: PipelineConfig,
    pub toolchain: Arc<dyn Toolchain>,
    pub table: Arc<ResultTable>,
    benchmark_options: BenchmarkOptions,
}

impl RunContext {
    pub fn new(
        config: PipelineConfig,
        toolchain: Arc<dyn Toolchain>,
        table: Arc<ResultTable>,
    ) -> Self {
        let benchmark_options = config.benchmark_options();
        Self {
            config,
            toolchain,
            table,
            benchmark_options,
        }
    }

    /// Context backed by the configured clang.
    pub fn with_clang(config: PipelineConfig, table: Arc<ResultTable>) -> Self {
        let toolchain = Arc::new(ClangToolchain::new(config.compiler.clone()));
        Self::new(config, toolchain, table)
    }
}

/// File Task Processor: features + benchmark for one file, appended to the table.
///
/// Returns `Ok(None)` for names without the source extension. Analysis and
/// benchmarking failures are folded into the result; only a failed append is
/// an error.
pub fn process_file(ctx: &RunContext, filename: &str) -> Result<Option<BenchmarkResult>> {
    if !has_source_extension(filename, &ctx.config.source_extension) {
        debug!("Skipping {}", filename);
        return Ok(None);
    }

    let start = Instant::now();
    let source = ctx.config.input_dir.join(filename);
    let toolchain = ctx.toolchain.as_ref();

    let features = StaticAnalyzer::new(toolchain).analyze(&source);
    let (measurements, best_flag) =
        ExecutionBenchmarker::new(toolchain, &ctx.benchmark_options).benchmark(&source);

    let result = BenchmarkResult {
        filename: filename.to_string(),
        features,
        measurements,
        best_flag,
    };

    ctx.table.append(&result)?;

    debug!(
        "{} done in {:?} (best: {:?})",
        filename,
        start.elapsed(),
        result.best_flag
    );
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use optscope_storage::read_rows;

    #[test]
    fn test_non_source_file_is_skipped_without_row() {
        let dir = tempfile::tempdir().unwrap();
        let table = Arc::new(ResultTable::initialize(dir.path().join("features.csv")).unwrap());
        let config = PipelineConfig {
            input_dir: dir.path().to_path_buf(),
            compiler: "/nonexistent/clang".into(),
            ..Default::default()
        };
        let ctx = RunContext::with_clang(config, table.clone());

        assert!(process_file(&ctx, "README.md").unwrap().is_none());
        assert!(read_rows(table.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_compiler_still_produces_row() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("program_1.c"),
            "int main() {\n\n  return 0;\n}\n",
        )
        .unwrap();
        let table = Arc::new(ResultTable::initialize(dir.path().join("features.csv")).unwrap());
        let config = PipelineConfig {
            input_dir: dir.path().to_path_buf(),
            compiler: "/nonexistent/clang".into(),
            ..Default::default()
        };
        let ctx = RunContext::with_clang(config, table.clone());

        let result = process_file(&ctx, "program_1.c").unwrap().unwrap();
        assert_eq!(result.features.lines_of_code, 3);
        assert!(result.features.analysis.is_failed());
        assert_eq!(result.best_flag, None);

        let rows = read_rows(table.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            &rows[0][..],
            &["program_1.c", "3", "0", "0", "0", "0", "N/A", "N/A", "N/A", "N/A", "N/A", ""]
        );
    }
}
