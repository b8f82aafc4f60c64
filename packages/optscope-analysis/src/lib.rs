/*
 * Optscope Analysis - per-file feature extraction
 *
 * Derives the two halves of one dataset row for a C source file:
 * - Static features (LOC + control-flow node tallies from the clang JSON AST)
 * - Runtime features (wall-clock time of the binary under each optimization level)
 *
 * Architecture:
 * - Domain model (flags, measurements, result record)
 * - Toolchain port (external compiler behind a trait, clang adapter)
 * - Static Analyzer
 * - Execution Benchmarker
 */

pub mod benchmarker;
pub mod flags;
pub mod model;
pub mod static_analyzer;
pub mod toolchain;

pub use benchmarker::{artifact_path, select_best_flag, BenchmarkOptions, ExecutionBenchmarker};
pub use flags::{OptFlag, ParseFlagError};
pub use model::{
    BenchmarkResult, ControlFlowCounts, FlagMeasurements, Measurement, StaticAnalysis,
    StaticFeatures,
};
pub use static_analyzer::{count_control_flow, count_lines_of_code, StaticAnalyzer};
pub use toolchain::{ClangToolchain, RunOutcome, RunStatus, Toolchain, ToolchainError};
