//! Dataset domain model
//!
//! One [`BenchmarkResult`] per source file, built once and never mutated.

use crate::flags::OptFlag;
use std::fmt;
use std::time::Duration;

/// Tallies of the four control-flow node kinds in a translation unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlFlowCounts {
    pub for_loops: usize,
    pub while_loops: usize,
    pub if_statements: usize,
    pub switch_statements: usize,
}

/// Outcome of the AST pass.
///
/// `Failed` is kept separate from a genuine zero count so callers can tell
/// "no loops" from "could not look".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticAnalysis {
    Counted(ControlFlowCounts),
    Failed(String),
}

impl StaticAnalysis {
    pub fn is_failed(&self) -> bool {
        matches!(self, StaticAnalysis::Failed(_))
    }
}

/// Static (compile-free) features of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFeatures {
    /// Non-blank lines
    pub lines_of_code: usize,
    pub analysis: StaticAnalysis,
}

impl StaticFeatures {
    /// Counts as recorded in the result table: a failed analysis reads as all zeros.
    pub fn counts(&self) -> ControlFlowCounts {
        match &self.analysis {
            StaticAnalysis::Counted(counts) => *counts,
            StaticAnalysis::Failed(_) => ControlFlowCounts::default(),
        }
    }
}

/// Execution measurement for one optimization flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Binary ran to a zero exit status in this wall-clock time
    Completed(Duration),
    /// Compilation exited non-zero; the binary was never run
    CompileFailed,
    /// Binary was killed after exceeding the run timeout
    TimedOut,
    /// Binary exited non-zero, was killed by a signal, or could not be launched
    ExitFailure(Option<i32>),
}

impl Measurement {
    /// Duration usable for best-flag selection.
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Measurement::Completed(elapsed) => Some(elapsed.as_secs_f64()),
            _ => None,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Completed(elapsed) => write!(f, "{}", elapsed.as_secs_f64()),
            Measurement::CompileFailed => write!(f, "N/A"),
            Measurement::TimedOut => write!(f, "TIMEOUT"),
            Measurement::ExitFailure(_) => write!(f, "FAILED"),
        }
    }
}

/// One measurement per flag, indexed in [`OptFlag::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagMeasurements([Measurement; 5]);

impl FlagMeasurements {
    pub fn new(measurements: [Measurement; 5]) -> Self {
        Self(measurements)
    }

    /// Every flag marked as a compile failure.
    pub fn all_compile_failed() -> Self {
        Self([Measurement::CompileFailed; 5])
    }

    pub fn get(&self, flag: OptFlag) -> Measurement {
        self.0[flag.index()]
    }

    pub fn set(&mut self, flag: OptFlag, measurement: Measurement) {
        self.0[flag.index()] = measurement;
    }

    /// `(flag, measurement)` pairs in fixed flag order.
    pub fn iter(&self) -> impl Iterator<Item = (OptFlag, Measurement)> + '_ {
        OptFlag::ALL.into_iter().zip(self.0.iter().copied())
    }
}

impl Default for FlagMeasurements {
    fn default() -> Self {
        Self::all_compile_failed()
    }
}

/// One dataset row.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    pub filename: String,
    pub features: StaticFeatures,
    pub measurements: FlagMeasurements,
    pub best_flag: Option<OptFlag>,
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.features.counts();
        write!(
            f,
            "{{Filename: {}, LOC: {}, ForLoops: {}, WhileLoops: {}, IfStatements: {}, SwitchStatements: {}",
            self.filename,
            self.features.lines_of_code,
            counts.for_loops,
            counts.while_loops,
            counts.if_statements,
            counts.switch_statements
        )?;
        for (flag, measurement) in self.measurements.iter() {
            write!(f, ", {}: {}", flag.column_name(), measurement)?;
        }
        match self.best_flag {
            Some(flag) => write!(f, ", BestFlag: {}}}", flag),
            None => write!(f, ", BestFlag: none}}"),
        }
    }
}
