//! Static Analyzer
//!
//! LOC from the raw text, control-flow tallies from the clang JSON AST.
//! AST failures never propagate: they come back as [`StaticAnalysis::Failed`].

use crate::model::{ControlFlowCounts, StaticAnalysis, StaticFeatures};
use crate::toolchain::Toolchain;
use serde_json::Value;
use std::path::Path;
use tracing::warn;

const FOR_STMT: &str = "ForStmt";
const WHILE_STMT: &str = "WhileStmt";
const IF_STMT: &str = "IfStmt";
const SWITCH_STMT: &str = "SwitchStmt";

/// Count lines that contain anything other than whitespace.
pub fn count_lines_of_code(text: &str) -> usize {
    text.lines().filter(|line| !line.trim().is_empty()).count()
}

/// Tally `ForStmt` / `WhileStmt` / `IfStmt` / `SwitchStmt` nodes anywhere in the tree.
///
/// Walks with an explicit stack; system headers make the dump large and deep.
pub fn count_control_flow(ast: &Value) -> ControlFlowCounts {
    let mut counts = ControlFlowCounts::default();
    let mut stack = vec![ast];

    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                match map.get("kind").and_then(Value::as_str) {
                    Some(FOR_STMT) => counts.for_loops += 1,
                    Some(WHILE_STMT) => counts.while_loops += 1,
                    Some(IF_STMT) => counts.if_statements += 1,
                    Some(SWITCH_STMT) => counts.switch_statements += 1,
                    _ => {}
                }
                stack.extend(map.values());
            }
            Value::Array(items) => stack.extend(items.iter()),
            _ => {}
        }
    }

    counts
}

/// Static feature extraction for one source file
pub struct StaticAnalyzer<'a> {
    toolchain: &'a dyn Toolchain,
}

impl<'a> StaticAnalyzer<'a> {
    pub fn new(toolchain: &'a dyn Toolchain) -> Self {
        Self { toolchain }
    }

    pub fn analyze(&self, path: &Path) -> StaticFeatures {
        let lines_of_code = match std::fs::read(path) {
            Ok(bytes) => count_lines_of_code(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                0
            }
        };

        let analysis = self.control_flow(path);
        if let StaticAnalysis::Failed(reason) = &analysis {
            warn!(
                "AST analysis failed for {} (recorded as zero counts): {}",
                path.display(),
                reason
            );
        }

        StaticFeatures {
            lines_of_code,
            analysis,
        }
    }

    fn control_flow(&self, path: &Path) -> StaticAnalysis {
        let dump = match self.toolchain.dump_ast(path) {
            Ok(dump) => dump,
            Err(e) => return StaticAnalysis::Failed(e.to_string()),
        };

        match serde_json::from_slice::<Value>(&dump) {
            Ok(ast) => StaticAnalysis::Counted(count_control_flow(&ast)),
            Err(e) => StaticAnalysis::Failed(format!("Malformed AST dump: {}", e)),
        }
    }
}
