/*
 * Optscope Orchestration - parallel dataset builder
 *
 * Turns a directory of C programs into a table correlating static
 * structure with runtime under -O0/-O1/-O2/-O3/-Ofast.
 *
 * Architecture:
 * - Discovery (numeric filename order)
 * - Per-run context (config + toolchain + result table, no globals)
 * - File Task Processor (one file -> one durable row)
 * - Orchestrator (fixed-size worker pool, completion-order progress)
 */

pub mod config;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod pipeline;

pub use config::PipelineConfig;
pub use discovery::{compare_filenames, discover_sources, has_source_extension, numeric_key};
pub use error::{PipelineError, Result, Severity};
pub use orchestrator::{Orchestrator, RunSummary};
pub use pipeline::{process_file, RunContext};
