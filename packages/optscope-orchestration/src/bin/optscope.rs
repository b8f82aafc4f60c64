//! Optscope dataset builder CLI
//!
//! # Usage
//!
//! ```bash
//! # Defaults: random_c_programs/ -> features.csv, one worker per CPU
//! cargo run --bin optscope --release
//!
//! # YAML config with CLI overrides
//! cargo run --bin optscope --release -- --config optscope.yaml --workers 4 --timeout 10
//!
//! # Show the effective configuration
//! cargo run --bin optscope -- --print-config
//! ```

use anyhow::Context;
use clap::Parser;
use optscope_orchestration::{Orchestrator, PipelineConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "optscope=info,optscope_orchestration=info,optscope_analysis=info,optscope_storage=info";
const VERBOSE_FILTER: &str =
    "optscope=debug,optscope_orchestration=debug,optscope_analysis=debug,optscope_storage=debug";

#[derive(Parser)]
#[command(name = "optscope")]
#[command(about = "Build a static-feature / optimization-level runtime dataset from C programs", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of source files
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Result table (CSV)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Compiler program
    #[arg(long)]
    compiler: Option<PathBuf>,

    /// Worker pool size
    #[arg(short, long)]
    workers: Option<usize>,

    /// Kill benchmarked binaries after this many seconds (0 = never)
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory for compiled binaries
    #[arg(long)]
    artifact_dir: Option<PathBuf>,

    /// Recognized source extension (without the dot)
    #[arg(long)]
    extension: Option<String>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_yaml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(dir) = self.input_dir {
            config.input_dir = dir;
        }
        if let Some(output) = self.output {
            config.output_csv = output;
        }
        if let Some(compiler) = self.compiler {
            config.compiler = compiler;
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if let Some(timeout) = self.timeout {
            config.run_timeout_secs = Some(timeout);
        }
        if let Some(dir) = self.artifact_dir {
            config.artifact_dir = Some(dir);
        }
        if let Some(ext) = self.extension {
            config.source_extension = ext;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let print_config = cli.print_config;
    let config = cli.into_config()?;

    if print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let summary = Orchestrator::with_clang(config)
        .run()
        .context("feature extraction aborted")?;

    println!();
    println!(
        "Done: {}/{} rows written in {:?}",
        summary.rows_written, summary.total, summary.duration
    );
    if !summary.is_success() {
        println!("Failed ({}):", summary.failed.len());
        for (filename, reason) in &summary.failed {
            println!("  - {}: {}", filename, reason);
        }
    }

    Ok(())
}
