//! GridSweep - automated parameter sweeps for UI-only targets
//!
//! The `gridsweep` command drives sweep experiments end to end:
//!
//! ## Commands
//!
//! - `infer`: turn captured observations into typed parameter domains
//! - `plan`: show the Cartesian expansion of a parameter file
//! - `run`: execute a batch window against the built-in simulated panel
//!
//! Parameter and capture files are plain JSON arrays; results land in a
//! CSV whose columns follow the union of every measured field.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use gridsweep_batch::{init_tracing, BatchController, BatchWindow, SimulatedPanel};
use gridsweep_core::{
    combination_count, expand, to_csv, CapturedInput, ParamSet, PlanDigest, ResultTable,
};

#[derive(Parser)]
#[command(name = "gridsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Automated parameter sweeps for UI-only targets", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer parameter domains from captured observations
    Infer {
        /// Path to captured observations (JSON array)
        #[arg(short, long)]
        captures: PathBuf,

        /// Output path for the parameter file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the expansion plan for a parameter file
    Plan {
        /// Path to the parameter file (JSON array)
        #[arg(short, long)]
        params: PathBuf,

        /// List at most this many combinations
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },

    /// Execute a batch window against the simulated panel
    Run {
        /// Path to the parameter file (JSON array)
        #[arg(short, long)]
        params: PathBuf,

        /// First combination index to execute
        #[arg(long, default_value = "0")]
        start_index: usize,

        /// Maximum combinations to execute in this run
        #[arg(long, default_value = "200")]
        max_runs: usize,

        /// Per-step deadline in seconds (no deadline if omitted)
        #[arg(long)]
        step_timeout_secs: Option<u64>,

        /// Simulated measurement settle time per step, in milliseconds
        #[arg(long, default_value = "0")]
        latency_ms: u64,

        /// Output path for the results CSV
        #[arg(short, long, default_value = "results.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Infer { captures, out } => cmd_infer(&captures, out.as_deref()),
        Commands::Plan { params, limit } => cmd_plan(&params, limit),
        Commands::Run {
            params,
            start_index,
            max_runs,
            step_timeout_secs,
            latency_ms,
            out,
        } => {
            cmd_run(
                &params,
                start_index,
                max_runs,
                step_timeout_secs,
                latency_ms,
                &out,
            )
            .await
        }
    }
}

fn load_params(path: &Path) -> Result<ParamSet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read parameter file {}", path.display()))?;
    let set: ParamSet = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse parameter file {}", path.display()))?;
    set.validate()
        .with_context(|| format!("invalid parameter file {}", path.display()))?;
    Ok(set)
}

fn cmd_infer(captures: &Path, out: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(captures)
        .with_context(|| format!("failed to read capture file {}", captures.display()))?;
    let inputs: Vec<CapturedInput> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse capture file {}", captures.display()))?;

    let mut set = ParamSet::new();
    for input in inputs {
        let domain = input.into_domain();
        let label = domain.label.clone();
        if !set.insert(domain) {
            warn!(label = %label, "skipping duplicate capture");
        }
    }
    info!(parameters = set.len(), "inferred parameter domains");

    let rendered = serde_json::to_string_pretty(&set)?;
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {} parameter(s) to {}", set.len(), path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn cmd_plan(params: &Path, limit: usize) -> Result<()> {
    let set = load_params(params)?;
    let combos = expand(set.params());
    let digest = PlanDigest::of(&combos)?;

    println!("parameters:   {}", set.len());
    println!("combinations: {}", combos.len());
    println!("plan digest:  {digest}");

    for (i, combo) in combos.iter().take(limit).enumerate() {
        println!("  [{i}] {}", serde_json::to_string(combo)?);
    }
    if limit > 0 && combos.len() > limit {
        println!("  ... {} more", combos.len() - limit);
    }
    Ok(())
}

async fn cmd_run(
    params: &Path,
    start_index: usize,
    max_runs: usize,
    step_timeout_secs: Option<u64>,
    latency_ms: u64,
    out: &Path,
) -> Result<()> {
    let set = load_params(params)?;
    info!(
        parameters = set.len(),
        combinations = combination_count(set.params()),
        "expanding parameter grid"
    );
    let combos = expand(set.params());

    let driver = Arc::new(SimulatedPanel::with_latency(Duration::from_millis(
        latency_ms,
    )));
    let mut controller = BatchController::new(driver);
    if let Some(secs) = step_timeout_secs {
        controller = controller.with_step_timeout(Duration::from_secs(secs));
    }
    controller
        .handle()
        .set_window(BatchWindow::new(start_index, max_runs));

    let mut table = ResultTable::new();
    let report = controller.run(&combos, &mut table).await?;

    std::fs::write(out, to_csv(&table))
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!("run:       {}", report.run_id);
    println!("plan:      {}", report.plan_digest);
    println!("executed:  {}", report.executed);
    println!("failed:    {}", report.failed_count());
    println!("completed: {}", report.completed);
    println!("duration:  {} ms", report.duration_ms);
    println!("results:   {}", out.display());
    for failure in &report.failures {
        println!("  step {} failed: {}", failure.index, failure.error);
    }
    Ok(())
}
