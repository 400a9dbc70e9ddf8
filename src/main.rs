// SPDX-License-Identifier: Apache-2.0

//! AIGER -> technology-mapped Verilog netlist, improved by simulated annealing.

use aigmap::config::{ConfigOverrides, MapConfig};
use aigmap::mapping::{Objective, OverlapPolicy};
use aigmap::process_aig_path::process_aig_path;
use aigmap::transitions::TransitionKind;
use aigmap_anneal::{Schedule, TransitionOrder};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Input AIGER file (.aag or .aig).
    aig: PathBuf,

    /// Cell library JSON.
    library: PathBuf,

    /// Output netlist; rewritten every time the best cost improves.
    output: PathBuf,

    /// JSON configuration file; command line flags take precedence.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Random seed.
    #[clap(short = 'S', long)]
    seed: Option<u64>,

    /// Iterations per run, for every stage.
    #[clap(short = 'n', long)]
    iterations: Option<u64>,

    #[clap(long)]
    runs: Option<u32>,

    /// Initial temperature, for every stage.
    #[clap(long)]
    initial_temperature: Option<f64>,

    #[clap(long, value_enum)]
    schedule: Option<Schedule>,

    #[clap(long, value_enum)]
    order: Option<TransitionOrder>,

    /// Run a single stage with these transitions.
    #[clap(long, value_enum, value_delimiter = ',', num_args = 1..)]
    transitions: Option<Vec<TransitionKind>>,

    #[clap(long, value_enum)]
    objective: Option<Objective>,

    #[clap(long, value_enum)]
    overlap: Option<OverlapPolicy>,

    /// Drop candidates whose type has no library cell.
    #[clap(long)]
    #[arg(action = clap::ArgAction::Set)]
    prune_unmappable: Option<bool>,

    /// Audit the mapping state after every step.
    #[clap(long)]
    paranoid: bool,

    /// Progress line every N steps (0 disables).
    #[clap(long)]
    progress_interval: Option<u64>,

    /// Append progress records to this JSONL file.
    #[clap(long)]
    progress_path: Option<PathBuf>,

    /// Also write the final mapping in ABC pin order.
    #[clap(long)]
    abc_output: Option<PathBuf>,

    /// Write a JSON run summary here.
    #[clap(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    };
    config.apply_overrides(ConfigOverrides {
        seed: args.seed,
        iterations: args.iterations,
        runs: args.runs,
        initial_temperature: args.initial_temperature,
        schedule: args.schedule,
        order: args.order,
        transitions: args.transitions,
        objective: args.objective,
        overlap: args.overlap,
        prune_unmappable: args.prune_unmappable,
        paranoid: args.paranoid.then_some(true),
        progress_interval: args.progress_interval,
        progress_path: args.progress_path,
        abc_output: args.abc_output,
    })?;
    log::debug!("configuration: {:?}", config);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
        eprintln!("\nCtrl+C received, stopping after the current step...");
    })
    .context("failed to install the Ctrl-C handler")?;

    let summary = process_aig_path(
        &args.aig,
        &args.library,
        &args.output,
        &config,
        Some(running.clone()),
    )?;
    if !running.load(Ordering::SeqCst) {
        println!("Annealing was interrupted.");
    }
    println!(
        "candidates={} initial={:.6} best={:.6}",
        summary.candidates, summary.initial_metric, summary.best_metric
    );
    if let Some(path) = &args.summary {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}
