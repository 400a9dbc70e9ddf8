// SPDX-License-Identifier: Apache-2.0

//! End-to-end mapping flow used by the `aigmap` binary.

use crate::aig_serdes::load_aiger_auto::load_aiger_auto_from_path;
use crate::config::MapConfig;
use crate::emit_netlist::{write_netlist, NetlistStyle};
use crate::library::load_library_from_path;
use crate::mapping::{generate_candidates, prune_unmappable, Cost, TechMapper};
use crate::timing::{ScopedTimer, TimingReport};
use crate::transitions::build_transitions;
use aigmap_anneal::{AnnealReport, Annealer};
use anyhow::{anyhow, Context, Result};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub name: String,
    pub initial_cost: f64,
    pub best_cost: f64,
    pub final_cost: f64,
    pub iterations_run: u64,
    pub accepted: u64,
    pub cancelled: bool,
}

impl StageSummary {
    fn new(name: &str, r: &AnnealReport) -> Self {
        StageSummary {
            name: name.to_string(),
            initial_cost: r.initial_cost,
            best_cost: r.best_cost,
            final_cost: r.final_cost,
            iterations_run: r.iterations_run,
            accepted: r.stats.accepted_overall,
            cancelled: r.cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MapSummary {
    pub candidates: usize,
    pub initial: Cost,
    pub initial_metric: f64,
    /// Objective value of the netlist left in the output file.
    pub best_metric: f64,
    /// Ledger of the in-memory state after the last stage.
    pub last: Cost,
    pub stages: Vec<StageSummary>,
}

/// Loads `aig_path` and `library_path`, maps, anneals and writes the best
/// mapping seen to `output_path`.
pub fn process_aig_path(
    aig_path: &Path,
    library_path: &Path,
    output_path: &Path,
    config: &MapConfig,
    running: Option<Arc<AtomicBool>>,
) -> Result<MapSummary> {
    let mut timing = TimingReport::default();

    let t = ScopedTimer::start("load:aig");
    let graph = load_aiger_auto_from_path(aig_path).map_err(|e| anyhow!(e))?;
    t.finish(&mut timing);
    log::info!(
        "loaded '{}': {} input(s), {} output(s), {} AND gate(s)",
        graph.name(),
        graph.num_inputs(),
        graph.outputs().len(),
        graph.num_and_gates()
    );

    let t = ScopedTimer::start("load:library");
    let library = load_library_from_path(library_path).map_err(|e| anyhow!(e))?;
    t.finish(&mut timing);
    log::info!("loaded {} cell(s)", library.len());

    let t = ScopedTimer::start("candidates");
    let mut candidates = generate_candidates(&graph);
    if config.prune_unmappable {
        candidates = prune_unmappable(candidates, &library);
    }
    t.finish(&mut timing);
    let num_candidates = candidates.len();

    let mut rng = Pcg64Mcg::seed_from_u64(config.seed);
    let t = ScopedTimer::start("initialize");
    let mut mapper = TechMapper::initialize(
        Arc::new(graph),
        Arc::new(library),
        candidates,
        config.overlap,
        &mut rng,
    )
    .context("building the initial mapping")?;
    t.finish(&mut timing);

    let objective = config.objective;
    let initial = mapper.cost();
    let initial_metric = objective.metric(&initial);
    let mut best_metric = initial_metric;
    let t = ScopedTimer::start("write");
    write_netlist(&mapper, NetlistStyle::Named, output_path)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    t.finish(&mut timing);

    let mut stages = Vec::with_capacity(config.stages.len());
    for stage in &config.stages {
        let mut annealer = Annealer::new(
            stage.anneal_options(&config.anneal),
            build_transitions::<Pcg64Mcg>(&stage.transitions),
        );
        if let Some(r) = &running {
            annealer = annealer.with_running_flag(r.clone());
        }
        if config.paranoid {
            annealer = annealer.with_checker(Box::new(|m: &TechMapper| m.audit()));
        }
        log::info!("stage '{}'", stage.name);

        let t = ScopedTimer::start("anneal");
        let report = annealer.run(
            &mut mapper,
            &mut rng,
            |m| objective.metric(&m.cost()),
            |m, metric| {
                // A stage starts from the previous stage's last state, which
                // may be worse than the best already written.
                if metric < best_metric {
                    best_metric = metric;
                    let t = ScopedTimer::start("write");
                    write_netlist(m, NetlistStyle::Named, output_path)
                        .with_context(|| format!("failed to write {}", output_path.display()))?;
                    t.finish(&mut timing);
                }
                Ok(())
            },
        )?;
        t.finish(&mut timing);

        log::info!(
            "stage '{}': best={} final={} accepted: {}",
            stage.name,
            report.best_cost,
            report.final_cost,
            report.stats.accepted_summary()
        );
        let cancelled = report.cancelled;
        stages.push(StageSummary::new(&stage.name, &report));
        if cancelled {
            break;
        }
    }

    if let Some(abc) = &config.abc_output {
        write_netlist(&mapper, NetlistStyle::Abc, abc)
            .with_context(|| format!("failed to write {}", abc.display()))?;
    }

    let last = mapper.cost();
    log::info!("initial {} (objective {})", initial, initial_metric);
    log::info!("last    {} (objective {})", last, objective.metric(&last));
    log::info!("best objective written: {}", best_metric);
    timing.log_summary();

    Ok(MapSummary {
        candidates: num_candidates,
        initial,
        initial_metric,
        best_metric,
        last,
        stages,
    })
}
