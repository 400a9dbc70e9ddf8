// SPDX-License-Identifier: Apache-2.0

//! Single-chain simulated annealing over a mutable search state.
//!
//! The state is edited in place by [`Transition`]s. A transition must be able
//! to exactly undo its most recent forward application, so a rejected move is
//! rolled back instead of cloning the state before every proposal.

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum allowed relative temperature (as a ratio of the initial
/// temperature) to avoid underflow and numeric issues during cooling.
pub const MIN_TEMPERATURE_RATIO: f64 = 0.00001;

/// Cooling factor applied every `GEOMETRIC_STEP` iterations by
/// [`Schedule::Geometric`].
const GEOMETRIC_FACTOR: f64 = 0.95;
const GEOMETRIC_STEP: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

/// Result of applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// Nothing was modified (e.g. no candidate was bindable); the engine skips
    /// evaluation and never asks for an undo.
    Unchanged,
}

/// A reversible edit of the search state.
///
/// `apply(state, Direction::Backward, ..)` is only ever called directly after
/// a forward application that returned [`Applied::Changed`], and must restore
/// the state that existed before it.
pub trait Transition<S, R: RngCore> {
    fn name(&self) -> &str;

    fn apply(&mut self, state: &mut S, direction: Direction, rng: &mut R) -> Result<Applied>;
}

/// Temperature as a function of the iteration index within a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Schedule {
    /// `t0 * max(1 - i/n, MIN_TEMPERATURE_RATIO)`.
    Linear,
    /// `t0 * 0.2 / (i / 10)` with integer division; `t0` for the first ten
    /// iterations.
    #[default]
    Hyperbolic,
    /// `t0 * 0.95^(i / 100)`, floored at `t0 * MIN_TEMPERATURE_RATIO`.
    Geometric,
}

impl Schedule {
    pub fn temperature(self, initial: f64, iteration: u64, total: u64) -> f64 {
        match self {
            Schedule::Linear => {
                let progress = if total == 0 {
                    0.0
                } else {
                    iteration as f64 / total as f64
                };
                initial * (1.0 - progress).max(MIN_TEMPERATURE_RATIO)
            }
            Schedule::Hyperbolic => {
                let steps = iteration / 10;
                if steps == 0 {
                    initial
                } else {
                    initial * 0.2 / steps as f64
                }
            }
            Schedule::Geometric => {
                let factor = GEOMETRIC_FACTOR.powf((iteration / GEOMETRIC_STEP) as f64);
                initial * factor.max(MIN_TEMPERATURE_RATIO)
            }
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Schedule::Linear => "linear",
            Schedule::Hyperbolic => "hyperbolic",
            Schedule::Geometric => "geometric",
        };
        write!(f, "{}", name)
    }
}

/// How the next transition is picked from the configured list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionOrder {
    /// `transitions[iteration % len]`; restarts at the first transition
    /// every run.
    #[default]
    Cyclic,
    /// Uniformly random index drawn from the search RNG.
    Random,
}

/// Engine-level options for an annealing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealOptions {
    pub initial_temperature: f64,
    /// Iterations per run; the schedule restarts at every run.
    pub iterations: u64,
    pub runs: u32,
    pub schedule: Schedule,
    pub order: TransitionOrder,
    /// Emit a progress line every this many steps (0 disables).
    pub progress_interval: u64,
    /// Optional JSONL file that receives one record per progress line.
    pub progress_path: Option<PathBuf>,
}

impl Default for AnnealOptions {
    fn default() -> Self {
        AnnealOptions {
            initial_temperature: 1.0,
            iterations: 10_000,
            runs: 1,
            schedule: Schedule::default(),
            order: TransitionOrder::default(),
            progress_interval: 1000,
            progress_path: None,
        }
    }
}

/// Where the engine is within the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnealPhase {
    Idle,
    Proposing,
    Evaluating,
    Accepted,
    Rejected,
    Done,
}

impl fmt::Display for AnnealPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Details of what occurred during a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    Unchanged,
    MetropolisReject,
    Accepted { improving: bool },
}

/// Holds annealing step statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnealStats {
    pub proposed: u64,
    pub unchanged: u64,
    pub accepted_overall: u64,
    pub accepted_improving: u64,
    pub rejected_metro: u64,
    pub best_updates: u64,
    pub accepted_by_transition: BTreeMap<String, u64>,
}

impl AnnealStats {
    pub fn update_for_iteration(&mut self, transition: &str, outcome: IterationOutcome) {
        self.proposed += 1;
        match outcome {
            IterationOutcome::Unchanged => self.unchanged += 1,
            IterationOutcome::MetropolisReject => self.rejected_metro += 1,
            IterationOutcome::Accepted { improving } => {
                self.accepted_overall += 1;
                if improving {
                    self.accepted_improving += 1;
                }
                *self
                    .accepted_by_transition
                    .entry(transition.to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    /// Merges `other` into `self` (useful when a session is split into
    /// several calls).
    pub fn merge_from(&mut self, other: AnnealStats) {
        self.proposed += other.proposed;
        self.unchanged += other.unchanged;
        self.accepted_overall += other.accepted_overall;
        self.accepted_improving += other.accepted_improving;
        self.rejected_metro += other.rejected_metro;
        self.best_updates += other.best_updates;
        for (k, v) in other.accepted_by_transition {
            *self.accepted_by_transition.entry(k).or_insert(0) += v;
        }
    }

    pub fn accepted_summary(&self) -> String {
        if self.accepted_by_transition.is_empty() {
            return "-".to_string();
        }
        self.accepted_by_transition
            .iter()
            .map(|(name, count)| format!("{}:{}", name, count))
            .collect::<Vec<String>>()
            .join(", ")
    }
}

/// Summary returned once the engine reaches [`AnnealPhase::Done`].
///
/// The state handed to [`Annealer::run`] is left as the last step left it;
/// the best state is only observable through the improvement callback.
#[derive(Debug, Clone)]
pub struct AnnealReport {
    pub initial_cost: f64,
    pub best_cost: f64,
    pub final_cost: f64,
    pub iterations_run: u64,
    pub cancelled: bool,
    pub elapsed: Duration,
    pub stats: AnnealStats,
}

/// Decide whether to accept a candidate move under the Metropolis rule.
///
/// `current_metric` and `new_metric` are scalar objective values (lower is
/// better). A move that does not worsen the metric is always accepted.
/// Otherwise it is accepted with probability `exp((current - new) / temp)`;
/// a non-positive temperature rejects every worsening move.
pub fn metropolis_accept<R: RngCore + ?Sized>(
    current_metric: f64,
    new_metric: f64,
    temp: f64,
    rng: &mut R,
) -> bool {
    if new_metric <= current_metric {
        return true;
    }
    if temp <= 0.0 {
        return false;
    }

    let accept_prob = ((current_metric - new_metric) / temp).exp();
    let raw = rng.next_u64();

    // Top 53 bits scaled by 2^-53 gives a uniform value in [0, 1); dividing by
    // u64::MAX could yield exactly 1.0.
    let u01 = (raw >> 11) as f64 * 2.0_f64.powi(-53);
    u01 < accept_prob
}

type StateChecker<S> = Box<dyn Fn(&S) -> Result<(), String>>;

pub struct Annealer<S, R: RngCore> {
    options: AnnealOptions,
    transitions: Vec<Box<dyn Transition<S, R>>>,
    running: Option<Arc<AtomicBool>>,
    checker: Option<StateChecker<S>>,
    phase: AnnealPhase,
}

impl<S, R: RngCore> Annealer<S, R> {
    pub fn new(options: AnnealOptions, transitions: Vec<Box<dyn Transition<S, R>>>) -> Self {
        Annealer {
            options,
            transitions,
            running: None,
            checker: None,
            phase: AnnealPhase::Idle,
        }
    }

    /// The engine stops before the next proposal once `running` is false.
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    /// Runs `checker` after every step (accepted or rolled back) and aborts
    /// the session on the first failure.
    pub fn with_checker(mut self, checker: StateChecker<S>) -> Self {
        self.checker = Some(checker);
        self
    }

    pub fn options(&self) -> &AnnealOptions {
        &self.options
    }

    pub fn phase(&self) -> AnnealPhase {
        self.phase
    }

    pub fn transition_names(&self) -> Vec<String> {
        self.transitions
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map_or(true, |r| r.load(Ordering::SeqCst))
    }

    /// Runs `runs x iterations` steps over `state`.
    ///
    /// `estimate` maps the state to the scalar cost being minimized.
    /// `on_improvement` is invoked with the state and its cost every time an
    /// accepted move beats the best cost seen so far.
    pub fn run<E, P>(
        &mut self,
        state: &mut S,
        rng: &mut R,
        estimate: E,
        mut on_improvement: P,
    ) -> Result<AnnealReport>
    where
        E: Fn(&S) -> f64,
        P: FnMut(&S, f64) -> Result<()>,
    {
        let start_time = Instant::now();
        let initial_cost = estimate(state);
        let mut current_cost = initial_cost;
        let mut best_cost = initial_cost;
        let mut stats = AnnealStats::default();
        let mut step: u64 = 0;
        let mut cancelled = false;

        if self.transitions.is_empty() {
            log::warn!("no transitions configured; skipping annealing");
            self.phase = AnnealPhase::Done;
            return Ok(AnnealReport {
                initial_cost,
                best_cost,
                final_cost: current_cost,
                iterations_run: 0,
                cancelled,
                elapsed: start_time.elapsed(),
                stats,
            });
        }

        log::info!(
            "annealing: {} run(s) x {} iterations, t0={}, schedule={}, transitions=[{}]",
            self.options.runs,
            self.options.iterations,
            self.options.initial_temperature,
            self.options.schedule,
            self.transition_names().join(", ")
        );

        'runs: for run in 0..self.options.runs {
            for iteration in 0..self.options.iterations {
                if !self.is_running() {
                    log::info!("annealing cancelled at run {} iteration {}", run, iteration);
                    cancelled = true;
                    break 'runs;
                }
                let temperature = self.options.schedule.temperature(
                    self.options.initial_temperature,
                    iteration,
                    self.options.iterations,
                );

                let (index, outcome) = self.step(
                    state,
                    rng,
                    &estimate,
                    &mut current_cost,
                    temperature,
                    iteration,
                    step,
                )?;
                stats.update_for_iteration(self.transitions[index].name(), outcome);

                if matches!(outcome, IterationOutcome::Accepted { .. }) && current_cost < best_cost
                {
                    best_cost = current_cost;
                    stats.best_updates += 1;
                    log::debug!("new best cost {} at step {}", best_cost, step);
                    on_improvement(state, best_cost)?;
                }

                step += 1;
                self.phase = AnnealPhase::Idle;

                if self.options.progress_interval > 0 && step % self.options.progress_interval == 0
                {
                    self.report_progress(
                        run,
                        step,
                        current_cost,
                        best_cost,
                        temperature,
                        &stats,
                        start_time,
                    );
                }
            }
        }

        self.phase = AnnealPhase::Done;
        let report = AnnealReport {
            initial_cost,
            best_cost,
            final_cost: current_cost,
            iterations_run: step,
            cancelled,
            elapsed: start_time.elapsed(),
            stats,
        };
        log::info!(
            "annealing done: steps={} best={} final={} accepted={} rejected={} unchanged={}",
            report.iterations_run,
            report.best_cost,
            report.final_cost,
            report.stats.accepted_overall,
            report.stats.rejected_metro,
            report.stats.unchanged
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn step<E>(
        &mut self,
        state: &mut S,
        rng: &mut R,
        estimate: &E,
        current_cost: &mut f64,
        temperature: f64,
        iteration: u64,
        step: u64,
    ) -> Result<(usize, IterationOutcome)>
    where
        E: Fn(&S) -> f64,
    {
        self.phase = AnnealPhase::Proposing;
        let index = match self.options.order {
            TransitionOrder::Cyclic => (iteration % self.transitions.len() as u64) as usize,
            TransitionOrder::Random => rng.gen_range(0..self.transitions.len()),
        };
        let transition = &mut self.transitions[index];

        let outcome = match transition.apply(state, Direction::Forward, rng)? {
            Applied::Unchanged => {
                log::trace!("step {}: {} made no change", step, transition.name());
                self.phase = AnnealPhase::Rejected;
                IterationOutcome::Unchanged
            }
            Applied::Changed => {
                self.phase = AnnealPhase::Evaluating;
                let new_cost = estimate(state);
                if metropolis_accept(*current_cost, new_cost, temperature, rng) {
                    log::trace!(
                        "step {}: {} accepted {} -> {} (t={:.3e})",
                        step,
                        transition.name(),
                        current_cost,
                        new_cost,
                        temperature
                    );
                    let improving = new_cost < *current_cost;
                    *current_cost = new_cost;
                    self.phase = AnnealPhase::Accepted;
                    IterationOutcome::Accepted { improving }
                } else {
                    log::trace!(
                        "step {}: {} rejected {} -> {} (t={:.3e})",
                        step,
                        transition.name(),
                        current_cost,
                        new_cost,
                        temperature
                    );
                    transition.apply(state, Direction::Backward, rng)?;
                    self.phase = AnnealPhase::Rejected;
                    IterationOutcome::MetropolisReject
                }
            }
        };

        if let Some(checker) = &self.checker {
            checker(state).map_err(|e| {
                anyhow!(
                    "state check failed after step {} ({}, {:?}): {}",
                    step,
                    self.transitions[index].name(),
                    outcome,
                    e
                )
            })?;
        }
        Ok((index, outcome))
    }

    #[allow(clippy::too_many_arguments)]
    fn report_progress(
        &self,
        run: u32,
        step: u64,
        current_cost: f64,
        best_cost: f64,
        temperature: f64,
        stats: &AnnealStats,
        start_time: Instant,
    ) {
        let elapsed_secs = start_time.elapsed().as_secs_f64();
        let proposed_per_sec = if elapsed_secs > 0.0 {
            step as f64 / elapsed_secs
        } else {
            0.0
        };
        log::info!(
            "[anneal] run: {} | step: {} | Best: {:.6} | Cur: {:.6} | Temp: {:.2e} | Steps/s: {:.2} | Rejected (M/U): {}/{} | Accepted: {} ({})",
            run,
            step,
            best_cost,
            current_cost,
            temperature,
            proposed_per_sec,
            stats.rejected_metro,
            stats.unchanged,
            stats.accepted_overall,
            stats.accepted_summary(),
        );

        if let Some(path) = &self.options.progress_path {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(mut f) => {
                    let entry = json!({
                        "run": run,
                        "step": step,
                        "current_cost": current_cost,
                        "best_cost": best_cost,
                        "temperature": temperature,
                        "accepted": stats.accepted_overall,
                        "rejected": stats.rejected_metro,
                        "unchanged": stats.unchanged,
                        "proposed_per_sec": proposed_per_sec,
                    });
                    let _ = writeln!(f, "{}", entry);
                }
                Err(e) => log::warn!("could not open {}: {}", path.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FixedU64Rng {
        v: u64,
    }

    impl RngCore for FixedU64Rng {
        fn next_u32(&mut self) -> u32 {
            (self.v >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.v
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for (i, b) in dest.iter_mut().enumerate() {
                *b = (self.v >> ((i % 8) * 8)) as u8;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    /// Moves a counter by `delta`; undo subtracts it again.
    struct Nudge {
        name: &'static str,
        delta: i64,
    }

    impl<R: RngCore> Transition<i64, R> for Nudge {
        fn name(&self) -> &str {
            self.name
        }

        fn apply(
            &mut self,
            state: &mut i64,
            direction: Direction,
            _rng: &mut R,
        ) -> Result<Applied> {
            match direction {
                Direction::Forward => *state += self.delta,
                Direction::Backward => *state -= self.delta,
            }
            Ok(Applied::Changed)
        }
    }

    struct Idle;

    impl<R: RngCore> Transition<i64, R> for Idle {
        fn name(&self) -> &str {
            "idle"
        }

        fn apply(&mut self, _: &mut i64, direction: Direction, _: &mut R) -> Result<Applied> {
            assert_eq!(direction, Direction::Forward, "unchanged moves are never undone");
            Ok(Applied::Unchanged)
        }
    }

    /// Records its index every time it is proposed.
    struct Recorder {
        index: usize,
        seen: Rc<RefCell<Vec<usize>>>,
    }

    impl<R: RngCore> Transition<i64, R> for Recorder {
        fn name(&self) -> &str {
            "record"
        }

        fn apply(&mut self, _: &mut i64, _: Direction, _: &mut R) -> Result<Applied> {
            self.seen.borrow_mut().push(self.index);
            Ok(Applied::Unchanged)
        }
    }

    fn nudges() -> Vec<Box<dyn Transition<i64, Pcg64Mcg>>> {
        vec![
            Box::new(Nudge {
                name: "inc",
                delta: 1,
            }),
            Box::new(Nudge {
                name: "dec",
                delta: -1,
            }),
        ]
    }

    #[test]
    fn cyclic_order_restarts_every_run() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let transitions: Vec<Box<dyn Transition<i64, Pcg64Mcg>>> = (0..2)
            .map(|index| -> Box<dyn Transition<i64, Pcg64Mcg>> {
                Box::new(Recorder {
                    index,
                    seen: seen.clone(),
                })
            })
            .collect();
        let options = AnnealOptions {
            iterations: 3,
            runs: 2,
            order: TransitionOrder::Cyclic,
            progress_interval: 0,
            ..AnnealOptions::default()
        };
        let mut annealer = Annealer::new(options, transitions);
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let mut state = 0;
        annealer
            .run(&mut state, &mut rng, |s| *s as f64, |_, _| Ok(()))
            .unwrap();
        assert_eq!(*seen.borrow(), vec![0, 1, 0, 0, 1, 0]);
    }

    #[test]
    fn u01_conversion_never_reaches_one() {
        let mut rng = FixedU64Rng { v: u64::MAX };
        let raw = rng.next_u64();
        let u01 = (raw >> 11) as f64 * 2.0_f64.powi(-53);
        assert!(u01 < 1.0, "u01 must be in [0,1), got {u01}");
    }

    #[test]
    fn metropolis_always_accepts_non_worsening_moves() {
        let mut rng = FixedU64Rng { v: u64::MAX };
        assert!(metropolis_accept(10.0, 9.0, 1.0, &mut rng));
        assert!(metropolis_accept(10.0, 10.0, 0.0, &mut rng));
    }

    #[test]
    fn metropolis_uses_boltzmann_probability() {
        // exp(-1) ~= 0.3679
        let mut low = FixedU64Rng { v: 0 };
        assert!(metropolis_accept(1.0, 2.0, 1.0, &mut low));
        let mut high = FixedU64Rng { v: u64::MAX / 2 };
        assert!(!metropolis_accept(1.0, 2.0, 1.0, &mut high));
        let mut zero = FixedU64Rng { v: 0 };
        assert!(!metropolis_accept(1.0, 2.0, 0.0, &mut zero));
    }

    #[test]
    fn schedules_cool_down() {
        assert_eq!(Schedule::Hyperbolic.temperature(1.0, 9, 100), 1.0);
        assert_eq!(Schedule::Hyperbolic.temperature(1.0, 10, 100), 0.2);
        assert_eq!(Schedule::Hyperbolic.temperature(1.0, 40, 100), 0.05);
        assert_eq!(Schedule::Linear.temperature(2.0, 50, 100), 1.0);
        assert_eq!(
            Schedule::Linear.temperature(1.0, 100, 100),
            MIN_TEMPERATURE_RATIO
        );
        assert_eq!(Schedule::Geometric.temperature(1.0, 99, 1000), 1.0);
        assert!(Schedule::Geometric.temperature(1.0, 100_000, 1000) >= MIN_TEMPERATURE_RATIO);
    }

    #[test]
    fn anneal_converges_to_minimum_and_reports_improvements() {
        let _ = env_logger::builder().is_test(true).try_init();
        let options = AnnealOptions {
            initial_temperature: 0.5,
            iterations: 400,
            runs: 2,
            order: TransitionOrder::Random,
            progress_interval: 0,
            ..AnnealOptions::default()
        };
        let mut annealer = Annealer::new(options, nudges());
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let mut state: i64 = 25;
        let mut improvements = Vec::new();
        let report = annealer
            .run(
                &mut state,
                &mut rng,
                |s| (*s - 10).abs() as f64,
                |s, cost| {
                    assert_eq!((*s - 10).abs() as f64, cost);
                    improvements.push(cost);
                    Ok(())
                },
            )
            .unwrap();
        assert_eq!(report.initial_cost, 15.0);
        assert_eq!(report.best_cost, 0.0);
        assert_eq!(report.iterations_run, 800);
        assert_eq!(report.stats.proposed, 800);
        assert_eq!(
            report.stats.accepted_overall + report.stats.rejected_metro,
            800
        );
        assert_eq!(improvements.last(), Some(&0.0));
        assert!(improvements.windows(2).all(|w| w[1] < w[0]));
        assert_eq!(report.final_cost, (state - 10).abs() as f64);
        assert_eq!(annealer.phase(), AnnealPhase::Done);
    }

    #[test]
    fn rejected_moves_are_rolled_back() {
        let options = AnnealOptions {
            initial_temperature: 0.0,
            iterations: 50,
            progress_interval: 0,
            ..AnnealOptions::default()
        };
        let worsen: Vec<Box<dyn Transition<i64, Pcg64Mcg>>> = vec![Box::new(Nudge {
            name: "inc",
            delta: 1,
        })];
        let mut annealer = Annealer::new(options, worsen);
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let mut state: i64 = 0;
        let report = annealer
            .run(&mut state, &mut rng, |s| *s as f64, |_, _| Ok(()))
            .unwrap();
        assert_eq!(state, 0);
        assert_eq!(report.stats.rejected_metro, 50);
        assert_eq!(report.stats.accepted_overall, 0);
    }

    #[test]
    fn unchanged_moves_are_counted_without_undo() {
        let options = AnnealOptions {
            iterations: 10,
            progress_interval: 0,
            ..AnnealOptions::default()
        };
        let transitions: Vec<Box<dyn Transition<i64, Pcg64Mcg>>> = vec![Box::new(Idle)];
        let mut annealer = Annealer::new(options, transitions);
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let mut state = 3;
        let report = annealer
            .run(&mut state, &mut rng, |s| *s as f64, |_, _| Ok(()))
            .unwrap();
        assert_eq!(report.stats.unchanged, 10);
        assert_eq!(report.best_cost, 3.0);
    }

    #[test]
    fn cleared_running_flag_stops_before_first_step() {
        let running = Arc::new(AtomicBool::new(false));
        let mut annealer = Annealer::new(AnnealOptions::default(), nudges())
            .with_running_flag(running.clone());
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let mut state = 0;
        let report = annealer
            .run(&mut state, &mut rng, |s| *s as f64, |_, _| Ok(()))
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.iterations_run, 0);
    }

    #[test]
    fn checker_failure_aborts_the_session() {
        let options = AnnealOptions {
            initial_temperature: 100.0,
            iterations: 100,
            progress_interval: 0,
            ..AnnealOptions::default()
        };
        let mut annealer = Annealer::new(options, nudges()).with_checker(Box::new(|s: &i64| {
            if *s < 2 {
                Ok(())
            } else {
                Err(format!("state {} out of range", s))
            }
        }));
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let mut state = 1;
        let err = annealer
            .run(&mut state, &mut rng, |_| 0.0, |_, _| Ok(()))
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn progress_lines_are_appended_as_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let progress_path = temp_dir.path().join("progress.jsonl");
        let options = AnnealOptions {
            iterations: 30,
            progress_interval: 10,
            progress_path: Some(progress_path.clone()),
            ..AnnealOptions::default()
        };
        let mut annealer = Annealer::new(options, nudges());
        let mut rng = Pcg64Mcg::seed_from_u64(11);
        let mut state = 0;
        annealer
            .run(&mut state, &mut rng, |s| s.abs() as f64, |_, _| Ok(()))
            .unwrap();
        let contents = std::fs::read_to_string(&progress_path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["step"], 30);
    }

    #[test]
    fn stats_merge_accumulates_per_transition_counts() {
        let mut a = AnnealStats::default();
        a.update_for_iteration("add", IterationOutcome::Accepted { improving: true });
        let mut b = AnnealStats::default();
        b.update_for_iteration("add", IterationOutcome::Accepted { improving: false });
        b.update_for_iteration("remove", IterationOutcome::MetropolisReject);
        a.merge_from(b);
        assert_eq!(a.proposed, 3);
        assert_eq!(a.accepted_overall, 2);
        assert_eq!(a.accepted_improving, 1);
        assert_eq!(a.accepted_summary(), "add:2");
    }
}
