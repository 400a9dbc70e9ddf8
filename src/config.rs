// SPDX-License-Identifier: Apache-2.0

//! Run configuration: defaults, an optional JSON file, then command line
//! overrides, in that order of precedence.

use crate::mapping::{Objective, OverlapPolicy};
use crate::transitions::TransitionKind;
use aigmap_anneal::{AnnealOptions, Schedule, TransitionOrder};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One annealing session. Unset fields fall back to [`MapConfig::anneal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub name: String,
    pub transitions: Vec<TransitionKind>,
    #[serde(default)]
    pub initial_temperature: Option<f64>,
    #[serde(default)]
    pub iterations: Option<u64>,
}

impl StageConfig {
    pub fn anneal_options(&self, base: &AnnealOptions) -> AnnealOptions {
        AnnealOptions {
            initial_temperature: self.initial_temperature.unwrap_or(base.initial_temperature),
            iterations: self.iterations.unwrap_or(base.iterations),
            ..base.clone()
        }
    }
}

fn default_stages() -> Vec<StageConfig> {
    vec![
        // Cool start: only resize the default gates.
        StageConfig {
            name: "resize".to_string(),
            transitions: vec![TransitionKind::ChangeDefaultCell],
            initial_temperature: Some(0.01),
            iterations: None,
        },
        StageConfig {
            name: "cover".to_string(),
            transitions: TransitionKind::ALL.to_vec(),
            initial_temperature: None,
            iterations: None,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub seed: u64,
    pub objective: Objective,
    pub overlap: OverlapPolicy,
    /// Drop candidates whose type has no library cell instead of failing
    /// when one is bound.
    pub prune_unmappable: bool,
    /// Audit the full mapping state after every annealing step.
    pub paranoid: bool,
    pub anneal: AnnealOptions,
    pub stages: Vec<StageConfig>,
    /// Also write the final mapping in ABC pin order here.
    pub abc_output: Option<PathBuf>,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            seed: 1,
            objective: Objective::default(),
            overlap: OverlapPolicy::default(),
            prune_unmappable: false,
            paranoid: false,
            anneal: AnnealOptions::default(),
            stages: default_stages(),
            abc_output: None,
        }
    }
}

/// Command line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub seed: Option<u64>,
    pub iterations: Option<u64>,
    pub runs: Option<u32>,
    pub initial_temperature: Option<f64>,
    pub schedule: Option<Schedule>,
    pub order: Option<TransitionOrder>,
    /// Replaces all stages by a single stage with these transitions.
    pub transitions: Option<Vec<TransitionKind>>,
    pub objective: Option<Objective>,
    pub overlap: Option<OverlapPolicy>,
    pub prune_unmappable: Option<bool>,
    pub paranoid: Option<bool>,
    pub progress_interval: Option<u64>,
    pub progress_path: Option<PathBuf>,
    pub abc_output: Option<PathBuf>,
}

impl MapConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            bail!("at least one annealing stage is required");
        }
        for stage in &self.stages {
            if stage.transitions.is_empty() {
                bail!("stage '{}' has no transitions", stage.name);
            }
            let t0 = stage
                .initial_temperature
                .unwrap_or(self.anneal.initial_temperature);
            if !(t0.is_finite() && t0 >= 0.0) {
                bail!("stage '{}' has invalid initial temperature {}", stage.name, t0);
            }
        }
        Ok(())
    }

    /// Command line values replace file values; an explicit iteration count or
    /// temperature also replaces the per-stage values.
    pub fn apply_overrides(&mut self, o: ConfigOverrides) -> Result<()> {
        if let Some(v) = o.seed {
            self.seed = v;
        }
        if let Some(v) = o.iterations {
            self.anneal.iterations = v;
            self.stages.iter_mut().for_each(|s| s.iterations = None);
        }
        if let Some(v) = o.initial_temperature {
            self.anneal.initial_temperature = v;
            self.stages
                .iter_mut()
                .for_each(|s| s.initial_temperature = None);
        }
        if let Some(v) = o.runs {
            self.anneal.runs = v;
        }
        if let Some(v) = o.schedule {
            self.anneal.schedule = v;
        }
        if let Some(v) = o.order {
            self.anneal.order = v;
        }
        if let Some(transitions) = o.transitions {
            self.stages = vec![StageConfig {
                name: "cli".to_string(),
                transitions,
                initial_temperature: None,
                iterations: None,
            }];
        }
        if let Some(v) = o.objective {
            self.objective = v;
        }
        if let Some(v) = o.overlap {
            self.overlap = v;
        }
        if let Some(v) = o.prune_unmappable {
            self.prune_unmappable = v;
        }
        if let Some(v) = o.paranoid {
            self.paranoid = v;
        }
        if let Some(v) = o.progress_interval {
            self.anneal.progress_interval = v;
        }
        if o.progress_path.is_some() {
            self.anneal.progress_path = o.progress_path;
        }
        if o.abc_output.is_some() {
            self.abc_output = o.abc_output;
        }
        self.validate()
    }
}
