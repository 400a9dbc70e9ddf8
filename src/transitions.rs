// SPDX-License-Identifier: Apache-2.0

//! Reversible search moves over a [`TechMapper`].

use crate::aig::Literal;
use crate::library::CellId;
use crate::mapping::{GateId, MappingId, TechMapper, UnboundGate};
use aigmap_anneal::{Applied, Direction, Transition};
use anyhow::{anyhow, Result};
use clap::ValueEnum;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    AddRandomGate,
    RemoveRandomGate,
    ChangeDefaultCell,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 3] = [
        TransitionKind::AddRandomGate,
        TransitionKind::RemoveRandomGate,
        TransitionKind::ChangeDefaultCell,
    ];
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::AddRandomGate => write!(f, "AddGate"),
            TransitionKind::RemoveRandomGate => write!(f, "RemoveGate"),
            TransitionKind::ChangeDefaultCell => write!(f, "ChangeDefault"),
        }
    }
}

/// Boxed transitions in the order given; duplicates are kept so a kind can be
/// weighted by listing it more than once.
pub fn build_transitions<R: Rng + 'static>(
    kinds: &[TransitionKind],
) -> Vec<Box<dyn Transition<TechMapper, R>>> {
    kinds
        .iter()
        .map(|k| -> Box<dyn Transition<TechMapper, R>> {
            match k {
                TransitionKind::AddRandomGate => Box::new(AddRandomGate::default()),
                TransitionKind::RemoveRandomGate => Box::new(RemoveRandomGate::default()),
                TransitionKind::ChangeDefaultCell => Box::new(ChangeDefaultCell::default()),
            }
        })
        .collect()
}

/// Binds a uniformly random candidate.
#[derive(Debug, Default)]
pub struct AddRandomGate {
    last: Option<GateId>,
}

impl<R: Rng> Transition<TechMapper, R> for AddRandomGate {
    fn name(&self) -> &str {
        "AddGate"
    }

    fn apply(&mut self, m: &mut TechMapper, direction: Direction, rng: &mut R) -> Result<Applied> {
        match direction {
            Direction::Forward => {
                self.last = None;
                if m.candidates().is_empty() {
                    return Ok(Applied::Unchanged);
                }
                let id = MappingId(rng.gen_range(0..m.candidates().len()));
                match m.bind(id, rng)? {
                    Some(gate) => {
                        self.last = Some(gate);
                        Ok(Applied::Changed)
                    }
                    None => Ok(Applied::Unchanged),
                }
            }
            Direction::Backward => {
                let gate = self
                    .last
                    .take()
                    .ok_or_else(|| anyhow!("AddGate: nothing to undo"))?;
                m.unbind(gate)
                    .ok_or_else(|| anyhow!("AddGate: slot {} is not active", gate.0))?;
                Ok(Applied::Changed)
            }
        }
    }
}

/// Unbinds a uniformly random active mapped gate.
#[derive(Debug, Default)]
pub struct RemoveRandomGate {
    last: Option<UnboundGate>,
}

impl<R: Rng> Transition<TechMapper, R> for RemoveRandomGate {
    fn name(&self) -> &str {
        "RemoveGate"
    }

    fn apply(&mut self, m: &mut TechMapper, direction: Direction, rng: &mut R) -> Result<Applied> {
        match direction {
            Direction::Forward => {
                self.last = None;
                let Some(gate) = m.gates().active().map(|(id, _)| id).choose(rng) else {
                    return Ok(Applied::Unchanged);
                };
                self.last = m.unbind(gate);
                Ok(Applied::Changed)
            }
            Direction::Backward => {
                let u = self
                    .last
                    .take()
                    .ok_or_else(|| anyhow!("RemoveGate: nothing to undo"))?;
                m.rebind(u.slot, u.mapping, u.cell).ok_or_else(|| {
                    anyhow!("RemoveGate: candidate {} is no longer bindable", u.mapping.0)
                })?;
                Ok(Applied::Changed)
            }
        }
    }
}

/// Replaces the cell of a random default gate by a random cell of the same
/// type.
#[derive(Debug, Default)]
pub struct ChangeDefaultCell {
    literals: Option<Vec<Literal>>,
    last: Option<(Literal, CellId)>,
}

impl<R: Rng> Transition<TechMapper, R> for ChangeDefaultCell {
    fn name(&self) -> &str {
        "ChangeDefault"
    }

    fn apply(&mut self, m: &mut TechMapper, direction: Direction, rng: &mut R) -> Result<Applied> {
        match direction {
            Direction::Forward => {
                self.last = None;
                let literals = self
                    .literals
                    .get_or_insert_with(|| m.default_literals().collect());
                let Some(&lit) = literals.choose(rng) else {
                    return Ok(Applied::Unchanged);
                };
                let current = m
                    .node_state(lit)
                    .default_cell
                    .ok_or_else(|| anyhow!("{} has no default cell", lit))?;
                let logic_type = m.library().cell(current).logic_type;
                let Some(cell) = m.library().random_cell_of_type(logic_type, rng) else {
                    return Ok(Applied::Unchanged);
                };
                if cell == current {
                    return Ok(Applied::Unchanged);
                }
                let previous = m.set_default_cell(lit, cell)?;
                self.last = Some((lit, previous));
                Ok(Applied::Changed)
            }
            Direction::Backward => {
                let (lit, previous) = self
                    .last
                    .take()
                    .ok_or_else(|| anyhow!("ChangeDefault: nothing to undo"))?;
                m.set_default_cell(lit, previous)?;
                Ok(Applied::Changed)
            }
        }
    }
}
