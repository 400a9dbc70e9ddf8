// SPDX-License-Identifier: Apache-2.0

//! Incremental technology mapping state.
//!
//! A [`TechMapper`] starts from the default realization (one AND cell per AND
//! gate, one inverter per complemented literal, each activated only if
//! something needs it) and is then edited by binding and unbinding candidate
//! gates. The running [`cost::CostLedger`] is kept exactly equal to a
//! from-scratch recomputation, which [`TechMapper::audit`] checks.

pub mod binder;
pub mod candidates;
pub mod cost;
pub mod coverage;

pub use binder::{GateId, GateTable, MappedGate, MappingId, UnboundGate};
pub use candidates::{generate_candidates, prune_unmappable, GateMapping};
pub use cost::{Cost, CostLedger, Objective};
pub use coverage::{Coverage, NodeState};

use crate::aig::{Literal, LogicGraph};
use crate::library::{CellId, CellLibrary, LogicType};
use crate::map_error::MapError;
use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which bound literals make a candidate contended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Only the candidate's own output.
    #[default]
    OutputOnly,
    /// The output and every literal the candidate covers.
    Covers,
}

#[derive(Debug, Clone)]
pub struct TechMapper {
    graph: Arc<LogicGraph>,
    library: Arc<CellLibrary>,
    coverage: Coverage,
    gates: GateTable,
    candidates: Vec<GateMapping>,
    overlap: OverlapPolicy,
}

/// Cell type of the default gate driving `lit`, if it has one.
fn default_type(graph: &LogicGraph, lit: Literal) -> Option<LogicType> {
    if lit.is_complemented() {
        Some(LogicType::Not)
    } else if graph.operands(lit).is_some() {
        Some(LogicType::And)
    } else {
        None
    }
}

impl TechMapper {
    /// Builds the default realization with randomly chosen default cells and
    /// acquires every primary output.
    pub fn initialize<R: Rng + ?Sized>(
        graph: Arc<LogicGraph>,
        library: Arc<CellLibrary>,
        candidates: Vec<GateMapping>,
        overlap: OverlapPolicy,
        rng: &mut R,
    ) -> Result<Self, MapError> {
        if graph.num_and_gates() > 0 && !library.has_type(LogicType::And) {
            return Err(MapError::MissingDefaultCell(LogicType::And));
        }
        if graph.num_vars() > 0 && !library.has_type(LogicType::Not) {
            return Err(MapError::MissingDefaultCell(LogicType::Not));
        }

        let mut defaults = Vec::with_capacity(graph.num_literals());
        for i in 0..graph.num_literals() {
            let cell = match default_type(&graph, Literal(i as u32)) {
                Some(t) => Some(
                    library
                        .random_cell_of_type(t, rng)
                        .ok_or(MapError::MissingDefaultCell(t))?,
                ),
                None => None,
            };
            defaults.push(cell);
        }

        let mut coverage = Coverage::new(graph.clone(), library.clone(), defaults);
        for &o in graph.outputs() {
            coverage.add_dependency(o);
        }
        let gates = GateTable::new(graph.num_literals());
        let mapper = TechMapper {
            graph,
            library,
            coverage,
            gates,
            candidates,
            overlap,
        };
        log::info!(
            "initial mapping: {} default gate(s), {}",
            mapper.active_default_count(),
            mapper.cost()
        );
        Ok(mapper)
    }

    pub fn graph(&self) -> &Arc<LogicGraph> {
        &self.graph
    }

    pub fn library(&self) -> &Arc<CellLibrary> {
        &self.library
    }

    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    pub fn node_state(&self, lit: Literal) -> &NodeState {
        self.coverage.state(lit)
    }

    pub fn gates(&self) -> &GateTable {
        &self.gates
    }

    pub fn candidates(&self) -> &[GateMapping] {
        &self.candidates
    }

    pub fn candidate(&self, id: MappingId) -> &GateMapping {
        &self.candidates[id.0]
    }

    pub fn overlap(&self) -> OverlapPolicy {
        self.overlap
    }

    pub fn cost(&self) -> Cost {
        self.coverage.ledger().cost()
    }

    /// Literals that have a default gate, active or not.
    pub fn default_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.coverage
            .states()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.default_cell.is_some())
            .map(|(i, _)| Literal(i as u32))
    }

    pub fn active_default_count(&self) -> usize {
        self.coverage
            .states()
            .iter()
            .filter(|s| s.default_active)
            .count()
    }

    /// Swaps the default cell of `lit`; returns the previous one.
    pub fn set_default_cell(&mut self, lit: Literal, cell: CellId) -> Result<CellId, MapError> {
        let expected = default_type(&self.graph, lit)
            .ok_or(MapError::NoDefaultGate(lit))?;
        let c = self.library.cell(cell);
        if c.logic_type != expected {
            return Err(MapError::CellTypeMismatch {
                cell: c.name.clone(),
                expected,
            });
        }
        let previous = self
            .coverage
            .set_default_cell(lit, cell)
            .ok_or(MapError::MissingDefaultCell(expected))?;
        Ok(previous)
    }

    /// Recomputes dependency counts and the cost ledger from scratch and
    /// compares them with the incremental state.
    pub fn audit(&self) -> Result<(), String> {
        let n = self.graph.num_literals();
        let states = self.coverage.states();
        let mut errors = Vec::new();
        let mut dependents = vec![0u32; n];
        let mut ledger = CostLedger::default();

        for &o in self.graph.outputs() {
            dependents[o.index()] += 1;
        }
        for (i, s) in states.iter().enumerate() {
            let lit = Literal(i as u32);
            let expect_active =
                s.dependents > 0 && s.bound_by.is_none() && s.default_cell.is_some();
            if s.default_active != expect_active {
                errors.push(format!(
                    "{}: default_active={} but dependents={} bound_by={:?}",
                    lit, s.default_active, s.dependents, s.bound_by
                ));
            }
            if !s.default_active {
                continue;
            }
            if let Some(cell) = s.default_cell {
                ledger.add(self.coverage.contribution(cell, lit));
            }
            for f in coverage::default_fanin(&self.graph, lit).into_iter().flatten() {
                dependents[f.index()] += 1;
            }
        }
        for (id, g) in self.gates.active() {
            dependents[g.input_a.index()] += 1;
            dependents[g.input_b.index()] += 1;
            ledger.add(self.coverage.contribution(g.cell, g.output));
            if states[g.output.index()].bound_by != Some(id) {
                errors.push(format!(
                    "gate {} drives {} but the literal is bound by {:?}",
                    id.0,
                    g.output,
                    states[g.output.index()].bound_by
                ));
            }
            let m = &self.candidates[g.mapping.0];
            if (m.input_a, m.input_b, m.output) != (g.input_a, g.input_b, g.output)
                || self.library.cell(g.cell).logic_type != m.logic_type
            {
                errors.push(format!("gate {} does not match candidate {}", id.0, g.mapping.0));
            }
        }
        for (i, s) in states.iter().enumerate() {
            if let Some(id) = s.bound_by {
                let g = self.gates.get(id);
                if !g.active || g.output.index() != i {
                    errors.push(format!(
                        "{} is bound by inactive or foreign gate {}",
                        Literal(i as u32),
                        id.0
                    ));
                }
            }
            if s.dependents != dependents[i] {
                errors.push(format!(
                    "{}: dependents={} but recomputed {}",
                    Literal(i as u32),
                    s.dependents,
                    dependents[i]
                ));
            }
        }
        if self.gates.active().count() != self.gates.num_active() {
            errors.push("gate table active count is stale".to_string());
        }
        if ledger != *self.coverage.ledger() {
            errors.push(format!(
                "ledger {} differs from recomputed {}",
                self.coverage.ledger().cost(),
                ledger.cost()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aig::LogicGraphBuilder;
    use crate::test_utils::{full_library, library, nor_graph, setup_mapper, xor_graph};
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn and2_initial_cost() {
        let mut b = LogicGraphBuilder::new("and2", 2);
        let (x, y) = (b.input(0), b.input(1));
        let f = b.add_and(x, y);
        b.add_output(f, None);
        let lib = library(&[("AND", LogicType::And, 4.0, 2.0), ("INV", LogicType::Not, 1.0, 1.0)]);
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let m = setup_mapper(b.build(), lib, OverlapPolicy::OutputOnly, &mut rng);
        let c = m.cost();
        assert_eq!(c.area, 4.0);
        assert_eq!(c.static_power, 2.0);
        assert_eq!(c.dynamic_power, 2.0 * 0.375);
        assert_eq!(m.active_default_count(), 1);
        m.audit().unwrap();
    }

    #[test]
    fn missing_default_cells_are_reported() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let g = Arc::new(nor_graph(false));
        let no_and = Arc::new(library(&[("INV", LogicType::Not, 1.0, 1.0)]));
        let err =
            TechMapper::initialize(g.clone(), no_and, vec![], OverlapPolicy::OutputOnly, &mut rng)
                .unwrap_err();
        assert_eq!(err, MapError::MissingDefaultCell(LogicType::And));
        let no_inv = Arc::new(library(&[("AND", LogicType::And, 1.0, 1.0)]));
        let err = TechMapper::initialize(g, no_inv, vec![], OverlapPolicy::OutputOnly, &mut rng)
            .unwrap_err();
        assert_eq!(err, MapError::MissingDefaultCell(LogicType::Not));
    }

    #[test]
    fn set_default_cell_checks_type() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let mut m = setup_mapper(
            nor_graph(false),
            full_library(),
            OverlapPolicy::OutputOnly,
            &mut rng,
        );
        let inv_lit = Literal(1);
        let and_cell = m.library().cells_of_type(LogicType::And)[0];
        assert!(matches!(
            m.set_default_cell(inv_lit, and_cell),
            Err(MapError::CellTypeMismatch { .. })
        ));
        let big_inv = m.library().cell_by_name("INV_X2").unwrap();
        let old = m.set_default_cell(inv_lit, big_inv).unwrap();
        m.audit().unwrap();
        m.set_default_cell(inv_lit, old).unwrap();
        m.audit().unwrap();
    }

    #[test]
    fn random_bind_unbind_sequences_keep_invariants() {
        let mut rng = Pcg64Mcg::seed_from_u64(42);
        let mut m = setup_mapper(xor_graph(), full_library(), OverlapPolicy::OutputOnly, &mut rng);
        let initial = *m.coverage().ledger();
        let mut bound = Vec::new();
        for step in 0..200 {
            if step % 3 == 2 && !bound.is_empty() {
                let i = rng.gen_range(0..bound.len());
                let id: GateId = bound.swap_remove(i);
                m.unbind(id).unwrap();
            } else {
                let id = MappingId(rng.gen_range(0..m.candidates().len()));
                if let Some(g) = m.bind(id, &mut rng).unwrap() {
                    bound.push(g);
                }
            }
            m.audit().unwrap_or_else(|e| panic!("step {}: {}", step, e));
        }
        bound.shuffle(&mut rng);
        for id in bound {
            m.unbind(id).unwrap();
        }
        m.audit().unwrap();
        assert_eq!(*m.coverage().ledger(), initial);
    }
}
