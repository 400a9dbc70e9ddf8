// SPDX-License-Identifier: Apache-2.0

//! Per-literal dependency tracking with lazy default-gate activation.
//!
//! Every literal except an asserted primary input has a default gate: an AND
//! cell on the asserted output of an AND variable, an inverter on every
//! complemented literal. A default gate is active exactly when its literal
//! has dependents and is not driven by a mapped gate. Activating a default
//! gate acquires its own fan-in, deactivating releases it, so one change can
//! cascade through the whole fan-in cone.
//!
//! Cascades run on an explicit worklist. A cascade either only acquires or
//! only releases, which keeps every counter non-negative.

use crate::aig::{Literal, LogicGraph};
use crate::library::{CellId, CellLibrary};
use crate::mapping::binder::GateId;
use crate::mapping::cost::{Contribution, CostLedger};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeState {
    /// `None` only for asserted primary inputs.
    pub default_cell: Option<CellId>,
    pub default_active: bool,
    pub bound_by: Option<GateId>,
    pub dependents: u32,
}

/// Fan-in of the default gate driving `lit`.
pub fn default_fanin(graph: &LogicGraph, lit: Literal) -> [Option<Literal>; 2] {
    if lit.is_complemented() {
        [Some(lit.negate()), None]
    } else {
        match graph.operands(lit) {
            Some((lhs, rhs)) => [Some(lhs), Some(rhs)],
            None => [None, None],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Coverage {
    graph: Arc<LogicGraph>,
    library: Arc<CellLibrary>,
    states: Vec<NodeState>,
    ledger: CostLedger,
    worklist: Vec<Literal>,
}

impl Coverage {
    /// All default gates start inactive with zero dependents.
    pub fn new(
        graph: Arc<LogicGraph>,
        library: Arc<CellLibrary>,
        default_cells: Vec<Option<CellId>>,
    ) -> Self {
        assert_eq!(default_cells.len(), graph.num_literals());
        let states = default_cells
            .into_iter()
            .map(|default_cell| NodeState {
                default_cell,
                default_active: false,
                bound_by: None,
                dependents: 0,
            })
            .collect();
        Coverage {
            graph,
            library,
            states,
            ledger: CostLedger::default(),
            worklist: Vec::new(),
        }
    }

    pub fn state(&self, lit: Literal) -> &NodeState {
        &self.states[lit.index()]
    }

    pub fn states(&self) -> &[NodeState] {
        &self.states
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    /// Contribution of `cell` when it drives `lit`.
    pub fn contribution(&self, cell: CellId, lit: Literal) -> Contribution {
        Contribution::of(self.library.cell(cell), self.graph.switching_factor(lit))
    }

    pub(crate) fn add_cost(&mut self, cell: CellId, lit: Literal) {
        let c = self.contribution(cell, lit);
        self.ledger.add(c);
    }

    pub(crate) fn subtract_cost(&mut self, cell: CellId, lit: Literal) {
        let c = self.contribution(cell, lit);
        self.ledger.subtract(c);
    }

    /// Marks the default gate of `lit` active and queues its fan-in for
    /// acquisition.
    fn activate(&mut self, lit: Literal) {
        let state = &mut self.states[lit.index()];
        let Some(cell) = state.default_cell else {
            return;
        };
        debug_assert!(!state.default_active && state.bound_by.is_none());
        state.default_active = true;
        self.add_cost(cell, lit);
        self.worklist
            .extend(default_fanin(&self.graph, lit).into_iter().flatten());
    }

    /// Marks the default gate of `lit` inactive and queues its fan-in for
    /// release.
    fn deactivate(&mut self, lit: Literal) {
        let state = &mut self.states[lit.index()];
        debug_assert!(state.default_active);
        state.default_active = false;
        if let Some(cell) = state.default_cell {
            self.subtract_cost(cell, lit);
        }
        self.worklist
            .extend(default_fanin(&self.graph, lit).into_iter().flatten());
    }

    fn run_acquire(&mut self) {
        while let Some(lit) = self.worklist.pop() {
            let state = &mut self.states[lit.index()];
            state.dependents += 1;
            if state.dependents == 1 && state.bound_by.is_none() {
                self.activate(lit);
            }
        }
    }

    fn run_release(&mut self) {
        while let Some(lit) = self.worklist.pop() {
            let state = &mut self.states[lit.index()];
            assert!(state.dependents > 0, "dependency underflow on {}", lit);
            state.dependents -= 1;
            if state.dependents == 0 && state.default_active {
                self.deactivate(lit);
            }
        }
    }

    pub fn add_dependency(&mut self, lit: Literal) {
        assert!(self.graph.contains(lit), "{} is not in the graph", lit);
        self.worklist.push(lit);
        self.run_acquire();
    }

    pub fn remove_dependency(&mut self, lit: Literal) {
        assert!(self.graph.contains(lit), "{} is not in the graph", lit);
        self.worklist.push(lit);
        self.run_release();
    }

    /// `gate` now drives `lit`; its default gate (if active) is retracted.
    pub fn bind_cover(&mut self, lit: Literal, gate: GateId) {
        let state = &mut self.states[lit.index()];
        assert!(
            state.bound_by.is_none(),
            "{} is already driven by {:?}",
            lit,
            state.bound_by
        );
        state.bound_by = Some(gate);
        if state.default_active {
            self.deactivate(lit);
            self.run_release();
        }
    }

    /// `lit` falls back to its default gate, which is restored if the literal
    /// is still needed.
    pub fn unbind_cover(&mut self, lit: Literal) {
        let state = &mut self.states[lit.index()];
        assert!(state.bound_by.is_some(), "{} is not bound", lit);
        state.bound_by = None;
        if state.dependents > 0 {
            self.activate(lit);
            self.run_acquire();
        }
    }

    /// Replaces the default cell of `lit`, moving the ledger if the default
    /// gate is active. Returns the previous cell.
    pub fn set_default_cell(&mut self, lit: Literal, cell: CellId) -> Option<CellId> {
        let previous = self.states[lit.index()].default_cell;
        assert!(previous.is_some(), "{} has no default gate", lit);
        if self.states[lit.index()].default_active {
            if let Some(old) = previous {
                self.subtract_cost(old, lit);
            }
            self.add_cost(cell, lit);
        }
        self.states[lit.index()].default_cell = Some(cell);
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aig::LogicGraphBuilder;
    use crate::library::{Cell, LogicType};

    fn setup() -> (Arc<LogicGraph>, Coverage, Literal, Literal) {
        // f = !(a & b) & c
        let mut b = LogicGraphBuilder::new("cov", 3);
        let (x, y, z) = (b.input(0), b.input(1), b.input(2));
        let g = b.add_and(x, y);
        let f = b.add_and(g.negate(), z);
        b.add_output(f, None);
        let graph = Arc::new(b.build());
        let library = Arc::new(
            CellLibrary::new(vec![
                Cell::new("AND", LogicType::And, 2.0, 1.0),
                Cell::new("INV", LogicType::Not, 1.0, 0.5),
                Cell::new("INV_BIG", LogicType::Not, 4.0, 0.5),
            ])
            .unwrap(),
        );
        let defaults = (0..graph.num_literals())
            .map(|i| {
                let lit = Literal(i as u32);
                if lit.is_complemented() {
                    Some(CellId(1))
                } else if graph.operands(lit).is_some() {
                    Some(CellId(0))
                } else {
                    None
                }
            })
            .collect();
        let cov = Coverage::new(graph.clone(), library, defaults);
        (graph, cov, g, f)
    }

    #[test]
    fn acquiring_an_output_activates_its_cone() {
        let (_graph, mut cov, g, f) = setup();
        cov.add_dependency(f);
        assert!(cov.state(f).default_active);
        assert!(cov.state(g.negate()).default_active);
        assert!(cov.state(g).default_active);
        assert_eq!(cov.state(g).dependents, 1);
        assert!(!cov.state(f.negate()).default_active);
        // AND, INV, AND
        assert_eq!(cov.ledger().cost().area, 5.0);

        cov.remove_dependency(f);
        assert_eq!(*cov.ledger(), CostLedger::default());
        assert!(cov.states().iter().all(|s| s.dependents == 0 && !s.default_active));
    }

    #[test]
    fn binding_retracts_default_and_releases_fanin() {
        let (_graph, mut cov, g, f) = setup();
        cov.add_dependency(f);
        let before = cov.clone();
        cov.bind_cover(g.negate(), GateId(0));
        assert!(!cov.state(g.negate()).default_active);
        assert!(!cov.state(g).default_active);
        assert_eq!(cov.state(g).dependents, 0);
        assert_eq!(cov.ledger().cost().area, 2.0);

        cov.unbind_cover(g.negate());
        assert_eq!(cov.states(), before.states());
        assert_eq!(cov.ledger(), before.ledger());
    }

    #[test]
    fn changing_an_active_default_cell_moves_the_ledger() {
        let (_graph, mut cov, g, f) = setup();
        cov.add_dependency(f);
        assert_eq!(cov.set_default_cell(g.negate(), CellId(2)), Some(CellId(1)));
        assert_eq!(cov.ledger().cost().area, 8.0);
        // Inactive literal: no ledger change.
        cov.set_default_cell(f.negate(), CellId(2));
        assert_eq!(cov.ledger().cost().area, 8.0);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn releasing_an_unheld_literal_panics() {
        let (_graph, mut cov, g, _f) = setup();
        cov.remove_dependency(g);
    }
}
