// SPDX-License-Identifier: Apache-2.0

//! Mapped-gate slot table and the bind/unbind operations over it.

use crate::aig::Literal;
use crate::library::CellId;
use crate::map_error::MapError;
use crate::mapping::candidates::GateMapping;
use crate::mapping::TechMapper;
use rand::Rng;

/// Slot index in the [`GateTable`].
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct GateId(pub usize);

/// Index into the candidate catalogue.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct MappingId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedGate {
    pub cell: CellId,
    pub input_a: Literal,
    pub input_b: Literal,
    pub output: Literal,
    pub active: bool,
    pub mapping: MappingId,
}

impl MappedGate {
    fn vacant() -> Self {
        MappedGate {
            cell: CellId(0),
            input_a: Literal(0),
            input_b: Literal(0),
            output: Literal(0),
            active: false,
            mapping: MappingId(0),
        }
    }
}

/// What [`TechMapper::unbind`] removed; enough to put it back exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnboundGate {
    pub slot: GateId,
    pub mapping: MappingId,
    pub cell: CellId,
}

/// Fixed-size table of mapped gates, one slot per literal. Free slots are
/// found by a round-robin cursor.
#[derive(Debug, Clone)]
pub struct GateTable {
    slots: Vec<MappedGate>,
    cursor: usize,
    num_active: usize,
}

impl GateTable {
    pub fn new(capacity: usize) -> Self {
        GateTable {
            slots: vec![MappedGate::vacant(); capacity],
            cursor: 0,
            num_active: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn num_active(&self) -> usize {
        self.num_active
    }

    pub fn get(&self, id: GateId) -> &MappedGate {
        &self.slots[id.0]
    }

    pub fn slots(&self) -> &[MappedGate] {
        &self.slots
    }

    /// Active gates in slot order.
    pub fn active(&self) -> impl Iterator<Item = (GateId, &MappedGate)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, g)| g.active)
            .map(|(i, g)| (GateId(i), g))
    }

    /// Next free slot at or after the cursor, wrapping around.
    fn allocate(&mut self) -> GateId {
        let n = self.slots.len();
        for k in 0..n {
            let i = (self.cursor + k) % n;
            if !self.slots[i].active {
                self.cursor = (i + 1) % n;
                return GateId(i);
            }
        }
        // At most one gate drives each literal, so the table never fills.
        panic!("gate table exhausted ({} slots)", n);
    }

    fn occupy(&mut self, id: GateId, gate: MappedGate) {
        assert!(!self.slots[id.0].active, "slot {} is occupied", id.0);
        debug_assert!(gate.active);
        self.slots[id.0] = gate;
        self.num_active += 1;
    }

    fn release(&mut self, id: GateId) -> MappedGate {
        let gate = self.slots[id.0].clone();
        self.slots[id.0].active = false;
        self.num_active -= 1;
        gate
    }
}

impl TechMapper {
    /// Whether `mapping` can be bound without giving a net a second driver.
    pub fn is_bindable(&self, mapping: &GateMapping) -> bool {
        let bound = |lit: Literal| self.coverage.state(lit).bound_by.is_some();
        match self.overlap {
            crate::mapping::OverlapPolicy::OutputOnly => !bound(mapping.output),
            crate::mapping::OverlapPolicy::Covers => {
                !bound(mapping.output) && !mapping.covers.iter().any(|&l| bound(l))
            }
        }
    }

    /// Binds candidate `id` with a uniformly random cell of its type.
    ///
    /// Returns `Ok(None)` without touching any state if the candidate is
    /// contended.
    pub fn bind<R: Rng + ?Sized>(
        &mut self,
        id: MappingId,
        rng: &mut R,
    ) -> Result<Option<GateId>, MapError> {
        let mapping = &self.candidates[id.0];
        if !self.is_bindable(mapping) {
            log::trace!("bind {:?}: {} is contended", id, mapping.output);
            return Ok(None);
        }
        let cell = self
            .library
            .random_cell_of_type(mapping.logic_type, rng)
            .ok_or(MapError::NoCellForType(mapping.logic_type))?;
        Ok(self.bind_with_cell(id, cell))
    }

    /// Binds candidate `id` realized by `cell`.
    pub fn bind_with_cell(&mut self, id: MappingId, cell: CellId) -> Option<GateId> {
        if !self.is_bindable(&self.candidates[id.0]) {
            return None;
        }
        let slot = self.gates.allocate();
        self.place(slot, id, cell);
        Some(slot)
    }

    /// Re-creates a gate in a specific free slot; used to undo an unbind.
    pub fn rebind(&mut self, slot: GateId, id: MappingId, cell: CellId) -> Option<GateId> {
        if !self.is_bindable(&self.candidates[id.0]) {
            return None;
        }
        self.place(slot, id, cell);
        Some(slot)
    }

    fn place(&mut self, slot: GateId, id: MappingId, cell: CellId) {
        let mapping = &self.candidates[id.0];
        debug_assert_eq!(self.library.cell(cell).logic_type, mapping.logic_type);
        let (a, b, out) = (mapping.input_a, mapping.input_b, mapping.output);
        self.gates.occupy(
            slot,
            MappedGate {
                cell,
                input_a: a,
                input_b: b,
                output: out,
                active: true,
                mapping: id,
            },
        );
        // Acquire the inputs before retracting the output's default gate so
        // shared fan-in is not torn down and rebuilt.
        self.coverage.add_dependency(a);
        self.coverage.add_dependency(b);
        self.coverage.bind_cover(out, slot);
        self.coverage.add_cost(cell, out);
        log::trace!(
            "bound {:?} as {} ({}, {}) -> {} in slot {}",
            id,
            self.library.cell(cell).name,
            a,
            b,
            out,
            slot.0
        );
    }

    /// Removes the gate in slot `id`. Inactive slots are a no-op.
    pub fn unbind(&mut self, id: GateId) -> Option<UnboundGate> {
        if !self.gates.get(id).active {
            return None;
        }
        let gate = self.gates.release(id);
        self.coverage.unbind_cover(gate.output);
        self.coverage.remove_dependency(gate.input_a);
        self.coverage.remove_dependency(gate.input_b);
        self.coverage.subtract_cost(gate.cell, gate.output);
        log::trace!("unbound slot {} ({})", id.0, gate.output);
        Some(UnboundGate {
            slot: id,
            mapping: gate.mapping,
            cell: gate.cell,
        })
    }
}
