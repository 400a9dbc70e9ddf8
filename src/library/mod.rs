// SPDX-License-Identifier: Apache-2.0

//! Immutable standard-cell library.
//!
//! Cells are addressed by [`CellId`], an index into a table that never
//! changes after load.

pub mod cell;
pub mod load;

pub use cell::{Cell, CellAttributes, CellId, LogicType};
pub use load::{load_library, load_library_from_path};

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct CellLibrary {
    cells: Vec<Cell>,
    by_name: HashMap<String, CellId>,
    by_type: BTreeMap<LogicType, Vec<CellId>>,
}

impl CellLibrary {
    pub fn new(cells: Vec<Cell>) -> Result<Self, String> {
        let mut by_name = HashMap::with_capacity(cells.len());
        let mut by_type: BTreeMap<LogicType, Vec<CellId>> = BTreeMap::new();
        for (i, cell) in cells.iter().enumerate() {
            if by_name.insert(cell.name.clone(), CellId(i)).is_some() {
                return Err(format!("duplicate cell name '{}'", cell.name));
            }
            by_type.entry(cell.logic_type).or_default().push(CellId(i));
        }
        Ok(CellLibrary {
            cells,
            by_name,
            by_type,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    pub fn cell_by_name(&self, name: &str) -> Option<CellId> {
        self.by_name.get(name).copied()
    }

    /// Cells of the given type in library order.
    pub fn cells_of_type(&self, logic_type: LogicType) -> &[CellId] {
        self.by_type
            .get(&logic_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_type(&self, logic_type: LogicType) -> bool {
        !self.cells_of_type(logic_type).is_empty()
    }

    /// Uniformly random cell of the given type.
    pub fn random_cell_of_type<R: Rng + ?Sized>(
        &self,
        logic_type: LogicType,
        rng: &mut R,
    ) -> Option<CellId> {
        self.cells_of_type(logic_type).choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn indexes_cells_by_name_and_type() {
        let lib = CellLibrary::new(vec![
            Cell::new("AND2_X1", LogicType::And, 1.0, 0.1),
            Cell::new("INV_X1", LogicType::Not, 0.5, 0.05),
            Cell::new("AND2_X2", LogicType::And, 2.0, 0.2),
        ])
        .unwrap();
        assert_eq!(lib.len(), 3);
        assert_eq!(lib.cell_by_name("INV_X1"), Some(CellId(1)));
        assert_eq!(
            lib.cells_of_type(LogicType::And),
            &[CellId(0), CellId(2)]
        );
        assert!(lib.cells_of_type(LogicType::Xor).is_empty());
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let pick = lib.random_cell_of_type(LogicType::And, &mut rng).unwrap();
        assert_eq!(lib.cell(pick).logic_type, LogicType::And);
        assert_eq!(lib.random_cell_of_type(LogicType::Nor, &mut rng), None);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = CellLibrary::new(vec![
            Cell::new("X", LogicType::And, 1.0, 0.1),
            Cell::new("X", LogicType::Or, 1.0, 0.1),
        ])
        .unwrap_err();
        assert!(err.contains("duplicate"));
    }
}
