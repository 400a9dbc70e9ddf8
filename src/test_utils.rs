// SPDX-License-Identifier: Apache-2.0

//! Small graphs and libraries shared by unit and integration tests.

use crate::aig::{LogicGraph, LogicGraphBuilder};
use crate::library::{Cell, CellLibrary, LogicType};
use crate::mapping::{generate_candidates, OverlapPolicy, TechMapper};
use rand::Rng;
use std::sync::Arc;

/// Builds a library from `(name, type, area, leakage)` tuples.
pub fn library(cells: &[(&str, LogicType, f64, f64)]) -> CellLibrary {
    let cells = cells
        .iter()
        .map(|&(name, t, area, leak)| Cell::new(name, t, area, leak))
        .collect();
    CellLibrary::new(cells).expect("test library must be valid")
}

/// One or more cells of every two-input type plus two inverters.
pub fn full_library() -> CellLibrary {
    library(&[
        ("AND2_X1", LogicType::And, 4.0, 2.0),
        ("AND2_X2", LogicType::And, 5.0, 1.5),
        ("INV_X1", LogicType::Not, 1.0, 0.5),
        ("INV_X2", LogicType::Not, 2.0, 0.25),
        ("NAND2_X1", LogicType::Nand, 3.0, 1.0),
        ("NOR2_X1", LogicType::Nor, 3.0, 1.25),
        ("OR2_X1", LogicType::Or, 4.0, 1.75),
        ("XOR2_X1", LogicType::Xor, 6.0, 3.0),
        ("XNOR2_X1", LogicType::Xnor, 6.0, 3.0),
    ])
}

/// `f = !a & !b`; outputs `!f` (an OR) when `read_complement`, else `f`.
pub fn nor_graph(read_complement: bool) -> LogicGraph {
    let mut b = LogicGraphBuilder::new("nor2", 2);
    let (x, y) = (b.input(0), b.input(1));
    let f = b.add_and(x.negate(), y.negate());
    if read_complement {
        b.add_output(f.negate(), Some("y"));
    } else {
        b.add_output(f, Some("y"));
    }
    b.build()
}

/// Half adder: `sum = a ^ b` as the complement of
/// `AND(!AND(a, !b), !AND(!a, b))`, `carry = a & b`.
pub fn xor_graph() -> LogicGraph {
    let mut b = LogicGraphBuilder::new("half_adder", 2);
    let (x, y) = (b.input(0), b.input(1));
    let g1 = b.add_and(x, y.negate());
    let g2 = b.add_and(x.negate(), y);
    let f = b.add_and(g1.negate(), g2.negate());
    let carry = b.add_and(x, y);
    b.add_output(f.negate(), Some("sum"));
    b.add_output(carry, Some("carry"));
    b.build()
}

/// A four-input circuit mixing every pattern the candidate scan knows about,
/// with shared fan-in and an output that aliases an input.
pub fn mixed_graph() -> LogicGraph {
    let mut b = LogicGraphBuilder::new("mixed", 4);
    let (w, x, y, z) = (b.input(0), b.input(1), b.input(2), b.input(3));
    let g1 = b.add_and(w, x.negate());
    let g2 = b.add_and(w.negate(), x);
    let xnor = b.add_and(g1.negate(), g2.negate());
    let nor = b.add_and(y.negate(), z.negate());
    let n1 = b.add_and(xnor, nor.negate());
    let n2 = b.add_and(n1.negate(), y);
    let n3 = b.add_and(n2.negate(), xnor.negate());
    b.add_output(n3, Some("f0"));
    b.add_output(n1.negate(), Some("f1"));
    b.add_output(nor.negate(), Some("f2"));
    b.add_output(z, Some("f3"));
    b.build()
}

/// Initializes a mapper over the unpruned candidate catalogue of `graph`.
pub fn setup_mapper<R: Rng + ?Sized>(
    graph: LogicGraph,
    library: CellLibrary,
    overlap: OverlapPolicy,
    rng: &mut R,
) -> TechMapper {
    let candidates = generate_candidates(&graph);
    TechMapper::initialize(Arc::new(graph), Arc::new(library), candidates, overlap, rng)
        .expect("test mapper must initialize")
}
