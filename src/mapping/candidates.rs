// SPDX-License-Identifier: Apache-2.0

//! Structural scan for multi-node cells hidden in AND/INVERTER chains.
//!
//! Each AND variable `v` with operands `(x, y)` is inspected for:
//!
//! * `NAND(x, y) -> !v` when `!v` is read;
//! * `NOR(!x, !y) -> v` and `OR(!x, !y) -> !v` when both operands are
//!   complemented;
//! * `XOR`/`XNOR` when both operands are complemented outputs of AND gates
//!   computing complementary minterms over the same two variables.

use crate::aig::{Literal, LogicGraph, Var};
use crate::library::{CellLibrary, LogicType};
use std::collections::BTreeMap;

/// A candidate realization of `output` by a single two-input cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateMapping {
    pub input_a: Literal,
    pub input_b: Literal,
    pub output: Literal,
    pub logic_type: LogicType,
    /// Literals whose default gates the candidate subsumes; sorted, unique.
    pub covers: Vec<Literal>,
}

fn mapping(
    input_a: Literal,
    input_b: Literal,
    output: Literal,
    logic_type: LogicType,
    mut covers: Vec<Literal>,
) -> GateMapping {
    covers.sort();
    covers.dedup();
    GateMapping {
        input_a,
        input_b,
        output,
        logic_type,
        covers,
    }
}

/// Matches `v = AND(!AND(x1, y1), !AND(x2, y2))` where the inner gates are
/// complementary minterms over the same two variables.
fn match_xor(graph: &LogicGraph, v: Var, out: Literal, read_complement: bool) -> Vec<GateMapping> {
    let Some((x, y)) = graph.operands(v.asserted()) else {
        return Vec::new();
    };
    let (a, b) = (x.negate(), y.negate());
    let (Some((x1, y1)), Some((x2, y2))) = (graph.operands(a), graph.operands(b)) else {
        return Vec::new();
    };
    let same_vars = x1.var() == x2.var() && y1.var() == y2.var() && x1.var() != y1.var();
    if !same_vars || x2 != x1.negate() || y2 != y1.negate() {
        return Vec::new();
    }

    // Inner gate `a*!b` (or `!a*b`) means the OR of the two minterms is XOR,
    // so the outer AND of their complements is XNOR.
    let asserted_type = if x1.is_complemented() != y1.is_complemented() {
        LogicType::Xnor
    } else {
        LogicType::Xor
    };
    let complemented_type = if asserted_type == LogicType::Xnor {
        LogicType::Xor
    } else {
        LogicType::Xnor
    };

    let mut covers = vec![a, b, x, y, out];
    covers.extend(
        [x1, y1, x2, y2]
            .into_iter()
            .filter(|l| l.is_complemented()),
    );
    let (in_a, in_b) = (x1.asserted(), y1.asserted());

    let mut found = vec![mapping(in_a, in_b, out, asserted_type, covers.clone())];
    if read_complement {
        covers.push(out.negate());
        found.push(mapping(in_a, in_b, out.negate(), complemented_type, covers));
    }
    found
}

/// Candidates in ascending variable order; NAND, NOR, OR, then XOR/XNOR
/// within a variable.
pub fn generate_candidates(graph: &LogicGraph) -> Vec<GateMapping> {
    let mut found = Vec::new();
    for v in graph.and_vars() {
        let (y_out, n_out) = (v.asserted(), v.complemented());
        let Some((x, y)) = graph.operands(y_out) else {
            continue;
        };
        let read_complement = graph.out_degree(n_out) > 0;

        if read_complement {
            found.push(mapping(x, y, n_out, LogicType::Nand, vec![y_out, n_out]));
        }
        if x.is_complemented() && y.is_complemented() {
            let (a, b) = (x.negate(), y.negate());
            found.push(mapping(a, b, y_out, LogicType::Nor, vec![x, y, y_out]));
            if read_complement {
                found.push(mapping(a, b, n_out, LogicType::Or, vec![x, y, y_out, n_out]));
            }
            found.extend(match_xor(graph, v, y_out, read_complement));
        }
    }

    let mut counts: BTreeMap<LogicType, usize> = BTreeMap::new();
    for m in &found {
        *counts.entry(m.logic_type).or_default() += 1;
    }
    let summary: Vec<String> = counts
        .iter()
        .map(|(t, n)| format!("{}={}", t, n))
        .collect();
    log::info!(
        "found {} candidate(s) over {} AND gate(s): {}",
        found.len(),
        graph.num_and_gates(),
        summary.join(" ")
    );
    found
}

/// Drops candidates whose type has no cell in `library`.
pub fn prune_unmappable(candidates: Vec<GateMapping>, library: &CellLibrary) -> Vec<GateMapping> {
    let before = candidates.len();
    let kept: Vec<GateMapping> = candidates
        .into_iter()
        .filter(|m| library.has_type(m.logic_type))
        .collect();
    if kept.len() != before {
        log::info!(
            "pruned {} candidate(s) without a library cell",
            before - kept.len()
        );
    }
    kept
}
