// SPDX-License-Identifier: Apache-2.0

//! Writes a [`LogicGraph`] back out as AIGER.
//!
//! Our literal `l` is AIGER literal `l + 2` (AIGER reserves variable 0 for
//! the constant). The symbol table always carries the port names and the
//! module name goes into the first comment line, so reading the output back
//! yields the same graph.

use crate::aig::LogicGraph;
use std::fmt::Write as _;

fn header(kind: &str, g: &LogicGraph) -> String {
    format!(
        "{} {} {} 0 {} {}\n",
        kind,
        g.num_vars(),
        g.num_inputs(),
        g.outputs().len(),
        g.num_and_gates()
    )
}

fn symbols_and_comment(g: &LogicGraph) -> String {
    let mut s = String::new();
    for (i, name) in g.input_names().iter().enumerate() {
        let _ = writeln!(s, "i{} {}", i, name);
    }
    for (i, name) in g.output_names().iter().enumerate() {
        let _ = writeln!(s, "o{} {}", i, name);
    }
    let _ = writeln!(s, "c");
    let _ = writeln!(s, "{}", g.name());
    s
}

/// Emits the graph in ASCII AIGER ("aag") format.
pub fn emit_aiger(g: &LogicGraph) -> String {
    let mut s = header("aag", g);
    for input in g.inputs() {
        let _ = writeln!(s, "{}", input.raw() + 2);
    }
    for o in g.outputs() {
        let _ = writeln!(s, "{}", o.raw() + 2);
    }
    for v in g.and_vars() {
        let lhs = v.asserted();
        if let Some((a, b)) = g.operands(lhs) {
            let _ = writeln!(s, "{} {} {}", lhs.raw() + 2, b.raw() + 2, a.raw() + 2);
        }
    }
    s.push_str(&symbols_and_comment(g));
    s
}

fn encode_u32_varint(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Emits the graph in binary AIGER ("aig") format.
pub fn emit_aiger_binary(g: &LogicGraph) -> Vec<u8> {
    let mut out = header("aig", g).into_bytes();
    for o in g.outputs() {
        out.extend_from_slice(format!("{}\n", o.raw() + 2).as_bytes());
    }
    for v in g.and_vars() {
        let lhs = v.asserted();
        if let Some((a, b)) = g.operands(lhs) {
            // Canonical operands are ordered, so rhs0 = b >= rhs1 = a.
            let (lhs, rhs0, rhs1) = (lhs.raw() + 2, b.raw() + 2, a.raw() + 2);
            encode_u32_varint(&mut out, lhs - rhs0);
            encode_u32_varint(&mut out, rhs0 - rhs1);
        }
    }
    out.extend_from_slice(symbols_and_comment(g).as_bytes());
    out
}
