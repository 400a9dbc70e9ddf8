// SPDX-License-Identifier: Apache-2.0

//! Reads an ASCII AIGER ("aag") file.
//!
//! Only purely combinational files (L == 0) are accepted. The reader is
//! strict about syntax; structural checks (canonical numbering, operands
//! defined before use) belong to the visitor.

use crate::aig::{LogicGraph, LogicGraphBuilder};
use crate::aig_serdes::{parse_header, visit_symbols_and_comments, AigerVisitor};
use std::path::Path;

/// Parses ASCII-AIGER text into a [`LogicGraph`].
pub fn load_aiger(src: &str) -> Result<LogicGraph, String> {
    let mut builder = LogicGraphBuilder::default();
    visit_aiger(src, &mut builder)?;
    builder.finish()
}

pub fn load_aiger_from_path(path: &Path) -> Result<LogicGraph, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    load_aiger(&text)
}

fn next_non_empty_line<'a>(iter: &mut std::str::Lines<'a>) -> Option<&'a str> {
    iter.by_ref().find(|line| !line.trim().is_empty())
}

fn parse_literals<const N: usize>(line: &str, what: &str) -> Result<[u32; N], String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != N {
        return Err(format!(
            "expected {} literal(s) on {} line, got \"{}\"",
            N, what, line
        ));
    }
    let mut out = [0u32; N];
    for (slot, tok) in out.iter_mut().zip(tokens) {
        *slot = tok
            .parse()
            .map_err(|e| format!("invalid {} literal '{}': {}", what, tok, e))?;
    }
    Ok(out)
}

/// Streams an ASCII-AIGER file into `visitor`.
pub fn visit_aiger<V: AigerVisitor + ?Sized>(src: &str, visitor: &mut V) -> Result<(), String> {
    let mut lines = src.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| "empty AIGER input".to_string())?;
    let header = parse_header(header_line, "aag")?;
    visitor.on_header(&header)?;

    for idx in 0..header.num_inputs {
        let line = next_non_empty_line(&mut lines)
            .ok_or_else(|| format!("expected {} input lines but found fewer", header.num_inputs))?;
        let [lit] = parse_literals::<1>(line, "input")?;
        if lit & 1 != 0 {
            return Err(format!(
                "input literal must be positive, got negated literal {}",
                lit
            ));
        }
        visitor.on_input(idx, lit)?;
    }

    for idx in 0..header.num_outputs {
        let line = next_non_empty_line(&mut lines).ok_or_else(|| {
            format!(
                "expected {} output lines but found fewer",
                header.num_outputs
            )
        })?;
        let [lit] = parse_literals::<1>(line, "output")?;
        visitor.on_output(idx, lit)?;
    }

    for idx in 0..header.num_ands {
        let line = next_non_empty_line(&mut lines).ok_or_else(|| {
            format!("expected {} AND lines but found fewer", header.num_ands)
        })?;
        let [lhs, rhs0, rhs1] = parse_literals::<3>(line, "AND")?;
        if lhs & 1 != 0 {
            return Err(format!("AND output literal {} is negated", lhs));
        }
        visitor.on_and(idx, lhs, rhs0, rhs1)?;
    }

    visit_symbols_and_comments(lines, visitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aig::Literal;

    #[test]
    fn loads_half_adder_with_symbols() {
        // sum = !(a & b) & !(!a & !b), carry = a & b
        let src = "aag 5 2 0 2 3
2
4
10
6
6 2 4
8 3 5
10 7 9
i0 a
i1 b
o0 sum
o1 carry
c
half_adder
";
        let g = load_aiger(src).unwrap();
        assert_eq!(g.name(), "half_adder");
        assert_eq!(g.num_inputs(), 2);
        assert_eq!(g.num_and_gates(), 3);
        assert_eq!(g.input_names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(g.output_names(), &["sum".to_string(), "carry".to_string()]);
        assert_eq!(g.outputs(), &[Literal(8), Literal(4)]);
        assert_eq!(g.operands(Literal(6)), Some((Literal(1), Literal(3))));
        for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
            assert_eq!(g.evaluate_outputs(&[a, b]), vec![a ^ b, a & b]);
        }
    }

    #[test]
    fn rejects_latches() {
        let err = load_aiger("aag 1 0 1 0 0\n2 3\n").unwrap_err();
        assert!(err.contains("latch"), "{}", err);
    }

    #[test]
    fn rejects_truncated_and_section() {
        let err = load_aiger("aag 3 2 0 1 1\n2\n4\n6\n").unwrap_err();
        assert!(err.contains("AND lines"), "{}", err);
    }

    #[test]
    fn rejects_constant_outputs() {
        let err = load_aiger("aag 1 1 0 1 0\n2\n1\n").unwrap_err();
        assert!(err.contains("constant"), "{}", err);
    }

    #[test]
    fn rejects_non_ascii_symbol_kind() {
        let err = load_aiger("aag 1 1 0 1 0\n2\n2\n\u{e9}0 x\n").unwrap_err();
        assert!(err.contains("unrecognized symbol"), "{}", err);
    }

    #[test]
    fn rejects_header_counts_that_overflow() {
        let err = load_aiger("aag 4294967295 4294967295 0 0 1\n").unwrap_err();
        assert!(err.contains("too large"), "{}", err);
        let err = load_aiger("aag 7 4294967295 0 0 2\n").unwrap_err();
        assert!(err.contains("overflows"), "{}", err);
    }

    #[test]
    fn default_names_without_symbol_table() {
        let g = load_aiger("aag 3 2 0 1 1\n2\n4\n6\n6 4 2\n").unwrap();
        assert_eq!(g.name(), "top");
        assert_eq!(g.input_names(), &["i0".to_string(), "i1".to_string()]);
        assert_eq!(g.output_names(), &["o0".to_string()]);
    }
}
