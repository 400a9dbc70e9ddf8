// SPDX-License-Identifier: Apache-2.0

//! Construction of [`LogicGraph`]s, either programmatically or as the sink of
//! an AIGER reader.

use crate::aig::graph::LogicGraph;
use crate::aig::literal::{Literal, Var};
use crate::aig_serdes::{AigerHeader, AigerVisitor};

pub const DEFAULT_MODULE_NAME: &str = "top";

#[derive(Debug, Clone)]
pub struct LogicGraphBuilder {
    name: Option<String>,
    num_inputs: u32,
    ands: Vec<(Literal, Literal)>,
    outputs: Vec<Literal>,
    input_names: Vec<Option<String>>,
    output_names: Vec<Option<String>>,
    header: Option<AigerHeader>,
}

impl Default for LogicGraphBuilder {
    fn default() -> Self {
        LogicGraphBuilder {
            name: None,
            num_inputs: 0,
            ands: Vec::new(),
            outputs: Vec::new(),
            input_names: Vec::new(),
            output_names: Vec::new(),
            header: None,
        }
    }
}

/// Subtracts the AIGER constant offset: AIGER literal 2 is our literal 0.
fn rebase(raw: u32, what: &str) -> Result<Literal, String> {
    if raw < 2 {
        return Err(format!(
            "{} uses constant literal {}; constants are not supported",
            what, raw
        ));
    }
    Ok(Literal(raw - 2))
}

impl LogicGraphBuilder {
    pub fn new(name: &str, num_inputs: u32) -> Self {
        LogicGraphBuilder {
            name: Some(name.to_string()),
            num_inputs,
            input_names: vec![None; num_inputs as usize],
            ..LogicGraphBuilder::default()
        }
    }

    /// Asserted literal of primary input `index`.
    pub fn input(&self, index: u32) -> Literal {
        assert!(index < self.num_inputs, "input {} out of range", index);
        Var(index).asserted()
    }

    fn next_var(&self) -> Var {
        Var(self.num_inputs + self.ands.len() as u32)
    }

    fn try_add_and(&mut self, a: Literal, b: Literal) -> Result<Literal, String> {
        let v = self.next_var();
        if a.var() >= v || b.var() >= v {
            return Err(format!(
                "AND gate {} reads a literal that is not defined yet ({}, {})",
                v.0, a, b
            ));
        }
        if a == b {
            return Err(format!("AND gate {} has equal operands {}", v.0, a));
        }
        let (lhs, rhs) = if a <= b { (a, b) } else { (b, a) };
        self.ands.push((lhs, rhs));
        Ok(v.asserted())
    }

    /// Adds an AND gate over two already-defined literals and returns its
    /// asserted output literal.
    pub fn add_and(&mut self, a: Literal, b: Literal) -> Literal {
        match self.try_add_and(a, b) {
            Ok(lit) => lit,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn add_output(&mut self, lit: Literal, name: Option<&str>) {
        self.outputs.push(lit);
        self.output_names.push(name.map(str::to_string));
    }

    pub fn set_input_name(&mut self, index: u32, name: &str) {
        self.input_names[index as usize] = Some(name.to_string());
    }

    fn check_outputs(&self) -> Result<(), String> {
        let num_literals = 2 * self.next_var().0;
        for (i, o) in self.outputs.iter().enumerate() {
            if o.raw() >= num_literals {
                return Err(format!(
                    "output {} refers to undefined literal {}",
                    i,
                    o.raw() + 2
                ));
            }
        }
        Ok(())
    }

    /// Validates the collected file against its header and builds the graph.
    pub fn finish(self) -> Result<LogicGraph, String> {
        if let Some(h) = &self.header {
            if self.ands.len() as u32 != h.num_ands {
                return Err(format!(
                    "header declares {} AND gates but {} were read",
                    h.num_ands,
                    self.ands.len()
                ));
            }
            if self.outputs.len() as u32 != h.num_outputs {
                return Err(format!(
                    "header declares {} outputs but {} were read",
                    h.num_outputs,
                    self.outputs.len()
                ));
            }
        }
        self.check_outputs()?;
        Ok(self.build_unchecked())
    }

    /// Builds the graph; panics if an output refers to an undefined literal.
    pub fn build(self) -> LogicGraph {
        if let Err(e) = self.check_outputs() {
            panic!("{}", e);
        }
        self.build_unchecked()
    }

    fn build_unchecked(mut self) -> LogicGraph {
        self.input_names.resize(self.num_inputs as usize, None);
        let input_names = self
            .input_names
            .into_iter()
            .enumerate()
            .map(|(i, n)| n.unwrap_or_else(|| format!("i{}", i)))
            .collect();
        let output_names = self
            .output_names
            .into_iter()
            .enumerate()
            .map(|(i, n)| n.unwrap_or_else(|| format!("o{}", i)))
            .collect();
        LogicGraph::from_parts(
            self.name
                .unwrap_or_else(|| DEFAULT_MODULE_NAME.to_string()),
            self.num_inputs,
            &self.ands,
            self.outputs,
            input_names,
            output_names,
        )
    }
}

impl AigerVisitor for LogicGraphBuilder {
    fn on_header(&mut self, header: &AigerHeader) -> Result<(), String> {
        if header.num_latches != 0 {
            return Err("latch count (L) must be zero; sequential AIGER not supported".to_string());
        }
        let declared = header
            .num_inputs
            .checked_add(header.num_ands)
            .ok_or_else(|| {
                format!("I={} plus A={} overflows", header.num_inputs, header.num_ands)
            })?;
        if header.max_var != declared {
            return Err(format!(
                "non-canonical AIGER: M={} but I+A={}",
                header.max_var, declared
            ));
        }
        // Storage grows as sections are read; the header is not trusted for
        // sizing.
        self.num_inputs = header.num_inputs;
        self.input_names.clear();
        self.header = Some(*header);
        Ok(())
    }

    fn on_input(&mut self, index: u32, literal: u32) -> Result<(), String> {
        let lit = rebase(literal, "input")?;
        if index >= self.num_inputs || lit != Var(index).asserted() {
            return Err(format!(
                "input {} has literal {}; expected {}",
                index,
                literal,
                2 * (index + 1)
            ));
        }
        Ok(())
    }

    fn on_output(&mut self, index: u32, literal: u32) -> Result<(), String> {
        if index as usize != self.outputs.len() {
            return Err(format!("output {} delivered out of order", index));
        }
        let lit = rebase(literal, "output")?;
        self.add_output(lit, None);
        Ok(())
    }

    fn on_and(&mut self, index: u32, lhs: u32, rhs0: u32, rhs1: u32) -> Result<(), String> {
        let expected = self.next_var();
        if index != self.ands.len() as u32 || rebase(lhs, "AND output")? != expected.asserted() {
            return Err(format!(
                "AND gate {} defines literal {}; expected {}",
                index,
                lhs,
                2 * (expected.0 + 1)
            ));
        }
        let a = rebase(rhs0, "AND operand")?;
        let b = rebase(rhs1, "AND operand")?;
        self.try_add_and(a, b)?;
        Ok(())
    }

    fn on_input_name(&mut self, index: u32, name: &str) -> Result<(), String> {
        if index >= self.num_inputs {
            return Err(format!("symbol for nonexistent input {}", index));
        }
        let i = index as usize;
        if self.input_names.len() <= i {
            self.input_names.resize(i + 1, None);
        }
        self.input_names[i] = Some(name.to_string());
        Ok(())
    }

    fn on_output_name(&mut self, index: u32, name: &str) -> Result<(), String> {
        let slot = self
            .output_names
            .get_mut(index as usize)
            .ok_or_else(|| format!("symbol for nonexistent output {}", index))?;
        *slot = Some(name.to_string());
        Ok(())
    }

    fn on_comment(&mut self, line: &str) -> Result<(), String> {
        let line = line.trim();
        if self.name.is_none() && !line.is_empty() {
            self.name = Some(line.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(m: u32, i: u32, l: u32, o: u32, a: u32) -> AigerHeader {
        AigerHeader {
            max_var: m,
            num_inputs: i,
            num_latches: l,
            num_outputs: o,
            num_ands: a,
        }
    }

    #[test]
    fn visitor_rebases_literals() {
        let mut b = LogicGraphBuilder::default();
        b.on_header(&header(3, 2, 0, 1, 1)).unwrap();
        b.on_input(0, 2).unwrap();
        b.on_input(1, 4).unwrap();
        b.on_output(0, 7).unwrap();
        b.on_and(0, 6, 5, 2).unwrap();
        b.on_comment("").unwrap();
        b.on_comment("adder").unwrap();
        b.on_comment("ignored").unwrap();
        let g = b.finish().unwrap();
        assert_eq!(g.name(), "adder");
        assert_eq!(g.outputs(), &[Literal(5)]);
        assert_eq!(g.operands(Literal(4)), Some((Literal(0), Literal(3))));
    }

    #[test]
    fn visitor_rejects_constants_and_latches() {
        let mut b = LogicGraphBuilder::default();
        assert!(b.on_header(&header(1, 0, 1, 0, 0)).is_err());

        let mut b = LogicGraphBuilder::default();
        b.on_header(&header(2, 1, 0, 1, 1)).unwrap();
        b.on_input(0, 2).unwrap();
        let err = b.on_and(0, 4, 2, 1).unwrap_err();
        assert!(err.contains("constant"), "{}", err);
    }

    #[test]
    fn visitor_rejects_forward_references_and_equal_operands() {
        let mut b = LogicGraphBuilder::default();
        b.on_header(&header(3, 1, 0, 1, 2)).unwrap();
        b.on_input(0, 2).unwrap();
        assert!(b.on_and(0, 4, 6, 2).is_err());

        let mut b = LogicGraphBuilder::default();
        b.on_header(&header(3, 1, 0, 1, 2)).unwrap();
        b.on_input(0, 2).unwrap();
        assert!(b.on_and(0, 4, 3, 3).is_err());
    }

    #[test]
    fn finish_checks_counts_and_outputs() {
        let mut b = LogicGraphBuilder::default();
        b.on_header(&header(2, 1, 0, 1, 1)).unwrap();
        b.on_input(0, 2).unwrap();
        b.on_output(0, 4).unwrap();
        let err = b.finish().unwrap_err();
        assert!(err.contains("AND gates"), "{}", err);
    }

    #[test]
    fn header_sum_overflow_is_an_error() {
        let mut b = LogicGraphBuilder::default();
        let err = b.on_header(&header(3, u32::MAX, 0, 0, 4)).unwrap_err();
        assert!(err.contains("overflows"), "{}", err);
    }

    #[test]
    fn input_names_are_padded_to_the_input_count() {
        let mut b = LogicGraphBuilder::default();
        b.on_header(&header(3, 3, 0, 1, 0)).unwrap();
        for i in 0..3 {
            b.on_input(i, 2 * (i + 1)).unwrap();
        }
        b.on_output(0, 2).unwrap();
        b.on_input_name(1, "y").unwrap();
        assert!(b.on_input_name(3, "w").is_err());
        let g = b.finish().unwrap();
        assert_eq!(g.input_names(), &["i0".to_string(), "y".to_string(), "i2".to_string()]);
    }

    #[test]
    #[should_panic(expected = "equal operands")]
    fn add_and_panics_on_equal_operands() {
        let mut b = LogicGraphBuilder::new("bad", 1);
        let x = b.input(0);
        b.add_and(x, x);
    }
}
