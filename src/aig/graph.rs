// SPDX-License-Identifier: Apache-2.0

//! Immutable And-Inverter Graph in canonical AIGER layout.
//!
//! Variables `[0, num_inputs)` are primary inputs and variables
//! `[num_inputs, num_vars)` are AND gates. Every AND gate's operand literals
//! refer to strictly lower variables, so ascending variable order is a
//! topological order.

use crate::aig::literal::{Literal, Var};

/// Per-literal node data.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// `Some((lhs, rhs))` with `lhs <= rhs` on the asserted literal of an AND
    /// gate; `None` for inputs and complemented literals.
    pub operands: Option<(Literal, Literal)>,
    /// Probability that the literal is logic 1 under uniformly random inputs.
    pub set_probability: f64,
    /// `2p(1-p)`; identical for both polarities of a variable.
    pub switching_factor: f64,
    /// Structural readers of this literal: primary outputs and AND operands.
    pub out_degree: u32,
    pub is_primary_io: bool,
}

#[derive(Debug, Clone)]
pub struct LogicGraph {
    name: String,
    num_inputs: u32,
    nodes: Vec<Node>,
    outputs: Vec<Literal>,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

fn literal_probability(var_probability: &[f64], lit: Literal) -> f64 {
    let p = var_probability[lit.var().index()];
    if lit.is_complemented() {
        1.0 - p
    } else {
        p
    }
}

impl LogicGraph {
    /// Assembles the graph and runs the static analyses (set probability,
    /// switching factor, out-degree). `ands[k]` is the canonical operand pair
    /// of variable `num_inputs + k`.
    pub(crate) fn from_parts(
        name: String,
        num_inputs: u32,
        ands: &[(Literal, Literal)],
        outputs: Vec<Literal>,
        input_names: Vec<String>,
        output_names: Vec<String>,
    ) -> Self {
        let num_vars = num_inputs as usize + ands.len();

        // Single forward pass in index order; operands are always computed
        // before the gates reading them.
        let mut var_probability = vec![0.5; num_vars];
        for (k, &(lhs, rhs)) in ands.iter().enumerate() {
            let v = num_inputs as usize + k;
            debug_assert!(lhs.var().index() < v && rhs.var().index() < v);
            var_probability[v] = literal_probability(&var_probability, lhs)
                * literal_probability(&var_probability, rhs);
        }

        let mut nodes = Vec::with_capacity(num_vars * 2);
        for v in 0..num_vars {
            let p = var_probability[v];
            let q = 2.0 * p * (1.0 - p);
            let operands = if v >= num_inputs as usize {
                Some(ands[v - num_inputs as usize])
            } else {
                None
            };
            let is_input = v < num_inputs as usize;
            nodes.push(Node {
                operands,
                set_probability: p,
                switching_factor: q,
                out_degree: 0,
                is_primary_io: is_input,
            });
            nodes.push(Node {
                operands: None,
                set_probability: 1.0 - p,
                switching_factor: q,
                out_degree: 0,
                is_primary_io: is_input,
            });
        }

        for &(lhs, rhs) in ands {
            nodes[lhs.index()].out_degree += 1;
            nodes[rhs.index()].out_degree += 1;
        }
        for &o in &outputs {
            nodes[o.index()].out_degree += 1;
            nodes[o.index()].is_primary_io = true;
        }

        LogicGraph {
            name,
            num_inputs,
            nodes,
            outputs,
            input_names,
            output_names,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_inputs(&self) -> u32 {
        self.num_inputs
    }

    pub fn num_vars(&self) -> u32 {
        (self.nodes.len() / 2) as u32
    }

    pub fn num_literals(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_and_gates(&self) -> u32 {
        self.num_vars() - self.num_inputs
    }

    pub fn node(&self, lit: Literal) -> &Node {
        &self.nodes[lit.index()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Operands of the AND gate driving `lit`, if `lit` is an asserted AND
    /// output.
    pub fn operands(&self, lit: Literal) -> Option<(Literal, Literal)> {
        self.nodes[lit.index()].operands
    }

    pub fn is_input(&self, var: Var) -> bool {
        var.0 < self.num_inputs
    }

    pub fn contains(&self, lit: Literal) -> bool {
        lit.index() < self.nodes.len()
    }

    /// Variables of all AND gates in ascending (topological) order.
    pub fn and_vars(&self) -> impl Iterator<Item = Var> {
        (self.num_inputs..self.num_vars()).map(Var)
    }

    /// Asserted literals of the primary inputs.
    pub fn inputs(&self) -> impl Iterator<Item = Literal> {
        (0..self.num_inputs).map(|v| Var(v).asserted())
    }

    pub fn outputs(&self) -> &[Literal] {
        &self.outputs
    }

    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    pub fn set_probability(&self, lit: Literal) -> f64 {
        self.nodes[lit.index()].set_probability
    }

    pub fn switching_factor(&self, lit: Literal) -> f64 {
        self.nodes[lit.index()].switching_factor
    }

    pub fn out_degree(&self, lit: Literal) -> u32 {
        self.nodes[lit.index()].out_degree
    }
}
