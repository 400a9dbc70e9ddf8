// SPDX-License-Identifier: Apache-2.0

//! Boolean simulation of a [`LogicGraph`].

use crate::aig::graph::LogicGraph;
use crate::aig::literal::Literal;

impl LogicGraph {
    /// Values of every literal (indexed by literal) for one input assignment.
    pub fn evaluate(&self, inputs: &[bool]) -> Vec<bool> {
        assert_eq!(
            inputs.len(),
            self.num_inputs() as usize,
            "expected one value per primary input"
        );
        let mut values = vec![false; self.num_literals()];
        for (i, &value) in inputs.iter().enumerate() {
            values[2 * i] = value;
            values[2 * i + 1] = !value;
        }
        for v in self.and_vars() {
            let out = v.asserted();
            let (lhs, rhs) = self
                .operands(out)
                .expect("AND variable without operands");
            let value = values[lhs.index()] && values[rhs.index()];
            values[out.index()] = value;
            values[out.index() + 1] = !value;
        }
        values
    }

    pub fn evaluate_outputs(&self, inputs: &[bool]) -> Vec<bool> {
        let values = self.evaluate(inputs);
        self.outputs()
            .iter()
            .map(|o: &Literal| values[o.index()])
            .collect()
    }
}
