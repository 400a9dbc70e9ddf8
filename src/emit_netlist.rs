// SPDX-License-Identifier: Apache-2.0

//! Writes the current mapping as a flat gate-level Verilog netlist.
//!
//! Default gates are emitted first in literal order, then mapped gates in slot
//! order. Net names: an asserted primary input keeps its port name, the first
//! output port reading a literal names that literal, everything else is
//! `n<literal>`. Output ports that read an input, or a literal already named
//! by an earlier output, are driven by an `assign`.

use crate::aig::Literal;
use crate::mapping::{coverage::default_fanin, TechMapper};
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::Path;

/// Instance syntax of the emitted cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetlistStyle {
    /// `CELL g<k> ( a , b , y );`
    Named,
    /// `CELL ( y , a , b );`, as read back by ABC.
    Abc,
}

struct NetNames {
    names: Vec<Option<String>>,
    assigns: Vec<(String, String)>,
}

impl NetNames {
    fn new(m: &TechMapper) -> Self {
        let g = m.graph();
        let mut names: Vec<Option<String>> = vec![None; g.num_literals()];
        for (input, name) in g.inputs().zip(g.input_names()) {
            names[input.index()] = Some(name.clone());
        }
        let mut assigns = Vec::new();
        for (&o, out_name) in g.outputs().iter().zip(g.output_names()) {
            match &names[o.index()] {
                Some(existing) => assigns.push((out_name.clone(), existing.clone())),
                None => names[o.index()] = Some(out_name.clone()),
            }
        }
        NetNames { names, assigns }
    }

    fn get(&self, lit: Literal) -> String {
        match &self.names[lit.index()] {
            Some(n) => n.clone(),
            None => format!("n{}", lit.raw()),
        }
    }

    fn is_port(&self, lit: Literal) -> bool {
        self.names[lit.index()].is_some()
    }
}

/// One emitted cell instance: cell name, input nets, output net.
struct Instance<'a> {
    cell: &'a str,
    inputs: Vec<Literal>,
    output: Literal,
}

fn collect_instances(m: &TechMapper) -> Vec<Instance<'_>> {
    let mut instances = Vec::new();
    for (i, state) in m.coverage().states().iter().enumerate() {
        if !state.default_active {
            continue;
        }
        let Some(cell) = state.default_cell else {
            continue;
        };
        let lit = Literal(i as u32);
        instances.push(Instance {
            cell: &m.library().cell(cell).name,
            inputs: default_fanin(m.graph(), lit).into_iter().flatten().collect(),
            output: lit,
        });
    }
    for (_, gate) in m.gates().active() {
        instances.push(Instance {
            cell: &m.library().cell(gate.cell).name,
            inputs: vec![gate.input_a, gate.input_b],
            output: gate.output,
        });
    }
    instances
}

pub fn emit_netlist(m: &TechMapper, style: NetlistStyle) -> String {
    let g = m.graph();
    let nets = NetNames::new(m);
    let instances = collect_instances(m);

    let inputs: Vec<&str> = g.input_names().iter().map(String::as_str).collect();
    let outputs: Vec<&str> = g.output_names().iter().map(String::as_str).collect();
    let wires: BTreeSet<Literal> = instances
        .iter()
        .map(|inst| inst.output)
        .filter(|&lit| !nets.is_port(lit))
        .collect();

    let mut out = String::new();
    let ports: Vec<&str> = inputs.iter().chain(outputs.iter()).copied().collect();
    let _ = writeln!(out, "module {} ({});", g.name(), ports.join(", "));
    if !inputs.is_empty() {
        let _ = writeln!(out, "  input {};", inputs.join(", "));
    }
    if !outputs.is_empty() {
        let _ = writeln!(out, "  output {};", outputs.join(", "));
    }
    if !wires.is_empty() {
        let names: Vec<String> = wires.iter().map(|&l| nets.get(l)).collect();
        let _ = writeln!(out, "  wire {};", names.join(", "));
    }
    for (k, inst) in instances.iter().enumerate() {
        let ins: Vec<String> = inst.inputs.iter().map(|&l| nets.get(l)).collect();
        let y = nets.get(inst.output);
        match style {
            NetlistStyle::Named => {
                let _ = writeln!(out, "  {} g{} ( {} , {} );", inst.cell, k, ins.join(" , "), y);
            }
            NetlistStyle::Abc => {
                let _ = writeln!(out, "  {} ( {} , {} );", inst.cell, y, ins.join(" , "));
            }
        }
    }
    for (lhs, rhs) in &nets.assigns {
        let _ = writeln!(out, "  assign {} = {};", lhs, rhs);
    }
    out.push_str("endmodule\n");
    out
}

/// Writes the netlist to `path`, replacing any previous content.
pub fn write_netlist(m: &TechMapper, style: NetlistStyle, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, emit_netlist(m, style))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aig::LogicGraphBuilder;
    use crate::library::LogicType;
    use crate::mapping::{MappingId, OverlapPolicy};
    use crate::test_utils::{full_library, library, nor_graph, setup_mapper};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn single_cell_library() -> crate::library::CellLibrary {
        library(&[
            ("AND2", LogicType::And, 1.0, 1.0),
            ("INV", LogicType::Not, 1.0, 1.0),
            ("NOR2", LogicType::Nor, 1.0, 1.0),
            ("OR2", LogicType::Or, 1.0, 1.0),
            ("NAND2", LogicType::Nand, 1.0, 1.0),
        ])
    }

    #[test]
    fn default_mapping_of_a_nor() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let m = setup_mapper(
            nor_graph(false),
            single_cell_library(),
            OverlapPolicy::OutputOnly,
            &mut rng,
        );
        let want = "module nor2 (i0, i1, y);
  input i0, i1;
  output y;
  wire n1, n3;
  INV g0 ( i0 , n1 );
  INV g1 ( i1 , n3 );
  AND2 g2 ( n1 , n3 , y );
endmodule
";
        assert_eq!(emit_netlist(&m, NetlistStyle::Named), want);
    }

    #[test]
    fn mapped_gate_replaces_default_cone() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let mut m = setup_mapper(
            nor_graph(true),
            single_cell_library(),
            OverlapPolicy::OutputOnly,
            &mut rng,
        );
        let or = m
            .candidates()
            .iter()
            .position(|c| c.logic_type == LogicType::Or)
            .unwrap();
        m.bind(MappingId(or), &mut rng).unwrap().unwrap();
        let want = "module nor2 (i0, i1, y);
  input i0, i1;
  output y;
  OR2 g0 ( i0 , i1 , y );
endmodule
";
        assert_eq!(emit_netlist(&m, NetlistStyle::Named), want);
        let want_abc = "module nor2 (i0, i1, y);
  input i0, i1;
  output y;
  OR2 ( y , i0 , i1 );
endmodule
";
        assert_eq!(emit_netlist(&m, NetlistStyle::Abc), want_abc);
    }

    #[test]
    fn aliased_outputs_use_assign() {
        let mut b = LogicGraphBuilder::new("alias", 2);
        let (x, y) = (b.input(0), b.input(1));
        let f = b.add_and(x, y);
        b.add_output(f, Some("p"));
        b.add_output(f, Some("q"));
        b.add_output(x, Some("r"));
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let m = setup_mapper(b.build(), full_library(), OverlapPolicy::OutputOnly, &mut rng);
        let text = emit_netlist(&m, NetlistStyle::Named);
        assert!(text.contains(" , p );\n"), "{}", text);
        assert!(text.contains("  assign q = p;\n"), "{}", text);
        assert!(text.contains("  assign r = i0;\n"), "{}", text);
        assert!(!text.contains("wire"), "{}", text);
    }
}
