// SPDX-License-Identifier: Apache-2.0

//! Reading back emitted netlists and evaluating their cost independently of
//! the mapper's ledger.

pub mod cost_eval;
pub mod parse;
pub mod power;

pub use cost_eval::{decode_module_constraints, evaluate, Constraints, NetlistCost};
pub use parse::{parse_netlist, parse_netlist_file};
pub use power::dynamic_power;

use crate::library::{CellId, CellLibrary};
use crate::map_error::MapError;
use std::collections::HashMap;

/// Position of the output pin in an instance's connection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinOrder {
    /// `CELL name ( a , b , y );`
    #[default]
    InputsFirst,
    /// `CELL ( y , a , b );`
    OutputFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetlistInstance {
    pub cell_name: String,
    pub instance_name: Option<String>,
    pub inputs: Vec<String>,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Netlist {
    pub module_name: String,
    pub ports: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub wires: Vec<String>,
    pub instances: Vec<NetlistInstance>,
    /// `(lhs, rhs)` for every `assign lhs = rhs;`.
    pub assigns: Vec<(String, String)>,
}

impl Netlist {
    /// Library cell of every instance, in instance order.
    pub fn resolve_cells(&self, library: &CellLibrary) -> Result<Vec<CellId>, MapError> {
        self.instances
            .iter()
            .map(|inst| {
                library
                    .cell_by_name(&inst.cell_name)
                    .ok_or_else(|| MapError::UnknownCell(inst.cell_name.clone()))
            })
            .collect()
    }

    /// Follows `assign` chains to the net that actually carries the value.
    ///
    /// Builds the alias table on every call; use [`Netlist::aliases`] for
    /// repeated lookups.
    pub fn canonical_net<'a>(&'a self, net: &'a str) -> &'a str {
        self.aliases().resolve(net)
    }

    /// Alias table with every `assign` chain already collapsed.
    pub fn aliases(&self) -> NetAliases<'_> {
        let direct: HashMap<&str, &str> = self
            .assigns
            .iter()
            .map(|(l, r)| (l.as_str(), r.as_str()))
            .collect();
        let mut canonical = HashMap::with_capacity(direct.len());
        for &lhs in direct.keys() {
            let mut current = lhs;
            // Bounded so a cyclic chain terminates.
            for _ in 0..=direct.len() {
                match direct.get(current) {
                    Some(&next) => current = next,
                    None => break,
                }
            }
            canonical.insert(lhs, current);
        }
        NetAliases { canonical }
    }

    /// Number of instances per cell name.
    pub fn cell_counts(&self) -> Vec<(String, usize)> {
        let mut counts: std::collections::BTreeMap<&str, usize> = Default::default();
        for inst in &self.instances {
            *counts.entry(inst.cell_name.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

/// Net name to the name of the net driving it, resolved once per netlist.
#[derive(Debug, Clone, Default)]
pub struct NetAliases<'a> {
    canonical: HashMap<&'a str, &'a str>,
}

impl<'a> NetAliases<'a> {
    pub fn resolve<'n>(&self, net: &'n str) -> &'n str
    where
        'a: 'n,
    {
        self.canonical.get(net).copied().unwrap_or(net)
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LogicType;
    use crate::test_utils::library;

    #[test]
    fn resolves_cells_and_aliases() {
        let n = parse_netlist(
            "module m (a, y, z, w);\ninput a;\noutput y, z, w;\nINV g0 ( a , y );\nassign z = y;\nassign w = z;\nendmodule\n",
            PinOrder::InputsFirst,
        )
        .unwrap();
        assert_eq!(n.canonical_net("w"), "y");
        assert_eq!(n.canonical_net("a"), "a");
        let aliases = n.aliases();
        assert_eq!(aliases.len(), 2);
        assert_eq!((aliases.resolve("z"), aliases.resolve("w")), ("y", "y"));
        assert_eq!(aliases.resolve("y"), "y");
        let lib = library(&[("INV", LogicType::Not, 1.0, 1.0)]);
        assert_eq!(n.resolve_cells(&lib).unwrap(), vec![CellId(0)]);
        let empty = library(&[("BUF", LogicType::Buf, 1.0, 1.0)]);
        assert_eq!(
            n.resolve_cells(&empty).unwrap_err(),
            MapError::UnknownCell("INV".to_string())
        );
        assert_eq!(n.cell_counts(), vec![("INV".to_string(), 1)]);
    }
}
