// SPDX-License-Identifier: Apache-2.0

//! Switching-probability propagation over a parsed netlist.

use crate::library::CellLibrary;
use crate::map_error::MapError;
use crate::netlist::Netlist;
use std::collections::{HashMap, VecDeque};

/// Propagates set probabilities from the primary inputs (0.5 each) through
/// every instance in topological order, assuming independent inputs, and
/// returns `sum(q * leakage)` with `q = 2p(1-p)` on each instance output.
///
/// Instances that are not reachable from the primary inputs contribute
/// nothing.
pub fn dynamic_power(netlist: &Netlist, library: &CellLibrary) -> Result<f64, MapError> {
    let cells = netlist.resolve_cells(library)?;
    let aliases = netlist.aliases();

    // Readers of each net, one entry per pin.
    let mut readers: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut pending: Vec<usize> = Vec::with_capacity(netlist.instances.len());
    for (i, inst) in netlist.instances.iter().enumerate() {
        for net in &inst.inputs {
            readers
                .entry(aliases.resolve(net))
                .or_default()
                .push(i);
        }
        pending.push(inst.inputs.len());
    }

    let mut probability: HashMap<&str, f64> = HashMap::new();
    let mut ready: VecDeque<usize> = VecDeque::new();
    let settle = |net: &str, pending: &mut Vec<usize>, ready: &mut VecDeque<usize>| {
        for &r in readers.get(net).map(Vec::as_slice).unwrap_or(&[]) {
            pending[r] -= 1;
            if pending[r] == 0 {
                ready.push_back(r);
            }
        }
    };
    for input in &netlist.inputs {
        let net = aliases.resolve(input);
        if probability.insert(net, 0.5).is_none() {
            settle(net, &mut pending, &mut ready);
        }
    }

    let mut total = 0.0;
    let mut processed = 0;
    while let Some(i) = ready.pop_front() {
        let inst = &netlist.instances[i];
        let cell = library.cell(cells[i]);
        let p: Vec<f64> = inst
            .inputs
            .iter()
            .map(|n| probability.get(aliases.resolve(n)).copied().unwrap_or(0.5))
            .collect();
        let p0 = p.first().copied().unwrap_or(0.5);
        let p1 = p.get(1).copied().unwrap_or(p0);
        let out = cell.logic_type.set_probability(p0, p1);
        let q = 2.0 * out * (1.0 - out);
        total += q * cell.leakage_power;
        processed += 1;

        let net = aliases.resolve(&inst.output);
        probability.insert(net, out);
        settle(net, &mut pending, &mut ready);
    }
    if processed != netlist.instances.len() {
        log::warn!(
            "{} of {} instance(s) are not reachable from the primary inputs",
            netlist.instances.len() - processed,
            netlist.instances.len()
        );
    }
    Ok(total)
}
