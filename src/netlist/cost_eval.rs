// SPDX-License-Identifier: Apache-2.0

//! Contest-style scoring of a netlist: area times total power, with a
//! constant penalty when the constraints encoded in the module name are
//! violated.

use crate::library::CellLibrary;
use crate::map_error::MapError;
use crate::netlist::power::dynamic_power;
use crate::netlist::Netlist;
use serde::Serialize;

const CONSTRAINT_OFFSET: i64 = 1_234_567;
const MAX_CONSTRAINT_WORDS: usize = 32;
const VIOLATION_PENALTY: f64 = 2e7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Constraints {
    pub clock_period: f64,
    pub area: f64,
    pub power: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetlistCost {
    pub area: f64,
    pub static_power: f64,
    pub dynamic_power: f64,
    pub penalized: bool,
    pub cost: f64,
}

/// Decodes `name_<w0>_<w1>...`: each word minus 1234567 is an `i32` whose
/// little-endian bytes, concatenated and read up to the first NUL, spell
/// three numbers separated by single non-numeric characters.
pub fn decode_module_constraints(module_name: &str) -> Option<Constraints> {
    let mut bytes = Vec::with_capacity(4 * MAX_CONSTRAINT_WORDS);
    for segment in module_name.split('_').skip(1).take(MAX_CONSTRAINT_WORDS) {
        let word = segment.parse::<i64>().ok()? - CONSTRAINT_OFFSET;
        let word = i32::try_from(word).ok()?;
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = std::str::from_utf8(&bytes[..end]).ok()?;

    let numbers: Vec<f64> = text
        .split(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
        .filter(|s| !s.is_empty())
        .map(str::parse::<f64>)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers[..] {
        [clock_period, area, power] => Some(Constraints {
            clock_period,
            area,
            power,
        }),
        _ => None,
    }
}

/// Inverse of [`decode_module_constraints`]; used to build test fixtures.
pub fn encode_module_constraints(prefix: &str, text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    let mut name = prefix.to_string();
    for chunk in bytes.chunks(4) {
        let word = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        name.push_str(&format!("_{}", word as i64 + CONSTRAINT_OFFSET));
    }
    name
}

pub fn evaluate(netlist: &Netlist, library: &CellLibrary) -> Result<NetlistCost, MapError> {
    let cells = netlist.resolve_cells(library)?;
    let (mut area, mut static_power) = (0.0, 0.0);
    for &id in &cells {
        let cell = library.cell(id);
        area += cell.area;
        static_power += cell.leakage_power;
    }
    let dynamic = dynamic_power(netlist, library)?;

    let mut raw = area * (static_power + dynamic);
    let penalized = match decode_module_constraints(&netlist.module_name) {
        Some(c) => area >= c.area || (dynamic + c.power >= 0.0 && static_power >= c.power),
        None => {
            log::debug!(
                "module name '{}' carries no constraints; no penalty applied",
                netlist.module_name
            );
            false
        }
    };
    if penalized {
        raw += VIOLATION_PENALTY;
    }
    Ok(NetlistCost {
        area,
        static_power,
        dynamic_power: dynamic,
        penalized,
        cost: raw.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LogicType;
    use crate::netlist::{parse_netlist, PinOrder};
    use crate::test_utils::library;
    use test_case::test_case;

    #[test_case("10 2000 300", Some((10.0, 2000.0, 300.0)); "space separated")]
    #[test_case("1.5,2e3,0.25", Some((1.5, 2000.0, 0.25)); "comma separated")]
    #[test_case("12 34", None; "too few numbers")]
    fn constraint_round_trip(text: &str, want: Option<(f64, f64, f64)>) {
        let name = encode_module_constraints("top", text);
        let got = decode_module_constraints(&name).map(|c| (c.clock_period, c.area, c.power));
        assert_eq!(got, want);
    }

    #[test]
    fn plain_names_have_no_constraints() {
        assert_eq!(decode_module_constraints("top"), None);
        assert_eq!(decode_module_constraints("half_adder"), None);
    }

    fn netlist(name: &str) -> Netlist {
        parse_netlist(
            &format!(
                "module {} (a, b, y);\ninput a, b;\noutput y;\nAND2 g0 ( a , b , y );\nendmodule\n",
                name
            ),
            PinOrder::InputsFirst,
        )
        .unwrap()
    }

    #[test]
    fn cost_with_and_without_penalty() {
        let lib = library(&[("AND2", LogicType::And, 4.0, 2.0)]);
        let c = evaluate(&netlist("top"), &lib).unwrap();
        assert_eq!((c.area, c.static_power), (4.0, 2.0));
        assert_eq!(c.dynamic_power, 0.75);
        assert!(!c.penalized);
        assert_eq!(c.cost, (4.0f64 * 2.75).sqrt());

        let tight = encode_module_constraints("top", "1 3 100");
        let c = evaluate(&netlist(&tight), &lib).unwrap();
        assert!(c.penalized);
        assert_eq!(c.cost, (4.0f64 * 2.75 + 2e7).sqrt());

        let loose = encode_module_constraints("top", "1 100 100");
        assert!(!evaluate(&netlist(&loose), &lib).unwrap().penalized);
    }
}
