// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a cell in its (immutable) [`CellLibrary`](super::CellLibrary).
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CellId(pub usize);

/// Boolean function realized by a single-output cell.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicType {
    Buf,
    Not,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
}

impl LogicType {
    pub const ALL: [LogicType; 8] = [
        LogicType::Buf,
        LogicType::Not,
        LogicType::And,
        LogicType::Nand,
        LogicType::Or,
        LogicType::Nor,
        LogicType::Xor,
        LogicType::Xnor,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            LogicType::Buf => "buf",
            LogicType::Not => "not",
            LogicType::And => "and",
            LogicType::Nand => "nand",
            LogicType::Or => "or",
            LogicType::Nor => "nor",
            LogicType::Xor => "xor",
            LogicType::Xnor => "xnor",
        }
    }

    /// Output complemented relative to the base function.
    pub fn is_inverted(self) -> bool {
        matches!(
            self,
            LogicType::Not | LogicType::Nand | LogicType::Nor | LogicType::Xnor
        )
    }

    pub fn is_unary(self) -> bool {
        matches!(self, LogicType::Buf | LogicType::Not)
    }

    pub fn arity(self) -> usize {
        if self.is_unary() {
            1
        } else {
            2
        }
    }

    /// The non-inverted function sharing this type's base.
    pub fn base(self) -> LogicType {
        match self {
            LogicType::Buf | LogicType::Not => LogicType::Buf,
            LogicType::And | LogicType::Nand => LogicType::And,
            LogicType::Or | LogicType::Nor => LogicType::Or,
            LogicType::Xor | LogicType::Xnor => LogicType::Xor,
        }
    }

    pub fn same_base(self, other: LogicType) -> bool {
        self.base() == other.base()
    }

    /// Truth function; `b` is ignored for unary types.
    pub fn evaluate(self, a: bool, b: bool) -> bool {
        let base = match self.base() {
            LogicType::Buf => a,
            LogicType::And => a && b,
            LogicType::Or => a || b,
            _ => a ^ b,
        };
        base ^ self.is_inverted()
    }

    /// Output set probability assuming independent inputs with set
    /// probabilities `p0` and `p1`.
    pub fn set_probability(self, p0: f64, p1: f64) -> f64 {
        let base = match self.base() {
            LogicType::Buf => p0,
            LogicType::And => p0 * p1,
            LogicType::Or => 1.0 - (1.0 - p0) * (1.0 - p1),
            _ => p0 + p1 - 2.0 * p0 * p1,
        };
        if self.is_inverted() {
            1.0 - base
        } else {
            base
        }
    }
}

impl fmt::Display for LogicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Attributes carried for downstream timing/power models; the mapper itself
/// only reads area, leakage power and the logic type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellAttributes {
    pub propagation_delay: Option<f64>,
    pub transition_delay: Option<f64>,
    pub power_domain: Option<i64>,
    pub capacitance: Option<f64>,
    pub max_capacitance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub name: String,
    pub logic_type: LogicType,
    pub area: f64,
    pub leakage_power: f64,
    #[serde(default)]
    pub attributes: CellAttributes,
}

impl Cell {
    pub fn new(name: &str, logic_type: LogicType, area: f64, leakage_power: f64) -> Self {
        Cell {
            name: name.to_string(),
            logic_type,
            area,
            leakage_power,
            attributes: CellAttributes::default(),
        }
    }
}
