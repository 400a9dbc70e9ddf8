// SPDX-License-Identifier: Apache-2.0

use crate::aig::Literal;
use crate::library::LogicType;

/// Fatal lookup failures while building or editing a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// A candidate of this type was bound but the library has no such cell.
    NoCellForType(LogicType),
    /// The default AND/INVERTER realization needs a cell of this type.
    MissingDefaultCell(LogicType),
    UnknownCell(String),
    CellTypeMismatch { cell: String, expected: LogicType },
    /// Asserted primary inputs are driven externally.
    NoDefaultGate(Literal),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::NoCellForType(t) => write!(f, "mapping error: no library cell of type {}", t),
            MapError::MissingDefaultCell(t) => write!(
                f,
                "mapping error: library has no {} cell for the default realization",
                t
            ),
            MapError::UnknownCell(name) => write!(f, "mapping error: unknown cell '{}'", name),
            MapError::CellTypeMismatch { cell, expected } => write!(
                f,
                "mapping error: cell '{}' is not of type {}",
                cell, expected
            ),
            MapError::NoDefaultGate(lit) => {
                write!(f, "mapping error: literal {} has no default gate", lit)
            }
        }
    }
}

impl std::error::Error for MapError {}
