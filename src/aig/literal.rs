// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// A graph variable: a primary input or the output of an AND gate.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Var(pub u32);

impl Var {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn asserted(self) -> Literal {
        Literal(self.0 << 1)
    }

    pub fn complemented(self) -> Literal {
        Literal((self.0 << 1) | 1)
    }
}

/// A signal reference: `var * 2` for the asserted polarity, `var * 2 + 1`
/// for the complemented one.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Literal(pub u32);

impl Literal {
    pub fn new(var: Var, complemented: bool) -> Self {
        Literal((var.0 << 1) | complemented as u32)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    pub fn is_complemented(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn negate(self) -> Self {
        Literal(self.0 ^ 1)
    }

    /// The literal with the invert bit cleared.
    pub fn asserted(self) -> Self {
        Literal(self.0 & !1)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complemented() {
            write!(f, "!v{}", self.0 >> 1)
        } else {
            write!(f, "v{}", self.0 >> 1)
        }
    }
}
