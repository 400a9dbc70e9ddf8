// SPDX-License-Identifier: Apache-2.0

//! Running area/power ledger.
//!
//! Contributions are accumulated in signed fixed point with 64 fractional
//! bits, so adding and later subtracting the same contribution restores the
//! ledger bit-for-bit regardless of the order of intervening updates.

use crate::library::Cell;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

const FIXED_ONE: f64 = 18446744073709551616.0; // 2^64

fn to_fixed(v: f64) -> i128 {
    (v * FIXED_ONE).round() as i128
}

fn from_fixed(v: i128) -> f64 {
    v as f64 / FIXED_ONE
}

/// Cost of one active gate, in ledger units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contribution {
    area: i128,
    static_power: i128,
    dynamic_power: i128,
}

impl Contribution {
    /// `{area, leakage, leakage * q}` of `cell` driving a net with switching
    /// factor `q`.
    pub fn of(cell: &Cell, switching_factor: f64) -> Self {
        Contribution {
            area: to_fixed(cell.area),
            static_power: to_fixed(cell.leakage_power),
            dynamic_power: to_fixed(cell.leakage_power * switching_factor),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostLedger {
    area: i128,
    static_power: i128,
    dynamic_power: i128,
}

impl CostLedger {
    pub fn add(&mut self, c: Contribution) {
        self.area += c.area;
        self.static_power += c.static_power;
        self.dynamic_power += c.dynamic_power;
    }

    pub fn subtract(&mut self, c: Contribution) {
        self.area -= c.area;
        self.static_power -= c.static_power;
        self.dynamic_power -= c.dynamic_power;
    }

    pub fn cost(&self) -> Cost {
        Cost {
            area: from_fixed(self.area),
            static_power: from_fixed(self.static_power),
            dynamic_power: from_fixed(self.dynamic_power),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Cost {
    pub area: f64,
    pub static_power: f64,
    pub dynamic_power: f64,
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "area={:.6} static_power={:.6} dynamic_power={:.6}",
            self.area, self.static_power, self.dynamic_power
        )
    }
}

/// Scalar cost minimized by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Objective {
    /// Total cell area.
    Area,
    /// `area + static_power`.
    #[default]
    AreaPlusPower,
    /// `sqrt((1 + area) * (1 + static_power + dynamic_power))`.
    Product,
}

impl Objective {
    pub fn metric(&self, c: &Cost) -> f64 {
        match self {
            Objective::Area => c.area,
            Objective::AreaPlusPower => c.area + c.static_power,
            Objective::Product => {
                ((1.0 + c.area) * (1.0 + c.static_power + c.dynamic_power)).sqrt()
            }
        }
    }
}
