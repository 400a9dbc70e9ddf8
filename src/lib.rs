// SPDX-License-Identifier: Apache-2.0

pub mod aig;
pub mod aig_serdes;
pub mod config;
pub mod emit_netlist;
pub mod library;
pub mod map_error;
pub mod mapping;
pub mod netlist;
pub mod process_aig_path;
pub mod test_utils;
pub mod timing;
pub mod transitions;

pub use map_error::MapError;
