// SPDX-License-Identifier: Apache-2.0

pub mod builder;
pub mod eval;
pub mod graph;
pub mod literal;

pub use builder::LogicGraphBuilder;
pub use graph::{LogicGraph, Node};
pub use literal::{Literal, Var};
