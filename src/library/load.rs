// SPDX-License-Identifier: Apache-2.0

//! Loads a cell library from its JSON description:
//!
//! ```json
//! {"information": {"cell_num": "2", "attribute_num": "7", "attributes": [...]},
//!  "cells": [{"cell_name": "and_1", "cell_type": "and",
//!             "data_1_f": "0.1", ..., "data_6_f": "1.0", ...}]}
//! ```
//!
//! Numeric fields may be written as JSON numbers or as strings. The
//! positional attributes are `data_1_f` propagation delay, `data_2_f`
//! transition delay, `data_3_i` power domain, `data_4_f` leakage power,
//! `data_5_f` capacitance, `data_6_f` area and `data_7_f` max capacitance.

use crate::library::cell::{Cell, CellAttributes, LogicType};
use crate::library::CellLibrary;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn as_f64(&self, field: &str, cell: &str) -> Result<f64, String> {
        match self {
            NumberOrString::Number(v) => Ok(*v),
            NumberOrString::String(s) => s.trim().parse::<f64>().map_err(|e| {
                format!("cell '{}': invalid {} value '{}': {}", cell, field, s, e)
            }),
        }
    }

    fn as_i64(&self, field: &str, cell: &str) -> Result<i64, String> {
        match self {
            NumberOrString::Number(v) if v.fract() == 0.0 => Ok(*v as i64),
            NumberOrString::Number(v) => Err(format!(
                "cell '{}': {} must be an integer, got {}",
                cell, field, v
            )),
            NumberOrString::String(s) => s.trim().parse::<i64>().map_err(|e| {
                format!("cell '{}': invalid {} value '{}': {}", cell, field, s, e)
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LibraryInformation {
    #[serde(default)]
    cell_num: Option<NumberOrString>,
    #[serde(default)]
    attribute_num: Option<NumberOrString>,
    #[serde(default)]
    attributes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CellRecord {
    cell_name: String,
    cell_type: String,
    #[serde(default)]
    data_1_f: Option<NumberOrString>,
    #[serde(default)]
    data_2_f: Option<NumberOrString>,
    #[serde(default)]
    data_3_i: Option<NumberOrString>,
    data_4_f: NumberOrString,
    #[serde(default)]
    data_5_f: Option<NumberOrString>,
    data_6_f: NumberOrString,
    #[serde(default)]
    data_7_f: Option<NumberOrString>,
}

#[derive(Debug, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    information: Option<LibraryInformation>,
    cells: Vec<CellRecord>,
}

fn optional_f64(
    v: &Option<NumberOrString>,
    field: &str,
    cell: &str,
) -> Result<Option<f64>, String> {
    v.as_ref().map(|v| v.as_f64(field, cell)).transpose()
}

impl CellRecord {
    fn into_cell(self) -> Result<Cell, String> {
        let name = self.cell_name;
        let logic_type = LogicType::from_name(self.cell_type.trim()).ok_or_else(|| {
            format!(
                "cell '{}': unknown cell_type '{}'",
                name, self.cell_type
            )
        })?;
        let leakage_power = self.data_4_f.as_f64("data_4_f", &name)?;
        let area = self.data_6_f.as_f64("data_6_f", &name)?;
        if !(area.is_finite() && leakage_power.is_finite()) {
            return Err(format!("cell '{}': area and leakage must be finite", name));
        }
        let attributes = CellAttributes {
            propagation_delay: optional_f64(&self.data_1_f, "data_1_f", &name)?,
            transition_delay: optional_f64(&self.data_2_f, "data_2_f", &name)?,
            power_domain: self
                .data_3_i
                .as_ref()
                .map(|v| v.as_i64("data_3_i", &name))
                .transpose()?,
            capacitance: optional_f64(&self.data_5_f, "data_5_f", &name)?,
            max_capacitance: optional_f64(&self.data_7_f, "data_7_f", &name)?,
        };
        Ok(Cell {
            name,
            logic_type,
            area,
            leakage_power,
            attributes,
        })
    }
}

/// Parses a JSON cell library.
pub fn load_library(src: &str) -> Result<CellLibrary, String> {
    let file: LibraryFile =
        serde_json::from_str(src).map_err(|e| format!("invalid cell library JSON: {}", e))?;

    let declared_cells = match &file.information {
        Some(info) => {
            log::debug!(
                "library declares {:?} attribute(s): {}",
                info.attribute_num,
                info.attributes.join(", ")
            );
            info.cell_num
                .as_ref()
                .map(|v| v.as_i64("cell_num", "<information>"))
                .transpose()?
        }
        None => None,
    };
    if let Some(n) = declared_cells {
        if n != file.cells.len() as i64 {
            log::warn!(
                "library information declares {} cells but {} are listed",
                n,
                file.cells.len()
            );
        }
    }

    let cells = file
        .cells
        .into_iter()
        .map(CellRecord::into_cell)
        .collect::<Result<Vec<Cell>, String>>()?;
    CellLibrary::new(cells)
}

pub fn load_library_from_path(path: &Path) -> Result<CellLibrary, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    load_library(&text).map_err(|e| format!("{}: {}", path.display(), e))
}
