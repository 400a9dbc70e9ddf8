// SPDX-License-Identifier: Apache-2.0

//! Auto-detect and load either ASCII or binary AIGER files.

use crate::aig::LogicGraph;
use crate::aig_serdes::load_aiger::load_aiger;
use crate::aig_serdes::load_aiger_binary::load_aiger_binary;
use std::fs;
use std::path::Path;

/// Parses an ASCII (`.aag`) or binary (`.aig`) AIGER file from disk.
pub fn load_aiger_auto_from_path(path: &Path) -> Result<LogicGraph, String> {
    let contents =
        fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    load_aiger_auto(&contents).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Parses either ASCII or binary AIGER bytes, dispatching based on the header.
pub fn load_aiger_auto(src: &[u8]) -> Result<LogicGraph, String> {
    let header_line_end = src
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| "unterminated AIGER header".to_string())?;
    let header_line = std::str::from_utf8(&src[..header_line_end])
        .map_err(|e| format!("invalid UTF-8 in AIGER header: {}", e))?;
    let header_kind = header_line
        .split_whitespace()
        .next()
        .ok_or_else(|| "missing AIGER header token".to_string())?;
    match header_kind {
        "aag" => {
            let text = std::str::from_utf8(src)
                .map_err(|e| format!("invalid UTF-8 in ASCII AIGER input: {}", e))?;
            load_aiger(text)
        }
        "aig" => load_aiger_binary(src),
        other => Err(format!("unknown AIGER header '{}'", other)),
    }
}
