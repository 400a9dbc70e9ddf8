// SPDX-License-Identifier: Apache-2.0

//! Reads a binary AIGER ("aig") file.
//!
//! Inputs are implicit (input `k` is literal `2(k+1)`) and AND gates are
//! delta-encoded as two LEB128-style varints per gate. Only purely
//! combinational files (L == 0) are accepted.

use crate::aig::{LogicGraph, LogicGraphBuilder};
use crate::aig_serdes::{parse_header, visit_symbols_and_comments, AigerVisitor};
use std::fs;
use std::path::Path;

/// Parses a binary-AIGER file from disk.
pub fn load_aiger_binary_from_path(path: &Path) -> Result<LogicGraph, String> {
    let contents =
        fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    load_aiger_binary(&contents)
}

/// Parses the provided binary-AIGER bytes into a [`LogicGraph`].
pub fn load_aiger_binary(src: &[u8]) -> Result<LogicGraph, String> {
    let mut builder = LogicGraphBuilder::default();
    visit_aiger_binary(src, &mut builder)?;
    builder.finish()
}

/// Streams a binary-AIGER file into `visitor`.
pub fn visit_aiger_binary<V: AigerVisitor + ?Sized>(
    src: &[u8],
    visitor: &mut V,
) -> Result<(), String> {
    let (header_line, mut cursor) = read_ascii_line(src, 0)?;
    let header = parse_header(&header_line, "aig")?;
    visitor.on_header(&header)?;

    for idx in 0..header.num_inputs {
        visitor.on_input(idx, 2 * (idx + 1))?;
    }

    for idx in 0..header.num_outputs {
        let (line, next_cursor) = read_ascii_line(src, cursor)?;
        cursor = next_cursor;
        let lit_val: u32 = line
            .trim()
            .parse()
            .map_err(|e| format!("invalid output literal '{}': {}", line, e))?;
        visitor.on_output(idx, lit_val)?;
    }

    for and_idx in 0..header.num_ands {
        let delta0 = decode_u32_varint(src, &mut cursor)?;
        let delta1 = decode_u32_varint(src, &mut cursor)?;
        let lhs_var = header.num_inputs + and_idx + 1;
        let lhs_lit = lhs_var << 1;
        let rhs0 = lhs_lit
            .checked_sub(delta0)
            .ok_or_else(|| format!("invalid AIGER delta0 {} for lhs {}", delta0, lhs_lit))?;
        let rhs1 = rhs0
            .checked_sub(delta1)
            .ok_or_else(|| format!("invalid AIGER delta1 {} for rhs0 {}", delta1, rhs0))?;
        visitor.on_and(and_idx, lhs_lit, rhs0, rhs1)?;
    }

    let remaining = &src[cursor..];
    let tail = std::str::from_utf8(remaining)
        .map_err(|e| format!("invalid UTF-8 in symbol/comment tail: {}", e))?;
    visit_symbols_and_comments(tail.lines(), visitor)
}

fn read_ascii_line(src: &[u8], start: usize) -> Result<(String, usize), String> {
    if start >= src.len() {
        return Err("unexpected EOF while reading ASCII line".to_string());
    }
    let end = src[start..]
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| "unterminated ASCII line in AIGER input".to_string())?;
    let line_bytes = &src[start..start + end];
    let line = std::str::from_utf8(line_bytes)
        .map_err(|e| format!("invalid UTF-8 in AIGER line: {}", e))?;
    Ok((line.to_string(), start + end + 1))
}

fn decode_u32_varint(src: &[u8], cursor: &mut usize) -> Result<u32, String> {
    let mut shift = 0u32;
    let mut acc = 0u32;
    loop {
        if *cursor >= src.len() {
            return Err("unexpected EOF while reading AIGER varint".to_string());
        }
        let byte = src[*cursor];
        *cursor += 1;
        acc |= ((byte & 0x7f) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(acc);
        }
        shift += 7;
        if shift >= 32 {
            return Err("AIGER varint overflow".to_string());
        }
    }
}
