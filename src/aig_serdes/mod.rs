// SPDX-License-Identifier: Apache-2.0

//! AIGER (de)serialization.
//!
//! Readers are event driven: they validate the file syntax and deliver its
//! contents in file order to an [`AigerVisitor`]. Literals are passed through
//! in raw AIGER numbering (constant false is literal 0).

pub mod emit_aiger;
pub mod load_aiger;
pub mod load_aiger_auto;
pub mod load_aiger_binary;

/// The `M I L O A` header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AigerHeader {
    pub max_var: u32,
    pub num_inputs: u32,
    pub num_latches: u32,
    pub num_outputs: u32,
    pub num_ands: u32,
}

/// Receives the sections of an AIGER file in order.
pub trait AigerVisitor {
    fn on_header(&mut self, header: &AigerHeader) -> Result<(), String>;

    fn on_input(&mut self, index: u32, literal: u32) -> Result<(), String>;

    fn on_output(&mut self, index: u32, literal: u32) -> Result<(), String>;

    /// AND gate number `index` defining `lhs = rhs0 & rhs1`.
    fn on_and(&mut self, index: u32, lhs: u32, rhs0: u32, rhs1: u32) -> Result<(), String>;

    fn on_input_name(&mut self, _index: u32, _name: &str) -> Result<(), String> {
        Ok(())
    }

    fn on_output_name(&mut self, _index: u32, _name: &str) -> Result<(), String> {
        Ok(())
    }

    /// One line of the trailing comment section.
    fn on_comment(&mut self, _line: &str) -> Result<(), String> {
        Ok(())
    }
}

pub(crate) fn parse_header(header_line: &str, kind: &str) -> Result<AigerHeader, String> {
    let header_tokens: Vec<&str> = header_line.split_whitespace().collect();
    if header_tokens.len() != 6 {
        return Err(format!(
            "expected 6 tokens in AIGER header, got {} (\"{}\")",
            header_tokens.len(),
            header_line
        ));
    }
    if header_tokens[0] != kind {
        return Err(format!(
            "expected '{}' AIGER header; got '{}'",
            kind, header_tokens[0]
        ));
    }

    let parse_u32 = |s: &str, field: &str| -> Result<u32, String> {
        s.parse::<u32>()
            .map_err(|e| format!("invalid {} value '{}': {}", field, s, e))
    };

    let header = AigerHeader {
        max_var: parse_u32(header_tokens[1], "M")?,
        num_inputs: parse_u32(header_tokens[2], "I")?,
        num_latches: parse_u32(header_tokens[3], "L")?,
        num_outputs: parse_u32(header_tokens[4], "O")?,
        num_ands: parse_u32(header_tokens[5], "A")?,
    };
    if header.num_latches != 0 {
        return Err("latch count (L) must be zero; sequential AIGER not supported".to_string());
    }
    // Every literal up to `2M + 1` must be representable.
    if header.max_var > (u32::MAX - 1) / 2 - 1 {
        return Err(format!("max variable index M={} is too large", header.max_var));
    }
    if header.num_inputs.checked_add(header.num_ands).is_none() {
        return Err(format!("I={} plus A={} overflows", header.num_inputs, header.num_ands));
    }
    Ok(header)
}

/// Delivers the optional symbol table and comment section that follow the
/// AND gates.
pub(crate) fn visit_symbols_and_comments<'a, V: AigerVisitor + ?Sized>(
    lines: impl Iterator<Item = &'a str>,
    visitor: &mut V,
) -> Result<(), String> {
    let mut in_comments = false;
    for line in lines {
        if in_comments {
            visitor.on_comment(line)?;
            continue;
        }
        if line == "c" || line.starts_with("c ") {
            in_comments = true;
            let rest = line[1..].trim();
            if !rest.is_empty() {
                visitor.on_comment(rest)?;
            }
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let kind_len = line.chars().next().map_or(0, char::len_utf8);
        let (kind, rest) = line.split_at(kind_len);
        let (idx_str, name) = rest
            .split_once(' ')
            .ok_or_else(|| format!("malformed symbol '{}': missing name", line))?;
        let idx: u32 = idx_str
            .parse()
            .map_err(|e| format!("invalid symbol index in '{}': {}", line, e))?;
        match kind {
            "i" => visitor.on_input_name(idx, name)?,
            "o" => visitor.on_output_name(idx, name)?,
            "l" => return Err(format!("latch symbol '{}' in combinational file", line)),
            _ => return Err(format!("unrecognized symbol table entry '{}'", line)),
        }
    }
    Ok(())
}
