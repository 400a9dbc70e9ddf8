// SPDX-License-Identifier: Apache-2.0

//! Token scanner and parser for the flat gate-level netlists this crate
//! emits (and the ABC pin-order variant).

use crate::netlist::{Netlist, NetlistInstance, PinOrder};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Module,
    Endmodule,
    Input,
    Output,
    Wire,
    Assign,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPayload {
    Identifier(String),
    Keyword(Keyword),
    OParen,
    CParen,
    Semi,
    Comma,
    Equals,
}

impl fmt::Display for TokenPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPayload::Identifier(s) => write!(f, "{}", s),
            TokenPayload::Keyword(k) => write!(f, "{}", format!("{:?}", k).to_lowercase()),
            TokenPayload::OParen => write!(f, "("),
            TokenPayload::CParen => write!(f, ")"),
            TokenPayload::Semi => write!(f, ";"),
            TokenPayload::Comma => write!(f, ","),
            TokenPayload::Equals => write!(f, "="),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub lineno: u32,
    pub colno: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub payload: TokenPayload,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub message: String,
    pub pos: Pos,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.pos.lineno, self.pos.colno, self.message)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '\\'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '[' | ']' | '.')
}

pub struct TokenScanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    pos: Pos,
    lookahead: Option<Token>,
}

impl<'a> TokenScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        TokenScanner {
            chars: text.chars().peekable(),
            pos: Pos {
                lineno: 1,
                colno: 1,
            },
            lookahead: None,
        }
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.pos.lineno += 1;
            self.pos.colno = 1;
        } else {
            self.pos.colno += 1;
        }
        Some(c)
    }

    fn error(&self, message: String) -> ScanError {
        ScanError {
            message,
            pos: self.pos,
        }
    }

    /// Skips whitespace and `//` / `/* */` comments.
    fn skip_trivia(&mut self) -> Result<(), ScanError> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let start = self.pos;
                    self.bump();
                    match self.bump() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            let mut prev = '\0';
                            loop {
                                match self.bump() {
                                    Some('/') if prev == '*' => break,
                                    Some(c) => prev = c,
                                    None => {
                                        return Err(ScanError {
                                            message: "unterminated block comment".to_string(),
                                            pos: start,
                                        })
                                    }
                                }
                            }
                        }
                        _ => {
                            return Err(ScanError {
                                message: "unexpected '/'".to_string(),
                                pos: start,
                            })
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan(&mut self) -> Result<Option<Token>, ScanError> {
        self.skip_trivia()?;
        let pos = self.pos;
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };
        let payload = match c {
            '(' => TokenPayload::OParen,
            ')' => TokenPayload::CParen,
            ';' => TokenPayload::Semi,
            ',' => TokenPayload::Comma,
            '=' => TokenPayload::Equals,
            c if is_ident_start(c) => {
                let mut s = String::new();
                if c == '\\' {
                    // Escaped identifier: runs to the next whitespace.
                    self.bump();
                    while let Some(&c) = self.chars.peek() {
                        if c.is_whitespace() {
                            break;
                        }
                        s.push(c);
                        self.bump();
                    }
                } else {
                    while let Some(&c) = self.chars.peek() {
                        if !is_ident_char(c) {
                            break;
                        }
                        s.push(c);
                        self.bump();
                    }
                }
                let payload = match s.as_str() {
                    "module" => TokenPayload::Keyword(Keyword::Module),
                    "endmodule" => TokenPayload::Keyword(Keyword::Endmodule),
                    "input" => TokenPayload::Keyword(Keyword::Input),
                    "output" => TokenPayload::Keyword(Keyword::Output),
                    "wire" => TokenPayload::Keyword(Keyword::Wire),
                    "assign" => TokenPayload::Keyword(Keyword::Assign),
                    _ => TokenPayload::Identifier(s),
                };
                return Ok(Some(Token { payload, pos }));
            }
            other => return Err(self.error(format!("unexpected character '{}'", other))),
        };
        self.bump();
        Ok(Some(Token { payload, pos }))
    }

    pub fn peekt(&mut self) -> Result<Option<&Token>, ScanError> {
        if self.lookahead.is_none() {
            self.lookahead = self.scan()?;
        }
        Ok(self.lookahead.as_ref())
    }

    pub fn popt(&mut self) -> Result<Option<Token>, ScanError> {
        match self.lookahead.take() {
            Some(t) => Ok(Some(t)),
            None => self.scan(),
        }
    }
}

pub struct Parser<'a> {
    scanner: TokenScanner<'a>,
    pin_order: PinOrder,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str, pin_order: PinOrder) -> Self {
        Parser {
            scanner: TokenScanner::new(text),
            pin_order,
        }
    }

    fn next(&mut self, what: &str) -> Result<Token, ScanError> {
        let pos = self.scanner.pos();
        self.scanner.popt()?.ok_or_else(|| ScanError {
            message: format!("unexpected end of input, expected {}", what),
            pos,
        })
    }

    fn expect(&mut self, want: TokenPayload) -> Result<(), ScanError> {
        let tok = self.next(&format!("'{}'", want))?;
        if tok.payload != want {
            return Err(ScanError {
                message: format!("expected '{}', got '{}'", want, tok.payload),
                pos: tok.pos,
            });
        }
        Ok(())
    }

    fn identifier(&mut self, what: &str) -> Result<String, ScanError> {
        let tok = self.next(what)?;
        match tok.payload {
            TokenPayload::Identifier(s) => Ok(s),
            other => Err(ScanError {
                message: format!("expected {}, got '{}'", what, other),
                pos: tok.pos,
            }),
        }
    }

    fn peek_is(&mut self, want: &TokenPayload) -> Result<bool, ScanError> {
        Ok(self.scanner.peekt()?.map_or(false, |t| &t.payload == want))
    }

    /// `name (, name)* terminator`; an empty list is allowed.
    fn identifier_list(&mut self, terminator: TokenPayload) -> Result<Vec<String>, ScanError> {
        let mut names = Vec::new();
        if self.peek_is(&terminator)? {
            self.scanner.popt()?;
            return Ok(names);
        }
        loop {
            names.push(self.identifier("net name")?);
            let tok = self.next("',' or terminator")?;
            if tok.payload == terminator {
                return Ok(names);
            }
            if tok.payload != TokenPayload::Comma {
                return Err(ScanError {
                    message: format!("expected ',' or '{}', got '{}'", terminator, tok.payload),
                    pos: tok.pos,
                });
            }
        }
    }

    fn instance(&mut self, cell_name: String) -> Result<NetlistInstance, ScanError> {
        let pos = self.scanner.pos();
        let instance_name = if self.peek_is(&TokenPayload::OParen)? {
            None
        } else {
            Some(self.identifier("instance name")?)
        };
        self.expect(TokenPayload::OParen)?;
        let mut pins = self.identifier_list(TokenPayload::CParen)?;
        self.expect(TokenPayload::Semi)?;
        if pins.len() < 2 {
            return Err(ScanError {
                message: format!(
                    "instance of {} needs an output and at least one input, got {} pin(s)",
                    cell_name,
                    pins.len()
                ),
                pos,
            });
        }
        let output = match self.pin_order {
            PinOrder::InputsFirst => pins.pop().unwrap_or_default(),
            PinOrder::OutputFirst => pins.remove(0),
        };
        Ok(NetlistInstance {
            cell_name,
            instance_name,
            inputs: pins,
            output,
        })
    }

    pub fn parse_module(&mut self) -> Result<Netlist, ScanError> {
        self.expect(TokenPayload::Keyword(Keyword::Module))?;
        let module_name = self.identifier("module name")?;
        let mut ports = Vec::new();
        if self.peek_is(&TokenPayload::OParen)? {
            self.scanner.popt()?;
            ports = self.identifier_list(TokenPayload::CParen)?;
        }
        self.expect(TokenPayload::Semi)?;

        let mut netlist = Netlist {
            module_name,
            ports,
            ..Netlist::default()
        };
        loop {
            let tok = self.next("module item or 'endmodule'")?;
            match tok.payload {
                TokenPayload::Keyword(Keyword::Endmodule) => break,
                TokenPayload::Keyword(Keyword::Input) => {
                    netlist.inputs.extend(self.identifier_list(TokenPayload::Semi)?)
                }
                TokenPayload::Keyword(Keyword::Output) => {
                    netlist.outputs.extend(self.identifier_list(TokenPayload::Semi)?)
                }
                TokenPayload::Keyword(Keyword::Wire) => {
                    netlist.wires.extend(self.identifier_list(TokenPayload::Semi)?)
                }
                TokenPayload::Keyword(Keyword::Assign) => {
                    let lhs = self.identifier("assign target")?;
                    self.expect(TokenPayload::Equals)?;
                    let rhs = self.identifier("assign source")?;
                    self.expect(TokenPayload::Semi)?;
                    netlist.assigns.push((lhs, rhs));
                }
                TokenPayload::Identifier(cell_name) => {
                    let inst = self.instance(cell_name)?;
                    netlist.instances.push(inst);
                }
                other => {
                    return Err(ScanError {
                        message: format!("unexpected '{}' in module body", other),
                        pos: tok.pos,
                    })
                }
            }
        }
        if let Some(extra) = self.scanner.peekt()? {
            log::warn!(
                "ignoring content after endmodule at {}:{}",
                extra.pos.lineno,
                extra.pos.colno
            );
        }
        Ok(netlist)
    }
}

pub fn parse_netlist(text: &str, pin_order: PinOrder) -> Result<Netlist, String> {
    Parser::new(text, pin_order)
        .parse_module()
        .map_err(|e| format!("netlist parse error at {}", e))
}

pub fn parse_netlist_file(path: &Path, pin_order: PinOrder) -> Result<Netlist, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_netlist(&text, pin_order).map_err(|e| format!("{}: {}", path.display(), e))
}
