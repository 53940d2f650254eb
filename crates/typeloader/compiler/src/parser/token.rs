// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Token definitions for declarative documents

use std::fmt;
use typeloader_common::Location;

/// A token in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Location of the first character
    pub location: Location,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Whether a line break separates this token from the previous one
    pub newline_before: bool,
}

/// Token categories
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    StringLiteral(String),
    /// Numeric literal; the lexeme is kept so versions like `2.15` survive
    NumberLiteral { value: f64, lexeme: String },
    /// `{ } ( ) [ ] : ; , .`
    Punctuator(char),
    /// Any other operator, e.g. `+`, `===`, `=>`
    Operator(String),
    Eof,
}

impl Token {
    pub fn is_punctuator(&self, ch: char) -> bool {
        self.kind == TokenKind::Punctuator(ch)
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Identifier(ident) if ident == name)
    }

    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(ident) => write!(f, "{}", ident),
            TokenKind::StringLiteral(value) => write!(f, "\"{}\"", value),
            TokenKind::NumberLiteral { lexeme, .. } => write!(f, "{}", lexeme),
            TokenKind::Punctuator(ch) => write!(f, "{}", ch),
            TokenKind::Operator(op) => write!(f, "{}", op),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
