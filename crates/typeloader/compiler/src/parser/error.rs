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

//! Parser error types and handling

use std::fmt;
use thiserror::Error;
use typeloader_common::{ErrorKind, Location, QmlError};
use url::Url;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Main error type for parsing operations
#[derive(Error, Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The kind of error
    pub kind: ParseErrorKind,
    /// Location where the error occurred
    pub location: Location,
    /// Human-readable error message
    pub message: String,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(kind: ParseErrorKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            message: message.into(),
        }
    }

    /// Create an unexpected token error
    pub fn unexpected_token(location: Location, found: &str, expected: Option<&str>) -> Self {
        let message = match expected {
            Some(expected) => format!("Expected token `{}`, found `{}`", expected, found),
            None => format!("Unexpected token `{}`", found),
        };
        Self::new(ParseErrorKind::UnexpectedToken, location, message)
    }

    /// Create an unexpected end of file error
    pub fn unexpected_eof(location: Location) -> Self {
        Self::new(ParseErrorKind::UnexpectedEof, location, "Unexpected end of file")
    }

    /// Get detailed error information for debugging
    pub fn debug_message(&self) -> String {
        format!("[{}] {} at {}: {}", self.kind.code(), self.kind.description(), self.location, self.message)
    }

    /// Convert into the user-facing error record of `url`
    pub fn to_qml_error(&self, url: &Url) -> QmlError {
        QmlError::new(ErrorKind::Parse, self.message.clone()).with_url(url).with_location(self.location)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}: {}", self.kind.description(), self.location.line, self.location.column, self.message)
    }
}

/// Categories of parse errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Invalid character")]
    InvalidCharacter,

    #[error("Invalid number")]
    InvalidNumber,

    #[error("Invalid escape sequence")]
    InvalidEscapeSequence,

    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Unterminated comment")]
    UnterminatedComment,

    #[error("Unexpected token")]
    UnexpectedToken,

    #[error("Unexpected end of file")]
    UnexpectedEof,

    /// Import statement with a bad uri, version or qualifier
    #[error("Invalid import")]
    InvalidImport,

    /// Malformed property, signal, function or enum declaration
    #[error("Invalid declaration")]
    InvalidDeclaration,

    /// A second root object, or no root object at all
    #[error("Invalid root object")]
    InvalidRoot,

    /// Nesting deeper than the parser is willing to follow
    #[error("Recursion limit exceeded")]
    RecursionLimitExceeded,
}

impl ParseErrorKind {
    /// Get a short error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::InvalidCharacter => "P001",
            ParseErrorKind::InvalidNumber => "P002",
            ParseErrorKind::InvalidEscapeSequence => "P003",
            ParseErrorKind::UnterminatedString => "P004",
            ParseErrorKind::UnterminatedComment => "P005",
            ParseErrorKind::UnexpectedToken => "P006",
            ParseErrorKind::UnexpectedEof => "P007",
            ParseErrorKind::InvalidImport => "P008",
            ParseErrorKind::InvalidDeclaration => "P009",
            ParseErrorKind::InvalidRoot => "P010",
            ParseErrorKind::RecursionLimitExceeded => "P011",
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ParseErrorKind::InvalidCharacter => "Invalid character",
            ParseErrorKind::InvalidNumber => "Invalid number format",
            ParseErrorKind::InvalidEscapeSequence => "Invalid escape sequence",
            ParseErrorKind::UnterminatedString => "Unterminated string literal",
            ParseErrorKind::UnterminatedComment => "Unterminated comment",
            ParseErrorKind::UnexpectedToken => "Unexpected token",
            ParseErrorKind::UnexpectedEof => "Unexpected end of file",
            ParseErrorKind::InvalidImport => "Invalid import",
            ParseErrorKind::InvalidDeclaration => "Invalid declaration",
            ParseErrorKind::InvalidRoot => "Invalid root object",
            ParseErrorKind::RecursionLimitExceeded => "Recursion limit exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_token_message() {
        let error = ParseError::unexpected_token(Location::new(3, 7), ";", Some("}"));
        assert_eq!(error.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(error.message, "Expected token `}`, found `;`");
        assert!(error.debug_message().starts_with("[P006]"));
    }

    #[test]
    fn test_conversion_to_error_record() {
        let url = Url::parse("file:///app/B.qml").unwrap();
        let record = ParseError::unexpected_eof(Location::new(9, 1)).to_qml_error(&url);
        assert_eq!(record.kind, ErrorKind::Parse);
        assert_eq!((record.line, record.column), (9, 1));
        assert_eq!(record.to_string(), "file:///app/B.qml:9:1: Unexpected end of file");
    }
}
