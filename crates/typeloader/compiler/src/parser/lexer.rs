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

//! Lexical analyzer for declarative documents

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::token::{Token, TokenKind};
use std::iter::Peekable;
use std::str::CharIndices;
use typeloader_common::Location;

const OPERATOR_CHARS: &str = "+-*/%=!<>&|^~?";

/// Tokenizer over one source text
pub struct QmlLexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    location: Location,
    newline_before: bool,
}

impl<'a> QmlLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            location: Location::start(),
            newline_before: false,
        }
    }

    /// Tokenize the entire input; the last token is always [`TokenKind::Eof`]
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|(offset, _)| *offset).unwrap_or(self.source.len())
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, ch)| ch)
    }

    fn next_char(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        self.location.advance(ch);
        Some(ch)
    }

    fn skip_trivia(&mut self) -> ParseResult<()> {
        while let Some(ch) = self.peek_char() {
            match ch {
                '\n' => {
                    self.newline_before = true;
                    self.next_char();
                }
                c if c.is_whitespace() => {
                    self.next_char();
                }
                '/' if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.next_char();
                    }
                }
                '/' if self.peek_second() == Some('*') => {
                    let start = self.location;
                    self.next_char();
                    self.next_char();
                    let mut closed = false;
                    while let Some(c) = self.next_char() {
                        if c == '\n' {
                            self.newline_before = true;
                        }
                        if c == '*' && self.peek_char() == Some('/') {
                            self.next_char();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(ParseError::new(ParseErrorKind::UnterminatedComment, start, "Unterminated comment"));
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_trivia()?;
        let location = self.location;
        let start = self.offset();
        let newline_before = std::mem::take(&mut self.newline_before);

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(ch) if "{}()[]:;,.".contains(ch) => {
                self.next_char();
                TokenKind::Punctuator(ch)
            }
            Some(ch) if OPERATOR_CHARS.contains(ch) => {
                let mut op = String::new();
                while let Some(c) = self.peek_char() {
                    if !OPERATOR_CHARS.contains(c) || (c == '/' && matches!(self.peek_second(), Some('/') | Some('*'))) {
                        break;
                    }
                    op.push(c);
                    self.next_char();
                }
                TokenKind::Operator(op)
            }
            Some(quote @ ('"' | '\'' | '`')) => self.scan_string(quote, location)?,
            Some(ch) if ch.is_ascii_digit() => self.scan_number(location)?,
            Some(ch) if is_identifier_start(ch) => {
                let mut ident = String::new();
                while let Some(c) = self.peek_char().filter(|c| is_identifier_continue(*c)) {
                    ident.push(c);
                    self.next_char();
                }
                TokenKind::Identifier(ident)
            }
            Some(ch) => return Err(ParseError::new(ParseErrorKind::InvalidCharacter, location, format!("Unexpected character '{}'", ch))),
        };

        let end = self.offset();
        Ok(Token {
            kind,
            location,
            start,
            end,
            newline_before,
        })
    }

    fn scan_string(&mut self, quote: char, start: Location) -> ParseResult<TokenKind> {
        self.next_char();
        let mut value = String::new();
        loop {
            let Some(ch) = self.next_char() else {
                return Err(ParseError::new(ParseErrorKind::UnterminatedString, start, "Unterminated string literal"));
            };
            match ch {
                c if c == quote => return Ok(TokenKind::StringLiteral(value)),
                '\n' if quote != '`' => {
                    return Err(ParseError::new(ParseErrorKind::UnterminatedString, start, "Unterminated string literal"));
                }
                '\\' => {
                    let escape_location = self.location;
                    let Some(escaped) = self.next_char() else {
                        return Err(ParseError::new(ParseErrorKind::UnterminatedString, start, "Unterminated string literal"));
                    };
                    match escaped {
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'v' => value.push('\u{b}'),
                        '0' => value.push('\0'),
                        '\n' => {}
                        'u' => {
                            let mut hex = String::new();
                            for _ in 0..4 {
                                match self.peek_char().filter(|c| c.is_ascii_hexdigit()) {
                                    Some(c) => {
                                        hex.push(c);
                                        self.next_char();
                                    }
                                    None => break,
                                }
                            }
                            let decoded = u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == 4).and_then(char::from_u32);
                            match decoded {
                                Some(c) => value.push(c),
                                None => {
                                    return Err(ParseError::new(ParseErrorKind::InvalidEscapeSequence, escape_location, format!("Invalid escape sequence: \\u{}", hex)));
                                }
                            }
                        }
                        other => value.push(other),
                    }
                }
                other => value.push(other),
            }
        }
    }

    fn scan_number(&mut self, start: Location) -> ParseResult<TokenKind> {
        let mut lexeme = String::new();
        let take_digits = |lexer: &mut Self, lexeme: &mut String, radix: u32| {
            while let Some(c) = lexer.peek_char().filter(|c| c.is_digit(radix)) {
                lexeme.push(c);
                lexer.next_char();
            }
        };

        if self.peek_char() == Some('0') && matches!(self.peek_second(), Some('x') | Some('X')) {
            self.next_char();
            self.next_char();
            take_digits(self, &mut lexeme, 16);
            let value = i64::from_str_radix(&lexeme, 16)
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber, start, format!("Invalid hexadecimal literal: 0x{}", lexeme)))?;
            return Ok(TokenKind::NumberLiteral {
                value: value as f64,
                lexeme: format!("0x{}", lexeme),
            });
        }

        take_digits(self, &mut lexeme, 10);
        if self.peek_char() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            lexeme.push('.');
            self.next_char();
            take_digits(self, &mut lexeme, 10);
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            lexeme.push('e');
            self.next_char();
            if let Some(sign) = self.peek_char().filter(|c| *c == '+' || *c == '-') {
                lexeme.push(sign);
                self.next_char();
            }
            let before = lexeme.len();
            take_digits(self, &mut lexeme, 10);
            if lexeme.len() == before {
                return Err(ParseError::new(ParseErrorKind::InvalidNumber, start, "Invalid number: missing exponent digits"));
            }
        }

        let value = lexeme
            .parse::<f64>()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber, start, format!("Invalid number literal: {}", lexeme)))?;
        Ok(TokenKind::NumberLiteral { value, lexeme })
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}
