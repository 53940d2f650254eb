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

//! Recursive-descent parser producing a [`Document`]

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::QmlLexer;
use super::token::{Token, TokenKind};
use crate::document::{Binding, BindingValue, Document, EnumDecl, ImportKind, ImportRecord, MethodDecl, Pragma, PropertyDecl, QmlObject, SignalDecl, starts_uppercase};
use tracing::trace;
use typeloader_common::{Location, Version};
use url::Url;

const MAX_NESTING: usize = 256;

/// Parse `source` as the document at `url`
pub fn parse_document(url: &Url, source: &str) -> ParseResult<Document> {
    let tokens = QmlLexer::new(source).tokenize()?;
    trace!(url = %url, tokens = tokens.len(), "Parsing document");
    let mut parser = DocumentParser {
        source,
        tokens,
        pos: 0,
        objects: Vec::new(),
        depth: 0,
    };
    let (imports, pragmas) = parser.parse_header()?;
    parser.parse_root()?;
    Ok(Document {
        url: url.clone(),
        imports,
        pragmas,
        objects: parser.objects,
        source_checksum: *blake3::hash(source.as_bytes()).as_bytes(),
    })
}

struct DocumentParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    objects: Vec<QmlObject>,
    depth: usize,
}

impl DocumentParser<'_> {
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn eat_punctuator(&mut self, ch: char) -> bool {
        if self.peek().is_punctuator(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: Option<&str>) -> ParseError {
        let token = self.peek();
        if token.is_eof() {
            return ParseError::unexpected_eof(token.location);
        }
        ParseError::unexpected_token(token.location, &token.kind.to_string(), expected)
    }

    fn expect_punctuator(&mut self, ch: char) -> ParseResult<Token> {
        if self.peek().is_punctuator(ch) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(Some(&ch.to_string())))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<(String, Location)> {
        let token = self.peek();
        match token.identifier() {
            Some(ident) => {
                let result = (ident.to_string(), token.location);
                self.pos += 1;
                Ok(result)
            }
            None => Err(self.unexpected(Some("identifier"))),
        }
    }

    /// `a.b.c`
    fn parse_dotted(&mut self) -> ParseResult<(Vec<String>, Location)> {
        let (first, location) = self.expect_identifier()?;
        let mut segments = vec![first];
        while self.peek().is_punctuator('.') && self.peek_at(1).identifier().is_some() {
            self.pos += 1;
            segments.push(self.expect_identifier()?.0);
        }
        Ok((segments, location))
    }

    fn parse_header(&mut self) -> ParseResult<(Vec<ImportRecord>, Vec<Pragma>)> {
        let mut imports = Vec::new();
        let mut pragmas = Vec::new();
        loop {
            if self.peek().is_identifier("import") {
                imports.push(self.parse_import()?);
            } else if self.peek().is_identifier("pragma") {
                pragmas.push(self.parse_pragma()?);
            } else {
                return Ok((imports, pragmas));
            }
            self.eat_punctuator(';');
        }
    }

    fn parse_import(&mut self) -> ParseResult<ImportRecord> {
        let location = self.advance().location;
        let kind = match &self.peek().kind {
            TokenKind::StringLiteral(path) => {
                let path = path.clone();
                self.pos += 1;
                if path.ends_with(".js") || path.ends_with(".mjs") {
                    ImportKind::Script { path }
                } else {
                    ImportKind::Directory { path }
                }
            }
            TokenKind::Identifier(_) => ImportKind::Module { uri: self.parse_dotted()?.0.join(".") },
            _ => return Err(self.unexpected(Some("module identifier or path"))),
        };

        let version = match &self.peek().kind {
            TokenKind::NumberLiteral { lexeme, .. } => {
                let version_location = self.peek().location;
                let version = lexeme
                    .parse::<Version>()
                    .map_err(|_| ParseError::new(ParseErrorKind::InvalidImport, version_location, format!("Invalid import version \"{}\"", lexeme)))?;
                self.pos += 1;
                Some(version)
            }
            _ => None,
        };

        let qualifier = if self.peek().is_identifier("as") {
            self.pos += 1;
            let (qualifier, qualifier_location) = self.expect_identifier()?;
            if !starts_uppercase(&qualifier) {
                return Err(ParseError::new(ParseErrorKind::InvalidImport, qualifier_location, "Invalid import qualifier ID"));
            }
            Some(qualifier)
        } else {
            None
        };

        if matches!(kind, ImportKind::Script { .. }) && qualifier.is_none() {
            return Err(ParseError::new(ParseErrorKind::InvalidImport, location, "Script import requires a qualifier"));
        }

        Ok(ImportRecord {
            kind,
            version,
            qualifier,
            location,
        })
    }

    fn parse_pragma(&mut self) -> ParseResult<Pragma> {
        let location = self.advance().location;
        let (name, _) = self.expect_identifier()?;
        let value = if self.eat_punctuator(':') { Some(self.expect_identifier()?.0) } else { None };
        Ok(Pragma { name, value, location })
    }

    fn parse_root(&mut self) -> ParseResult<()> {
        if self.peek().is_eof() {
            return Err(ParseError::new(ParseErrorKind::InvalidRoot, self.peek().location, "Expected a root object"));
        }
        let (type_name, location) = self.parse_dotted()?;
        self.parse_object(&type_name.join("."), location)?;
        if !self.peek().is_eof() {
            return Err(ParseError::new(ParseErrorKind::InvalidRoot, self.peek().location, "Expected only one root object"));
        }
        Ok(())
    }

    /// Parse `{ members }` of an object whose type name was already consumed
    fn parse_object(&mut self, type_name: &str, location: Location) -> ParseResult<usize> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ParseError::new(ParseErrorKind::RecursionLimitExceeded, location, "Objects are nested too deeply"));
        }
        let index = self.objects.len();
        self.objects.push(QmlObject::new(type_name, location));
        self.expect_punctuator('{')?;
        self.parse_members(index, &[])?;
        self.expect_punctuator('}')?;
        self.depth -= 1;
        Ok(index)
    }

    fn parse_members(&mut self, object: usize, prefix: &[String]) -> ParseResult<()> {
        loop {
            while self.eat_punctuator(';') {}
            let token = self.peek();
            if token.is_punctuator('}') || token.is_eof() {
                return Ok(());
            }
            let Some(ident) = token.identifier().map(str::to_string) else {
                return Err(self.unexpected(Some("}")));
            };
            let next_is_colon = self.peek_at(1).is_punctuator(':');

            match ident.as_str() {
                "id" if next_is_colon && prefix.is_empty() => {
                    self.pos += 2;
                    let (id, _) = self.expect_identifier()?;
                    self.objects[object].id = Some(id);
                }
                "property" | "readonly" | "default" | "required" if !next_is_colon && prefix.is_empty() => self.parse_property(object)?,
                "signal" if !next_is_colon && prefix.is_empty() => self.parse_signal(object)?,
                "function" if !next_is_colon && prefix.is_empty() => self.parse_function(object)?,
                "enum" if !next_is_colon && prefix.is_empty() => self.parse_enum(object)?,
                _ => self.parse_binding_or_child(object, prefix)?,
            }
        }
    }

    fn parse_binding_or_child(&mut self, object: usize, prefix: &[String]) -> ParseResult<()> {
        let (path, location) = self.parse_dotted()?;
        let last_is_type = path.last().is_some_and(|segment| starts_uppercase(segment));

        if self.peek().is_punctuator('{') {
            if last_is_type {
                let child = self.parse_object(&path.join("."), location)?;
                self.objects[object].children.push(child);
            } else {
                self.pos += 1;
                let full: Vec<String> = prefix.iter().cloned().chain(path).collect();
                self.parse_members(object, &full)?;
                self.expect_punctuator('}')?;
            }
            return Ok(());
        }

        self.expect_punctuator(':')?;
        let value = self.parse_binding_value()?;
        self.objects[object].bindings.push(Binding {
            path: prefix.iter().cloned().chain(path).collect(),
            value,
            location,
            is_initializer: false,
        });
        Ok(())
    }

    fn parse_property(&mut self, object: usize) -> ParseResult<()> {
        let mut readonly = false;
        let mut is_default = false;
        let mut is_required = false;
        let location = self.peek().location;
        loop {
            let (word, word_location) = self.expect_identifier()?;
            match word.as_str() {
                "readonly" => readonly = true,
                "default" => is_default = true,
                "required" => is_required = true,
                "property" => break,
                other => {
                    return Err(ParseError::new(ParseErrorKind::InvalidDeclaration, word_location, format!("Unexpected property modifier \"{}\"", other)));
                }
            }
        }

        let (type_name, alias) = if self.peek().is_identifier("alias") {
            self.pos += 1;
            ("alias".to_string(), true)
        } else if self.peek().is_identifier("list") && self.peek_at(1).kind == TokenKind::Operator("<".into()) {
            self.pos += 2;
            let (element, _) = self.parse_dotted()?;
            if self.peek().kind != TokenKind::Operator(">".into()) {
                return Err(self.unexpected(Some(">")));
            }
            self.pos += 1;
            (format!("list<{}>", element.join(".")), false)
        } else {
            (self.parse_dotted()?.0.join("."), false)
        };
        let (name, name_location) = self.expect_identifier()?;

        let mut decl = PropertyDecl {
            name: name.clone(),
            type_name,
            readonly,
            is_default,
            is_required,
            alias_target: None,
            location,
        };

        if alias {
            self.expect_punctuator(':')?;
            let (target, _) = self.parse_dotted()?;
            decl.alias_target = Some(target);
            self.objects[object].properties.push(decl);
            return Ok(());
        }

        self.objects[object].properties.push(decl);
        if self.eat_punctuator(':') {
            let value = self.parse_binding_value()?;
            self.objects[object].bindings.push(Binding {
                path: vec![name],
                value,
                location: name_location,
                is_initializer: true,
            });
        }
        Ok(())
    }

    fn parse_signal(&mut self, object: usize) -> ParseResult<()> {
        let location = self.advance().location;
        let (name, _) = self.expect_identifier()?;
        let mut parameters = Vec::new();
        if self.eat_punctuator('(') {
            while !self.eat_punctuator(')') {
                let (first, _) = self.parse_dotted()?;
                let first = first.join(".");
                let parameter = if self.eat_punctuator(':') {
                    (self.parse_dotted()?.0.join("."), first)
                } else {
                    let (name, _) = self.expect_identifier()?;
                    (first, name)
                };
                parameters.push(parameter);
                if !self.eat_punctuator(',') && !self.peek().is_punctuator(')') {
                    return Err(self.unexpected(Some(")")));
                }
            }
        }
        self.objects[object].signals.push(SignalDecl { name, parameters, location });
        Ok(())
    }

    fn parse_function(&mut self, object: usize) -> ParseResult<()> {
        let location = self.advance().location;
        let (name, _) = self.expect_identifier()?;
        self.expect_punctuator('(')?;
        let mut parameters = Vec::new();
        while !self.eat_punctuator(')') {
            let (parameter, _) = self.expect_identifier()?;
            if self.eat_punctuator(':') {
                self.parse_dotted()?;
            }
            parameters.push(parameter);
            if !self.eat_punctuator(',') && !self.peek().is_punctuator(')') {
                return Err(self.unexpected(Some(")")));
            }
        }
        if self.eat_punctuator(':') {
            self.parse_dotted()?;
        }
        if !self.peek().is_punctuator('{') {
            return Err(self.unexpected(Some("{")));
        }
        let body = self.capture_balanced()?;
        self.objects[object].methods.push(MethodDecl {
            name,
            parameters,
            body,
            location,
        });
        Ok(())
    }

    fn parse_enum(&mut self, object: usize) -> ParseResult<()> {
        let location = self.advance().location;
        let (name, name_location) = self.expect_identifier()?;
        if !starts_uppercase(&name) {
            return Err(ParseError::new(ParseErrorKind::InvalidDeclaration, name_location, "Enum names must begin with an upper case letter"));
        }
        self.expect_punctuator('{')?;
        let mut keys = Vec::new();
        let mut next_value = 0i64;
        while !self.eat_punctuator('}') {
            let (key, key_location) = self.expect_identifier()?;
            if !starts_uppercase(&key) {
                return Err(ParseError::new(ParseErrorKind::InvalidDeclaration, key_location, "Enum names must begin with an upper case letter"));
            }
            if self.peek().kind == TokenKind::Operator("=".into()) {
                self.pos += 1;
                let negative = self.peek().kind == TokenKind::Operator("-".into());
                if negative {
                    self.pos += 1;
                }
                let token = self.advance();
                let TokenKind::NumberLiteral { value, .. } = token.kind else {
                    return Err(ParseError::unexpected_token(token.location, &token.kind.to_string(), Some("number")));
                };
                next_value = if negative { -(value as i64) } else { value as i64 };
            }
            keys.push((key, next_value));
            next_value += 1;
            if !self.eat_punctuator(',') && !self.peek().is_punctuator('}') {
                return Err(self.unexpected(Some("}")));
            }
        }
        self.objects[object].enums.push(EnumDecl { name, keys, location });
        Ok(())
    }

    /// Whether the tokens at the cursor start an object declaration (`Type {` or `Q.Type {`)
    fn at_object_declaration(&self) -> bool {
        let mut n = 0;
        loop {
            let Some(ident) = self.peek_at(n).identifier() else {
                return false;
            };
            if self.peek_at(n + 1).is_punctuator('.') {
                n += 2;
                continue;
            }
            return starts_uppercase(ident) && self.peek_at(n + 1).is_punctuator('{');
        }
    }

    fn parse_binding_value(&mut self) -> ParseResult<BindingValue> {
        if self.at_object_declaration() {
            let (type_name, location) = self.parse_dotted()?;
            return Ok(BindingValue::Object(self.parse_object(&type_name.join("."), location)?));
        }

        if self.peek().is_punctuator('[') {
            let saved = self.pos;
            self.pos += 1;
            if self.at_object_declaration() {
                let mut objects = Vec::new();
                loop {
                    let (type_name, location) = self.parse_dotted()?;
                    objects.push(self.parse_object(&type_name.join("."), location)?);
                    if self.eat_punctuator(']') {
                        return Ok(BindingValue::ObjectList(objects));
                    }
                    self.expect_punctuator(',')?;
                    if self.eat_punctuator(']') {
                        return Ok(BindingValue::ObjectList(objects));
                    }
                }
            }
            self.pos = saved;
        }

        if self.peek().is_punctuator('{') {
            return Ok(BindingValue::Script(self.capture_balanced()?));
        }

        let first = self.pos;
        self.skip_expression()?;
        let tokens = &self.tokens[first..self.pos];
        if tokens.is_empty() {
            return Err(self.unexpected(Some("expression")));
        }
        Ok(classify_expression(tokens).unwrap_or_else(|| {
            let text = &self.source[tokens[0].start..tokens[tokens.len() - 1].end];
            BindingValue::Script(text.to_string())
        }))
    }

    /// Consume a `{ ... }` block and return its source text
    fn capture_balanced(&mut self) -> ParseResult<String> {
        let open = self.expect_punctuator('{')?;
        let mut depth = 1usize;
        loop {
            let token = self.advance();
            match &token.kind {
                TokenKind::Eof => return Err(ParseError::unexpected_eof(token.location)),
                TokenKind::Punctuator('{' | '(' | '[') => depth += 1,
                TokenKind::Punctuator('}' | ')' | ']') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.source[open.start..token.end].to_string());
                    }
                }
                _ => {}
            }
        }
    }

    /// Advance past one expression statement
    fn skip_expression(&mut self) -> ParseResult<()> {
        let mut depth = 0usize;
        let first = self.pos;
        loop {
            let token = self.peek();
            if token.is_eof() {
                if depth > 0 {
                    return Err(ParseError::unexpected_eof(token.location));
                }
                return Ok(());
            }
            if depth == 0 {
                if token.is_punctuator(';') || token.is_punctuator('}') || token.is_punctuator(')') || token.is_punctuator(']') {
                    return Ok(());
                }
                if self.pos > first && token.newline_before && !continues_expression(&self.tokens[self.pos - 1], token) {
                    return Ok(());
                }
            }
            match token.kind {
                TokenKind::Punctuator('{' | '(' | '[') => depth += 1,
                TokenKind::Punctuator('}' | ')' | ']') => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }
    }
}

/// Whether a line break between `previous` and `next` stays inside one expression
fn continues_expression(previous: &Token, next: &Token) -> bool {
    let is_joiner = |token: &Token| matches!(token.kind, TokenKind::Operator(_) | TokenKind::Punctuator('.' | ',' | ':'));
    is_joiner(previous) || is_joiner(next) || previous.is_punctuator('(') || previous.is_punctuator('[')
}

/// Recognise literals and plain identifier chains
fn classify_expression(tokens: &[Token]) -> Option<BindingValue> {
    match tokens {
        [single] => match &single.kind {
            TokenKind::NumberLiteral { value, .. } => Some(BindingValue::Number(*value)),
            TokenKind::StringLiteral(value) => Some(BindingValue::String(value.clone())),
            TokenKind::Identifier(ident) => Some(match ident.as_str() {
                "true" => BindingValue::Bool(true),
                "false" => BindingValue::Bool(false),
                "null" => BindingValue::Null,
                _ => BindingValue::Identifier(vec![ident.clone()]),
            }),
            _ => None,
        },
        [sign, number] if sign.kind == TokenKind::Operator("-".into()) => match &number.kind {
            TokenKind::NumberLiteral { value, .. } => Some(BindingValue::Number(-value)),
            _ => None,
        },
        _ => {
            let mut segments = Vec::new();
            for (i, token) in tokens.iter().enumerate() {
                if i % 2 == 0 {
                    segments.push(token.identifier()?.to_string());
                } else if !token.is_punctuator('.') {
                    return None;
                }
            }
            (tokens.len() % 2 == 1).then_some(BindingValue::Identifier(segments))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("file:///app/Main.qml").unwrap()
    }

    fn parse(source: &str) -> Document {
        parse_document(&url(), source).unwrap()
    }

    #[test]
    fn test_imports_and_pragmas() {
        let doc = parse(
            r#"pragma Singleton
import QtQuick 2.15
import QtQuick.Controls 2.0 as QQC
import "components"
import "util.js" as Util
QtObject {}
"#,
        );
        assert!(doc.is_singleton());
        assert_eq!(doc.imports.len(), 4);
        assert_eq!(doc.imports[0].kind, ImportKind::Module { uri: "QtQuick".into() });
        assert_eq!(doc.imports[0].version, Some(Version::new(2, 15)));
        assert_eq!(doc.imports[0].location, Location::new(2, 1));
        assert_eq!(doc.imports[1].qualifier.as_deref(), Some("QQC"));
        assert_eq!(doc.imports[2].kind, ImportKind::Directory { path: "components".into() });
        assert_eq!(doc.imports[3].kind, ImportKind::Script { path: "util.js".into() });
    }

    #[test]
    fn test_object_tree() {
        let doc = parse(
            r#"import QtQuick 2.0
Rectangle {
    id: root
    width: 200; height: -1.5
    color: "red"
    anchors.fill: parent
    font { pixelSize: 12; bold: true }
    Text { text: root.width > 100 ? "wide" : "narrow" }
    Q.Item {}
}
"#,
        );
        assert_eq!(doc.objects.len(), 3);
        let root = doc.root().unwrap();
        assert_eq!(root.type_name, "Rectangle");
        assert_eq!(root.id.as_deref(), Some("root"));
        assert_eq!(root.children, vec![1, 2]);
        assert_eq!(doc.objects[2].type_name, "Q.Item");

        let values: Vec<(String, BindingValue)> = root.bindings.iter().map(|b| (b.path.join("."), b.value.clone())).collect();
        assert_eq!(values[0], ("width".into(), BindingValue::Number(200.0)));
        assert_eq!(values[1], ("height".into(), BindingValue::Number(-1.5)));
        assert_eq!(values[2], ("color".into(), BindingValue::String("red".into())));
        assert_eq!(values[3], ("anchors.fill".into(), BindingValue::Identifier(vec!["parent".into()])));
        assert_eq!(values[4], ("font.pixelSize".into(), BindingValue::Number(12.0)));
        assert_eq!(values[5], ("font.bold".into(), BindingValue::Bool(true)));
        assert_eq!(doc.objects[1].bindings[0].value, BindingValue::Script("root.width > 100 ? \"wide\" : \"narrow\"".into()));
    }

    #[test]
    fn test_declarations() {
        let doc = parse(
            r#"Item {
    property int count: 3
    readonly property list<Item> extras
    default property alias content: inner.data
    signal activated(string reason, int code)
    function reset(a, b) { count = 0; return { a: a } }
    enum Mode { Off, On = 5, Auto }
    onActivated: { console.log(reason) }
    Item { id: inner }
}"#,
        );
        let root = doc.root().unwrap();
        assert_eq!(root.properties.len(), 3);
        assert!(root.properties[1].readonly);
        assert_eq!(root.properties[1].element_type(), "Item");
        assert!(root.properties[2].is_default);
        assert_eq!(root.properties[2].alias_target, Some(vec!["inner".to_string(), "data".to_string()]));
        assert_eq!(root.signals[0].parameters, vec![("string".to_string(), "reason".to_string()), ("int".to_string(), "code".to_string())]);
        assert_eq!(root.methods[0].body, "{ count = 0; return { a: a } }");
        assert_eq!(root.enums[0].keys, vec![("Off".to_string(), 0), ("On".to_string(), 5), ("Auto".to_string(), 6)]);
        assert!(root.bindings[0].is_initializer);
        assert!(root.bindings[1].is_signal_handler());
        assert_eq!(root.bindings[1].value, BindingValue::Script("{ console.log(reason) }".into()));
    }

    #[test]
    fn test_object_values() {
        let doc = parse("ListView {\n delegate: Text {}\n data: [ Item {}, Item {} ]\n model: [1, 2]\n}");
        let root = doc.root().unwrap();
        assert_eq!(root.bindings[0].value, BindingValue::Object(1));
        assert_eq!(root.bindings[1].value, BindingValue::ObjectList(vec![2, 3]));
        assert_eq!(root.bindings[2].value, BindingValue::Script("[1, 2]".into()));
    }

    #[test]
    fn test_multiline_expression() {
        let doc = parse("Item {\n width: parent.width\n   - 10\n height: 5\n}");
        let root = doc.root().unwrap();
        assert_eq!(root.bindings[0].value, BindingValue::Script("parent.width\n   - 10".into()));
        assert_eq!(root.bindings[1].value, BindingValue::Number(5.0));
    }

    #[test]
    fn test_syntax_errors() {
        let error = parse_document(&url(), "Item {\n width: 1\n").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::UnexpectedEof);

        let error = parse_document(&url(), "Item {}\nItem {}").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::InvalidRoot);
        assert_eq!(error.location, Location::new(2, 1));

        let error = parse_document(&url(), "import \"util.js\"\nItem {}").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::InvalidImport);

        let error = parse_document(&url(), "import QtQuick 2.0 as q\nItem {}").unwrap_err();
        assert_eq!(error.message, "Invalid import qualifier ID");

        let error = parse_document(&url(), "").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::InvalidRoot);
    }
}
