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

//! Intermediate representation of a parsed document

use serde::{Deserialize, Serialize};
use typeloader_common::{Location, Version};
use typeloader_registry::Digest;
use url::Url;

/// Kind of an import statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportKind {
    /// `import QtQuick 2.0`
    Module { uri: String },
    /// `import "controls"`
    Directory { path: String },
    /// `import "util.js" as Util`
    Script { path: String },
}

/// One import statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub kind: ImportKind,
    pub version: Option<Version>,
    pub qualifier: Option<String>,
    pub location: Location,
}

impl ImportRecord {
    /// The uri or path as written
    pub fn target(&self) -> &str {
        match &self.kind {
            ImportKind::Module { uri } => uri,
            ImportKind::Directory { path } | ImportKind::Script { path } => path,
        }
    }
}

/// `pragma Name` or `pragma Name: Value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pragma {
    pub name: String,
    pub value: Option<String>,
    pub location: Location,
}

/// `property <type> <name>` or `property alias <name>: <target>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    /// Declared type, `list<T>` for list properties; `alias` for aliases
    pub type_name: String,
    pub readonly: bool,
    pub is_default: bool,
    pub is_required: bool,
    /// `id` or `id.property` path of an alias
    pub alias_target: Option<Vec<String>>,
    pub location: Location,
}

impl PropertyDecl {
    pub fn is_alias(&self) -> bool {
        self.alias_target.is_some()
    }

    /// Element type name of `list<T>` or the plain type name
    pub fn element_type(&self) -> &str {
        self.type_name.strip_prefix("list<").and_then(|t| t.strip_suffix('>')).unwrap_or(&self.type_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDecl {
    pub name: String,
    /// `(type, name)` pairs
    pub parameters: Vec<(String, String)>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub keys: Vec<(String, i64)>,
    pub location: Location,
}

/// Right-hand side of a binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BindingValue {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
    /// `parent.width`, `Text.AlignHCenter`
    Identifier(Vec<String>),
    /// Index into [`Document::objects`]
    Object(usize),
    /// `[ A {}, B {} ]`
    ObjectList(Vec<usize>),
    /// Anything else, kept as source text
    Script(String),
}

impl BindingValue {
    pub fn is_object(&self) -> bool {
        matches!(self, BindingValue::Object(_) | BindingValue::ObjectList(_))
    }
}

/// `path: value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Dotted property path; grouped blocks are flattened into it
    pub path: Vec<String>,
    pub value: BindingValue,
    pub location: Location,
    /// Initializer of a property declared on the same object
    pub is_initializer: bool,
}

impl Binding {
    pub fn property_name(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    /// `Keys.onPressed`, `ListView.delegate` and the like
    pub fn is_attached(&self) -> bool {
        self.path.len() > 1 && starts_uppercase(self.property_name())
    }

    pub fn is_grouped(&self) -> bool {
        self.path.len() > 1 && !self.is_attached()
    }

    /// `onClicked` and friends
    pub fn is_signal_handler(&self) -> bool {
        self.path.len() == 1 && self.property_name().strip_prefix("on").and_then(|rest| rest.chars().next()).is_some_and(|c| c.is_ascii_uppercase())
    }
}

/// An object declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QmlObject {
    /// Type name as written, possibly qualified (`Q.Item`)
    pub type_name: String,
    pub location: Location,
    pub id: Option<String>,
    pub properties: Vec<PropertyDecl>,
    pub signals: Vec<SignalDecl>,
    pub methods: Vec<MethodDecl>,
    pub enums: Vec<EnumDecl>,
    pub bindings: Vec<Binding>,
    /// Objects assigned to the default property, in declaration order
    pub children: Vec<usize>,
}

impl QmlObject {
    pub fn new(type_name: &str, location: Location) -> Self {
        Self {
            type_name: type_name.to_string(),
            location,
            id: None,
            properties: Vec::new(),
            signals: Vec::new(),
            methods: Vec::new(),
            enums: Vec::new(),
            bindings: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// A parsed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub url: Url,
    pub imports: Vec<ImportRecord>,
    pub pragmas: Vec<Pragma>,
    /// Every object in the document; index 0 is the root
    pub objects: Vec<QmlObject>,
    /// blake3 of the source text
    pub source_checksum: Digest,
}

impl Document {
    pub fn root(&self) -> Option<&QmlObject> {
        self.objects.first()
    }

    /// The `pragma Singleton` statement, if present
    pub fn singleton_pragma(&self) -> Option<&Pragma> {
        self.pragmas.iter().find(|p| p.name == "Singleton")
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton_pragma().is_some()
    }

    /// Object declaring `id`
    pub fn object_by_id(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.id.as_deref() == Some(id))
    }
}

pub(crate) fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}
