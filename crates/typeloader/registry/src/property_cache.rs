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

//! Property caches
//!
//! A property cache is the flattened, index-addressable member table of one
//! type: every property, signal, method and enumeration visible on it,
//! base class members first.

use serde::{Deserialize, Serialize};

/// A property slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyData {
    pub name: String,
    pub type_name: String,
    pub writable: bool,
    pub is_alias: bool,
    pub index: u32,
    pub revision: u32,
}

impl PropertyData {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            writable: true,
            is_alias: false,
            index: 0,
            revision: 0,
        }
    }

    pub fn readonly(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Whether an object declaration may be assigned to this property
    pub fn accepts_object(&self) -> bool {
        matches!(self.type_name.as_str(), "var" | "variant")
            || self.type_name.starts_with("list<")
            || self.type_name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
    }
}

/// A signal or method slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodData {
    pub name: String,
    pub parameters: Vec<String>,
    pub index: u32,
}

/// An enumeration visible through the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumData {
    pub name: String,
    pub scoped: bool,
    pub values: Vec<(String, i64)>,
}

/// Flattened member table of a type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyCache {
    pub class_name: String,
    /// Closest native class in the inheritance chain
    pub native_class: Option<String>,
    pub properties: Vec<PropertyData>,
    pub signals: Vec<MethodData>,
    pub methods: Vec<MethodData>,
    pub enums: Vec<EnumData>,
    pub default_property: Option<String>,
}

impl PropertyCache {
    pub fn new(class_name: &str, native_class: Option<&str>) -> Self {
        Self {
            class_name: class_name.to_string(),
            native_class: native_class.map(str::to_string),
            ..Self::default()
        }
    }

    /// A copy of this cache to be extended by a derived class
    pub fn derive(&self, class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            ..self.clone()
        }
    }

    /// Append a property, assigning it the next slot index
    pub fn append_property(&mut self, mut property: PropertyData) -> u32 {
        let index = self.properties.len() as u32;
        property.index = index;
        self.properties.push(property);
        index
    }

    pub fn append_signal(&mut self, name: &str, parameters: Vec<String>) -> u32 {
        let index = self.signals.len() as u32;
        self.signals.push(MethodData {
            name: name.to_string(),
            parameters,
            index,
        });
        index
    }

    pub fn append_method(&mut self, name: &str, parameters: Vec<String>) -> u32 {
        let index = self.methods.len() as u32;
        self.methods.push(MethodData {
            name: name.to_string(),
            parameters,
            index,
        });
        index
    }

    pub fn append_enum(&mut self, data: EnumData) {
        self.enums.push(data);
    }

    /// Most derived property called `name`
    pub fn property(&self, name: &str) -> Option<&PropertyData> {
        self.properties.iter().rev().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut PropertyData> {
        self.properties.iter_mut().rev().find(|p| p.name == name)
    }

    pub fn signal(&self, name: &str) -> Option<&MethodData> {
        self.signals.iter().rev().find(|s| s.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodData> {
        self.methods.iter().rev().find(|m| m.name == name)
    }

    /// Whether `handler` (e.g. `onClicked`, `onWidthChanged`) names a signal of this type.
    ///
    /// Every property has an implicit `<name>Changed` notify signal.
    pub fn has_signal_handler(&self, handler: &str) -> bool {
        let Some(signal) = signal_name_from_handler(handler) else {
            return false;
        };
        if self.signal(&signal).is_some() {
            return true;
        }
        signal.strip_suffix("Changed").is_some_and(|property| self.property(property).is_some())
    }

    /// Value of `key` in enumeration `enum_name`
    pub fn enum_value(&self, enum_name: &str, key: &str) -> Option<i64> {
        self.enums
            .iter()
            .rev()
            .filter(|e| e.name == enum_name)
            .find_map(|e| e.values.iter().find(|(k, _)| k == key).map(|(_, v)| *v))
    }

    /// Value of an unscoped key in any enumeration
    pub fn unscoped_enum_value(&self, key: &str) -> Option<i64> {
        self.enums
            .iter()
            .rev()
            .filter(|e| !e.scoped)
            .find_map(|e| e.values.iter().find(|(k, _)| k == key).map(|(_, v)| *v))
    }
}

/// `onFooBar` -> `fooBar`
pub fn signal_name_from_handler(handler: &str) -> Option<String> {
    let rest = handler.strip_prefix("on")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    Some(first.to_ascii_lowercase().to_string() + chars.as_str())
}
