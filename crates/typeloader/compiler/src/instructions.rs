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

//! Binding instructions and the unit string table

use crate::document::{Binding, BindingValue, QmlObject};
use crate::resolved::ResolvedTypeMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use typeloader_common::Location;
use typeloader_registry::PropertyCache;

/// Interned strings of a compiled unit, serialized as a plain list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StringTable {
    strings: Vec<String>,
    index: HashMap<String, u32>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, value: &str) -> u32 {
        if let Some(&id) = self.index.get(value) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.strings.push(value.to_string());
        self.index.insert(value.to_string(), id);
        id
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.strings.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl From<Vec<String>> for StringTable {
    fn from(strings: Vec<String>) -> Self {
        let index = strings.iter().enumerate().map(|(i, s)| (s.clone(), i as u32)).collect();
        Self { strings, index }
    }
}

impl From<StringTable> for Vec<String> {
    fn from(table: StringTable) -> Self {
        table.strings
    }
}

/// One step of a compiled binding. String operands index the unit's [`StringTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    LoadNumber(f64),
    LoadString(u32),
    LoadBool(bool),
    LoadNull,
    /// Enumeration value folded at compile time
    LoadEnum(i64),
    /// Name lookup in the binding scope
    LoadName(u32),
    GetMember(u32),
    /// Instantiate the object at the given index
    CreateObject(u32),
    CreateList(Vec<u32>),
    /// Evaluate script source
    RunScript(u32),
    /// Store the loaded value into the property slot of the object
    StoreProperty(u32),
    StoreGrouped { property: u32, path: Vec<u32> },
    StoreAttached { type_name: u32, path: Vec<u32> },
    /// Connect the handler source to a signal
    ConnectSignal { signal: u32, handler: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledBinding {
    pub path: Vec<String>,
    pub instructions: Vec<Instruction>,
    pub location: Location,
}

/// An object with its final property cache and compiled bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledObject {
    pub type_name: String,
    pub id: Option<String>,
    pub location: Location,
    pub property_cache: PropertyCache,
    pub bindings: Vec<CompiledBinding>,
    pub children: Vec<u32>,
}

/// Lowers bindings to instructions, folding enum references of resolved types
pub struct InstructionGenerator<'a> {
    resolved: &'a ResolvedTypeMap,
    strings: &'a mut StringTable,
}

impl<'a> InstructionGenerator<'a> {
    pub fn new(resolved: &'a ResolvedTypeMap, strings: &'a mut StringTable) -> Self {
        Self { resolved, strings }
    }

    pub fn compile_object(&mut self, object: &QmlObject, property_cache: PropertyCache) -> CompiledObject {
        let bindings = object.bindings.iter().map(|binding| self.compile_binding(binding, &property_cache)).collect();
        CompiledObject {
            type_name: object.type_name.clone(),
            id: object.id.clone(),
            location: object.location,
            property_cache,
            bindings,
            children: object.children.iter().map(|&c| c as u32).collect(),
        }
    }

    pub fn compile_binding(&mut self, binding: &Binding, cache: &PropertyCache) -> CompiledBinding {
        let mut instructions = Vec::new();
        let name = binding.property_name();

        if binding.is_signal_handler() {
            let handler = match &binding.value {
                BindingValue::Script(source) => source.clone(),
                BindingValue::Identifier(segments) => segments.join("."),
                _ => String::new(),
            };
            let signal = typeloader_registry::signal_name_from_handler(name).unwrap_or_default();
            instructions.push(Instruction::ConnectSignal {
                signal: self.strings.intern(&signal),
                handler: self.strings.intern(&handler),
            });
        } else {
            self.load_value(&binding.value, &mut instructions);
            let store = if binding.is_attached() {
                Instruction::StoreAttached {
                    type_name: self.strings.intern(name),
                    path: self.intern_all(&binding.path[1..]),
                }
            } else {
                let property = cache.property(name).map(|p| p.index).unwrap_or(u32::MAX);
                if binding.is_grouped() {
                    Instruction::StoreGrouped {
                        property,
                        path: self.intern_all(&binding.path[1..]),
                    }
                } else {
                    Instruction::StoreProperty(property)
                }
            };
            instructions.push(store);
        }

        CompiledBinding {
            path: binding.path.clone(),
            instructions,
            location: binding.location,
        }
    }

    fn intern_all(&mut self, segments: &[String]) -> Vec<u32> {
        segments.iter().map(|s| self.strings.intern(s)).collect()
    }

    fn load_value(&mut self, value: &BindingValue, out: &mut Vec<Instruction>) {
        match value {
            BindingValue::Number(n) => out.push(Instruction::LoadNumber(*n)),
            BindingValue::String(s) => out.push(Instruction::LoadString(self.strings.intern(s))),
            BindingValue::Bool(b) => out.push(Instruction::LoadBool(*b)),
            BindingValue::Null => out.push(Instruction::LoadNull),
            BindingValue::Object(index) => out.push(Instruction::CreateObject(*index as u32)),
            BindingValue::ObjectList(indices) => out.push(Instruction::CreateList(indices.iter().map(|&i| i as u32).collect())),
            BindingValue::Script(source) => out.push(Instruction::RunScript(self.strings.intern(source))),
            BindingValue::Identifier(segments) => {
                if let Some(value) = self.fold_enum(segments) {
                    out.push(Instruction::LoadEnum(value));
                    return;
                }
                let Some((first, rest)) = segments.split_first() else { return };
                out.push(Instruction::LoadName(self.strings.intern(first)));
                for member in rest {
                    out.push(Instruction::GetMember(self.strings.intern(member)));
                }
            }
        }
    }

    /// `Type.Key` or `Type.Enum.Key` of a resolved type
    fn fold_enum(&self, segments: &[String]) -> Option<i64> {
        match segments {
            [type_name, key] => self.resolved.get(type_name)?.enum_value(key),
            [type_name, enum_name, key] => self.resolved.get(type_name)?.scoped_enum_value(enum_name, key),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use crate::resolved::ResolvedType;
    use typeloader_common::Version;
    use typeloader_registry::TypeRegistry;
    use typeloader_registry::builtins::{QTQUICK_MODULE, register_builtin_types};
    use url::Url;

    #[test]
    fn test_string_table_interns_once() {
        let mut table = StringTable::new();
        let a = table.intern("width");
        let b = table.intern("height");
        assert_eq!(table.intern("width"), a);
        assert_ne!(a, b);
        assert_eq!(table.get(b), Some("height"));
        assert_eq!(table.len(), 2);

        let restored = StringTable::from(Vec::<String>::from(table.clone()));
        assert_eq!(restored, table);
    }

    #[test]
    fn test_compile_bindings() {
        let registry = TypeRegistry::new();
        register_builtin_types(&registry).unwrap();
        let mut resolved = ResolvedTypeMap::new();
        for name in ["Item", "Text", "ListView"] {
            let descriptor = registry.lookup(QTQUICK_MODULE, name, 2, 0).unwrap();
            resolved.insert(name.to_string(), ResolvedType::native(descriptor, Some(Version::new(2, 0)), Location::unknown()));
        }

        let url = Url::parse("file:///app/Main.qml").unwrap();
        let document = parse_document(
            &url,
            "Text {\n width: 10\n horizontalAlignment: Text.AlignHCenter\n transformOrigin: Item.Center\n wrapMode: Text.WrapMode.WordWrap\n height: parent.height\n anchors.left: parent.left\n onLinkActivated: go(link)\n}",
        )
        .unwrap();
        let cache = resolved["Text"].property_cache().unwrap();
        let mut strings = StringTable::new();
        let object = InstructionGenerator::new(&resolved, &mut strings).compile_object(&document.objects[0], cache);

        let width = object.property_cache.property("width").unwrap().index;
        assert_eq!(object.bindings[0].instructions, vec![Instruction::LoadNumber(10.0), Instruction::StoreProperty(width)]);
        assert!(matches!(object.bindings[1].instructions[0], Instruction::LoadEnum(_)));
        assert_eq!(object.bindings[2].instructions[0], Instruction::LoadEnum(4));
        assert!(matches!(object.bindings[3].instructions[0], Instruction::LoadEnum(_)));
        assert!(matches!(object.bindings[4].instructions[..], [Instruction::LoadName(_), Instruction::GetMember(_), Instruction::StoreProperty(_)]));
        assert!(matches!(object.bindings[5].instructions.last(), Some(Instruction::StoreGrouped { .. })));
        match &object.bindings[6].instructions[..] {
            [Instruction::ConnectSignal { signal, handler }] => {
                assert_eq!(strings.get(*signal), Some("linkActivated"));
                assert_eq!(strings.get(*handler), Some("go(link)"));
            }
            other => panic!("unexpected instructions {:?}", other),
        }
    }
}
