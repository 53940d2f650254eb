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

//! Type references used by a document

use crate::document::{BindingValue, Document, starts_uppercase};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use typeloader_common::Location;

/// A type name used by a document, before resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeReference {
    /// Name as written, possibly qualified (`Q.Item`)
    pub name: String,
    /// First place the name is used
    pub location: Location,
    /// The document instantiates the type
    pub needs_creation: bool,
    /// Failing to resolve the name is an error
    pub error_when_not_found: bool,
}

/// Collect every type reference of `document`, in order of first use.
///
/// Object declarations need creation; property types only need the type;
/// uppercase names in attached bindings and enum expressions are looked up
/// opportunistically and never reported when missing.
pub fn collect_type_references(document: &Document) -> Vec<TypeReference> {
    let mut collector = Collector::default();
    for object in &document.objects {
        collector.add(&object.type_name, object.location, true, true);

        for property in object.properties.iter().filter(|p| !p.is_alias()) {
            let element = property.element_type();
            if is_object_type_name(element) {
                collector.add(element, property.location, false, true);
            }
        }

        for binding in &object.bindings {
            if binding.is_attached() {
                collector.add(binding.property_name(), binding.location, false, false);
            }
            if let BindingValue::Identifier(segments) = &binding.value {
                if segments.len() > 1 && starts_uppercase(&segments[0]) {
                    collector.add(&segments[0], binding.location, false, false);
                }
            }
        }
    }
    collector.references
}

/// Names that refer to object types rather than value types (`int`, `color`, ...)
pub fn is_object_type_name(name: &str) -> bool {
    name.rsplit('.').next().is_some_and(starts_uppercase)
}

#[derive(Default)]
struct Collector {
    references: Vec<TypeReference>,
    index: HashMap<String, usize>,
}

impl Collector {
    fn add(&mut self, name: &str, location: Location, needs_creation: bool, error_when_not_found: bool) {
        match self.index.get(name) {
            Some(&i) => {
                let reference = &mut self.references[i];
                reference.needs_creation |= needs_creation;
                reference.error_when_not_found |= error_when_not_found;
            }
            None => {
                self.index.insert(name.to_string(), self.references.len());
                self.references.push(TypeReference {
                    name: name.to_string(),
                    location,
                    needs_creation,
                    error_when_not_found,
                });
            }
        }
    }
}
