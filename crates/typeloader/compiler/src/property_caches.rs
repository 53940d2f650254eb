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

//! Property cache creation for every object of a document

use crate::document::{Document, QmlObject};
use crate::resolved::ResolvedTypeMap;
use std::collections::{HashMap, HashSet};
use typeloader_common::{ErrorKind, Location, QmlError, QmlErrors};
use typeloader_registry::{EnumData, PropertyCache, PropertyData};

/// Builds one property cache per object: the base type's cache extended by the object's own declarations.
///
/// Aliases are left out; they are added by [`crate::aliases::resolve_aliases`]
/// once every object's cache exists.
pub struct PropertyCacheCreator<'a> {
    document: &'a Document,
    resolved: &'a ResolvedTypeMap,
    errors: QmlErrors,
}

impl<'a> PropertyCacheCreator<'a> {
    pub fn new(document: &'a Document, resolved: &'a ResolvedTypeMap) -> Self {
        Self {
            document,
            resolved,
            errors: Vec::new(),
        }
    }

    pub fn build(mut self) -> Result<Vec<PropertyCache>, QmlErrors> {
        self.check_ids();
        let caches: Vec<PropertyCache> = self.document.objects.iter().enumerate().map(|(index, object)| self.build_object(index, object)).collect();
        if self.errors.is_empty() { Ok(caches) } else { Err(self.errors) }
    }

    fn error(&mut self, location: Location, description: String) {
        self.errors.push(QmlError::new(ErrorKind::Compile, description).with_url(&self.document.url).with_location(location));
    }

    fn check_ids(&mut self) {
        let mut seen = HashSet::new();
        for object in &self.document.objects {
            let Some(id) = &object.id else { continue };
            if !id.chars().next().is_some_and(|c| c.is_lowercase() || c == '_') {
                self.error(object.location, "IDs cannot start with an uppercase letter".to_string());
            } else if !seen.insert(id.as_str()) {
                self.error(object.location, "id is not unique".to_string());
            }
        }
    }

    fn build_object(&mut self, index: usize, object: &QmlObject) -> PropertyCache {
        let base = match self.resolved.get(&object.type_name) {
            Some(resolved) => resolved.property_cache(),
            None => None,
        };
        let mut cache = match base {
            Some(base) => base.derive(&format!("{}_QMLTYPE_{}", object.type_name, index)),
            None => {
                self.error(object.location, format!("{} is not a type", object.type_name));
                PropertyCache::new(&object.type_name, None)
            }
        };

        let mut names: HashMap<&str, &'static str> = HashMap::new();
        let mut has_default = false;
        for property in &object.properties {
            if names.insert(&property.name, "property").is_some() {
                self.error(property.location, "Duplicate property name".to_string());
                continue;
            }
            if property.is_default {
                if has_default {
                    self.error(property.location, "Duplicate default property".to_string());
                }
                has_default = true;
            }
            if property.is_alias() {
                continue;
            }
            let mut data = PropertyData::new(&property.name, &property.type_name);
            data.writable = !property.readonly;
            cache.append_property(data);
            if property.is_default {
                cache.default_property = Some(property.name.clone());
            }
        }

        for signal in &object.signals {
            if let Some(kind) = names.insert(&signal.name, "signal") {
                let description = if kind == "signal" { "Duplicate signal name" } else { "Duplicate signal name: invalid override of property change signal or superclass signal" };
                self.error(signal.location, description.to_string());
                continue;
            }
            if signal.name.ends_with("Changed") && object.properties.iter().any(|p| format!("{}Changed", p.name) == signal.name) {
                self.error(signal.location, "Duplicate signal name: invalid override of property change signal or superclass signal".to_string());
                continue;
            }
            cache.append_signal(&signal.name, signal.parameters.iter().map(|(type_name, _)| type_name.clone()).collect());
        }

        for method in &object.methods {
            if names.insert(&method.name, "method").is_some() {
                self.error(method.location, "Duplicate method name".to_string());
                continue;
            }
            cache.append_method(&method.name, method.parameters.clone());
        }

        let mut enum_names = HashSet::new();
        for decl in &object.enums {
            if !enum_names.insert(decl.name.as_str()) {
                self.error(decl.location, "Duplicate scoped enum name".to_string());
                continue;
            }
            cache.append_enum(EnumData {
                name: decl.name.clone(),
                scoped: false,
                values: decl.keys.clone(),
            });
        }

        cache
    }
}

/// Build the property caches of every object in `document`
pub fn build_property_caches(document: &Document, resolved: &ResolvedTypeMap) -> Result<Vec<PropertyCache>, QmlErrors> {
    PropertyCacheCreator::new(document, resolved).build()
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

    fn caches(source: &str) -> Result<Vec<PropertyCache>, QmlErrors> {
        let registry = TypeRegistry::new();
        register_builtin_types(&registry).unwrap();
        let url = Url::parse("file:///app/Main.qml").unwrap();
        let document = parse_document(&url, source).unwrap();
        let mut resolved = ResolvedTypeMap::new();
        for name in ["Item", "Rectangle", "Text"] {
            let descriptor = registry.lookup(QTQUICK_MODULE, name, 2, 0).unwrap();
            resolved.insert(name.to_string(), ResolvedType::native(descriptor, Some(Version::new(2, 0)), Location::unknown()));
        }
        build_property_caches(&document, &resolved)
    }

    #[test]
    fn test_declared_members_extend_base() {
        let caches = caches("Rectangle {\n property int count\n readonly property string label: \"x\"\n signal done(int code)\n function reset() {}\n enum Mode { A, B }\n Text {}\n}").unwrap();
        let root = &caches[0];
        assert_eq!(root.class_name, "Rectangle_QMLTYPE_0");
        assert_eq!(root.native_class.as_deref(), Some("QQuickRectangle"));
        assert!(root.property("color").is_some());
        assert!(root.property("count").unwrap().writable);
        assert!(!root.property("label").unwrap().writable);
        assert!(root.signal("done").is_some());
        assert!(root.has_signal_handler("onCountChanged"));
        assert!(root.method("reset").is_some());
        assert_eq!(root.enum_value("Mode", "B"), Some(1));
        assert!(caches[1].property("text").is_some());
    }

    #[test]
    fn test_revisioned_property_hidden_for_old_import() {
        let caches = caches("Item {}").unwrap();
        assert!(caches[0].property("antialiasing").is_none());
    }

    #[test]
    fn test_duplicate_names() {
        let errors = caches("Item {\n property int a\n property real a\n signal s\n signal s\n function f() {}\n function f() {}\n}").unwrap_err();
        let messages: Vec<&str> = errors.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(messages, vec!["Duplicate property name", "Duplicate signal name", "Duplicate method name"]);
        assert_eq!(errors[0].location(), Location::new(3, 2));
    }

    #[test]
    fn test_unknown_type_and_bad_ids() {
        let errors = caches("Item {\n id: root\n Button {}\n Item { id: root }\n Item { id: Big }\n}").unwrap_err();
        let messages: Vec<&str> = errors.iter().map(|e| e.description.as_str()).collect();
        assert!(messages.contains(&"id is not unique"));
        assert!(messages.contains(&"IDs cannot start with an uppercase letter"));
        assert!(messages.contains(&"Button is not a type"));
    }
}
