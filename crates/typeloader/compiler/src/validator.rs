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

//! Binding validation against the property caches

use crate::document::{Binding, Document};
use typeloader_common::{ErrorKind, Location, QmlError, QmlErrors};
use typeloader_registry::PropertyCache;

/// Scalar types that cannot be used as a grouped property
const SCALAR_TYPES: &[&str] = &["int", "real", "double", "bool", "string", "url", "var", "variant"];

/// Checks every binding of a document against the cache of its object
pub struct BindingValidator<'a> {
    document: &'a Document,
    caches: &'a [PropertyCache],
    errors: QmlErrors,
}

impl<'a> BindingValidator<'a> {
    pub fn new(document: &'a Document, caches: &'a [PropertyCache]) -> Self {
        Self {
            document,
            caches,
            errors: Vec::new(),
        }
    }

    pub fn validate(mut self) -> Result<(), QmlErrors> {
        for (object, cache) in self.document.objects.iter().zip(self.caches) {
            for binding in &object.bindings {
                self.validate_binding(binding, cache);
            }
            if let Some(&first_child) = object.children.first() {
                self.validate_default_property(cache, self.document.objects[first_child].location);
            }
        }
        if self.errors.is_empty() { Ok(()) } else { Err(self.errors) }
    }

    fn error(&mut self, location: Location, description: String) {
        self.errors.push(QmlError::new(ErrorKind::BindingValidation, description).with_url(&self.document.url).with_location(location));
    }

    fn validate_binding(&mut self, binding: &Binding, cache: &PropertyCache) {
        if binding.is_attached() {
            return;
        }
        let name = binding.property_name();
        if binding.is_signal_handler() {
            if !cache.has_signal_handler(name) {
                self.error(binding.location, format!("Cannot assign to non-existent property \"{}\"", name));
            }
            return;
        }

        let Some(property) = cache.property(name) else {
            self.error(binding.location, format!("Cannot assign to non-existent property \"{}\"", name));
            return;
        };

        if binding.is_grouped() {
            if SCALAR_TYPES.contains(&property.type_name.as_str()) {
                self.error(binding.location, "Invalid grouped property access".to_string());
            }
            return;
        }

        let is_list = property.type_name.starts_with("list<");
        if !property.writable && !is_list && !binding.is_initializer {
            self.error(binding.location, format!("Invalid property assignment: \"{}\" is a read-only property", name));
            return;
        }
        if binding.value.is_object() && !property.accepts_object() {
            self.error(binding.location, format!("Cannot assign object to property \"{}\"", name));
        }
    }

    fn validate_default_property(&mut self, cache: &PropertyCache, location: Location) {
        match cache.default_property.as_deref().map(|name| cache.property(name)) {
            None | Some(None) => self.error(location, "Cannot assign to non-existent default property".to_string()),
            Some(Some(property)) if !property.accepts_object() => {
                let name = property.name.clone();
                self.error(location, format!("Cannot assign object to property \"{}\"", name));
            }
            Some(Some(_)) => {}
        }
    }
}

/// Validate every binding of `document`
pub fn validate_bindings(document: &Document, caches: &[PropertyCache]) -> Result<(), QmlErrors> {
    BindingValidator::new(document, caches).validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use typeloader_registry::PropertyData;
    use url::Url;

    fn item_cache(name: &str) -> PropertyCache {
        let mut cache = PropertyCache::new(name, Some("QQuickItem"));
        cache.append_property(PropertyData::new("width", "real"));
        cache.append_property(PropertyData::new("parent", "Item"));
        cache.append_property(PropertyData::new("anchors", "QQuickAnchors").readonly());
        cache.append_property(PropertyData::new("data", "list<QtObject>").readonly());
        cache.append_property(PropertyData::new("implicitWidth", "real").readonly());
        cache.append_signal("clicked", Vec::new());
        cache.default_property = Some("data".to_string());
        cache
    }

    fn validate(source: &str) -> Result<(), QmlErrors> {
        let url = Url::parse("file:///app/Main.qml").unwrap();
        let document = parse_document(&url, source).unwrap();
        let caches: Vec<PropertyCache> = document.objects.iter().map(|o| item_cache(&o.type_name)).collect();
        validate_bindings(&document, &caches)
    }

    fn messages(source: &str) -> Vec<String> {
        validate(source).unwrap_err().into_iter().map(|e| e.description).collect()
    }

    #[test]
    fn test_valid_bindings() {
        validate("Item {\n width: 10\n anchors.fill: parent\n onClicked: doIt()\n onWidthChanged: {}\n Keys.enabled: true\n data: [ Item {} ]\n Item {}\n}").unwrap();
    }

    #[test]
    fn test_non_existent_property() {
        let errors = validate("Item {\n  colour: \"red\"\n}").unwrap_err();
        assert_eq!(errors[0].description, "Cannot assign to non-existent property \"colour\"");
        assert_eq!(errors[0].kind, ErrorKind::BindingValidation);
        assert_eq!(errors[0].location(), Location::new(2, 3));
    }

    #[test]
    fn test_non_existent_signal_handler() {
        assert_eq!(messages("Item { onPressed: go() }"), vec!["Cannot assign to non-existent property \"onPressed\""]);
    }

    #[test]
    fn test_read_only_property() {
        assert_eq!(messages("Item { implicitWidth: 4 }"), vec!["Invalid property assignment: \"implicitWidth\" is a read-only property"]);
    }

    #[test]
    fn test_object_to_scalar() {
        assert_eq!(messages("Item { width: Item {} }"), vec!["Cannot assign object to property \"width\""]);
    }

    #[test]
    fn test_grouped_scalar() {
        assert_eq!(messages("Item { width.value: 3 }"), vec!["Invalid grouped property access"]);
    }
}
