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

//! Alias resolution

use crate::document::Document;
use typeloader_common::{ErrorKind, QmlError, QmlErrors};
use typeloader_registry::{PropertyCache, PropertyData};

/// Append every `property alias` to the caches built for `document`.
///
/// Aliases may target other aliases, so resolution repeats until a pass makes
/// no progress. Whatever is left then is circular or points at nothing.
pub fn resolve_aliases(document: &Document, caches: &mut [PropertyCache]) -> Result<(), QmlErrors> {
    let mut pending: Vec<(usize, usize)> = Vec::new();
    for (object_index, object) in document.objects.iter().enumerate() {
        for (decl_index, decl) in object.properties.iter().enumerate() {
            if decl.is_alias() {
                pending.push((object_index, decl_index));
            }
        }
    }

    let mut errors = QmlErrors::new();
    loop {
        let before = pending.len();
        let mut still_pending = Vec::new();
        for (object_index, decl_index) in pending {
            match resolve_one(document, caches, &still_pending, object_index, decl_index) {
                Resolution::Resolved(data) => {
                    let decl = &document.objects[object_index].properties[decl_index];
                    let cache = &mut caches[object_index];
                    cache.append_property(data);
                    if decl.is_default {
                        cache.default_property = Some(decl.name.clone());
                    }
                }
                Resolution::Waiting => still_pending.push((object_index, decl_index)),
                Resolution::Failed(description) => {
                    let decl = &document.objects[object_index].properties[decl_index];
                    errors.push(QmlError::new(ErrorKind::Compile, description).with_url(&document.url).with_location(decl.location));
                }
            }
        }
        pending = still_pending;
        if pending.is_empty() || pending.len() == before {
            break;
        }
    }

    for (object_index, decl_index) in pending {
        let decl = &document.objects[object_index].properties[decl_index];
        let target = decl.alias_target.as_deref().unwrap_or_default().join(".");
        errors.push(QmlError::new(ErrorKind::Compile, format!("Invalid alias target location: {}", target)).with_url(&document.url).with_location(decl.location));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

enum Resolution {
    Resolved(PropertyData),
    Waiting,
    Failed(String),
}

fn resolve_one(document: &Document, caches: &[PropertyCache], waiting: &[(usize, usize)], object_index: usize, decl_index: usize) -> Resolution {
    let decl = &document.objects[object_index].properties[decl_index];
    let target = decl.alias_target.as_deref().unwrap_or_default();
    let Some(id) = target.first() else {
        return Resolution::Failed("Invalid alias target location: ".to_string());
    };
    let Some(target_index) = document.object_by_id(id) else {
        return Resolution::Failed(format!("Invalid alias reference. Unable to find id \"{}\"", id));
    };

    let mut data = match target {
        [_] => PropertyData::new(&decl.name, &document.objects[target_index].type_name).readonly(),
        [_, property] => match caches[target_index].property(property) {
            Some(found) => {
                let mut data = PropertyData::new(&decl.name, &found.type_name);
                data.writable = found.writable && !decl.readonly;
                data
            }
            None => {
                let target_object = &document.objects[target_index];
                let is_unresolved_alias = |&(o, d): &(usize, usize)| o == target_index && target_object.properties[d].name == *property;
                let pending_later = target_object.properties.iter().enumerate().any(|(d, p)| p.name == *property && p.is_alias() && (target_index, d) > (object_index, decl_index));
                if waiting.iter().any(is_unresolved_alias) || pending_later {
                    return Resolution::Waiting;
                }
                return Resolution::Failed(format!("Invalid alias target location: {}", property));
            }
        },
        [_, property, value_property] => match caches[target_index].property(property) {
            Some(found) if !found.is_alias => {
                let mut data = PropertyData::new(&decl.name, "var");
                data.writable = !decl.readonly;
                data
            }
            _ => return Resolution::Failed(format!("Invalid alias target location: {}", value_property)),
        },
        _ => return Resolution::Failed(format!("Invalid alias target location: {}", target[1..].join("."))),
    };
    data.is_alias = true;
    Resolution::Resolved(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use url::Url;

    fn resolve(source: &str) -> (Vec<PropertyCache>, Result<(), QmlErrors>) {
        let url = Url::parse("file:///app/Main.qml").unwrap();
        let document = parse_document(&url, source).unwrap();
        let mut caches: Vec<PropertyCache> = document
            .objects
            .iter()
            .map(|object| {
                let mut cache = PropertyCache::new(&object.type_name, None);
                cache.append_property(PropertyData::new("width", "real"));
                cache.append_property(PropertyData::new("children", "list<Item>").readonly());
                cache
            })
            .collect();
        let result = resolve_aliases(&document, &mut caches);
        (caches, result)
    }

    #[test]
    fn test_property_and_object_aliases() {
        let (caches, result) = resolve("Item {\n property alias innerWidth: inner.width\n property alias box: inner\n Item { id: inner }\n}");
        result.unwrap();
        let width = caches[0].property("innerWidth").unwrap();
        assert!(width.is_alias && width.writable);
        assert_eq!(width.type_name, "real");
        let boxed = caches[0].property("box").unwrap();
        assert_eq!(boxed.type_name, "Item");
        assert!(!boxed.writable);
    }

    #[test]
    fn test_alias_to_later_alias() {
        let (caches, result) = resolve("Item {\n property alias outer: child.inner\n Item {\n  id: child\n  property alias inner: leaf.width\n  Item { id: leaf }\n }\n}");
        result.unwrap();
        assert_eq!(caches[0].property("outer").unwrap().type_name, "real");
        assert!(caches[1].property("inner").is_some());
    }

    #[test]
    fn test_unknown_id() {
        let (_, result) = resolve("Item {\n property alias w: missing.width\n}");
        let errors = result.unwrap_err();
        assert_eq!(errors[0].description, "Invalid alias reference. Unable to find id \"missing\"");
        assert_eq!(errors[0].line, 2);
    }

    #[test]
    fn test_unknown_target_property() {
        let (_, result) = resolve("Item {\n id: root\n property alias h: root.height\n}");
        assert_eq!(result.unwrap_err()[0].description, "Invalid alias target location: height");
    }

    #[test]
    fn test_circular_aliases() {
        let (_, result) = resolve("Item {\n id: root\n property alias a: root.b\n property alias b: root.a\n}");
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.description.starts_with("Invalid alias target location")));
    }
}
