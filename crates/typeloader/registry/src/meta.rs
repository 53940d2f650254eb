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

//! Native meta-object descriptions
//!
//! A [`MetaObject`] is the static description of a natively implemented
//! class: its properties, signals, methods and enumerations, plus its super
//! class and any "related" meta objects whose enumerations it re-exports.

use std::sync::Arc;

/// A property exposed by a native class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaProperty {
    pub name: String,
    pub type_name: String,
    pub writable: bool,
    /// Minor version the property was introduced in; 0 means always present
    pub revision: u32,
}

/// A signal or invokable method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaMethod {
    pub name: String,
    pub parameters: Vec<String>,
    pub revision: u32,
}

/// An enumeration declared by a native class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEnum {
    pub name: String,
    pub scoped: bool,
    pub keys: Vec<(String, i64)>,
}

impl MetaEnum {
    /// Unscoped enum with sequential values starting at 0
    pub fn sequential(name: &str, keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            scoped: false,
            keys: keys.iter().enumerate().map(|(i, k)| (k.to_string(), i as i64)).collect(),
        }
    }

    /// Enum with explicit values
    pub fn with_values(name: &str, keys: &[(&str, i64)]) -> Self {
        Self {
            name: name.to_string(),
            scoped: false,
            keys: keys.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    /// Mark the enum as scoped (`enum class`)
    pub fn scoped(mut self) -> Self {
        self.scoped = true;
        self
    }
}

/// Static description of a native class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaObject {
    pub class_name: String,
    pub super_class: Option<Arc<MetaObject>>,
    pub properties: Vec<MetaProperty>,
    pub signals: Vec<MetaMethod>,
    pub methods: Vec<MetaMethod>,
    pub enums: Vec<MetaEnum>,
    pub related: Vec<Arc<MetaObject>>,
    pub default_property: Option<String>,
}

impl MetaObject {
    /// Start describing a class
    pub fn builder(class_name: &str) -> MetaObjectBuilder {
        MetaObjectBuilder {
            meta: MetaObject {
                class_name: class_name.to_string(),
                super_class: None,
                properties: Vec::new(),
                signals: Vec::new(),
                methods: Vec::new(),
                enums: Vec::new(),
                related: Vec::new(),
                default_property: None,
            },
        }
    }

    /// The inheritance chain ordered from the root base class to `self`
    pub fn chain(&self) -> Vec<&MetaObject> {
        let mut chain = vec![self];
        let mut current = self.super_class.as_deref();
        while let Some(mo) = current {
            chain.push(mo);
            current = mo.super_class.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Whether `self` is, or inherits from, a class called `class_name`
    pub fn inherits(&self, class_name: &str) -> bool {
        self.chain().iter().any(|mo| mo.class_name == class_name)
    }

    /// The default property, looked up along the inheritance chain
    pub fn default_property(&self) -> Option<&str> {
        self.chain().iter().rev().find_map(|mo| mo.default_property.as_deref())
    }

    /// Whether any property or method anywhere in the chain carries a revision
    pub fn has_revisioned_members(&self) -> bool {
        self.chain()
            .iter()
            .any(|mo| mo.properties.iter().any(|p| p.revision != 0) || mo.methods.iter().chain(mo.signals.iter()).any(|m| m.revision != 0))
    }

    /// Feed a stable description of the whole chain into `hasher`
    pub(crate) fn hash_into(&self, hasher: &mut blake3::Hasher) {
        for mo in self.chain() {
            hasher.update(mo.class_name.as_bytes());
            hasher.update(&[0]);
            for p in &mo.properties {
                hasher.update(p.name.as_bytes());
                hasher.update(b":");
                hasher.update(p.type_name.as_bytes());
                hasher.update(&[p.writable as u8]);
                hasher.update(&p.revision.to_le_bytes());
            }
            for m in mo.signals.iter().chain(mo.methods.iter()) {
                hasher.update(m.name.as_bytes());
                hasher.update(b"(");
                for param in &m.parameters {
                    hasher.update(param.as_bytes());
                    hasher.update(b",");
                }
                hasher.update(b")");
            }
            for e in &mo.enums {
                hasher.update(e.name.as_bytes());
                hasher.update(&[e.scoped as u8]);
                for (key, value) in &e.keys {
                    hasher.update(key.as_bytes());
                    hasher.update(&value.to_le_bytes());
                }
            }
        }
    }
}

/// Builder for [`MetaObject`]
pub struct MetaObjectBuilder {
    meta: MetaObject,
}

impl MetaObjectBuilder {
    pub fn inherits(mut self, super_class: &Arc<MetaObject>) -> Self {
        self.meta.super_class = Some(Arc::clone(super_class));
        self
    }

    pub fn property(mut self, name: &str, type_name: &str) -> Self {
        self.meta.properties.push(MetaProperty {
            name: name.to_string(),
            type_name: type_name.to_string(),
            writable: true,
            revision: 0,
        });
        self
    }

    pub fn readonly_property(mut self, name: &str, type_name: &str) -> Self {
        self.meta.properties.push(MetaProperty {
            name: name.to_string(),
            type_name: type_name.to_string(),
            writable: false,
            revision: 0,
        });
        self
    }

    /// A writable property that only exists from minor version `revision` on
    pub fn revisioned_property(mut self, name: &str, type_name: &str, revision: u32) -> Self {
        self.meta.properties.push(MetaProperty {
            name: name.to_string(),
            type_name: type_name.to_string(),
            writable: true,
            revision,
        });
        self
    }

    pub fn signal(mut self, name: &str, parameters: &[&str]) -> Self {
        self.meta.signals.push(MetaMethod {
            name: name.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            revision: 0,
        });
        self
    }

    pub fn method(mut self, name: &str, parameters: &[&str]) -> Self {
        self.meta.methods.push(MetaMethod {
            name: name.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            revision: 0,
        });
        self
    }

    pub fn enumeration(mut self, meta_enum: MetaEnum) -> Self {
        self.meta.enums.push(meta_enum);
        self
    }

    /// Re-export the enumerations of another class
    pub fn related(mut self, related: &Arc<MetaObject>) -> Self {
        self.meta.related.push(Arc::clone(related));
        self
    }

    pub fn default_property(mut self, name: &str) -> Self {
        self.meta.default_property = Some(name.to_string());
        self
    }

    pub fn build(self) -> Arc<MetaObject> {
        Arc::new(self.meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Arc<MetaObject> {
        let object = MetaObject::builder("QObject").property("objectName", "string").build();
        MetaObject::builder("QQuickItem").inherits(&object).property("width", "real").default_property("data").build()
    }

    #[test]
    fn test_chain_order_is_base_first() {
        let rect = MetaObject::builder("QQuickRectangle").inherits(&item()).build();
        let names: Vec<&str> = rect.chain().iter().map(|mo| mo.class_name.as_str()).collect();
        assert_eq!(names, vec!["QObject", "QQuickItem", "QQuickRectangle"]);
        assert!(rect.inherits("QObject"));
        assert!(!rect.inherits("QQuickText"));
    }

    #[test]
    fn test_default_property_is_inherited() {
        let rect = MetaObject::builder("QQuickRectangle").inherits(&item()).build();
        assert_eq!(rect.default_property(), Some("data"));
    }

    #[test]
    fn test_revisioned_members() {
        assert!(!item().has_revisioned_members());
        let revisioned = MetaObject::builder("QQuickFlickable").inherits(&item()).revisioned_property("synchronousDrag", "bool", 12).build();
        assert!(revisioned.has_revisioned_members());
    }
}
