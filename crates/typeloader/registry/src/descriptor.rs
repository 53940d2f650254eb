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

//! Type descriptors
//!
//! A [`TypeDescriptor`] is the immutable description of one registered type.
//! Data derived from the meta object (enum tables, the extended chain and the
//! meta-object checksum) is computed on first use, exactly once, under the
//! process-wide type registration lock.

use crate::Digest;
use crate::enums::{EnumTable, enum_sources};
use crate::meta::MetaObject;
use crate::property_cache::{EnumData, PropertyCache, PropertyData};
use crate::registry::type_registration_lock;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;
use typeloader_common::Version;
use url::Url;

/// Registry-assigned identity of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Native,
    Singleton,
    CompositeSingleton,
    Interface,
    Composite,
}

/// Data of a natively implemented type
#[derive(Debug, Clone)]
pub struct NativeTypeData {
    pub meta_object: Arc<MetaObject>,
    pub extension: Option<Arc<MetaObject>>,
    pub creatable: bool,
    pub no_creation_reason: Option<String>,
    /// Also enter keys of scoped enums into the unscoped table
    pub register_enum_classes_unscoped: bool,
}

/// Data of a native singleton
#[derive(Debug, Clone)]
pub struct SingletonTypeData {
    pub type_name: String,
    pub meta_object: Option<Arc<MetaObject>>,
}

/// Kind-specific descriptor data
#[derive(Debug, Clone)]
pub enum TypeData {
    Native(NativeTypeData),
    Singleton(SingletonTypeData),
    Composite { url: Url },
    Interface { iid: String },
}

/// Extended meta-object information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedInfo {
    /// Class names from the root base class to the type, followed by the extension chain
    pub chain: Vec<String>,
    pub contains_revisioned: bool,
}

/// A request to register a type
#[derive(Debug, Clone)]
pub struct TypeRegistration {
    pub module: String,
    pub element_name: String,
    pub version: Version,
    pub kind: TypeKind,
    pub data: TypeData,
}

impl TypeRegistration {
    /// A creatable native type
    pub fn native(module: &str, element_name: &str, version: Version, meta_object: Arc<MetaObject>) -> Self {
        Self {
            module: module.to_string(),
            element_name: element_name.to_string(),
            version,
            kind: TypeKind::Native,
            data: TypeData::Native(NativeTypeData {
                meta_object,
                extension: None,
                creatable: true,
                no_creation_reason: None,
                register_enum_classes_unscoped: true,
            }),
        }
    }

    /// A native singleton
    pub fn singleton(module: &str, element_name: &str, version: Version, type_name: &str, meta_object: Option<Arc<MetaObject>>) -> Self {
        Self {
            module: module.to_string(),
            element_name: element_name.to_string(),
            version,
            kind: TypeKind::Singleton,
            data: TypeData::Singleton(SingletonTypeData {
                type_name: type_name.to_string(),
                meta_object,
            }),
        }
    }

    /// An interface, usable as a property type but never instantiated
    pub fn interface(module: &str, element_name: &str, version: Version, iid: &str) -> Self {
        Self {
            module: module.to_string(),
            element_name: element_name.to_string(),
            version,
            kind: TypeKind::Interface,
            data: TypeData::Interface { iid: iid.to_string() },
        }
    }

    /// A type defined by a source document
    pub fn composite(url: &Url, module: &str, element_name: &str, version: Version, singleton: bool) -> Self {
        Self {
            module: module.to_string(),
            element_name: element_name.to_string(),
            version,
            kind: if singleton { TypeKind::CompositeSingleton } else { TypeKind::Composite },
            data: TypeData::Composite { url: url.clone() },
        }
    }

    /// Attach an extension meta object to a native type
    pub fn with_extension(mut self, extension: Arc<MetaObject>) -> Self {
        if let TypeData::Native(native) = &mut self.data {
            native.extension = Some(extension);
        }
        self
    }

    /// Mark a native type as not creatable from documents
    pub fn uncreatable(mut self, reason: &str) -> Self {
        if let TypeData::Native(native) = &mut self.data {
            native.creatable = false;
            native.no_creation_reason = Some(reason.to_string());
        }
        self
    }

    /// Keep keys of scoped enums out of the unscoped table
    pub fn with_scoped_enums_only(mut self) -> Self {
        if let TypeData::Native(native) = &mut self.data {
            native.register_enum_classes_unscoped = false;
        }
        self
    }

    /// Native class implementing the type, if any
    pub fn class_name(&self) -> Option<&str> {
        match &self.data {
            TypeData::Native(native) => Some(native.meta_object.class_name.as_str()),
            TypeData::Singleton(singleton) => Some(singleton.type_name.as_str()),
            TypeData::Interface { iid } => Some(iid.as_str()),
            TypeData::Composite { .. } => None,
        }
    }

    /// Source document of a composite registration
    pub fn source_url(&self) -> Option<&Url> {
        match &self.data {
            TypeData::Composite { url } => Some(url),
            _ => None,
        }
    }

    /// Whether two registrations describe the same type
    pub fn is_compatible_with(&self, other: &TypeRegistration) -> bool {
        if self.kind != other.kind || self.class_name() != other.class_name() {
            return false;
        }
        match (&self.data, &other.data) {
            (TypeData::Composite { url: a }, TypeData::Composite { url: b }) => a == b,
            _ => true,
        }
    }
}

/// A registered type
#[derive(Debug)]
pub struct TypeDescriptor {
    id: TypeId,
    registration: TypeRegistration,
    enums: OnceLock<EnumTable>,
    extended: OnceLock<ExtendedInfo>,
    checksum: OnceLock<Option<Digest>>,
}

impl TypeDescriptor {
    pub(crate) fn new(id: TypeId, registration: TypeRegistration) -> Self {
        Self {
            id,
            registration,
            enums: OnceLock::new(),
            extended: OnceLock::new(),
            checksum: OnceLock::new(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn module(&self) -> &str {
        &self.registration.module
    }

    pub fn element_name(&self) -> &str {
        &self.registration.element_name
    }

    pub fn version(&self) -> Version {
        self.registration.version
    }

    pub fn kind(&self) -> TypeKind {
        self.registration.kind
    }

    pub fn data(&self) -> &TypeData {
        &self.registration.data
    }

    pub(crate) fn registration(&self) -> &TypeRegistration {
        &self.registration
    }

    /// `module/element`, or just the element name for unnamed modules
    pub fn qml_type_name(&self) -> String {
        if self.module().is_empty() { self.element_name().to_string() } else { format!("{}/{}", self.module(), self.element_name()) }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind(), TypeKind::Composite | TypeKind::CompositeSingleton)
    }

    pub fn is_composite_singleton(&self) -> bool {
        self.kind() == TypeKind::CompositeSingleton
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self.kind(), TypeKind::Singleton | TypeKind::CompositeSingleton)
    }

    pub fn is_interface(&self) -> bool {
        self.kind() == TypeKind::Interface
    }

    /// Whether documents may declare instances of this type
    pub fn is_creatable(&self) -> bool {
        match self.data() {
            TypeData::Native(native) => native.creatable,
            TypeData::Composite { .. } => self.kind() == TypeKind::Composite,
            TypeData::Singleton(_) | TypeData::Interface { .. } => false,
        }
    }

    pub fn no_creation_reason(&self) -> Option<&str> {
        match self.data() {
            TypeData::Native(native) => native.no_creation_reason.as_deref(),
            _ => None,
        }
    }

    /// Source document of a composite type
    pub fn source_url(&self) -> Option<&Url> {
        match self.data() {
            TypeData::Composite { url } => Some(url),
            _ => None,
        }
    }

    /// Meta object of native types and native singletons
    pub fn meta_object(&self) -> Option<&Arc<MetaObject>> {
        match self.data() {
            TypeData::Native(native) => Some(&native.meta_object),
            TypeData::Singleton(singleton) => singleton.meta_object.as_ref(),
            _ => None,
        }
    }

    fn extension(&self) -> Option<&Arc<MetaObject>> {
        match self.data() {
            TypeData::Native(native) => native.extension.as_ref(),
            _ => None,
        }
    }

    /// Extended chain information, computed once
    pub fn extended(&self) -> Option<&ExtendedInfo> {
        let meta = self.meta_object()?;
        Some(self.extended.get_or_init(|| {
            let _guard = type_registration_lock().lock();
            let mut chain: Vec<String> = meta.chain().iter().map(|mo| mo.class_name.clone()).collect();
            let mut contains_revisioned = meta.has_revisioned_members();
            if let Some(extension) = self.extension() {
                chain.extend(extension.chain().iter().map(|mo| mo.class_name.clone()));
                contains_revisioned |= extension.has_revisioned_members();
            }
            ExtendedInfo { chain, contains_revisioned }
        }))
    }

    /// Enum table, built on first query
    pub fn enum_table(&self) -> Option<&EnumTable> {
        let meta = self.meta_object()?;
        // Computed before taking the lock below; `extended` locks on its own.
        let _ = self.extended();
        Some(self.enums.get_or_init(|| {
            let _guard = type_registration_lock().lock();
            let unscoped = match self.data() {
                TypeData::Native(native) => native.register_enum_classes_unscoped,
                _ => true,
            };
            let sources = enum_sources(meta, self.extension().map(|e| e.as_ref()));
            debug!(type_name = %self.qml_type_name(), sources = sources.len(), "Building enum table");
            EnumTable::build(&sources, unscoped)
        }))
    }

    /// Value of an unscoped enum key
    pub fn enum_value(&self, key: &str) -> Option<i64> {
        self.enum_table()?.value(key)
    }

    /// Index of the scoped table for enum `name`
    pub fn scoped_enum_index(&self, name: &str) -> Option<usize> {
        self.enum_table()?.scoped_index(name)
    }

    /// Value of `key` within the scoped table at `index`
    pub fn scoped_enum_value(&self, index: usize, key: &str) -> Option<i64> {
        self.enum_table()?.scoped_value(index, key)
    }

    /// Stable checksum of the native meta-object chain. Composite types have none.
    pub fn metaobject_checksum(&self) -> Option<Digest> {
        *self.checksum.get_or_init(|| {
            let mut hasher = blake3::Hasher::new();
            hasher.update(self.qml_type_name().as_bytes());
            match self.data() {
                TypeData::Composite { .. } => return None,
                TypeData::Interface { iid } => {
                    hasher.update(iid.as_bytes());
                }
                TypeData::Singleton(singleton) => {
                    hasher.update(singleton.type_name.as_bytes());
                    if let Some(meta) = &singleton.meta_object {
                        meta.hash_into(&mut hasher);
                    }
                }
                TypeData::Native(native) => {
                    native.meta_object.hash_into(&mut hasher);
                    if let Some(extension) = &native.extension {
                        extension.hash_into(&mut hasher);
                    }
                }
            }
            Some(*hasher.finalize().as_bytes())
        })
    }

    /// Property cache of a native type as seen by an import of `minor`.
    ///
    /// Members introduced in a later minor revision are left out.
    pub fn property_cache(&self, minor: u32) -> Option<PropertyCache> {
        let meta = self.meta_object()?;
        let filter_revisions = self.extended().is_some_and(|info| info.contains_revisioned);
        let visible = |revision: u32| !filter_revisions || revision <= minor;

        let mut cache = PropertyCache::new(&meta.class_name, Some(&meta.class_name));
        let extension_chain = self.extension().map(|e| e.chain()).unwrap_or_default();
        for mo in meta.chain().into_iter().chain(extension_chain) {
            for property in mo.properties.iter().filter(|p| visible(p.revision)) {
                let mut data = PropertyData::new(&property.name, &property.type_name);
                data.writable = property.writable;
                data.revision = property.revision;
                cache.append_property(data);
            }
            for signal in mo.signals.iter().filter(|s| visible(s.revision)) {
                cache.append_signal(&signal.name, signal.parameters.clone());
            }
            for method in mo.methods.iter().filter(|m| visible(m.revision)) {
                cache.append_method(&method.name, method.parameters.clone());
            }
            for meta_enum in &mo.enums {
                cache.append_enum(EnumData {
                    name: meta_enum.name.clone(),
                    scoped: meta_enum.scoped,
                    values: meta_enum.keys.clone(),
                });
            }
        }
        cache.default_property = meta.default_property().map(str::to_string);
        Some(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaEnum;

    fn flickable() -> TypeDescriptor {
        let item = MetaObject::builder("QQuickItem")
            .property("width", "real")
            .enumeration(MetaEnum::sequential("TransformOrigin", &["TopLeft", "Center"]))
            .enumeration(MetaEnum::with_values("Status", &[("Null", 0), ("Ready", 1)]).scoped())
            .build();
        let meta = MetaObject::builder("QQuickFlickable").inherits(&item).revisioned_property("boundsMovement", "enum", 10).build();
        TypeDescriptor::new(TypeId(1), TypeRegistration::native("QtQuick", "Flickable", Version::new(2, 0), meta))
    }

    #[test]
    fn test_enum_queries() {
        let descriptor = flickable();
        assert_eq!(descriptor.enum_value("Center"), Some(1));
        assert_eq!(descriptor.enum_value("Ready"), Some(1));
        let index = descriptor.scoped_enum_index("Status").unwrap();
        assert_eq!(descriptor.scoped_enum_value(index, "Null"), Some(0));
        assert_eq!(descriptor.scoped_enum_index("Missing"), None);
    }

    #[test]
    fn test_scoped_only_registration() {
        let meta = MetaObject::builder("QQuickImage").enumeration(MetaEnum::with_values("Status", &[("Ready", 1)]).scoped()).build();
        let descriptor = TypeDescriptor::new(TypeId(2), TypeRegistration::native("QtQuick", "Image", Version::new(2, 0), meta).with_scoped_enums_only());
        assert_eq!(descriptor.enum_value("Ready"), None);
        let index = descriptor.scoped_enum_index("Status").unwrap();
        assert_eq!(descriptor.scoped_enum_value(index, "Ready"), Some(1));
    }

    #[test]
    fn test_property_cache_respects_revisions() {
        let descriptor = flickable();
        assert!(descriptor.extended().unwrap().contains_revisioned);
        assert!(descriptor.property_cache(0).unwrap().property("boundsMovement").is_none());
        assert!(descriptor.property_cache(10).unwrap().property("boundsMovement").is_some());
        assert!(descriptor.property_cache(0).unwrap().property("width").is_some());
    }

    #[test]
    fn test_checksum_is_stable_and_absent_for_composites() {
        assert_eq!(flickable().metaobject_checksum(), flickable().metaobject_checksum());
        assert!(flickable().metaobject_checksum().is_some());

        let url = Url::parse("file:///app/Button.qml").unwrap();
        let composite = TypeDescriptor::new(TypeId(3), TypeRegistration::composite(&url, "", "Button", Version::new(1, 0), false));
        assert_eq!(composite.metaobject_checksum(), None);
        assert!(composite.is_creatable());
        assert_eq!(composite.source_url(), Some(&url));
    }

    #[test]
    fn test_creatability() {
        let meta = MetaObject::builder("QQuickKeys").build();
        let keys = TypeDescriptor::new(TypeId(4), TypeRegistration::native("QtQuick", "Keys", Version::new(2, 0), meta).uncreatable("Keys is only available via attached properties"));
        assert!(!keys.is_creatable());
        assert_eq!(keys.no_creation_reason(), Some("Keys is only available via attached properties"));
    }
}
