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

//! The process-wide type registry
//!
//! Maps `(module, element name, version)` to shared [`TypeDescriptor`]s and
//! composite source URLs to their registered types.

use crate::descriptor::{TypeDescriptor, TypeId, TypeKind, TypeRegistration};
use parking_lot::{Mutex, RwLock, const_mutex};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use typeloader_common::Version;
use url::Url;

static TYPE_REGISTRATION_LOCK: Mutex<()> = const_mutex(());

/// The lock serialising lazy per-type setup
pub fn type_registration_lock() -> &'static Mutex<()> {
    &TYPE_REGISTRATION_LOCK
}

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Cannot register type {module}/{name} {version}: conflicts with existing {existing}")]
    DuplicateRegistration { module: String, name: String, version: Version, existing: String },

    #[error("Invalid type name \"{0}\": type names must begin with an uppercase letter")]
    InvalidTypeName(String),

    #[error("Composite type URL {0} is not absolute")]
    RelativeUrl(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Default)]
struct RegistryData {
    next_id: u32,
    types: Vec<Arc<TypeDescriptor>>,
    by_key: HashMap<(String, String, Version), Arc<TypeDescriptor>>,
    by_name: HashMap<(String, String), Vec<Arc<TypeDescriptor>>>,
    by_url: HashMap<Url, Arc<TypeDescriptor>>,
    modules: HashMap<String, BTreeSet<u32>>,
}

/// Registry of all known types
#[derive(Default)]
pub struct TypeRegistry {
    data: RwLock<RegistryData>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, returning its shared descriptor.
    ///
    /// Registering an identical type again returns the existing descriptor.
    #[instrument(skip(self, registration), fields(module = %registration.module, name = %registration.element_name, version = %registration.version))]
    pub fn register(&self, registration: TypeRegistration) -> RegistryResult<Arc<TypeDescriptor>> {
        if !registration.element_name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            return Err(RegistryError::InvalidTypeName(registration.element_name));
        }

        let mut data = self.data.write();
        let key = (registration.module.clone(), registration.element_name.clone(), registration.version);

        if let Some(existing) = data.by_key.get(&key) {
            if existing.registration().is_compatible_with(&registration) {
                debug!("Type already registered");
                return Ok(Arc::clone(existing));
            }
            return Err(duplicate(&registration, existing));
        }

        let name_key = (registration.module.clone(), registration.element_name.clone());
        let conflict = data.by_name.get(&name_key).and_then(|versions| {
            versions.iter().find(|d| {
                d.version().major == registration.version.major
                    && !d.is_composite()
                    && registration.kind != TypeKind::Composite
                    && registration.kind != TypeKind::CompositeSingleton
                    && !d.registration().is_compatible_with(&registration)
            })
        });
        if let Some(conflict) = conflict {
            warn!(existing = %conflict.qml_type_name(), "Conflicting native registration within one major version");
            return Err(duplicate(&registration, conflict));
        }

        let id = TypeId(data.next_id);
        data.next_id += 1;
        let url = registration.source_url().cloned();
        let version = registration.version;
        let module = registration.module.clone();
        let descriptor = Arc::new(TypeDescriptor::new(id, registration));

        data.types.push(Arc::clone(&descriptor));
        data.by_key.insert(key, Arc::clone(&descriptor));
        let versions = data.by_name.entry(name_key).or_default();
        versions.push(Arc::clone(&descriptor));
        versions.sort_by_key(|d| d.version());
        if let Some(url) = url {
            data.by_url.insert(url, Arc::clone(&descriptor));
        }
        if !module.is_empty() {
            data.modules.entry(module).or_default().insert(version.major);
        }

        debug!(id = %id, "Registered type");
        Ok(descriptor)
    }

    /// Highest registered version of `module/name` with the given major and a minor of at most `minor`
    pub fn lookup(&self, module: &str, name: &str, major: u32, minor: u32) -> Option<Arc<TypeDescriptor>> {
        let requested = Version::new(major, minor);
        let data = self.data.read();
        data.by_name
            .get(&(module.to_string(), name.to_string()))?
            .iter()
            .rev()
            .find(|d| d.version().available_in(requested))
            .cloned()
    }

    /// Highest registered version of `module/name`, for imports without a version
    pub fn lookup_latest(&self, module: &str, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.data.read().by_name.get(&(module.to_string(), name.to_string()))?.last().cloned()
    }

    /// Whether any type has been registered for `uri`
    pub fn is_module_installed(&self, uri: &str) -> bool {
        self.data.read().modules.contains_key(uri)
    }

    /// Whether `uri` has types registered under `major`
    pub fn module_has_major(&self, uri: &str, major: u32) -> bool {
        self.data.read().modules.get(uri).is_some_and(|majors| majors.contains(&major))
    }

    /// Names of every type registered for `uri`
    pub fn module_type_names(&self, uri: &str) -> Vec<String> {
        let data = self.data.read();
        let mut names: Vec<String> = data.by_name.keys().filter(|(module, _)| module == uri).map(|(_, name)| name.clone()).collect();
        names.sort();
        names
    }

    /// Register (or find) the composite type defined by `url`.
    ///
    /// A singleton registration upgrades a previously registered plain composite
    /// for the same URL, since qmldir singleton declarations may be seen after
    /// the document was first referenced by path.
    pub fn register_composite(&self, url: &Url, module: &str, name: &str, version: Version, singleton: bool) -> RegistryResult<Arc<TypeDescriptor>> {
        if url.cannot_be_a_base() {
            return Err(RegistryError::RelativeUrl(url.to_string()));
        }
        if let Some(existing) = self.existing_composite(url, singleton) {
            return Ok(existing);
        }

        let registration = TypeRegistration::composite(url, module, name, version, singleton);
        let mut data = self.data.write();
        if let Some(existing) = data.by_url.get(url).filter(|existing| existing.is_composite_singleton() || !singleton) {
            return Ok(Arc::clone(existing));
        }

        let id = TypeId(data.next_id);
        data.next_id += 1;
        let descriptor = Arc::new(TypeDescriptor::new(id, registration));
        data.types.push(Arc::clone(&descriptor));
        data.by_url.insert(url.clone(), Arc::clone(&descriptor));
        if !module.is_empty() {
            let key = (module.to_string(), name.to_string(), version);
            data.by_key.insert(key, Arc::clone(&descriptor));
            let versions = data.by_name.entry((module.to_string(), name.to_string())).or_default();
            versions.retain(|d| d.source_url() != Some(url));
            versions.push(Arc::clone(&descriptor));
            versions.sort_by_key(|d| d.version());
            data.modules.entry(module.to_string()).or_default().insert(version.major);
        }
        info!(url = %url, singleton, "Registered composite type");
        Ok(descriptor)
    }

    fn existing_composite(&self, url: &Url, singleton: bool) -> Option<Arc<TypeDescriptor>> {
        let data = self.data.read();
        data.by_url.get(url).filter(|existing| existing.is_composite_singleton() || !singleton).cloned()
    }

    /// Composite type registered for `url`
    pub fn qml_type_for_url(&self, url: &Url) -> Option<Arc<TypeDescriptor>> {
        self.data.read().by_url.get(url).cloned()
    }

    /// Descriptor by id
    pub fn get(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.data.read().types.iter().find(|d| d.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.data.read().types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn duplicate(registration: &TypeRegistration, existing: &TypeDescriptor) -> RegistryError {
    RegistryError::DuplicateRegistration {
        module: registration.module.clone(),
        name: registration.element_name.clone(),
        version: registration.version,
        existing: format!("{} {}", existing.qml_type_name(), existing.version()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaObject;
    use proptest::prelude::*;

    fn native(module: &str, name: &str, class: &str, major: u32, minor: u32) -> TypeRegistration {
        TypeRegistration::native(module, name, Version::new(major, minor), MetaObject::builder(class).build())
    }

    #[test]
    fn test_identical_registration_is_idempotent() {
        let registry = TypeRegistry::new();
        let first = registry.register(native("QtQuick", "Item", "QQuickItem", 2, 0)).unwrap();
        let second = registry.register(native("QtQuick", "Item", "QQuickItem", 2, 0)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflicting_registration_is_rejected() {
        let registry = TypeRegistry::new();
        registry.register(native("QtQuick", "Item", "QQuickItem", 2, 0)).unwrap();

        let same_key = registry.register(native("QtQuick", "Item", "QQuickOtherItem", 2, 0));
        assert!(matches!(same_key, Err(RegistryError::DuplicateRegistration { .. })));

        let same_major = registry.register(native("QtQuick", "Item", "QQuickOtherItem", 2, 4));
        assert!(matches!(same_major, Err(RegistryError::DuplicateRegistration { .. })));

        let other_major = registry.register(native("QtQuick", "Item", "QQuickOtherItem", 3, 0));
        assert!(other_major.is_ok());
    }

    #[test]
    fn test_lowercase_name_is_rejected() {
        let registry = TypeRegistry::new();
        let result = registry.register(native("QtQuick", "item", "QQuickItem", 2, 0));
        assert_eq!(result.unwrap_err(), RegistryError::InvalidTypeName("item".to_string()));
    }

    #[test]
    fn test_lookup_picks_highest_available_minor() {
        let registry = TypeRegistry::new();
        registry.register(native("QtQuick", "Item", "QQuickItem", 2, 0)).unwrap();
        registry.register(native("QtQuick", "Item", "QQuickItem", 2, 4)).unwrap();

        assert_eq!(registry.lookup("QtQuick", "Item", 2, 3).unwrap().version(), Version::new(2, 0));
        assert_eq!(registry.lookup("QtQuick", "Item", 2, 15).unwrap().version(), Version::new(2, 4));
        assert!(registry.lookup("QtQuick", "Item", 1, 15).is_none());
        assert!(registry.lookup("QtQuick", "Rectangle", 2, 15).is_none());
        assert!(registry.is_module_installed("QtQuick"));
        assert!(registry.module_has_major("QtQuick", 2));
        assert!(!registry.module_has_major("QtQuick", 3));
        assert_eq!(registry.lookup_latest("QtQuick", "Item").unwrap().version(), Version::new(2, 4));
    }

    #[test]
    fn test_composite_registration_by_url() {
        let registry = TypeRegistry::new();
        let url = Url::parse("file:///app/Style.qml").unwrap();
        let plain = registry.register_composite(&url, "", "Style", Version::new(1, 0), false).unwrap();
        assert!(!plain.is_composite_singleton());

        let again = registry.register_composite(&url, "", "Style", Version::new(1, 0), false).unwrap();
        assert!(Arc::ptr_eq(&plain, &again));

        let singleton = registry.register_composite(&url, "", "Style", Version::new(1, 0), true).unwrap();
        assert!(singleton.is_composite_singleton());
        assert!(Arc::ptr_eq(&registry.qml_type_for_url(&url).unwrap(), &singleton));
    }

    proptest! {
        #[test]
        fn prop_lookup_returns_highest_minor_not_above_request(
            minors in proptest::collection::btree_set(0u32..20, 1..6),
            requested in 0u32..25,
        ) {
            let registry = TypeRegistry::new();
            for minor in &minors {
                registry.register(native("Shapes", "Shape", "QQuickShape", 1, *minor)).unwrap();
            }
            let expected = minors.iter().copied().filter(|m| *m <= requested).max();
            let found = registry.lookup("Shapes", "Shape", 1, requested).map(|d| d.version().minor);
            prop_assert_eq!(found, expected);
        }
    }
}
