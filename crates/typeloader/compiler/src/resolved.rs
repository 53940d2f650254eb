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

//! Compiler inputs produced by dependency resolution

use crate::unit::CompiledUnit;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use typeloader_common::{Location, Version};
use typeloader_registry::{Digest, PropertyCache, TypeDescriptor};
use url::Url;

/// A type reference after resolution
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub descriptor: Option<Arc<TypeDescriptor>>,
    /// Compiled unit of a composite dependency; absent for cyclic references that only name the type
    pub compiled: Option<Arc<CompiledUnit>>,
    /// Version of the import the type was found through
    pub version: Option<Version>,
    pub location: Location,
    pub needs_creation: bool,
}

impl ResolvedType {
    pub fn native(descriptor: Arc<TypeDescriptor>, version: Option<Version>, location: Location) -> Self {
        Self {
            descriptor: Some(descriptor),
            compiled: None,
            version,
            location,
            needs_creation: false,
        }
    }

    /// Minor version used to filter revisioned members
    pub fn minor_version(&self) -> u32 {
        self.version.map(|v| v.minor).unwrap_or(u32::MAX)
    }

    /// Root property cache of the type: the composite's root object or the native type's cache
    pub fn property_cache(&self) -> Option<PropertyCache> {
        if let Some(unit) = &self.compiled {
            return unit.root_property_cache().cloned();
        }
        self.descriptor.as_ref().filter(|d| !d.is_composite())?.property_cache(self.minor_version())
    }

    /// Value of `Type.Key`
    pub fn enum_value(&self, key: &str) -> Option<i64> {
        if let Some(unit) = &self.compiled {
            return unit.root_property_cache()?.unscoped_enum_value(key);
        }
        self.descriptor.as_ref()?.enum_value(key)
    }

    /// Value of `Type.Enum.Key`
    pub fn scoped_enum_value(&self, enum_name: &str, key: &str) -> Option<i64> {
        if let Some(unit) = &self.compiled {
            return unit.root_property_cache()?.enum_value(enum_name, key);
        }
        let descriptor = self.descriptor.as_ref()?;
        let index = descriptor.scoped_enum_index(enum_name)?;
        descriptor.scoped_enum_value(index, key)
    }
}

/// Resolved types keyed by the name used in the document, in name order
pub type ResolvedTypeMap = BTreeMap<String, ResolvedType>;

/// A script imported with `import "file.js" as Qualifier`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScript {
    pub qualifier: String,
    pub url: Url,
    /// blake3 of the script source; absent if the script failed to load
    pub checksum: Option<Digest>,
    pub location: Location,
}

/// The names a compiled unit can see: types, import namespaces and scripts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeNameCache {
    /// Name as used in the document to `module/Type` or the composite URL
    pub types: BTreeMap<String, String>,
    /// Import qualifiers
    pub namespaces: BTreeSet<String>,
    /// Script qualifier to script URL
    pub scripts: BTreeMap<String, Url>,
}

impl TypeNameCache {
    pub fn add_type(&mut self, name: &str, target: impl Into<String>) {
        self.types.insert(name.to_string(), target.into());
    }

    pub fn add_namespace(&mut self, qualifier: &str) {
        self.namespaces.insert(qualifier.to_string());
    }

    pub fn add_script(&mut self, qualifier: &str, url: &Url) {
        self.scripts.insert(qualifier.to_string(), url.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.namespaces.is_empty() && self.scripts.is_empty()
    }
}
