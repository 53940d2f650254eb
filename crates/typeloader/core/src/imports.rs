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

//! Imports of a document and type resolution through them

use crate::qmldir::Qmldir;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use typeloader_common::{Location, Version};
use typeloader_compiler::{ImportKind, ImportRecord};
use typeloader_registry::{TypeDescriptor, TypeRegistry};
use url::Url;

/// Why a type name did not resolve
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Namespace {0} cannot be used as a type")]
    NamespaceUsedAsType(String),

    #[error("module \"{0}\" is not installed")]
    ModuleNotInstalled(String),

    #[error("{0} is not a type")]
    TypeNotFound(String),

    #[error("Element is not creatable.")]
    ElementNotCreatable(String),
}

/// A composite type offered by a directory or module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeEntry {
    pub name: String,
    pub url: Url,
    pub version: Option<Version>,
    pub singleton: bool,
    pub internal: bool,
}

/// One import of a document
#[derive(Debug, Clone)]
pub struct ImportEntry {
    pub record: ImportRecord,
    /// Module uri; empty for directory imports
    pub uri: String,
    /// Directory holding the qmldir or the directory's documents
    pub base: Option<Url>,
    pub qmldir: Option<Arc<Qmldir>>,
    pub composites: Vec<CompositeEntry>,
    /// Remote directories without a qmldir entry for a name fall back to `<dir>/<Name>.qml`
    pub remote: bool,
    /// Zero until the import is known to exist
    pub priority: u32,
}

impl ImportEntry {
    /// A module import; `qmldir` is the module manifest found on the import path
    pub fn module(record: ImportRecord, uri: &str, qmldir: Option<(Url, Arc<Qmldir>)>) -> Self {
        let mut entry = Self {
            record,
            uri: uri.to_string(),
            base: None,
            qmldir: None,
            composites: Vec::new(),
            remote: false,
            priority: 0,
        };
        if let Some((base, qmldir)) = qmldir {
            entry.base = Some(base);
            entry.set_qmldir(qmldir);
        }
        entry
    }

    /// A directory import; contents are added with [`Self::add_listing`] and [`Self::set_qmldir`]
    pub fn directory(record: ImportRecord, base: Url, remote: bool) -> Self {
        Self {
            record,
            uri: String::new(),
            base: Some(base),
            qmldir: None,
            composites: Vec::new(),
            remote,
            priority: 0,
        }
    }

    /// The implicit import of the document's own directory
    pub fn implicit(document_url: &Url, remote: bool) -> Option<Self> {
        let base = document_url.join("./").ok()?;
        let record = ImportRecord {
            kind: ImportKind::Directory { path: ".".to_string() },
            version: None,
            qualifier: None,
            location: Location::unknown(),
        };
        Some(Self::directory(record, base, remote))
    }

    pub fn is_module(&self) -> bool {
        !self.uri.is_empty()
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.record.qualifier.as_deref()
    }

    /// Where this import's qmldir lives
    pub fn qmldir_url(&self) -> Option<Url> {
        self.base.as_ref()?.join("qmldir").ok()
    }

    /// Add the composite entries of a qmldir; earlier entries (from listings) with the same name are replaced
    pub fn set_qmldir(&mut self, qmldir: Arc<Qmldir>) {
        if let Some(base) = &self.base {
            let from_qmldir: Vec<CompositeEntry> = qmldir
                .components
                .iter()
                .filter_map(|c| {
                    Some(CompositeEntry {
                        name: c.name.clone(),
                        url: base.join(&c.file).ok()?,
                        version: c.version,
                        singleton: c.singleton,
                        internal: c.internal,
                    })
                })
                .collect();
            self.composites.retain(|existing| !from_qmldir.iter().any(|c| c.name == existing.name));
            self.composites.extend(from_qmldir);
        }
        self.qmldir = Some(qmldir);
    }

    /// Add the `Name.qml` documents of a local directory listing
    pub fn add_listing(&mut self, files: &[String]) {
        let Some(base) = self.base.clone() else { return };
        for file in files {
            let Some(name) = file.strip_suffix(".qml") else { continue };
            if !name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) || self.composites.iter().any(|c| c.name == name) {
                continue;
            }
            if let Ok(url) = base.join(file) {
                self.composites.push(CompositeEntry {
                    name: name.to_string(),
                    url,
                    version: None,
                    singleton: false,
                    internal: false,
                });
            }
        }
    }

    /// Composite singletons declared by this import's qmldir
    pub fn composite_singletons(&self) -> impl Iterator<Item = &CompositeEntry> {
        self.composites.iter().filter(|c| c.singleton)
    }

    fn composite(&self, name: &str, include_internal: bool) -> Option<&CompositeEntry> {
        let requested = self.record.version;
        self.composites
            .iter()
            .filter(|c| c.name == name && (include_internal || !c.internal))
            .filter(|c| match (c.version, requested) {
                (Some(available), Some(requested)) => available.available_in(requested),
                _ => true,
            })
            .max_by_key(|c| c.version)
    }

    /// Resolve `name` within this import
    pub fn resolve(&self, registry: &TypeRegistry, name: &str, include_internal: bool) -> Option<ImportedType> {
        if let Some(entry) = self.composite(name, include_internal) {
            let version = entry.version.or(self.record.version).unwrap_or(Version::new(1, 0));
            let descriptor = registry.register_composite(&entry.url, &self.uri, &entry.name, version, entry.singleton).ok()?;
            return Some(ImportedType { descriptor, version: self.record.version });
        }

        if self.is_module() {
            let descriptor = match self.record.version {
                Some(v) => registry.lookup(&self.uri, name, v.major, v.minor),
                None => registry.lookup_latest(&self.uri, name),
            }?;
            return Some(ImportedType { descriptor, version: self.record.version });
        }

        if self.remote && self.priority > 0 && name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            let url = self.base.as_ref()?.join(&format!("{}.qml", name)).ok()?;
            let descriptor = registry.register_composite(&url, "", name, Version::new(1, 0), false).ok()?;
            return Some(ImportedType { descriptor, version: None });
        }
        None
    }
}

/// A type found through the imports
#[derive(Debug, Clone)]
pub struct ImportedType {
    pub descriptor: Arc<TypeDescriptor>,
    /// Version of the import the type came through
    pub version: Option<Version>,
}

/// `import "file.js" as Qualifier`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptImport {
    pub qualifier: String,
    pub url: Url,
    pub location: Location,
}

/// Every import of one document.
///
/// Later explicit imports take precedence over earlier ones; the implicit
/// import of the document's directory is consulted last.
#[derive(Debug, Clone, Default)]
pub struct ImportCache {
    entries: Vec<ImportEntry>,
    implicit: Option<ImportEntry>,
    implicit_loaded: bool,
    scripts: Vec<ScriptImport>,
}

impl ImportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an explicit import, returning its index
    pub fn add(&mut self, mut entry: ImportEntry, found: bool) -> usize {
        let index = self.entries.len();
        if found {
            entry.priority = index as u32 + 1;
        }
        self.entries.push(entry);
        index
    }

    /// Add a script import unless its qualifier is already taken
    pub fn add_script(&mut self, script: ScriptImport) -> bool {
        if self.scripts.iter().any(|s| s.qualifier == script.qualifier) {
            return false;
        }
        self.scripts.push(script);
        true
    }

    pub fn set_implicit(&mut self, mut entry: ImportEntry) {
        entry.priority = u32::MAX;
        self.implicit = Some(entry);
        self.implicit_loaded = true;
    }

    pub fn is_implicit_loaded(&self) -> bool {
        self.implicit_loaded
    }

    pub fn entries(&self) -> &[ImportEntry] {
        &self.entries
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut ImportEntry> {
        self.entries.get_mut(index)
    }

    pub fn implicit(&self) -> Option<&ImportEntry> {
        self.implicit.as_ref()
    }

    pub fn implicit_mut(&mut self) -> Option<&mut ImportEntry> {
        self.implicit.as_mut()
    }

    pub fn scripts(&self) -> &[ScriptImport] {
        &self.scripts
    }

    /// Attach a qmldir that arrived after the imports were set up. Explicit
    /// imports waiting for it become available.
    pub fn attach_qmldir(&mut self, qmldir_url: &Url, qmldir: &Arc<Qmldir>) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.priority == 0 && entry.qmldir_url().as_ref() == Some(qmldir_url) {
                entry.set_qmldir(Arc::clone(qmldir));
                entry.priority = index as u32 + 1;
            }
        }
        if let Some(implicit) = self.implicit.as_mut() {
            if implicit.qmldir.is_none() && implicit.qmldir_url().as_ref() == Some(qmldir_url) {
                implicit.set_qmldir(Arc::clone(qmldir));
            }
        }
    }

    /// Explicit imports that never resolved
    pub fn unresolved(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter().filter(|e| e.priority == 0)
    }

    /// Import and script qualifiers
    pub fn namespaces(&self) -> BTreeSet<String> {
        self.entries.iter().filter_map(|e| e.qualifier().map(str::to_string)).chain(self.scripts.iter().map(|s| s.qualifier.clone())).collect()
    }

    pub fn is_namespace(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.qualifier() == Some(name)) || self.scripts.iter().any(|s| s.qualifier == name)
    }

    /// Every import in lookup order: explicit imports latest first, then the implicit one
    fn lookup_order(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter().rev().chain(self.implicit.iter())
    }

    /// Composite singletons declared by any imported qmldir, keyed by the name documents use
    pub fn composite_singletons(&self) -> Vec<(String, &CompositeEntry)> {
        let mut singletons: Vec<(String, &CompositeEntry)> = Vec::new();
        for entry in self.lookup_order() {
            for singleton in entry.composite_singletons() {
                let name = match entry.qualifier() {
                    Some(qualifier) => format!("{}.{}", qualifier, singleton.name),
                    None => singleton.name.clone(),
                };
                if !singletons.iter().any(|(existing, _)| *existing == name) {
                    singletons.push((name, singleton));
                }
            }
        }
        singletons
    }

    /// Resolve a possibly qualified type name against the loaded imports
    pub fn resolve_type(&self, registry: &TypeRegistry, name: &str) -> Result<ImportedType, ResolveError> {
        let (qualifier, local) = match name.split_once('.') {
            Some((qualifier, local)) => (Some(qualifier), local),
            None => (None, name),
        };

        if qualifier.is_none() && self.is_namespace(name) {
            return Err(ResolveError::NamespaceUsedAsType(name.to_string()));
        }
        if let Some(qualifier) = qualifier {
            if !self.is_namespace(qualifier) {
                return Err(ResolveError::TypeNotFound(name.to_string()));
            }
        }

        let mut not_installed = None;
        for entry in self.lookup_order().filter(|e| e.qualifier() == qualifier) {
            if entry.priority == 0 {
                if entry.is_module() && not_installed.is_none() {
                    not_installed = Some(entry.uri.clone());
                }
                continue;
            }
            let is_implicit = entry.priority == u32::MAX;
            if let Some(found) = entry.resolve(registry, local, is_implicit) {
                return Ok(found);
            }
        }
        match not_installed {
            Some(uri) => Err(ResolveError::ModuleNotInstalled(uri)),
            None => Err(ResolveError::TypeNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typeloader_registry::builtins::register_builtin_types;

    fn record(kind: ImportKind, version: Option<Version>, qualifier: Option<&str>) -> ImportRecord {
        ImportRecord {
            kind,
            version,
            qualifier: qualifier.map(str::to_string),
            location: Location::new(1, 1),
        }
    }

    fn quick(qualifier: Option<&str>) -> ImportEntry {
        ImportEntry::module(record(ImportKind::Module { uri: "QtQuick".into() }, Some(Version::new(2, 0)), qualifier), "QtQuick", None)
    }

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        register_builtin_types(&registry).unwrap();
        registry
    }

    #[test]
    fn test_module_and_qualified_lookup() {
        let registry = registry();
        let mut imports = ImportCache::new();
        imports.add(quick(None), true);
        imports.add(quick(Some("Q")), true);

        let item = imports.resolve_type(&registry, "Item").unwrap();
        assert_eq!(item.descriptor.qml_type_name(), "QtQuick/Item");
        assert_eq!(item.version, Some(Version::new(2, 0)));
        assert!(imports.resolve_type(&registry, "Q.Rectangle").is_ok());
        assert_eq!(imports.resolve_type(&registry, "Q").unwrap_err(), ResolveError::NamespaceUsedAsType("Q".into()));
        assert_eq!(imports.resolve_type(&registry, "Z.Item").unwrap_err(), ResolveError::TypeNotFound("Z.Item".into()));
        assert_eq!(imports.resolve_type(&registry, "Button").unwrap_err(), ResolveError::TypeNotFound("Button".into()));
    }

    #[test]
    fn test_unresolved_module() {
        let registry = registry();
        let mut imports = ImportCache::new();
        let missing = ImportEntry::module(record(ImportKind::Module { uri: "Missing".into() }, Some(Version::new(1, 0)), None), "Missing", None);
        imports.add(missing, false);
        assert_eq!(imports.unresolved().count(), 1);
        assert_eq!(imports.resolve_type(&registry, "Thing").unwrap_err(), ResolveError::ModuleNotInstalled("Missing".into()));
    }

    #[test]
    fn test_later_import_wins_and_implicit_is_last() {
        let registry = registry();
        let base = Url::parse("file:///app/controls/").unwrap();
        let mut controls = ImportEntry::directory(record(ImportKind::Directory { path: "controls".into() }, None, None), base, false);
        controls.add_listing(&["Item.qml".to_string(), "helper.js".to_string(), "lower.qml".to_string()]);

        let mut imports = ImportCache::new();
        imports.add(quick(None), true);
        imports.add(controls, true);
        let mut implicit = ImportEntry::implicit(&Url::parse("file:///app/Main.qml").unwrap(), false).unwrap();
        implicit.add_listing(&["Rectangle.qml".to_string(), "Card.qml".to_string()]);
        imports.set_implicit(implicit);

        let item = imports.resolve_type(&registry, "Item").unwrap();
        assert_eq!(item.descriptor.source_url().unwrap().as_str(), "file:///app/controls/Item.qml");
        let rectangle = imports.resolve_type(&registry, "Rectangle").unwrap();
        assert_eq!(rectangle.descriptor.qml_type_name(), "QtQuick/Rectangle");
        let card = imports.resolve_type(&registry, "Card").unwrap();
        assert_eq!(card.descriptor.source_url().unwrap().as_str(), "file:///app/Card.qml");
        assert!(imports.resolve_type(&registry, "Lower").is_err());
    }

    #[test]
    fn test_qmldir_entries_versions_and_internal() {
        let registry = registry();
        let (qmldir, errors) = Qmldir::parse("module Controls\nsingleton Theme 1.0 Theme.qml\ninternal Private Private.qml\nButton 1.0 Button.qml\nButton 1.1 Button11.qml\n");
        assert!(errors.is_empty());
        let base = Url::parse("file:///modules/Controls/").unwrap();
        let entry = ImportEntry::module(
            record(ImportKind::Module { uri: "Controls".into() }, Some(Version::new(1, 0)), None),
            "Controls",
            Some((base, Arc::new(qmldir))),
        );
        let mut imports = ImportCache::new();
        imports.add(entry, true);

        let button = imports.resolve_type(&registry, "Button").unwrap();
        assert_eq!(button.descriptor.source_url().unwrap().as_str(), "file:///modules/Controls/Button.qml");
        assert!(imports.resolve_type(&registry, "Private").is_err());
        let singletons = imports.composite_singletons();
        assert_eq!(singletons.len(), 1);
        assert_eq!(singletons[0].0, "Theme");
    }

    #[test]
    fn test_late_qmldir_enables_remote_directory() {
        let registry = registry();
        let base = Url::parse("http://example.com/app/controls/").unwrap();
        let remote = ImportEntry::directory(record(ImportKind::Directory { path: "controls".into() }, None, None), base.clone(), true);
        let mut imports = ImportCache::new();
        imports.add(quick(None), true);
        imports.add(remote, false);
        assert_eq!(imports.unresolved().count(), 1);
        assert!(imports.resolve_type(&registry, "Button").is_err());

        let (qmldir, _) = Qmldir::parse("Button 1.0 Button.qml\n");
        imports.attach_qmldir(&base.join("qmldir").unwrap(), &Arc::new(qmldir));
        assert_eq!(imports.unresolved().count(), 0);
        assert_eq!(imports.entries()[1].priority, 2);
        let button = imports.resolve_type(&registry, "Button").unwrap();
        assert_eq!(button.descriptor.source_url().unwrap().as_str(), "http://example.com/app/controls/Button.qml");
        let fallback = imports.resolve_type(&registry, "Slider").unwrap();
        assert_eq!(fallback.descriptor.source_url().unwrap().as_str(), "http://example.com/app/controls/Slider.qml");
    }

    #[test]
    fn test_script_qualifiers_are_namespaces() {
        let registry = registry();
        let mut imports = ImportCache::new();
        let script = ScriptImport {
            qualifier: "Util".into(),
            url: Url::parse("file:///app/util.js").unwrap(),
            location: Location::new(2, 1),
        };
        assert!(imports.add_script(script.clone()));
        assert!(!imports.add_script(script));
        assert!(imports.namespaces().contains("Util"));
        assert_eq!(imports.resolve_type(&registry, "Util").unwrap_err(), ResolveError::NamespaceUsedAsType("Util".into()));
    }
}
