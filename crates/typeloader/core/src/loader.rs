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

//! The type loader
//!
//! Owns every [`SourceUnit`] and drives it from fetch to a terminal state.
//! All loader state lives on one thread. Fetches that do not complete
//! immediately are picked up by [`TypeLoader::process_events`], which also
//! re-examines units whose dependencies have become terminal.
//!
//! A document moves through these steps:
//!
//! 1. its source arrives (or a disk-cached unit for the same timestamp and text),
//! 2. it is parsed and its imports are set up, fetching qmldir files as needed,
//! 3. referenced composite types, composite singletons and scripts become
//!    dependency units; the unit waits until each of them is terminal,
//! 4. types are resolved, the dependency digest checked against a cached
//!    unit, and otherwise the document is compiled and saved to the cache.

use crate::fetch::{Fetch, FetchResult, Fetcher, SourceData};
use crate::graph::{DependencyGraph, EdgeOutcome};
use crate::imports::{ImportCache, ImportEntry, ImportedType, ResolveError, ScriptImport};
use crate::qmldir::Qmldir;
use crate::unit::{SourceUnit, UnitKind, UnitStatus};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};
use typeloader_common::{ErrorKind, LoaderConfig, Location, QmlError, QmlErrors};
use typeloader_compiler::{
    Blake3DependencyHasher, CacheError, CompileContext, CompiledUnit, DependencyHasher, DiskCache, Document, ImportKind, ImportRecord, ResolvedScript, ResolvedType, ResolvedTypeMap, TypeNameCache, TypeReference, collect_type_references, compile,
    parse_document,
};
use typeloader_registry::TypeRegistry;
use url::Url;

#[derive(Debug, Clone)]
enum QmldirState {
    /// Fetch in flight; units waiting for it
    Pending(Vec<Url>),
    Loaded(Arc<Qmldir>, QmlErrors),
    Failed,
}

enum QmldirLookup {
    Loaded(Arc<Qmldir>, QmlErrors),
    Pending,
    Missing,
}

pub struct TypeLoader {
    config: LoaderConfig,
    registry: Arc<TypeRegistry>,
    fetcher: Box<dyn Fetcher>,
    hasher: Box<dyn DependencyHasher>,
    disk_cache: Option<DiskCache>,
    units: HashMap<Url, SourceUnit>,
    graph: DependencyGraph,
    qmldirs: HashMap<Url, QmldirState>,
    /// Fetch results not yet handled
    incoming: VecDeque<(Url, FetchResult)>,
    /// Units to re-check for completion
    ready: VecDeque<Url>,
}

impl TypeLoader {
    pub fn new(registry: Arc<TypeRegistry>, fetcher: Box<dyn Fetcher>, config: LoaderConfig) -> Self {
        let disk_cache = config.disk_cache_active().then(|| DiskCache::new(config.cache_dir.clone()));
        info!(
            disk_cache = ?disk_cache.as_ref().map(|cache| cache.dir().display().to_string()),
            import_paths = config.import_paths.len(),
            "Type loader created"
        );
        Self {
            config,
            registry,
            fetcher,
            hasher: Box::new(Blake3DependencyHasher),
            disk_cache,
            units: HashMap::new(),
            graph: DependencyGraph::new(),
            qmldirs: HashMap::new(),
            incoming: VecDeque::new(),
            ready: VecDeque::new(),
        }
    }

    /// Replace the dependency hasher
    pub fn with_hasher(mut self, hasher: Box<dyn DependencyHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// The disk cache, if active
    pub fn disk_cache(&self) -> Option<&DiskCache> {
        self.disk_cache.as_ref()
    }

    pub fn unit(&self, url: &Url) -> Option<&SourceUnit> {
        self.units.get(url)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The unit for `url`, created and fetched on first use. Each call takes
    /// one reference, given back with [`Self::release`].
    pub fn get_or_create(&mut self, url: &Url) -> &SourceUnit {
        self.ensure_unit(url);
        let unit = self.units.entry(url.clone()).or_insert_with(|| SourceUnit::new(url.clone()));
        unit.add_ref();
        unit
    }

    fn ensure_unit(&mut self, url: &Url) {
        if self.units.contains_key(url) {
            return;
        }
        trace!(url = %url, "New unit");
        self.units.insert(url.clone(), SourceUnit::new(url.clone()));
        match self.fetcher.fetch(url) {
            Fetch::Ready(result) => self.incoming.push_back((url.clone(), result)),
            Fetch::Pending => debug!(url = %url, "Fetch pending"),
        }
    }

    /// Give back a reference taken by [`Self::get_or_create`]; returns the references left
    pub fn release(&mut self, url: &Url) -> usize {
        self.units.get_mut(url).map_or(0, SourceUnit::release_ref)
    }

    /// Drop terminal units that nobody references and no loading unit waits for
    pub fn trim_cache(&mut self) -> usize {
        let removable: Vec<Url> = self
            .units
            .values()
            .filter(|unit| unit.is_terminal() && unit.external_refs() == 0)
            .map(|unit| unit.url().clone())
            .filter(|url| self.graph.dependents(url).iter().all(|dependent| self.units.get(dependent).is_none_or(SourceUnit::is_terminal)))
            .collect();
        for url in &removable {
            self.units.remove(url);
            self.graph.remove(url);
        }
        if !removable.is_empty() {
            debug!(removed = removable.len(), remaining = self.units.len(), "Trimmed unit cache");
        }
        removable.len()
    }

    /// Run `callback` once `url` is terminal, or right away if it already is.
    /// Returns false if there is no unit for `url`.
    pub fn on_complete(&mut self, url: &Url, callback: impl FnOnce(&SourceUnit) + Send + 'static) -> bool {
        let Some(unit) = self.units.get_mut(url) else {
            return false;
        };
        if let Some(callback) = unit.push_callback(Box::new(callback)) {
            callback(&*unit);
        }
        true
    }

    /// Load `url` and pump events until it is terminal.
    ///
    /// Takes a reference on the unit like [`Self::get_or_create`]. Fails with
    /// a fetch error if the loader runs out of work first, which happens when
    /// a remote fetch has not completed yet.
    #[instrument(skip(self, url), fields(url = %url))]
    pub fn load(&mut self, url: &Url) -> Result<Arc<CompiledUnit>, QmlErrors> {
        self.get_or_create(url);
        while !self.units.get(url).is_some_and(SourceUnit::is_terminal) {
            if self.process_events() == 0 {
                return Err(vec![QmlError::new(ErrorKind::Fetch, "Load did not complete").with_url(url)]);
            }
        }
        let Some(unit) = self.units.get(url) else {
            return Err(vec![QmlError::new(ErrorKind::Fetch, "Load did not complete").with_url(url)]);
        };
        match unit.compiled() {
            Some(compiled) if unit.is_complete() => Ok(Arc::clone(compiled)),
            _ if unit.is_complete() => Err(vec![QmlError::new(ErrorKind::Compile, "Not a QML document").with_url(url)]),
            _ => Err(unit.errors().to_vec()),
        }
    }

    /// Handle completed fetches and units whose dependencies finished.
    /// Returns the number of events handled, at most `max_events_per_pump`.
    pub fn process_events(&mut self) -> usize {
        let mut processed = 0;
        while processed < self.config.max_events_per_pump {
            self.incoming.extend(self.fetcher.poll_completed());
            if let Some((url, result)) = self.incoming.pop_front() {
                if matches!(self.qmldirs.get(&url), Some(QmldirState::Pending(_))) {
                    self.qmldir_received(&url, result);
                } else {
                    self.data_received(&url, result);
                }
            } else if let Some(url) = self.ready.pop_front() {
                self.try_finish(&url);
            } else {
                break;
            }
            processed += 1;
        }
        processed
    }

    /// Source data (or a fetch failure) for the unit at `url`
    pub fn data_received(&mut self, url: &Url, result: FetchResult) {
        let Some(unit) = self.units.get_mut(url) else {
            warn!(url = %url, "Data received for unknown unit");
            return;
        };
        if unit.status() != UnitStatus::Loading {
            trace!(url = %url, status = %unit.status(), "Ignored duplicate data");
            return;
        }
        let data = match result {
            Ok(data) => data,
            Err(error) => {
                self.finish(url, Err(vec![QmlError::new(ErrorKind::Fetch, error.to_string()).with_url(url)]));
                return;
            }
        };
        unit.source_timestamp = data.timestamp;
        match unit.kind() {
            UnitKind::Script => {
                unit.script_checksum = Some(*blake3::hash(&data.bytes).as_bytes());
                self.finish(url, Ok(()));
            }
            UnitKind::Document => self.document_received(url, data),
        }
    }

    fn document_received(&mut self, url: &Url, data: SourceData) {
        let cached = match &self.disk_cache {
            Some(cache) => match cache.load(url, data.timestamp) {
                Ok(cached) => Some(cached),
                Err(CacheError::NotFound(_)) => None,
                Err(error) => {
                    debug!(target: "typeloader::disk_cache", url = %url, code = error.code(), "Cached unit rejected: {}", error);
                    None
                }
            },
            None => None,
        };
        // The timestamp alone cannot tell apart two writes in the same clock tick
        let source_checksum = *blake3::hash(&data.bytes).as_bytes();
        let cached = cached.filter(|cached| {
            let matches = cached.source_checksum == source_checksum;
            if !matches {
                debug!(target: "typeloader::disk_cache", url = %url, "Cached unit rejected: source text changed");
            }
            matches
        });

        let Some(unit) = self.units.get_mut(url) else {
            return;
        };
        unit.advance(UnitStatus::Parsing);
        match cached {
            Some(cached) if cached.is_pending_type_compilation() => {
                if let Some(document) = cached.document {
                    debug!(target: "typeloader::disk_cache", url = %url, "Restored ahead-of-time document");
                    unit.type_references = collect_type_references(&document);
                    unit.document = Some(document);
                    unit.restored_ahead_of_time = true;
                }
            }
            Some(cached) => {
                unit.type_references = cached.type_references.clone();
                unit.backup_source = Some(String::from_utf8_lossy(&data.bytes).into_owned());
                unit.cached = Some(cached);
            }
            None => {}
        }

        if unit.document.is_none() && unit.cached.is_none() {
            match parse_source(url, &data.bytes) {
                Ok(document) => {
                    unit.type_references = collect_type_references(&document);
                    unit.document = Some(document);
                }
                Err(error) => {
                    self.finish(url, Err(vec![error]));
                    return;
                }
            }
        }

        let records = match (&unit.document, &unit.cached) {
            (Some(document), _) => document.imports.clone(),
            (None, Some(cached)) => cached.imports.clone(),
            (None, None) => Vec::new(),
        };
        self.set_up_imports(url, records);
    }

    fn set_up_imports(&mut self, url: &Url, records: Vec<ImportRecord>) {
        if let Some(unit) = self.units.get_mut(url) {
            unit.advance(UnitStatus::ResolvingDependencies);
        }
        let mut imports = ImportCache::new();
        let mut pending = Vec::new();
        let mut errors = Vec::new();

        // Remote qmldir files cannot be fetched on demand, so the implicit import is loaded up front
        if !self.fetcher.is_local(url) {
            if let Some(mut implicit) = ImportEntry::implicit(url, true) {
                if let Some(qmldir_url) = implicit.qmldir_url() {
                    match self.request_qmldir(&qmldir_url, Some(url)) {
                        QmldirLookup::Loaded(qmldir, qmldir_errors) => {
                            implicit.set_qmldir(qmldir);
                            errors.extend(qmldir_errors);
                        }
                        QmldirLookup::Pending => pending.push(qmldir_url),
                        QmldirLookup::Missing => {}
                    }
                }
                imports.set_implicit(implicit);
            }
        }

        for record in records {
            match record.kind.clone() {
                ImportKind::Module { uri } => {
                    let (entry, found, module_errors) = self.module_import(url, record, &uri);
                    errors.extend(module_errors);
                    imports.add(entry, found);
                }
                ImportKind::Directory { path } => {
                    let Ok(base) = url.join(&format!("{}/", path.trim_end_matches('/'))) else {
                        errors.push(QmlError::new(ErrorKind::Import, format!("Invalid import path \"{}\"", path)).with_url(url).with_location(record.location));
                        continue;
                    };
                    let local = self.fetcher.is_local(&base);
                    let mut entry = ImportEntry::directory(record, base.clone(), !local);
                    let Some(qmldir_url) = entry.qmldir_url() else {
                        imports.add(entry, false);
                        continue;
                    };
                    if local {
                        let listing = self.fetcher.list_directory(&base);
                        let mut found = listing.is_some();
                        if let QmldirLookup::Loaded(qmldir, qmldir_errors) = self.request_qmldir(&qmldir_url, None) {
                            entry.set_qmldir(qmldir);
                            errors.extend(qmldir_errors);
                            found = true;
                        }
                        if let Some(files) = listing {
                            entry.add_listing(&files);
                        }
                        imports.add(entry, found);
                    } else {
                        match self.request_qmldir(&qmldir_url, Some(url)) {
                            QmldirLookup::Loaded(qmldir, qmldir_errors) => {
                                entry.set_qmldir(qmldir);
                                errors.extend(qmldir_errors);
                                imports.add(entry, true);
                            }
                            QmldirLookup::Pending => {
                                pending.push(qmldir_url);
                                imports.add(entry, false);
                            }
                            QmldirLookup::Missing => {
                                imports.add(entry, false);
                            }
                        }
                    }
                }
                ImportKind::Script { path } => match url.join(&path) {
                    Ok(script_url) => {
                        let script = ScriptImport {
                            qualifier: record.qualifier.clone().unwrap_or_default(),
                            url: script_url,
                            location: record.location,
                        };
                        if !imports.add_script(script) {
                            debug!(url = %url, path = %path, "Duplicate script import ignored");
                        }
                    }
                    Err(_) => errors.push(QmlError::new(ErrorKind::Import, format!("Invalid import path \"{}\"", path)).with_url(url).with_location(record.location)),
                },
            }
        }

        let Some(unit) = self.units.get_mut(url) else {
            return;
        };
        unit.imports = imports;
        unit.pending_qmldirs = pending;
        if !errors.is_empty() {
            self.finish(url, Err(errors));
            return;
        }
        self.discover_dependencies(url);
    }

    /// Set up a module import from the registry and the first qmldir found on the import paths
    fn module_import(&mut self, url: &Url, record: ImportRecord, uri: &str) -> (ImportEntry, bool, QmlErrors) {
        let relative = uri.replace('.', "/");
        let mut errors = Vec::new();
        let mut found_qmldir = None;
        let import_paths: Vec<PathBuf> = self.config.import_paths.clone();
        for path in import_paths {
            let Ok(base) = Url::from_directory_path(path.join(&relative)) else {
                continue;
            };
            let Ok(qmldir_url) = base.join("qmldir") else {
                continue;
            };
            if let QmldirLookup::Loaded(qmldir, qmldir_errors) = self.request_qmldir(&qmldir_url, None) {
                debug!(uri, qmldir = %qmldir_url, "Module qmldir found");
                errors.extend(qmldir_errors);
                found_qmldir = Some((base, qmldir));
                break;
            }
        }

        let installed = self.registry.is_module_installed(uri);
        if let Some((_, qmldir)) = &found_qmldir {
            if !installed {
                for plugin in &qmldir.plugins {
                    errors.push(QmlError::new(ErrorKind::Import, format!("module \"{}\" plugin \"{}\" not found", uri, plugin.name)).with_url(url).with_location(record.location));
                }
            }
        }
        let version_available = record.version.is_none_or(|version| self.registry.module_has_major(uri, version.major));
        let found = found_qmldir.is_some() || (installed && version_available);
        (ImportEntry::module(record, uri, found_qmldir), found, errors)
    }

    /// Look up a qmldir, fetching it on first use. A `waiter` is told when a pending fetch completes.
    fn request_qmldir(&mut self, qmldir_url: &Url, waiter: Option<&Url>) -> QmldirLookup {
        match self.qmldirs.get_mut(qmldir_url) {
            Some(QmldirState::Loaded(qmldir, errors)) => return QmldirLookup::Loaded(Arc::clone(qmldir), errors.clone()),
            Some(QmldirState::Failed) => return QmldirLookup::Missing,
            Some(QmldirState::Pending(waiters)) => {
                return match waiter {
                    Some(waiter) => {
                        if !waiters.contains(waiter) {
                            waiters.push(waiter.clone());
                        }
                        QmldirLookup::Pending
                    }
                    None => QmldirLookup::Missing,
                };
            }
            None => {}
        }

        let state = match self.fetcher.fetch(qmldir_url) {
            Fetch::Ready(Ok(data)) => parse_qmldir(qmldir_url, &data),
            Fetch::Ready(Err(error)) => {
                trace!(url = %qmldir_url, "No qmldir: {}", error);
                QmldirState::Failed
            }
            Fetch::Pending => QmldirState::Pending(waiter.into_iter().cloned().collect()),
        };
        let lookup = match &state {
            QmldirState::Loaded(qmldir, errors) => QmldirLookup::Loaded(Arc::clone(qmldir), errors.clone()),
            QmldirState::Pending(_) if waiter.is_some() => QmldirLookup::Pending,
            QmldirState::Pending(_) | QmldirState::Failed => QmldirLookup::Missing,
        };
        self.qmldirs.insert(qmldir_url.clone(), state);
        lookup
    }

    fn qmldir_received(&mut self, qmldir_url: &Url, result: FetchResult) {
        let waiters = match self.qmldirs.remove(qmldir_url) {
            Some(QmldirState::Pending(waiters)) => waiters,
            Some(other) => {
                self.qmldirs.insert(qmldir_url.clone(), other);
                return;
            }
            None => return,
        };
        let state = match result {
            Ok(data) => parse_qmldir(qmldir_url, &data),
            Err(error) => {
                debug!(url = %qmldir_url, "qmldir unavailable: {}", error);
                QmldirState::Failed
            }
        };
        self.qmldirs.insert(qmldir_url.clone(), state.clone());

        for waiter in waiters {
            let Some(unit) = self.units.get_mut(&waiter) else {
                continue;
            };
            if unit.is_terminal() {
                continue;
            }
            unit.pending_qmldirs.retain(|pending| pending != qmldir_url);
            if let QmldirState::Loaded(qmldir, errors) = &state {
                unit.imports.attach_qmldir(qmldir_url, qmldir);
                if !errors.is_empty() {
                    self.finish(&waiter, Err(errors.clone()));
                    continue;
                }
            }
            if unit.pending_qmldirs.is_empty() {
                self.discover_dependencies(&waiter);
            }
        }
    }

    /// Resolve `name` through the imports of the unit at `url`, loading a
    /// local document's implicit import on the first miss.
    pub fn resolve_type(&mut self, url: &Url, name: &str) -> Result<ImportedType, ResolveError> {
        let Some(unit) = self.units.get(url) else {
            return Err(ResolveError::TypeNotFound(name.to_string()));
        };
        let implicit_loaded = unit.imports.is_implicit_loaded();
        let result = unit.imports.resolve_type(&self.registry, name);
        match result {
            Err(ResolveError::TypeNotFound(_)) if !implicit_loaded => {
                self.load_implicit_import(url);
                match self.units.get(url) {
                    Some(unit) => unit.imports.resolve_type(&self.registry, name),
                    None => Err(ResolveError::TypeNotFound(name.to_string())),
                }
            }
            result => result,
        }
    }

    fn load_implicit_import(&mut self, url: &Url) {
        let Some(mut implicit) = ImportEntry::implicit(url, false) else {
            return;
        };
        if let Some(base) = implicit.base.clone() {
            if let Some(files) = self.fetcher.list_directory(&base) {
                implicit.add_listing(&files);
            }
        }
        if let Some(qmldir_url) = implicit.qmldir_url() {
            if let QmldirLookup::Loaded(qmldir, errors) = self.request_qmldir(&qmldir_url, None) {
                for error in &errors {
                    warn!(url = %url, "{}", error);
                }
                implicit.set_qmldir(qmldir);
            }
        }
        trace!(url = %url, types = implicit.composites.len(), "Implicit import loaded");
        if let Some(unit) = self.units.get_mut(url) {
            unit.imports.set_implicit(implicit);
        }
    }

    /// Create units for everything the document at `url` depends on and queue it for completion
    fn discover_dependencies(&mut self, url: &Url) {
        let references = match self.units.get(url) {
            Some(unit) if unit.pending_qmldirs.is_empty() && !unit.is_terminal() => unit.type_references.clone(),
            _ => return,
        };
        let mut dependencies = Vec::new();
        for reference in &references {
            if let Ok(found) = self.resolve_type(url, &reference.name) {
                if let Some(source) = found.descriptor.source_url() {
                    dependencies.push(source.clone());
                }
            }
        }
        if let Some(unit) = self.units.get(url) {
            dependencies.extend(unit.imports.composite_singletons().into_iter().map(|(_, singleton)| singleton.url.clone()));
            dependencies.extend(unit.imports.scripts().iter().map(|script| script.url.clone()));
        }

        for dependency in dependencies {
            self.ensure_unit(&dependency);
            if self.graph.add_dependency(url, &dependency) == EdgeOutcome::WouldCycle {
                debug!(url = %url, dependency = %dependency, "Cyclic dependency, not waiting");
            }
        }
        self.ready.push_back(url.clone());
    }

    fn try_finish(&mut self, url: &Url) {
        let Some(unit) = self.units.get(url) else {
            return;
        };
        if unit.status() != UnitStatus::ResolvingDependencies || !unit.pending_qmldirs.is_empty() {
            return;
        }
        let waiting = self.graph.dependencies(url).iter().any(|dependency| self.units.get(dependency).is_some_and(|unit| !unit.is_terminal()));
        if waiting {
            return;
        }
        let result = self.all_dependencies_done(url);
        self.finish(url, result);
    }

    fn all_dependencies_done(&mut self, url: &Url) -> Result<(), QmlErrors> {
        let Some(unit) = self.units.get(url) else {
            return Ok(());
        };
        let errors: QmlErrors = unit.imports.unresolved().map(|entry| self.unresolved_import_error(url, entry)).collect();
        if !errors.is_empty() {
            return Err(errors);
        }

        let references = unit.type_references.clone();
        let mut errors = Vec::new();
        let mut resolved = ResolvedTypeMap::new();
        let mut names = TypeNameCache::default();

        for reference in &references {
            match self.resolve_type(url, &reference.name) {
                Ok(found) => {
                    if let Some(resolved_type) = self.resolved_reference(url, reference, found, &mut errors) {
                        names.add_type(&reference.name, type_target(&resolved_type));
                        resolved.insert(reference.name.clone(), resolved_type);
                    }
                }
                Err(ResolveError::TypeNotFound(_)) if !reference.error_when_not_found => {}
                Err(error) => errors.push(QmlError::new(ErrorKind::Import, error.to_string()).with_url(url).with_location(reference.location)),
            }
        }

        let Some(unit) = self.units.get(url) else {
            return Ok(());
        };
        for (name, singleton) in unit.imports.composite_singletons() {
            let Some(dependency) = self.units.get(&singleton.url) else {
                continue;
            };
            if dependency.is_error() {
                errors.push(QmlError::new(ErrorKind::Dependency, format!("Type {} unavailable", name)).with_url(url));
                errors.extend(dependency.errors().iter().cloned());
                continue;
            }
            // Still loading only when the singleton depends back on this unit
            let Some(compiled) = dependency.compiled() else {
                continue;
            };
            if !compiled.is_singleton() {
                errors.push(
                    QmlError::new(ErrorKind::SingletonPragmaMismatch, format!("qmldir defines type as singleton, but no pragma Singleton found in type {}.", name))
                        .with_url(&singleton.url),
                );
                continue;
            }
            if !resolved.contains_key(&name) {
                names.add_type(&name, singleton.url.to_string());
                resolved.insert(
                    name,
                    ResolvedType {
                        descriptor: self.registry.qml_type_for_url(&singleton.url),
                        compiled: Some(Arc::clone(compiled)),
                        version: singleton.version,
                        location: Location::unknown(),
                        needs_creation: false,
                    },
                );
            }
        }

        let mut scripts = Vec::new();
        for script in unit.imports.scripts() {
            match self.units.get(&script.url) {
                Some(dependency) if dependency.is_complete() => {
                    names.add_script(&script.qualifier, &script.url);
                    scripts.push(ResolvedScript {
                        qualifier: script.qualifier.clone(),
                        url: script.url.clone(),
                        checksum: dependency.script_checksum(),
                        location: script.location,
                    });
                }
                Some(dependency) if dependency.is_error() => {
                    errors.push(QmlError::new(ErrorKind::Dependency, format!("Script {} unavailable", script.url)).with_url(url).with_location(script.location));
                    errors.extend(dependency.errors().iter().cloned());
                }
                _ => {}
            }
        }
        for namespace in unit.imports.namespaces() {
            names.add_namespace(&namespace);
        }

        if let Some(pragma) = singleton_pragma(unit) {
            if let Some(descriptor) = self.registry.qml_type_for_url(url) {
                if !descriptor.is_composite_singleton() {
                    errors.push(
                        QmlError::new(ErrorKind::SingletonPragmaMismatch, format!("pragma Singleton used with a non composite singleton type {}", descriptor.element_name()))
                            .with_url(url)
                            .with_location(pragma),
                    );
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        self.compile_unit(url, &names, &resolved, &scripts)
    }

    /// Resolution of one reference once its dependency is terminal; failures are added to `errors`
    fn resolved_reference(&self, url: &Url, reference: &TypeReference, found: ImportedType, errors: &mut QmlErrors) -> Option<ResolvedType> {
        let descriptor = found.descriptor;
        let mut compiled = None;
        if let Some(source) = descriptor.source_url() {
            match self.units.get(source) {
                Some(dependency) if dependency.is_complete() => compiled = dependency.compiled().cloned(),
                Some(dependency) if dependency.is_error() => {
                    errors.push(type_unavailable(url, reference));
                    errors.extend(dependency.errors().iter().cloned());
                    return None;
                }
                _ if reference.needs_creation => {
                    errors.push(type_unavailable(url, reference));
                    errors.push(QmlError::new(ErrorKind::Dependency, "Cyclic dependency").with_url(source));
                    return None;
                }
                _ => {}
            }
        }

        if reference.needs_creation {
            let reason = if descriptor.is_composite_singleton() {
                Some(format!("Composite Singleton Type {} is not creatable.", reference.name))
            } else if !descriptor.is_creatable() {
                Some(descriptor.no_creation_reason().map(str::to_string).unwrap_or_else(|| ResolveError::ElementNotCreatable(reference.name.clone()).to_string()))
            } else {
                None
            };
            if let Some(reason) = reason {
                errors.push(QmlError::new(ErrorKind::Import, reason).with_url(url).with_location(reference.location));
                return None;
            }
        }

        Some(ResolvedType {
            descriptor: Some(descriptor),
            compiled,
            version: found.version,
            location: reference.location,
            needs_creation: reference.needs_creation,
        })
    }

    fn unresolved_import_error(&self, url: &Url, entry: &ImportEntry) -> QmlError {
        let description = match (&entry.record.kind, entry.record.version) {
            (ImportKind::Module { uri }, Some(version)) if self.registry.is_module_installed(uri) => format!("module \"{}\" version {} is not installed", uri, version),
            (ImportKind::Module { uri }, _) => format!("module \"{}\" is not installed", uri),
            (ImportKind::Directory { path }, _) | (ImportKind::Script { path }, _) => format!("\"{}\": no such directory", path),
        };
        QmlError::new(ErrorKind::Import, description).with_url(url).with_location(entry.record.location)
    }

    /// Reuse the cached unit if its dependencies are unchanged, otherwise compile and save
    fn compile_unit(&mut self, url: &Url, names: &TypeNameCache, resolved: &ResolvedTypeMap, scripts: &[ResolvedScript]) -> Result<(), QmlErrors> {
        let Some(unit) = self.units.get_mut(url) else {
            return Ok(());
        };

        if let Some(cached) = unit.cached.take() {
            let digest = self.hasher.digest(resolved, scripts);
            if digest.is_some() && digest == cached.dependency_digest {
                debug!(target: "typeloader::disk_cache", url = %url, "Reusing cached unit");
                unit.compiled = Some(Arc::new(cached));
                return Ok(());
            }
            debug!(target: "typeloader::disk_cache", url = %url, "Dependencies changed, recompiling");
            let source = unit.backup_source.take().unwrap_or_default();
            let document = parse_source(url, source.as_bytes()).map_err(|error| vec![error])?;
            unit.document = Some(document);
        }

        let Some(document) = unit.document.take() else {
            return Err(vec![QmlError::new(ErrorKind::Compile, "No document to compile").with_url(url)]);
        };
        unit.advance(UnitStatus::Compiling);
        let context = CompileContext {
            type_name_cache: names,
            resolved_types: resolved,
            scripts,
            hasher: self.hasher.as_ref(),
            source_timestamp: unit.source_timestamp,
        };
        let compiled = compile(&document, &context)?;

        if let Some(cache) = &self.disk_cache {
            if unit.restored_ahead_of_time {
                trace!(target: "typeloader::disk_cache", url = %url, "Not saving recompiled ahead-of-time unit");
            } else if let Err(error) = cache.save(&compiled) {
                warn!(target: "typeloader::disk_cache", url = %url, code = error.code(), "Failed to save compilation unit: {}", error);
            }
        }
        unit.compiled = Some(Arc::new(compiled));
        Ok(())
    }

    /// Move `url` to a terminal state, run its callbacks and wake its dependents
    fn finish(&mut self, url: &Url, result: Result<(), QmlErrors>) {
        let Some(unit) = self.units.get_mut(url) else {
            return;
        };
        let callbacks = match result {
            Ok(()) => {
                debug!(url = %url, "Unit complete");
                unit.complete()
            }
            Err(errors) => {
                for error in &errors {
                    debug!(url = %url, kind = error.kind.code(), "{}", error);
                }
                unit.fail(errors)
            }
        };
        for callback in callbacks {
            callback(&*unit);
        }
        for dependent in self.graph.dependents(url) {
            self.ready.push_back(dependent);
        }
    }
}

fn parse_source(url: &Url, bytes: &[u8]) -> Result<Document, QmlError> {
    if bytes.is_empty() {
        return Err(QmlError::new(ErrorKind::Parse, "File is empty").with_url(url));
    }
    let text = std::str::from_utf8(bytes).map_err(|e| QmlError::new(ErrorKind::Parse, format!("File is not valid UTF-8: {}", e)).with_url(url))?;
    parse_document(url, text).map_err(|e| {
        debug!(url = %url, "Parse failed: {}", e.debug_message());
        e.to_qml_error(url)
    })
}

fn parse_qmldir(url: &Url, data: &SourceData) -> QmldirState {
    let text = String::from_utf8_lossy(&data.bytes);
    let (qmldir, errors) = Qmldir::parse(&text);
    let errors = errors.into_iter().map(|error| QmlError::new(ErrorKind::Import, error.message).with_url(url).with_location(Location::new(error.line, 1))).collect();
    QmldirState::Loaded(Arc::new(qmldir), errors)
}

fn type_unavailable(url: &Url, reference: &TypeReference) -> QmlError {
    QmlError::new(ErrorKind::Dependency, format!("Type {} unavailable", reference.name)).with_url(url).with_location(reference.location)
}

/// Name recorded in the type name cache: the document URL for composites
fn type_target(resolved: &ResolvedType) -> String {
    match &resolved.descriptor {
        Some(descriptor) => descriptor.source_url().map(Url::to_string).unwrap_or_else(|| descriptor.qml_type_name()),
        None => String::new(),
    }
}

/// Location of the unit's `pragma Singleton`, if it has one
fn singleton_pragma(unit: &SourceUnit) -> Option<Location> {
    if let Some(document) = &unit.document {
        return document.singleton_pragma().map(|pragma| pragma.location);
    }
    unit.cached.as_ref().filter(|cached| cached.is_singleton()).map(|_| Location::unknown())
}
