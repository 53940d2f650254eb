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

//! Source units: the per-URL load state

use crate::imports::ImportCache;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use typeloader_common::{QmlError, QmlErrors};
use typeloader_compiler::{CompiledUnit, Document, TypeReference};
use typeloader_registry::Digest;
use url::Url;

/// Load state of a unit. Statuses only move forward; `Complete` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitStatus {
    Loading,
    Parsing,
    ResolvingDependencies,
    Compiling,
    Complete,
    Error,
}

impl UnitStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UnitStatus::Complete | UnitStatus::Error)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitStatus::Loading => "loading",
            UnitStatus::Parsing => "parsing",
            UnitStatus::ResolvingDependencies => "resolving dependencies",
            UnitStatus::Compiling => "compiling",
            UnitStatus::Complete => "complete",
            UnitStatus::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// A `.qml` document
    Document,
    /// A `.js` script
    Script,
}

impl UnitKind {
    pub fn for_url(url: &Url) -> Self {
        let path = url.path();
        if path.ends_with(".js") || path.ends_with(".mjs") { UnitKind::Script } else { UnitKind::Document }
    }
}

/// One-shot completion callback
pub type CompletionCallback = Box<dyn FnOnce(&SourceUnit) + Send>;

/// Load state of one URL
pub struct SourceUnit {
    url: Url,
    kind: UnitKind,
    status: UnitStatus,
    errors: QmlErrors,
    pub(crate) source_timestamp: u64,
    /// Source text kept while a disk-cached unit is awaiting verification
    pub(crate) backup_source: Option<String>,
    pub(crate) document: Option<Document>,
    /// Unit loaded from disk, used if its dependency digest still matches
    pub(crate) cached: Option<CompiledUnit>,
    /// The document came from an ahead-of-time unit and must not be saved again
    pub(crate) restored_ahead_of_time: bool,
    pub(crate) compiled: Option<Arc<CompiledUnit>>,
    pub(crate) script_checksum: Option<Digest>,
    pub(crate) type_references: Vec<TypeReference>,
    pub(crate) imports: ImportCache,
    /// qmldir URLs still being fetched for this unit's imports
    pub(crate) pending_qmldirs: Vec<Url>,
    callbacks: Vec<CompletionCallback>,
    external_refs: usize,
}

impl fmt::Debug for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceUnit")
            .field("url", &self.url.as_str())
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("errors", &self.errors.len())
            .field("external_refs", &self.external_refs)
            .finish()
    }
}

impl SourceUnit {
    pub fn new(url: Url) -> Self {
        let kind = UnitKind::for_url(&url);
        Self {
            url,
            kind,
            status: UnitStatus::Loading,
            errors: Vec::new(),
            source_timestamp: 0,
            backup_source: None,
            document: None,
            cached: None,
            restored_ahead_of_time: false,
            compiled: None,
            script_checksum: None,
            type_references: Vec::new(),
            imports: ImportCache::new(),
            pending_qmldirs: Vec::new(),
            callbacks: Vec::new(),
            external_refs: 0,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_complete(&self) -> bool {
        self.status == UnitStatus::Complete
    }

    pub fn is_error(&self) -> bool {
        self.status == UnitStatus::Error
    }

    pub fn errors(&self) -> &[QmlError] {
        &self.errors
    }

    /// The compiled unit of a complete document
    pub fn compiled(&self) -> Option<&Arc<CompiledUnit>> {
        self.compiled.as_ref()
    }

    /// blake3 of a complete script's source
    pub fn script_checksum(&self) -> Option<Digest> {
        self.script_checksum
    }

    pub fn source_timestamp(&self) -> u64 {
        self.source_timestamp
    }

    pub fn type_references(&self) -> &[TypeReference] {
        &self.type_references
    }

    pub fn imports(&self) -> &ImportCache {
        &self.imports
    }

    pub fn external_refs(&self) -> usize {
        self.external_refs
    }

    pub(crate) fn add_ref(&mut self) {
        self.external_refs += 1;
    }

    pub(crate) fn release_ref(&mut self) -> usize {
        self.external_refs = self.external_refs.saturating_sub(1);
        self.external_refs
    }

    /// Move to `next`. Returns false, leaving the status unchanged, if that would move backwards or leave a terminal state.
    pub(crate) fn advance(&mut self, next: UnitStatus) -> bool {
        if self.status.is_terminal() || next <= self.status {
            trace!(url = %self.url, from = %self.status, to = %next, "Ignored status change");
            return false;
        }
        debug!(url = %self.url, from = %self.status, to = %next, "Unit status");
        self.status = next;
        true
    }

    /// Fail with `errors`; returns the callbacks to run
    pub(crate) fn fail(&mut self, errors: QmlErrors) -> Vec<CompletionCallback> {
        if !self.advance(UnitStatus::Error) {
            return Vec::new();
        }
        self.errors = errors;
        self.release_transient();
        std::mem::take(&mut self.callbacks)
    }

    /// Complete; returns the callbacks to run
    pub(crate) fn complete(&mut self) -> Vec<CompletionCallback> {
        if !self.advance(UnitStatus::Complete) {
            return Vec::new();
        }
        self.release_transient();
        std::mem::take(&mut self.callbacks)
    }

    fn release_transient(&mut self) {
        self.document = None;
        self.cached = None;
        self.backup_source = None;
    }

    /// Queue `callback`, or hand it back if the unit is already terminal
    pub(crate) fn push_callback(&mut self, callback: CompletionCallback) -> Option<CompletionCallback> {
        if self.is_terminal() {
            return Some(callback);
        }
        self.callbacks.push(callback);
        None
    }
}
