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

//! Enumeration tables for native types
//!
//! The table is built once per type from an explicit, ordered list of enum
//! sources. Later sources override keys of earlier ones; two definitions of
//! the same key inside one source with different values are reported as a
//! conflict and the last definition wins.

use crate::meta::MetaObject;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// One meta object contributing enumerations, with the path it was reached by
#[derive(Debug, Clone)]
pub struct EnumSource<'a> {
    pub meta: &'a MetaObject,
    /// Class names from the owning type to this source, e.g. `["QQuickListView", "QQuickItem"]`
    pub path: Vec<String>,
}

impl EnumSource<'_> {
    fn injection_path(&self) -> String {
        self.path.join("->")
    }
}

/// Build the ordered enum-source list of a type.
///
/// Related meta objects (recursively) come first, then the inheritance chain
/// from the root base class to the type itself, then the extension chain.
pub fn enum_sources<'a>(meta: &'a MetaObject, extension: Option<&'a MetaObject>) -> Vec<EnumSource<'a>> {
    let mut sources = Vec::new();
    let mut seen = HashSet::new();

    let chain = meta.chain();
    let derived_path = |mo: &MetaObject| -> Vec<String> {
        let mut path: Vec<String> = chain.iter().rev().map(|m| m.class_name.clone()).take_while(|name| name != &mo.class_name).collect();
        path.push(mo.class_name.clone());
        path
    };

    for mo in &chain {
        collect_related(mo, derived_path(mo), &mut seen, &mut sources);
    }
    for mo in &chain {
        if seen.insert(mo.class_name.clone()) {
            sources.push(EnumSource { meta: mo, path: derived_path(mo) });
        }
    }
    if let Some(extension) = extension {
        for mo in extension.chain() {
            if seen.insert(mo.class_name.clone()) {
                sources.push(EnumSource {
                    meta: mo,
                    path: vec![meta.class_name.clone(), mo.class_name.clone()],
                });
            }
        }
    }
    sources
}

fn collect_related<'a>(mo: &'a MetaObject, path: Vec<String>, seen: &mut HashSet<String>, sources: &mut Vec<EnumSource<'a>>) {
    for related in &mo.related {
        if !seen.insert(related.class_name.clone()) {
            continue;
        }
        let mut related_path = path.clone();
        related_path.push(related.class_name.clone());
        collect_related(related, related_path.clone(), seen, sources);
        sources.push(EnumSource { meta: related, path: related_path });
    }
}

/// How an enum key collided with an earlier definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// A later source redefines a key from an earlier (base or related) source
    ShadowsBase,
    /// Two definitions inside the same class with different values
    SameLevel,
}

/// A recorded enum key collision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConflict {
    pub key: String,
    pub kind: ConflictKind,
    pub previous: i64,
    pub value: i64,
    /// Every definition of the key seen so far, as `Class.Enum.Key injected by A->B`
    pub candidates: Vec<String>,
}

/// Lookup tables for the enumerations visible on one type
#[derive(Debug, Clone, Default)]
pub struct EnumTable {
    values: HashMap<String, i64>,
    scoped: Vec<HashMap<String, i64>>,
    scoped_index: HashMap<String, usize>,
    conflicts: Vec<EnumConflict>,
}

impl EnumTable {
    /// Build the table from `sources` in order.
    ///
    /// Keys of scoped enums are only entered into the unscoped map when
    /// `scoped_keys_unscoped` is set.
    pub fn build(sources: &[EnumSource<'_>], scoped_keys_unscoped: bool) -> Self {
        let mut table = Self::default();
        // key -> (source index, candidate descriptions)
        let mut definitions: HashMap<String, (usize, Vec<String>)> = HashMap::new();

        for (level, source) in sources.iter().enumerate() {
            for meta_enum in &source.meta.enums {
                let index = *table.scoped_index.entry(meta_enum.name.clone()).or_insert_with(|| {
                    table.scoped.push(HashMap::new());
                    table.scoped.len() - 1
                });

                for (key, value) in &meta_enum.keys {
                    table.scoped[index].insert(key.clone(), *value);
                    if meta_enum.scoped && !scoped_keys_unscoped {
                        continue;
                    }

                    let candidate = format!("{}.{}.{} injected by {}", source.meta.class_name, meta_enum.name, key, source.injection_path());
                    let previous = table.values.insert(key.clone(), *value);
                    let entry = definitions.entry(key.clone()).or_insert_with(|| (level, Vec::new()));
                    let previous_level = entry.0;
                    entry.0 = level;
                    entry.1.push(candidate);

                    let Some(previous) = previous else { continue };
                    if previous == *value {
                        continue;
                    }
                    let kind = if previous_level == level { ConflictKind::SameLevel } else { ConflictKind::ShadowsBase };
                    let candidates = entry.1.clone();
                    match kind {
                        ConflictKind::SameLevel => warn!(key = %key, previous, value, "Enum key conflict: {}", candidates.join(", ")),
                        ConflictKind::ShadowsBase => debug!(key = %key, previous, value, "Enum key shadowed: {}", candidates.join(", ")),
                    }
                    table.conflicts.push(EnumConflict {
                        key: key.clone(),
                        kind,
                        previous,
                        value: *value,
                        candidates,
                    });
                }
            }
        }
        table
    }

    /// Value of an unscoped key
    pub fn value(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    /// Index of the scoped table of enum `name`
    pub fn scoped_index(&self, name: &str) -> Option<usize> {
        self.scoped_index.get(name).copied()
    }

    /// Value of `key` within the scoped table at `index`
    pub fn scoped_value(&self, index: usize, key: &str) -> Option<i64> {
        self.scoped.get(index).and_then(|keys| keys.get(key)).copied()
    }

    pub fn conflicts(&self) -> &[EnumConflict] {
        &self.conflicts
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.scoped.is_empty()
    }
}
