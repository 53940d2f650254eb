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

//! Dependency digests

use crate::resolved::{ResolvedScript, ResolvedTypeMap};
use typeloader_registry::Digest;

/// Computes a digest over everything a unit was compiled against.
///
/// `None` means some dependency has no stable checksum; a unit compiled
/// without a digest is never reused from disk.
pub trait DependencyHasher: Send + Sync {
    fn digest(&self, types: &ResolvedTypeMap, scripts: &[ResolvedScript]) -> Option<Digest>;
}

/// blake3 over type names and dependency checksums, in name order.
///
/// Composite dependencies contribute their unit checksum; native types
/// contribute the checksum of their meta-object chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3DependencyHasher;

impl DependencyHasher for Blake3DependencyHasher {
    fn digest(&self, types: &ResolvedTypeMap, scripts: &[ResolvedScript]) -> Option<Digest> {
        let mut hasher = blake3::Hasher::new();
        for (name, resolved) in types {
            let checksum = match (&resolved.compiled, &resolved.descriptor) {
                (Some(unit), _) => unit.checksum,
                (None, Some(descriptor)) => descriptor.metaobject_checksum()?,
                (None, None) => return None,
            };
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
            hasher.update(&checksum);
        }

        let mut scripts: Vec<&ResolvedScript> = scripts.iter().collect();
        scripts.sort_by(|a, b| a.qualifier.cmp(&b.qualifier));
        for script in scripts {
            hasher.update(script.qualifier.as_bytes());
            hasher.update(&[0]);
            hasher.update(&script.checksum?);
        }
        Some(*hasher.finalize().as_bytes())
    }
}
