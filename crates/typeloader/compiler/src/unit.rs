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

//! Compiled units

use crate::document::{Document, ImportRecord};
use crate::instructions::{CompiledObject, StringTable};
use crate::references::{TypeReference, collect_type_references};
use crate::resolved::TypeNameCache;
use bincode::error::EncodeError;
use serde::{Deserialize, Serialize};
use typeloader_registry::{Digest, PropertyCache};
use url::Url;

/// Unit flag bits
pub mod flags {
    /// The document declares `pragma Singleton`
    pub const IS_SINGLETON: u32 = 1 << 0;
    /// Produced ahead of time; type compilation happens at load
    pub const PENDING_TYPE_COMPILATION: u32 = 1 << 1;
}

/// The immutable output of compiling one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledUnit {
    pub url: Url,
    pub flags: u32,
    /// Modification time of the source, nanoseconds since the epoch
    pub source_timestamp: u64,
    pub source_checksum: Digest,
    pub strings: StringTable,
    pub imports: Vec<ImportRecord>,
    pub type_references: Vec<TypeReference>,
    /// Index 0 is the root object; empty while type compilation is pending
    pub objects: Vec<CompiledObject>,
    pub type_name_cache: TypeNameCache,
    pub dependent_scripts: Vec<Url>,
    /// Parsed document kept by units awaiting type compilation
    pub document: Option<Document>,
    /// Digest of the dependencies the unit was compiled against
    pub dependency_digest: Option<Digest>,
    /// Identity of this unit, folded into the digest of its dependents
    pub checksum: Digest,
}

impl CompiledUnit {
    /// A unit holding only the parsed document, compiled to completion when loaded
    pub fn ahead_of_time(document: Document, source_timestamp: u64) -> Result<Self, EncodeError> {
        let mut unit_flags = flags::PENDING_TYPE_COMPILATION;
        if document.is_singleton() {
            unit_flags |= flags::IS_SINGLETON;
        }
        let checksum = unit_checksum(&document.source_checksum, None, unit_flags, &[])?;
        Ok(Self {
            url: document.url.clone(),
            flags: unit_flags,
            source_timestamp,
            source_checksum: document.source_checksum,
            strings: StringTable::new(),
            imports: document.imports.clone(),
            type_references: collect_type_references(&document),
            objects: Vec::new(),
            type_name_cache: TypeNameCache::default(),
            dependent_scripts: Vec::new(),
            document: Some(document),
            dependency_digest: None,
            checksum,
        })
    }

    pub fn is_singleton(&self) -> bool {
        self.flags & flags::IS_SINGLETON != 0
    }

    pub fn is_pending_type_compilation(&self) -> bool {
        self.flags & flags::PENDING_TYPE_COMPILATION != 0
    }

    pub fn root(&self) -> Option<&CompiledObject> {
        self.objects.first()
    }

    pub fn root_property_cache(&self) -> Option<&PropertyCache> {
        self.root().map(|root| &root.property_cache)
    }

    /// Whether the stored checksum matches the unit contents
    pub fn verify_checksum(&self) -> bool {
        unit_checksum(&self.source_checksum, self.dependency_digest.as_ref(), self.flags, &self.objects).is_ok_and(|checksum| checksum == self.checksum)
    }
}

pub(crate) fn unit_checksum(source_checksum: &Digest, dependency_digest: Option<&Digest>, flags: u32, objects: &[CompiledObject]) -> Result<Digest, EncodeError> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(source_checksum);
    match dependency_digest {
        Some(digest) => {
            hasher.update(&[1]);
            hasher.update(digest);
        }
        None => {
            hasher.update(&[0]);
        }
    }
    hasher.update(&flags.to_le_bytes());
    bincode::serde::encode_into_std_write(objects, &mut hasher, bincode::config::standard())?;
    Ok(*hasher.finalize().as_bytes())
}
