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

//! On-disk cache of compiled units.
//!
//! A cache file holds a bincode [`CacheHeader`] followed by the bincode
//! encoded [`CompiledUnit`]. Files are named after the blake3 of the source
//! URL and replaced atomically through a temporary file.

use crate::unit::CompiledUnit;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use typeloader_common::{ErrorKind, QmlError};
use typeloader_registry::Digest;
use url::Url;

pub const CACHE_MAGIC: [u8; 4] = *b"QMLC";
/// Bumped whenever the layout of [`CompiledUnit`] changes
pub const CACHE_FORMAT_VERSION: u32 = 2;
pub const CACHE_EXTENSION: &str = "qmlc";
/// Upper bound on the bytes a header may claim while decoding
const HEADER_LIMIT: usize = 64 * 1024;
/// Upper bound on the bytes a unit payload may claim while decoding
const PAYLOAD_LIMIT: usize = 256 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("No cache file for {0}")]
    NotFound(String),

    #[error("I/O error on cache file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to encode unit: {0}")]
    Encode(String),

    #[error("Failed to decode cache file: {0}")]
    Decode(String),

    #[error("Not a cache file")]
    BadMagic,

    #[error("Cache format version {found} does not match {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Cache file was written for {found}")]
    UrlMismatch { found: String },

    #[error("Source file is newer than the cache")]
    Stale,

    #[error("Cache payload checksum mismatch")]
    ChecksumMismatch,
}

impl CacheError {
    /// Error code for the cache failure
    pub fn code(&self) -> &'static str {
        match self {
            CacheError::NotFound(_) => "C001",
            CacheError::Io { .. } => "C002",
            CacheError::Encode(_) => "C003",
            CacheError::Decode(_) => "C004",
            CacheError::BadMagic => "C005",
            CacheError::VersionMismatch { .. } => "C006",
            CacheError::UrlMismatch { .. } => "C007",
            CacheError::Stale => "C008",
            CacheError::ChecksumMismatch => "C009",
        }
    }

    pub fn to_qml_error(&self, url: &Url) -> QmlError {
        QmlError::new(ErrorKind::Cache, self.to_string()).with_url(url)
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Fixed header preceding every cached unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheHeader {
    pub magic: [u8; 4],
    pub format_version: u32,
    pub url: String,
    pub source_timestamp: u64,
    pub flags: u32,
    /// blake3 of the encoded unit following the header
    pub payload_checksum: Digest,
}

/// Directory of cached units
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file path for `url`
    pub fn path_for(&self, url: &Url) -> PathBuf {
        let hash = blake3::hash(url.as_str().as_bytes());
        self.dir.join(format!("{}.{}", hash.to_hex(), CACHE_EXTENSION))
    }

    /// Write `unit`, replacing any previous file for its URL
    pub fn save(&self, unit: &CompiledUnit) -> CacheResult<PathBuf> {
        let config = bincode::config::standard();
        let payload = bincode::serde::encode_to_vec(unit, config).map_err(|e| CacheError::Encode(e.to_string()))?;
        let header = CacheHeader {
            magic: CACHE_MAGIC,
            format_version: CACHE_FORMAT_VERSION,
            url: unit.url.to_string(),
            source_timestamp: unit.source_timestamp,
            flags: unit.flags,
            payload_checksum: *blake3::hash(&payload).as_bytes(),
        };
        let mut bytes = bincode::serde::encode_to_vec(&header, config).map_err(|e| CacheError::Encode(e.to_string()))?;
        bytes.extend_from_slice(&payload);

        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io { path: self.dir.clone(), source })?;
        let path = self.path_for(&unit.url);
        let temp = path.with_extension(format!("{}.tmp", CACHE_EXTENSION));
        fs::write(&temp, &bytes).map_err(|source| CacheError::Io { path: temp.clone(), source })?;
        fs::rename(&temp, &path).map_err(|source| CacheError::Io { path: path.clone(), source })?;
        debug!(target: "typeloader::disk_cache", url = %unit.url, path = %path.display(), bytes = bytes.len(), "Saved compilation unit");
        Ok(path)
    }

    /// Read the unit cached for `url`, provided it was written for a source
    /// with the same modification time
    pub fn load(&self, url: &Url, source_timestamp: u64) -> CacheResult<CompiledUnit> {
        let path = self.path_for(url);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(CacheError::NotFound(url.to_string())),
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let header_config = bincode::config::standard().with_limit::<HEADER_LIMIT>();
        let (header, header_len): (CacheHeader, usize) = bincode::serde::decode_from_slice(&bytes, header_config).map_err(|e| CacheError::Decode(e.to_string()))?;
        if header.magic != CACHE_MAGIC {
            return Err(CacheError::BadMagic);
        }
        if header.format_version != CACHE_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                found: header.format_version,
                expected: CACHE_FORMAT_VERSION,
            });
        }
        if header.url != url.as_str() {
            return Err(CacheError::UrlMismatch { found: header.url });
        }
        if header.source_timestamp != source_timestamp {
            return Err(CacheError::Stale);
        }

        let payload = &bytes[header_len..];
        if *blake3::hash(payload).as_bytes() != header.payload_checksum {
            warn!(target: "typeloader::disk_cache", url = %url, "Cache file is corrupt");
            return Err(CacheError::ChecksumMismatch);
        }
        let payload_config = bincode::config::standard().with_limit::<PAYLOAD_LIMIT>();
        let (unit, _): (CompiledUnit, usize) = bincode::serde::decode_from_slice(payload, payload_config).map_err(|e| CacheError::Decode(e.to_string()))?;
        debug!(target: "typeloader::disk_cache", url = %url, "Loaded compilation unit");
        Ok(unit)
    }

    /// Remove the file cached for `url`, if any
    pub fn remove(&self, url: &Url) -> CacheResult<bool> {
        let path = self.path_for(url);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    /// Remove every cache file, returning how many were deleted
    pub fn clear(&self) -> CacheResult<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => return Err(CacheError::Io { path: self.dir.clone(), source }),
        };
        let mut removed = 0;
        for entry in entries {
            let path = entry.map_err(|source| CacheError::Io { path: self.dir.clone(), source })?.path();
            if path.extension().is_some_and(|ext| ext == CACHE_EXTENSION) {
                fs::remove_file(&path).map_err(|source| CacheError::Io { path: path.clone(), source })?;
                removed += 1;
            }
        }
        debug!(target: "typeloader::disk_cache", dir = %self.dir.display(), removed, "Cleared cache");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use tempfile::TempDir;

    fn unit(timestamp: u64) -> CompiledUnit {
        let url = Url::parse("file:///app/Main.qml").unwrap();
        CompiledUnit::ahead_of_time(parse_document(&url, "import QtQuick 2.0\nItem { width: 10 }").unwrap(), timestamp).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let unit = unit(100);
        let path = cache.save(&unit).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), CACHE_EXTENSION);

        let loaded = cache.load(&unit.url, 100).unwrap();
        assert_eq!(loaded, unit);
    }

    #[test]
    fn test_stale_and_missing() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let unit = unit(100);
        assert!(matches!(cache.load(&unit.url, 100), Err(CacheError::NotFound(_))));
        cache.save(&unit).unwrap();
        assert!(matches!(cache.load(&unit.url, 101), Err(CacheError::Stale)));
    }

    #[test]
    fn test_corrupt_payload() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let unit = unit(7);
        let path = cache.save(&unit).unwrap();
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();
        let error = cache.load(&unit.url, 7).unwrap_err();
        assert!(matches!(error, CacheError::ChecksumMismatch));
        assert_eq!(error.to_qml_error(&unit.url).kind, ErrorKind::Cache);
    }

    #[test]
    fn test_garbage_file() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let url = Url::parse("file:///app/Main.qml").unwrap();
        fs::write(cache.path_for(&url), b"not a cache file at all").unwrap();
        assert!(cache.load(&url, 0).is_err());
    }

    #[test]
    fn test_huge_length_prefix_is_rejected() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let url = Url::parse("file:///app/Main.qml").unwrap();
        let mut bytes = CACHE_MAGIC.to_vec();
        bytes.push(CACHE_FORMAT_VERSION as u8);
        // u64 varint marker followed by a URL length no file could hold
        bytes.push(0xfd);
        bytes.extend_from_slice(&(u64::MAX / 2).to_le_bytes());
        fs::write(cache.path_for(&url), bytes).unwrap();
        let error = cache.load(&url, 0).unwrap_err();
        assert!(matches!(error, CacheError::Decode(_)));
        assert_eq!(error.code(), "C004");
    }

    #[test]
    fn test_remove_and_clear() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let unit = unit(1);
        cache.save(&unit).unwrap();
        assert!(cache.remove(&unit.url).unwrap());
        assert!(!cache.remove(&unit.url).unwrap());

        cache.save(&unit).unwrap();
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();
        assert_eq!(cache.clear().unwrap(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }
}
