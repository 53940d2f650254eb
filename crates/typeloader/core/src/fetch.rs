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

//! Source fetching
//!
//! The loader never touches the file system or network itself. A [`Fetcher`]
//! either answers immediately or reports the request as pending and hands the
//! result back later through [`Fetcher::poll_completed`].

use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("No such file or directory")]
    NotFound(String),

    #[error("{message}")]
    Io { url: String, message: String },

    #[error("Unsupported URL scheme \"{0}\"")]
    UnsupportedScheme(String),
}

/// Raw bytes of a source plus its modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceData {
    pub bytes: Vec<u8>,
    /// Nanoseconds since the epoch; 0 when unknown
    pub timestamp: u64,
}

impl SourceData {
    pub fn new(bytes: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        Self { bytes: bytes.into(), timestamp }
    }
}

pub type FetchResult = Result<SourceData, FetchError>;

/// Outcome of a fetch request
#[derive(Debug)]
pub enum Fetch {
    Ready(FetchResult),
    /// Delivered later by [`Fetcher::poll_completed`]
    Pending,
}

/// Source of document, script and qmldir contents
pub trait Fetcher: Send + Sync {
    /// Whether `url` is answered synchronously
    fn is_local(&self, url: &Url) -> bool;

    fn fetch(&self, url: &Url) -> Fetch;

    /// File names in the directory `url`, `None` if it does not exist or cannot be listed
    fn list_directory(&self, url: &Url) -> Option<Vec<String>>;

    /// Results of pending fetches that have completed since the last call
    fn poll_completed(&self) -> Vec<(Url, FetchResult)>;
}

/// Reads `file:` URLs from the local file system
#[derive(Debug, Default, Clone, Copy)]
pub struct FileFetcher;

impl FileFetcher {
    fn path(url: &Url) -> Result<PathBuf, FetchError> {
        if url.scheme() != "file" {
            return Err(FetchError::UnsupportedScheme(url.scheme().to_string()));
        }
        url.to_file_path().map_err(|_| FetchError::Io {
            url: url.to_string(),
            message: "Invalid file URL".to_string(),
        })
    }
}

impl Fetcher for FileFetcher {
    fn is_local(&self, url: &Url) -> bool {
        url.scheme() == "file"
    }

    fn fetch(&self, url: &Url) -> Fetch {
        let path = match Self::path(url) {
            Ok(path) => path,
            Err(e) => return Fetch::Ready(Err(e)),
        };
        let read = fs::metadata(&path).and_then(|metadata| {
            let timestamp = metadata.modified().ok().and_then(|t| t.duration_since(UNIX_EPOCH).ok()).and_then(|d| u64::try_from(d.as_nanos()).ok()).unwrap_or(0);
            fs::read(&path).map(|bytes| SourceData { bytes, timestamp })
        });
        Fetch::Ready(read.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound(url.to_string()),
            _ => FetchError::Io {
                url: url.to_string(),
                message: e.to_string(),
            },
        }))
    }

    fn list_directory(&self, url: &Url) -> Option<Vec<String>> {
        let path = Self::path(url).ok()?;
        let entries = fs::read_dir(path).ok()?;
        let mut names: Vec<String> = entries.filter_map(|entry| entry.ok()?.file_name().into_string().ok()).collect();
        names.sort();
        Some(names)
    }

    fn poll_completed(&self) -> Vec<(Url, FetchResult)> {
        Vec::new()
    }
}

/// In-memory sources.
///
/// `file:` URLs are answered synchronously; every other scheme behaves like a
/// remote fetch and completes on the next [`Fetcher::poll_completed`].
#[derive(Default)]
pub struct MemoryFetcher {
    sources: Mutex<BTreeMap<Url, SourceData>>,
    in_flight: Mutex<VecDeque<Url>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the source at `url`
    pub fn insert(&self, url: &Url, text: &str, timestamp: u64) {
        self.sources.lock().insert(url.clone(), SourceData::new(text, timestamp));
    }

    pub fn with_source(self, url: &Url, text: &str, timestamp: u64) -> Self {
        self.insert(url, text, timestamp);
        self
    }

    pub fn remove(&self, url: &Url) {
        self.sources.lock().remove(url);
    }

    fn lookup(&self, url: &Url) -> FetchResult {
        self.sources.lock().get(url).cloned().ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

impl Fetcher for MemoryFetcher {
    fn is_local(&self, url: &Url) -> bool {
        url.scheme() == "file"
    }

    fn fetch(&self, url: &Url) -> Fetch {
        if self.is_local(url) {
            return Fetch::Ready(self.lookup(url));
        }
        debug!(url = %url, "Queued remote fetch");
        self.in_flight.lock().push_back(url.clone());
        Fetch::Pending
    }

    fn list_directory(&self, url: &Url) -> Option<Vec<String>> {
        let prefix = url.as_str().trim_end_matches('/').to_string() + "/";
        let sources = self.sources.lock();
        let names: Vec<String> = sources
            .keys()
            .filter_map(|key| key.as_str().strip_prefix(&prefix))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(str::to_string)
            .collect();
        if names.is_empty() { None } else { Some(names) }
    }

    fn poll_completed(&self) -> Vec<(Url, FetchResult)> {
        let urls: Vec<Url> = self.in_flight.lock().drain(..).collect();
        urls.into_iter()
            .map(|url| {
                let result = self.lookup(&url);
                (url, result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_file_fetcher_reads_and_lists() {
        let dir = TempDir::new().unwrap();
        let mut file = fs::File::create(dir.path().join("Main.qml")).unwrap();
        file.write_all(b"Item {}").unwrap();
        fs::write(dir.path().join("qmldir"), "Button 1.0 Button.qml").unwrap();

        let fetcher = FileFetcher;
        let url = Url::from_file_path(dir.path().join("Main.qml")).unwrap();
        match fetcher.fetch(&url) {
            Fetch::Ready(Ok(data)) => {
                assert_eq!(data.bytes, b"Item {}");
                let modified = fs::metadata(dir.path().join("Main.qml")).unwrap().modified().unwrap();
                assert_eq!(data.timestamp as u128, modified.duration_since(UNIX_EPOCH).unwrap().as_nanos());
            }
            other => panic!("unexpected {:?}", other),
        }

        let missing = Url::from_file_path(dir.path().join("Missing.qml")).unwrap();
        assert!(matches!(fetcher.fetch(&missing), Fetch::Ready(Err(FetchError::NotFound(_)))));

        let dir_url = Url::from_directory_path(dir.path()).unwrap();
        assert_eq!(fetcher.list_directory(&dir_url), Some(vec!["Main.qml".to_string(), "qmldir".to_string()]));
        assert!(fetcher.is_local(&url));
    }

    #[test]
    fn test_memory_fetcher_remote_completes_on_poll() {
        let remote = Url::parse("http://example.com/app/Main.qml").unwrap();
        let fetcher = MemoryFetcher::new().with_source(&remote, "Item {}", 3);
        assert!(matches!(fetcher.fetch(&remote), Fetch::Pending));
        let completed = fetcher.poll_completed();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].1.as_ref().unwrap().timestamp, 3);
        assert!(fetcher.poll_completed().is_empty());
    }

    #[test]
    fn test_memory_fetcher_lists_direct_children() {
        let base = Url::parse("file:///app/").unwrap();
        let fetcher = MemoryFetcher::new()
            .with_source(&base.join("Main.qml").unwrap(), "Item {}", 1)
            .with_source(&base.join("Button.qml").unwrap(), "Item {}", 1)
            .with_source(&base.join("lib/Other.qml").unwrap(), "Item {}", 1);
        assert_eq!(fetcher.list_directory(&base), Some(vec!["Button.qml".to_string(), "Main.qml".to_string()]));
        assert_eq!(fetcher.list_directory(&Url::parse("file:///nowhere/").unwrap()), None);
        assert!(matches!(fetcher.fetch(&base.join("Nope.qml").unwrap()), Fetch::Ready(Err(FetchError::NotFound(_)))));
    }
}
