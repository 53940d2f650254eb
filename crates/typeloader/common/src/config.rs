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

//! Loader configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Environment variable disabling the disk cache
pub const ENV_DISABLE_DISK_CACHE: &str = "QML_DISABLE_DISK_CACHE";
/// Environment variable forcing the disk cache on, even when disabled
pub const ENV_FORCE_DISK_CACHE: &str = "QML_FORCE_DISK_CACHE";
/// Environment variable listing extra module import paths
pub const ENV_IMPORT_PATH: &str = "QML_IMPORT_PATH";
/// Environment variable marking the session as being debugged
pub const ENV_DEBUG: &str = "QML_DEBUG";

/// Configuration for the type loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Never read or write compiled units on disk
    pub disable_disk_cache: bool,
    /// Use the disk cache even if `disable_disk_cache` is set
    pub force_disk_cache: bool,
    /// The session is being debugged; cached bytecode would hide breakpoints
    pub debug_mode: bool,
    /// Directory holding `*.qmlc` files
    pub cache_dir: PathBuf,
    /// Directories searched for `<uri>/qmldir` module manifests, in order
    pub import_paths: Vec<PathBuf>,
    /// Upper bound of ready units processed by a single `process_events` call
    pub max_events_per_pump: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            disable_disk_cache: false,
            force_disk_cache: false,
            debug_mode: false,
            cache_dir: std::env::temp_dir().join("typeloader-cache"),
            import_paths: Vec::new(),
            max_events_per_pump: 10_000,
        }
    }
}

impl LoaderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).map(|v| !v.is_empty() && v != "0").unwrap_or(false);

        let mut config = Self {
            disable_disk_cache: flag(ENV_DISABLE_DISK_CACHE),
            force_disk_cache: flag(ENV_FORCE_DISK_CACHE),
            debug_mode: flag(ENV_DEBUG),
            ..Self::default()
        };
        if let Some(paths) = lookup(ENV_IMPORT_PATH) {
            config.import_paths = std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()).collect();
        }
        debug!(disk_cache = config.disk_cache_active(), debug_mode = config.debug_mode, import_paths = config.import_paths.len(), "Loader configuration");
        config
    }

    /// Set the cache directory
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Append an import path
    pub fn with_import_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.import_paths.push(path.into());
        self
    }

    /// Enable or disable the disk cache
    pub fn with_disk_cache(mut self, enabled: bool) -> Self {
        self.disable_disk_cache = !enabled;
        self
    }

    /// Force the disk cache on
    pub fn with_forced_disk_cache(mut self, forced: bool) -> Self {
        self.force_disk_cache = forced;
        self
    }

    /// Mark the session as being debugged
    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    /// Whether compiled units may be read from or written to disk
    pub fn disk_cache_active(&self) -> bool {
        (!self.disable_disk_cache || self.force_disk_cache) && !self.debug_mode
    }
}
