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

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use typeloader_common::LoaderConfig;

pub fn load_from_file(path: impl AsRef<Path>) -> Result<LoaderConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: LoaderConfig = toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

/// Configuration file (or the environment), overridden by command line flags
pub fn resolve_config(cli_config: Option<&Path>, cli_cache_dir: Option<PathBuf>, cli_import_paths: Vec<PathBuf>, no_cache: bool) -> Result<LoaderConfig> {
    let mut config = match cli_config {
        Some(path) => load_from_file(path)?,
        None => LoaderConfig::from_env(),
    };

    if let Some(cache_dir) = cli_cache_dir {
        config.cache_dir = cache_dir;
    }
    // Command line paths are searched first
    let mut import_paths = cli_import_paths;
    import_paths.append(&mut config.import_paths);
    config.import_paths = import_paths;
    if no_cache {
        config.disable_disk_cache = true;
        config.force_disk_cache = false;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_then_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("qmlc.toml");
        std::fs::write(&path, "cache_dir = \"/var/cache/qml\"\nimport_paths = [\"/opt/qml\"]\nmax_events_per_pump = 50\n").unwrap();

        let config = resolve_config(Some(path.as_path()), None, vec![PathBuf::from("/usr/lib/qml")], false).unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/qml"));
        assert_eq!(config.import_paths, vec![PathBuf::from("/usr/lib/qml"), PathBuf::from("/opt/qml")]);
        assert_eq!(config.max_events_per_pump, 50);
        assert!(config.disk_cache_active());

        let config = resolve_config(Some(path.as_path()), Some(dir.path().to_path_buf()), Vec::new(), true).unwrap();
        assert_eq!(config.cache_dir, dir.path());
        assert!(!config.disk_cache_active());
    }

    #[test]
    fn test_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("qmlc.toml");
        std::fs::write(&path, "max_events_per_pump = \"many\"\n").unwrap();
        assert!(resolve_config(Some(path.as_path()), None, Vec::new(), false).is_err());
        assert!(resolve_config(Some(dir.path().join("missing.toml").as_path()), None, Vec::new(), false).is_err());
    }
}
