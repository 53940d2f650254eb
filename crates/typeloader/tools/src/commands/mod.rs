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

pub mod cache;
pub mod load;
pub mod precompile;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use typeloader_common::LoaderConfig;
use typeloader_core::{FileFetcher, TypeLoader};
use typeloader_registry::TypeRegistry;
use typeloader_registry::builtins::register_builtin_types;
use url::Url;

/// A loader over the local file system with the builtin modules installed
pub fn file_loader(config: &LoaderConfig) -> Result<TypeLoader> {
    let registry = Arc::new(TypeRegistry::new());
    register_builtin_types(&registry).context("Failed to register builtin types")?;
    Ok(TypeLoader::new(registry, Box::new(FileFetcher), config.clone()))
}

pub fn file_url(path: &Path) -> Result<Url> {
    let absolute = std::fs::canonicalize(path).with_context(|| format!("File not found: {}", path.display()))?;
    Url::from_file_path(&absolute).map_err(|_| anyhow::anyhow!("Not a file path: {}", absolute.display()))
}
