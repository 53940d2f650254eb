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
use typeloader_common::LoaderConfig;
use typeloader_compiler::DiskCache;

pub fn clear_cache(config: &LoaderConfig) -> Result<()> {
    let cache = DiskCache::new(config.cache_dir.clone());
    let removed = cache.clear().with_context(|| format!("Failed to clear {}", cache.dir().display()))?;
    println!("Removed {} cached units from {}", removed, cache.dir().display());
    Ok(())
}
