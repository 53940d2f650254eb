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

use super::file_url;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use typeloader_common::LoaderConfig;
use typeloader_compiler::{CompiledUnit, DiskCache, parse_document};
use typeloader_core::{Fetch, Fetcher, FileFetcher};

/// Parse every `.qml` file under `dir` and store it as an ahead-of-time unit.
/// Type compilation happens when the document is first loaded.
pub fn precompile_dir(config: &LoaderConfig, dir: &Path) -> Result<()> {
    if !config.disk_cache_active() {
        bail!("The compilation cache is disabled");
    }
    let cache = DiskCache::new(config.cache_dir.clone());
    let mut files = Vec::new();
    collect_documents(dir, &mut files).with_context(|| format!("Failed to scan {}", dir.display()))?;
    files.sort();

    let mut saved = 0;
    let mut failed = 0;
    for file in &files {
        match precompile_file(&cache, file) {
            Ok(()) => saved += 1,
            Err(error) => {
                failed += 1;
                warn!(file = %file.display(), "{:#}", error);
            }
        }
    }

    println!("Precompiled {} of {} documents into {}", saved, files.len(), cache.dir().display());
    if failed > 0 {
        bail!("{} documents could not be precompiled", failed);
    }
    Ok(())
}

fn precompile_file(cache: &DiskCache, file: &Path) -> Result<()> {
    let url = file_url(file)?;
    let data = match FileFetcher.fetch(&url) {
        Fetch::Ready(result) => result?,
        Fetch::Pending => bail!("Unexpected pending fetch for {}", url),
    };
    let text = String::from_utf8(data.bytes).context("Document is not valid UTF-8")?;
    let document = parse_document(&url, &text).map_err(|e| anyhow::anyhow!("{}", e.to_qml_error(&url)))?;
    let path = cache.save(&CompiledUnit::ahead_of_time(document, data.timestamp)?)?;
    debug!(url = %url, path = %path.display(), "Saved ahead-of-time unit");
    Ok(())
}

fn collect_documents(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_documents(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "qml") {
            files.push(path);
        }
    }
    Ok(())
}
