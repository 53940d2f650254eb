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

use super::{file_loader, file_url};
use anyhow::{Result, bail};
use std::path::PathBuf;
use tracing::info;
use typeloader_common::LoaderConfig;

pub fn load_documents(config: &LoaderConfig, files: &[PathBuf]) -> Result<()> {
    let mut loader = file_loader(config)?;
    let mut failed = 0;

    for file in files {
        let url = file_url(file)?;
        match loader.load(&url) {
            Ok(unit) => {
                println!("{}: ok ({} objects, {} strings)", file.display(), unit.objects.len(), unit.strings.len());
            }
            Err(errors) => {
                failed += 1;
                for error in &errors {
                    eprintln!("{}", error);
                }
            }
        }
    }

    info!(documents = files.len(), units = loader.len(), "Load finished");
    if failed > 0 {
        bail!("{} of {} documents failed to load", failed, files.len());
    }
    Ok(())
}
