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

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod commands;
mod config;

use crate::config::resolve_config;
use anyhow::Result;

/// Load, precompile and cache QML documents
#[derive(Parser, Debug)]
#[command(name = "qmlc", about = "QML type loader and compilation cache")]
pub struct Cli {
    /// Path to configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Compilation cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Additional module import path; may be repeated
    #[arg(long = "import-path")]
    pub import_paths: Vec<PathBuf>,

    /// Do not read or write the compilation cache
    #[arg(long)]
    pub no_cache: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load documents and report their errors
    Load {
        /// Documents to load
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Parse every document under a directory and cache it for type compilation at load time
    Precompile {
        /// Directory to scan for .qml files
        dir: PathBuf,
    },

    /// Remove every cached compilation unit
    ClearCache,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let config = resolve_config(cli.config.as_deref(), cli.cache_dir, cli.import_paths, cli.no_cache)?;

    match cli.command {
        Commands::Load { files } => commands::load::load_documents(&config, &files)?,
        Commands::Precompile { dir } => commands::precompile::precompile_dir(&config, &dir)?,
        Commands::ClearCache => commands::cache::clear_cache(&config)?,
    }

    Ok(())
}
