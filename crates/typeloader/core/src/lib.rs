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

//! Source loading and dependency resolution
//!
//! [`TypeLoader`] turns document URLs into compiled units. It fetches sources
//! through a [`Fetcher`], resolves imports against the type registry and qmldir
//! manifests, waits for composite dependencies, and compiles each document once
//! everything it uses is available.

pub mod fetch;
pub mod graph;
pub mod imports;
pub mod loader;
pub mod qmldir;
pub mod unit;

pub use fetch::{Fetch, FetchError, FetchResult, Fetcher, FileFetcher, MemoryFetcher, SourceData};
pub use graph::{DependencyGraph, EdgeOutcome};
pub use imports::{CompositeEntry, ImportCache, ImportEntry, ImportedType, ResolveError, ScriptImport};
pub use loader::TypeLoader;
pub use qmldir::{Qmldir, QmldirComponent, QmldirError, QmldirPlugin, QmldirScript};
pub use unit::{CompletionCallback, SourceUnit, UnitKind, UnitStatus};
