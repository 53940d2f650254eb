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

//! Document compiler for the declarative type loader
//!
//! Turns source text into a [`Document`], and a document plus its resolved
//! dependencies into an immutable [`CompiledUnit`] that can be stored in a
//! [`DiskCache`].

pub mod aliases;
pub mod compile;
pub mod disk_cache;
pub mod document;
pub mod hasher;
pub mod instructions;
pub mod parser;
pub mod property_caches;
pub mod references;
pub mod resolved;
pub mod unit;
pub mod validator;

pub use compile::{CompileContext, compile};
pub use disk_cache::{CacheError, CacheHeader, CacheResult, DiskCache};
pub use document::{Binding, BindingValue, Document, ImportKind, ImportRecord, Pragma, PropertyDecl, QmlObject};
pub use hasher::{Blake3DependencyHasher, DependencyHasher};
pub use instructions::{CompiledBinding, CompiledObject, Instruction, StringTable};
pub use parser::{ParseError, ParseErrorKind, ParseResult, parse_document};
pub use references::{TypeReference, collect_type_references};
pub use resolved::{ResolvedScript, ResolvedType, ResolvedTypeMap, TypeNameCache};
pub use unit::{CompiledUnit, flags};
