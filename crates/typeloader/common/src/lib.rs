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

//! Shared vocabulary for the declarative type loader
//!
//! Source locations, versions, the user-facing error record and the loader
//! configuration live here so that every other crate in the workspace can
//! speak the same language without depending on each other.

pub mod config;
pub mod error;
pub mod location;
pub mod version;

pub use config::LoaderConfig;
pub use error::{ErrorKind, QmlError, QmlErrors};
pub use location::Location;
pub use version::Version;
