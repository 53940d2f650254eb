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

//! The error record surfaced to embedding applications

use crate::location::Location;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Categories of load failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed source text
    Parse,
    /// Module not installed, namespace misuse, unknown type, bad qmldir
    Import,
    /// A transitively required document or script failed
    Dependency,
    /// A binding targets a missing or non-settable property
    BindingValidation,
    /// Disk cache read/write failure (never fatal on its own)
    Cache,
    /// Declared and used singleton status disagree
    SingletonPragmaMismatch,
    /// The source could not be fetched
    Fetch,
    /// Any other compile-time failure (property caches, aliases, creatability)
    Compile,
}

impl ErrorKind {
    /// Get a short error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "Q001",
            ErrorKind::Import => "Q002",
            ErrorKind::Dependency => "Q003",
            ErrorKind::BindingValidation => "Q004",
            ErrorKind::Cache => "Q005",
            ErrorKind::SingletonPragmaMismatch => "Q006",
            ErrorKind::Fetch => "Q007",
            ErrorKind::Compile => "Q008",
        }
    }

    /// Whether this kind of error stops the load of the unit it is attached to
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ErrorKind::Cache)
    }
}

/// One structured error: url, line, column and a human readable description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QmlError {
    pub url: Option<Url>,
    pub line: u32,
    pub column: u32,
    pub description: String,
    pub kind: ErrorKind,
}

/// The error list attached to a failed unit, outermost record first
pub type QmlErrors = Vec<QmlError>;

impl QmlError {
    /// Create a new error without a location
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            url: None,
            line: 0,
            column: 0,
            description: description.into(),
            kind,
        }
    }

    /// Attach the document the error belongs to
    pub fn with_url(mut self, url: &Url) -> Self {
        self.url = Some(url.clone());
        self
    }

    /// Attach a source location
    pub fn with_location(mut self, location: Location) -> Self {
        self.line = location.line;
        self.column = location.column;
        self
    }

    pub fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    /// Rewrite the description as `"<prefix> <description>"`
    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.description = format!("{} {}", prefix, self.description);
        self
    }
}

impl fmt::Display for QmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{}", url)?,
            None => write!(f, "<Unknown File>")?,
        }
        if self.line > 0 {
            write!(f, ":{}", self.line)?;
            if self.column > 0 {
                write!(f, ":{}", self.column)?;
            }
        }
        write!(f, ": {}", self.description)
    }
}

impl std::error::Error for QmlError {}
