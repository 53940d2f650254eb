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

//! Module and type versions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A `major.minor` version as used by module imports and type registrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Whether something introduced at `self` is visible to an import of `requested`.
    ///
    /// Majors must match exactly; minors are backwards compatible.
    pub fn available_in(&self, requested: Version) -> bool {
        self.major == requested.major && self.minor <= requested.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version \"{0}\"")]
pub struct VersionParseError(pub String);

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.split_once('.').ok_or_else(|| VersionParseError(s.to_string()))?;
        let major = major.parse().map_err(|_| VersionParseError(s.to_string()))?;
        let minor = minor.parse().map_err(|_| VersionParseError(s.to_string()))?;
        Ok(Self { major, minor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!("2.15".parse::<Version>().unwrap(), Version::new(2, 15));
        assert!("2".parse::<Version>().is_err());
        assert!("a.b".parse::<Version>().is_err());
    }

    #[test]
    fn test_available_in() {
        let introduced = Version::new(2, 1);
        assert!(introduced.available_in(Version::new(2, 1)));
        assert!(introduced.available_in(Version::new(2, 7)));
        assert!(!introduced.available_in(Version::new(2, 0)));
        assert!(!introduced.available_in(Version::new(3, 1)));
    }
}
