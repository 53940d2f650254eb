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

//! qmldir manifest parsing
//!
//! A qmldir file lists the types, scripts and plugins of a module or
//! directory, one directive per line:
//!
//! ```text
//! module Controls
//! plugin controlsplugin
//! singleton Theme 1.0 Theme.qml
//! internal PrivateButton PrivateButton.qml
//! Button 1.0 Button.qml
//! Utils 1.0 utils.js
//! ```

use thiserror::Error;
use typeloader_common::Version;

/// A malformed qmldir line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct QmldirError {
    /// 1-based line number
    pub line: u32,
    pub message: String,
}

impl QmldirError {
    fn new(line: u32, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QmldirPlugin {
    pub name: String,
    pub path: Option<String>,
}

/// A composite type entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QmldirComponent {
    pub name: String,
    pub version: Option<Version>,
    /// File name relative to the qmldir
    pub file: String,
    pub singleton: bool,
    /// Only visible to documents in the same directory
    pub internal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QmldirScript {
    pub name: String,
    pub version: Version,
    pub file: String,
}

/// A parsed qmldir file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qmldir {
    pub module: Option<String>,
    pub plugins: Vec<QmldirPlugin>,
    pub components: Vec<QmldirComponent>,
    pub scripts: Vec<QmldirScript>,
    pub depends: Vec<(String, Option<Version>)>,
    pub type_info: Option<String>,
    pub designer_supported: bool,
    pub class_name: Option<String>,
}

impl Qmldir {
    /// Parse `text`; every malformed line is reported, the rest is kept
    pub fn parse(text: &str) -> (Qmldir, Vec<QmldirError>) {
        let mut qmldir = Qmldir::default();
        let mut errors = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index as u32 + 1;
            let content = raw.split('#').next().unwrap_or_default();
            let sections: Vec<&str> = content.split_whitespace().collect();
            if sections.is_empty() {
                continue;
            }
            if let Err(error) = qmldir.parse_line(line, &sections) {
                errors.push(error);
            }
        }
        (qmldir, errors)
    }

    fn parse_line(&mut self, line: u32, sections: &[&str]) -> Result<(), QmldirError> {
        match sections[0] {
            "module" => {
                if sections.len() != 2 {
                    return Err(QmldirError::new(line, format!("module identifier directive requires one argument, but {} were provided", sections.len() - 1)));
                }
                if self.module.is_some() {
                    return Err(QmldirError::new(line, "only one module identifier directive may be defined in a qmldir file"));
                }
                self.module = Some(sections[1].to_string());
            }
            "plugin" => {
                if !(2..=3).contains(&sections.len()) {
                    return Err(QmldirError::new(line, format!("plugin directive requires one or two arguments, but {} were provided", sections.len() - 1)));
                }
                self.plugins.push(QmldirPlugin {
                    name: sections[1].to_string(),
                    path: sections.get(2).map(|s| s.to_string()),
                });
            }
            "classname" => {
                if sections.len() != 2 {
                    return Err(QmldirError::new(line, format!("classname directive requires one argument, but {} were provided", sections.len() - 1)));
                }
                self.class_name = Some(sections[1].to_string());
            }
            "typeinfo" => {
                if sections.len() != 2 {
                    return Err(QmldirError::new(line, format!("typeinfo requires one argument, but {} were provided", sections.len() - 1)));
                }
                self.type_info = Some(sections[1].to_string());
            }
            "designersupported" => {
                if sections.len() != 1 {
                    return Err(QmldirError::new(line, "designersupported does not expect any argument"));
                }
                self.designer_supported = true;
            }
            "depends" => {
                if !(2..=3).contains(&sections.len()) {
                    return Err(QmldirError::new(line, format!("depends requires one or two arguments, but {} were provided", sections.len() - 1)));
                }
                let version = sections.get(2).map(|v| parse_version(line, v)).transpose()?;
                self.depends.push((sections[1].to_string(), version));
            }
            "singleton" => {
                let component = match sections.len() {
                    3 => component(sections[1], None, sections[2]),
                    4 => component(sections[1], Some(parse_version(line, sections[2])?), sections[3]),
                    n => {
                        return Err(QmldirError::new(line, format!("singleton types require two or three arguments, but {} were provided", n - 1)));
                    }
                };
                self.components.push(QmldirComponent { singleton: true, ..component });
            }
            "internal" => {
                let component = match sections.len() {
                    3 => component(sections[1], None, sections[2]),
                    4 => component(sections[1], Some(parse_version(line, sections[2])?), sections[3]),
                    n => {
                        return Err(QmldirError::new(line, format!("internal types require two or three arguments, but {} were provided", n - 1)));
                    }
                };
                self.components.push(QmldirComponent { internal: true, ..component });
            }
            name => match sections.len() {
                2 => self.components.push(component(name, None, sections[1])),
                3 => {
                    let version = parse_version(line, sections[1])?;
                    let file = sections[2];
                    if file.ends_with(".js") || file.ends_with(".mjs") {
                        self.scripts.push(QmldirScript {
                            name: name.to_string(),
                            version,
                            file: file.to_string(),
                        });
                    } else {
                        self.components.push(component(name, Some(version), file));
                    }
                }
                n => {
                    return Err(QmldirError::new(line, format!("a component declaration requires two or three arguments, but {} were provided", n - 1)));
                }
            },
        }
        Ok(())
    }

    /// Components visible to importers; internal types are only visible to the directory itself
    pub fn public_components(&self) -> impl Iterator<Item = &QmldirComponent> {
        self.components.iter().filter(|c| !c.internal)
    }

    pub fn singletons(&self) -> impl Iterator<Item = &QmldirComponent> {
        self.components.iter().filter(|c| c.singleton)
    }
}

fn component(name: &str, version: Option<Version>, file: &str) -> QmldirComponent {
    QmldirComponent {
        name: name.to_string(),
        version,
        file: file.to_string(),
        singleton: false,
        internal: false,
    }
}

fn parse_version(line: u32, text: &str) -> Result<Version, QmldirError> {
    text.parse().map_err(|_| QmldirError::new(line, format!("invalid version {}, expected <major>.<minor>", text)))
}
