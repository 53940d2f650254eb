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

//! Type compilation of a parsed document

use crate::aliases::resolve_aliases;
use crate::document::Document;
use crate::hasher::DependencyHasher;
use crate::instructions::{InstructionGenerator, StringTable};
use crate::property_caches::build_property_caches;
use crate::references::collect_type_references;
use crate::resolved::{ResolvedScript, ResolvedTypeMap, TypeNameCache};
use crate::unit::{CompiledUnit, flags, unit_checksum};
use crate::validator::validate_bindings;
use tracing::{debug, instrument};
use typeloader_common::{ErrorKind, QmlError, QmlErrors};

/// Everything a document is compiled against
pub struct CompileContext<'a> {
    pub type_name_cache: &'a TypeNameCache,
    pub resolved_types: &'a ResolvedTypeMap,
    pub scripts: &'a [ResolvedScript],
    pub hasher: &'a dyn DependencyHasher,
    /// Modification time of the source
    pub source_timestamp: u64,
}

/// Compile `document` into a unit.
///
/// Property caches are built first, then aliases are resolved and every
/// binding is validated. Any error stops compilation.
#[instrument(skip_all, fields(url = %document.url))]
pub fn compile(document: &Document, context: &CompileContext<'_>) -> Result<CompiledUnit, QmlErrors> {
    let mut caches = build_property_caches(document, context.resolved_types)?;
    resolve_aliases(document, &mut caches)?;
    validate_bindings(document, &caches)?;

    let mut strings = StringTable::new();
    let mut generator = InstructionGenerator::new(context.resolved_types, &mut strings);
    let objects: Vec<_> = document.objects.iter().zip(caches).map(|(object, cache)| generator.compile_object(object, cache)).collect();

    let dependency_digest = context.hasher.digest(context.resolved_types, context.scripts);
    if dependency_digest.is_none() {
        debug!("No dependency digest; unit will not be reused from disk");
    }
    let unit_flags = if document.is_singleton() { flags::IS_SINGLETON } else { 0 };
    let checksum = unit_checksum(&document.source_checksum, dependency_digest.as_ref(), unit_flags, &objects)
        .map_err(|e| vec![QmlError::new(ErrorKind::Compile, format!("Failed to encode unit: {}", e)).with_url(&document.url)])?;

    Ok(CompiledUnit {
        url: document.url.clone(),
        flags: unit_flags,
        source_timestamp: context.source_timestamp,
        source_checksum: document.source_checksum,
        strings,
        imports: document.imports.clone(),
        type_references: collect_type_references(document),
        objects,
        type_name_cache: context.type_name_cache.clone(),
        dependent_scripts: context.scripts.iter().map(|s| s.url.clone()).collect(),
        document: None,
        dependency_digest,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Blake3DependencyHasher;
    use crate::parser::parse_document;
    use crate::resolved::ResolvedType;
    use std::sync::Arc;
    use typeloader_common::{ErrorKind, Location, Version};
    use typeloader_registry::TypeRegistry;
    use typeloader_registry::builtins::{QTQUICK_MODULE, register_builtin_types};
    use url::Url;

    fn resolved(registry: &TypeRegistry, minor: u32) -> ResolvedTypeMap {
        let mut map = ResolvedTypeMap::new();
        for name in ["Item", "Rectangle", "Text", "MouseArea"] {
            let descriptor = registry.lookup(QTQUICK_MODULE, name, 2, minor).unwrap();
            map.insert(name.to_string(), ResolvedType::native(descriptor, Some(Version::new(2, minor)), Location::unknown()));
        }
        map
    }

    fn compile_source(source: &str, types: &ResolvedTypeMap) -> Result<CompiledUnit, QmlErrors> {
        let url = Url::parse("file:///app/Main.qml").unwrap();
        let document = parse_document(&url, source).unwrap();
        let names = TypeNameCache::default();
        let context = CompileContext {
            type_name_cache: &names,
            resolved_types: types,
            scripts: &[],
            hasher: &Blake3DependencyHasher,
            source_timestamp: 5,
        };
        compile(&document, &context)
    }

    #[test]
    fn test_compile_document() {
        let registry = TypeRegistry::new();
        register_builtin_types(&registry).unwrap();
        let types = resolved(&registry, 0);
        let unit = compile_source(
            "import QtQuick 2.0\nRectangle {\n id: root\n property alias label: text.text\n color: \"red\"\n Text { id: text; text: \"hi\" }\n MouseArea { onClicked: root.color = \"blue\" }\n}",
            &types,
        )
        .unwrap();
        assert_eq!(unit.objects.len(), 3);
        assert_eq!(unit.root().unwrap().children, vec![1, 2]);
        assert!(unit.root_property_cache().unwrap().property("label").unwrap().is_alias);
        assert!(unit.dependency_digest.is_some());
        assert!(unit.verify_checksum());
        assert!(!unit.is_pending_type_compilation());
        assert_eq!(unit.source_timestamp, 5);
    }

    #[test]
    fn test_revisioned_property_requires_newer_import() {
        let registry = TypeRegistry::new();
        register_builtin_types(&registry).unwrap();
        let errors = compile_source("import QtQuick 2.0\nItem { antialiasing: true }", &resolved(&registry, 0)).unwrap_err();
        assert_eq!(errors[0].description, "Cannot assign to non-existent property \"antialiasing\"");
        assert_eq!(errors[0].kind, ErrorKind::BindingValidation);

        compile_source("import QtQuick 2.1\nItem { antialiasing: true }", &resolved(&registry, 1)).unwrap();
    }

    #[test]
    fn test_composite_base_type() {
        let registry = TypeRegistry::new();
        register_builtin_types(&registry).unwrap();
        let types = resolved(&registry, 0);
        let button = Arc::new(compile_source("Item {\n property string label\n signal activated\n enum Style { Flat, Raised }\n}", &types).unwrap());

        let mut with_button = types.clone();
        with_button.insert(
            "Button".to_string(),
            ResolvedType {
                descriptor: None,
                compiled: Some(Arc::clone(&button)),
                version: None,
                location: Location::new(2, 1),
                needs_creation: true,
            },
        );
        let unit = compile_source("Item {\n Button { label: \"ok\"; onActivated: {} ; width: Button.Raised }\n}", &with_button).unwrap();
        let cache = &unit.objects[1].property_cache;
        assert!(cache.property("width").is_some());
        assert!(cache.property("label").is_some());

        let digest = unit.dependency_digest;
        let changed = Arc::new(compile_source("Item {\n property string label\n property int extra\n signal activated\n enum Style { Flat, Raised }\n}", &types).unwrap());
        with_button.get_mut("Button").unwrap().compiled = Some(changed);
        let recompiled = compile_source("Item {\n Button { label: \"ok\"; onActivated: {} ; width: Button.Raised }\n}", &with_button).unwrap();
        assert_ne!(recompiled.dependency_digest, digest);
    }

    #[test]
    fn test_singleton_flag() {
        let registry = TypeRegistry::new();
        register_builtin_types(&registry).unwrap();
        let unit = compile_source("pragma Singleton\nItem {}", &resolved(&registry, 0)).unwrap();
        assert!(unit.is_singleton());
    }
}
