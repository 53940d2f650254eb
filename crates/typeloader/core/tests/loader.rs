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

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use typeloader_common::{ErrorKind, LoaderConfig, Location};
use typeloader_compiler::{CompiledUnit, DiskCache, collect_type_references, parse_document};
use typeloader_core::{FileFetcher, MemoryFetcher, TypeLoader, UnitStatus};
use typeloader_registry::TypeRegistry;
use typeloader_registry::builtins::register_builtin_types;
use url::Url;

const MAIN: &str = "import QtQuick 2.0\nItem {\n    Button { label: \"ok\" }\n}\n";
const BUTTON: &str = "import QtQuick 2.0\nRectangle {\n    property string label\n}\n";

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn registry() -> Arc<TypeRegistry> {
    let registry = Arc::new(TypeRegistry::new());
    register_builtin_types(&registry).unwrap();
    registry
}

fn uncached_loader(fetcher: MemoryFetcher) -> TypeLoader {
    TypeLoader::new(registry(), Box::new(fetcher), LoaderConfig::default().with_disk_cache(false))
}

fn cached_loader(fetcher: MemoryFetcher, cache: &TempDir) -> TypeLoader {
    TypeLoader::new(registry(), Box::new(fetcher), LoaderConfig::default().with_cache_dir(cache.path()))
}

fn app(main: &str, button: &str, button_timestamp: u64) -> MemoryFetcher {
    MemoryFetcher::new().with_source(&url("file:///app/Main.qml"), main, 1).with_source(&url("file:///app/Button.qml"), button, button_timestamp)
}

#[test]
fn test_cached_unit_is_reused_for_unchanged_source() {
    let cache = TempDir::new().unwrap();
    let main = url("file:///app/Main.qml");

    let first = cached_loader(app(MAIN, BUTTON, 1), &cache).load(&main).unwrap();
    assert!(DiskCache::new(cache.path()).path_for(&main).exists());

    let second = cached_loader(app(MAIN, BUTTON, 1), &cache).load(&main).unwrap();
    assert_eq!(*first, *second);
}

#[test]
fn test_edit_with_same_timestamp_is_recompiled() {
    let cache = TempDir::new().unwrap();
    let main = url("file:///app/Main.qml");
    let first = cached_loader(app(MAIN, BUTTON, 1), &cache).load(&main).unwrap();

    let edited = MAIN.replace("\"ok\"", "\"cancel\"");
    let second = cached_loader(app(&edited, BUTTON, 1), &cache).load(&main).unwrap();
    assert_ne!(second.source_checksum, first.source_checksum);
    assert_eq!(second.source_checksum, *blake3::hash(edited.as_bytes()).as_bytes());

    let invalid = MAIN.replace("Item {\n", "Item {\n    nonexistentProperty: 2\n");
    let errors = cached_loader(app(&invalid, BUTTON, 1), &cache).load(&main).unwrap_err();
    assert!(errors.iter().any(|e| e.description == "Cannot assign to non-existent property \"nonexistentProperty\""));
}

#[test]
fn test_dependency_change_invalidates_cached_unit() {
    let cache = TempDir::new().unwrap();
    let main = url("file:///app/Main.qml");

    let first = cached_loader(app(MAIN, BUTTON, 1), &cache).load(&main).unwrap();
    let changed_button = "import QtQuick 2.0\nRectangle {\n    property string label\n    property int count\n}\n";
    let second = cached_loader(app(MAIN, changed_button, 2), &cache).load(&main).unwrap();
    assert!(second.dependency_digest.is_some());
    assert_ne!(first.dependency_digest, second.dependency_digest);
    assert_eq!(first.source_checksum, second.source_checksum);

    // The recompiled unit replaced the stale one on disk
    let third = cached_loader(app(MAIN, changed_button, 2), &cache).load(&main).unwrap();
    assert_eq!(third.dependency_digest, second.dependency_digest);
}

#[test]
fn test_disabled_cache_writes_nothing() {
    let cache = TempDir::new().unwrap();
    let config = LoaderConfig::default().with_cache_dir(cache.path()).with_debug_mode(true);
    let mut loader = TypeLoader::new(registry(), Box::new(app(MAIN, BUTTON, 1)), config);
    assert!(loader.disk_cache().is_none());
    loader.load(&url("file:///app/Main.qml")).unwrap();
    assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 0);
}

#[test]
fn test_ahead_of_time_unit_is_compiled_and_not_resaved() {
    let cache = TempDir::new().unwrap();
    let main = url("file:///app/Main.qml");
    let disk = DiskCache::new(cache.path());
    let document = parse_document(&main, MAIN).unwrap();
    disk.save(&CompiledUnit::ahead_of_time(document, 1).unwrap()).unwrap();

    let compiled = cached_loader(app(MAIN, BUTTON, 1), &cache).load(&main).unwrap();
    assert!(!compiled.is_pending_type_compilation());
    assert_eq!(compiled.objects.len(), 2);
    assert!(disk.load(&main, 1).unwrap().is_pending_type_compilation());
}

#[test]
fn test_resolution_is_idempotent() {
    let main = url("file:///app/Main.qml");
    let other = url("file:///app/Other.qml");
    let fetcher = app(MAIN, BUTTON, 1).with_source(&other, "import QtQuick 2.0\nItem {}\n", 1);
    let mut loader = uncached_loader(fetcher);
    loader.load(&main).unwrap();
    loader.load(&other).unwrap();

    let first = loader.resolve_type(&main, "Item").unwrap();
    let again = loader.resolve_type(&main, "Item").unwrap();
    let elsewhere = loader.resolve_type(&other, "Item").unwrap();
    assert!(Arc::ptr_eq(&first.descriptor, &again.descriptor));
    assert!(Arc::ptr_eq(&first.descriptor, &elsewhere.descriptor));

    let button = loader.resolve_type(&main, "Button").unwrap();
    let button_again = loader.resolve_type(&other, "Button").unwrap();
    assert!(Arc::ptr_eq(&button.descriptor, &button_again.descriptor));
}

#[test]
fn test_property_type_cycle_completes() {
    let a = url("file:///app/A.qml");
    let b = url("file:///app/B.qml");
    let fetcher = MemoryFetcher::new()
        .with_source(&a, "import QtQuick 2.0\nItem {\n    property B other\n}\n", 1)
        .with_source(&b, "import QtQuick 2.0\nItem {\n    property A other\n}\n", 1);
    let mut loader = uncached_loader(fetcher);
    loader.load(&a).unwrap();
    assert_eq!(loader.unit(&b).unwrap().status(), UnitStatus::Complete);
}

#[test]
fn test_creation_cycle_fails_without_hanging() {
    let a = url("file:///app/A.qml");
    let b = url("file:///app/B.qml");
    let fetcher = MemoryFetcher::new().with_source(&a, "import QtQuick 2.0\nItem {\n    B {}\n}\n", 1).with_source(&b, "import QtQuick 2.0\nItem {\n    A {}\n}\n", 1);
    let mut loader = uncached_loader(fetcher);
    let errors = loader.load(&a).unwrap_err();
    assert_eq!(errors[0].description, "Type B unavailable");
    assert_eq!(errors[1].description, "Type A unavailable");
    assert_eq!(errors[2].description, "Cyclic dependency");
    assert!(loader.unit(&b).unwrap().is_error());
}

#[test]
fn test_failed_dependency_is_reported_at_reference() {
    let a = url("file:///app/A.qml");
    let b = url("file:///app/B.qml");
    let fetcher = MemoryFetcher::new().with_source(&a, "import QtQuick 2.0\nItem {\n    B {}\n}\n", 1).with_source(&b, "import QtQuick 2.0\nItem {\n", 1);
    let mut loader = uncached_loader(fetcher);
    let errors = loader.load(&a).unwrap_err();
    assert_eq!(errors[0].description, "Type B unavailable");
    assert_eq!(errors[0].kind, ErrorKind::Dependency);
    assert_eq!(errors[0].url.as_ref(), Some(&a));
    assert_eq!(errors[0].location(), Location::new(3, 5));
    assert_eq!(errors[1].kind, ErrorKind::Parse);
    assert_eq!(errors[1].url.as_ref(), Some(&b));
}

#[test]
fn test_qmldir_singleton_without_pragma() {
    let main = url("file:///app/Main.qml");
    let fetcher = MemoryFetcher::new()
        .with_source(&main, "import QtQuick 2.0\nItem {\n    width: MySingleton.value\n}\n", 1)
        .with_source(&url("file:///app/qmldir"), "singleton MySingleton 1.0 MySingleton.qml\n", 1)
        .with_source(&url("file:///app/MySingleton.qml"), "import QtQml 2.0\nQtObject {\n    property int value: 1\n}\n", 1);
    let mut loader = uncached_loader(fetcher);
    let errors = loader.load(&main).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::SingletonPragmaMismatch);
    assert!(errors[0].description.contains("MySingleton"));
}

#[test]
fn test_qmldir_singleton_with_pragma() {
    let main = url("file:///app/Main.qml");
    let fetcher = MemoryFetcher::new()
        .with_source(&main, "import QtQuick 2.0\nItem {\n    width: MySingleton.value\n}\n", 1)
        .with_source(&url("file:///app/qmldir"), "singleton MySingleton 1.0 MySingleton.qml\n", 1)
        .with_source(&url("file:///app/MySingleton.qml"), "pragma Singleton\nimport QtQml 2.0\nQtObject {\n    property int value: 1\n}\n", 1);
    let mut loader = uncached_loader(fetcher);
    let compiled = loader.load(&main).unwrap();
    assert_eq!(compiled.type_name_cache.types.get("MySingleton").map(String::as_str), Some("file:///app/MySingleton.qml"));
}

#[test]
fn test_pragma_singleton_on_plain_composite() {
    let main = url("file:///app/Main.qml");
    let theme = url("file:///app/lib/Theme.qml");
    let fetcher = MemoryFetcher::new()
        .with_source(&main, "import QtQuick 2.0\nimport \"lib\"\nItem {\n    Theme {}\n}\n", 1)
        .with_source(&url("file:///app/lib/qmldir"), "Theme 1.0 Theme.qml\n", 1)
        .with_source(&theme, "pragma Singleton\nimport QtQml 2.0\nQtObject {}\n", 1);
    let mut loader = uncached_loader(fetcher);
    let errors = loader.load(&main).unwrap_err();
    let mismatch = errors.iter().find(|e| e.kind == ErrorKind::SingletonPragmaMismatch).unwrap();
    assert_eq!(mismatch.description, "pragma Singleton used with a non composite singleton type Theme");
    assert_eq!(mismatch.url.as_ref(), Some(&theme));
    assert_eq!(loader.unit(&theme).unwrap().status(), UnitStatus::Error);
}

#[test]
fn test_singleton_is_not_creatable() {
    let main = url("file:///app/Main.qml");
    let fetcher = MemoryFetcher::new()
        .with_source(&main, "import QtQuick 2.0\nimport \"lib\"\nItem {\n    Theme {}\n}\n", 1)
        .with_source(&url("file:///app/lib/qmldir"), "singleton Theme 1.0 Theme.qml\n", 1)
        .with_source(&url("file:///app/lib/Theme.qml"), "pragma Singleton\nimport QtQml 2.0\nQtObject {}\n", 1);
    let mut loader = uncached_loader(fetcher);
    let errors = loader.load(&main).unwrap_err();
    assert_eq!(errors[0].description, "Composite Singleton Type Theme is not creatable.");
    assert_eq!(errors[0].location(), Location::new(4, 5));
}

#[test]
fn test_uncreatable_native_type() {
    let main = url("file:///app/Main.qml");
    let mut loader = uncached_loader(MemoryFetcher::new().with_source(&main, "import QtQuick 2.0\nItem {\n    Keys {}\n}\n", 1));
    let errors = loader.load(&main).unwrap_err();
    assert_eq!(errors[0].description, "Keys is only available via attached properties");
}

#[test]
fn test_revisioned_property_follows_import_version() {
    let old = url("file:///app/Old.qml");
    let new = url("file:///app/New.qml");
    let fetcher = MemoryFetcher::new()
        .with_source(&old, "import QtQuick 2.0\nItem {\n    antialiasing: true\n}\n", 1)
        .with_source(&new, "import QtQuick 2.1\nItem {\n    antialiasing: true\n}\n", 1);
    let mut loader = uncached_loader(fetcher);
    let errors = loader.load(&old).unwrap_err();
    assert_eq!(errors[0].description, "Cannot assign to non-existent property \"antialiasing\"");
    assert_eq!(errors[0].kind, ErrorKind::BindingValidation);
    loader.load(&new).unwrap();
}

#[test]
fn test_module_from_import_path() {
    let root = TempDir::new().unwrap();
    let modules = root.path().join("modules");
    let controls = modules.join("My").join("Controls");
    fs::create_dir_all(&controls).unwrap();
    fs::write(controls.join("qmldir"), "module My.Controls\nButton 1.0 Button.qml\n").unwrap();
    fs::write(controls.join("Button.qml"), BUTTON).unwrap();
    let app = root.path().join("app");
    fs::create_dir_all(&app).unwrap();
    fs::write(app.join("Main.qml"), "import QtQuick 2.0\nimport My.Controls 1.0\nItem {\n    Button { label: \"ok\" }\n}\n").unwrap();

    let config = LoaderConfig::default().with_disk_cache(false).with_import_path(&modules);
    let mut loader = TypeLoader::new(registry(), Box::new(FileFetcher), config);
    let main = Url::from_file_path(app.join("Main.qml")).unwrap();
    let compiled = loader.load(&main).unwrap();
    assert_eq!(compiled.objects.len(), 2);
    let button = Url::from_file_path(controls.join("Button.qml")).unwrap();
    assert!(loader.unit(&button).unwrap().is_complete());
}

#[test]
fn test_module_plugin_without_native_types() {
    let root = TempDir::new().unwrap();
    let fancy = root.path().join("Fancy");
    fs::create_dir_all(&fancy).unwrap();
    fs::write(fancy.join("qmldir"), "module Fancy\nplugin fancyplugin\n").unwrap();
    fs::write(root.path().join("Main.qml"), "import QtQuick 2.0\nimport Fancy 1.0\nItem {}\n").unwrap();

    let config = LoaderConfig::default().with_disk_cache(false).with_import_path(root.path());
    let mut loader = TypeLoader::new(registry(), Box::new(FileFetcher), config);
    let errors = loader.load(&Url::from_file_path(root.path().join("Main.qml")).unwrap()).unwrap_err();
    assert_eq!(errors[0].description, "module \"Fancy\" plugin \"fancyplugin\" not found");
    assert_eq!(errors[0].location(), Location::new(2, 1));
}

#[test]
fn test_malformed_qmldir_is_an_import_error() {
    let main = url("file:///app/Main.qml");
    let fetcher = MemoryFetcher::new()
        .with_source(&main, "import QtQuick 2.0\nimport \"lib\"\nItem {}\n", 1)
        .with_source(&url("file:///app/lib/qmldir"), "Button 1.x Button.qml\n", 1);
    let mut loader = uncached_loader(fetcher);
    let errors = loader.load(&main).unwrap_err();
    assert_eq!(errors[0].kind, ErrorKind::Import);
    assert_eq!(errors[0].url.as_ref(), Some(&url("file:///app/lib/qmldir")));
    assert_eq!(errors[0].location().line, 1);
}

#[test]
fn test_missing_directory_import() {
    let main = url("file:///app/Main.qml");
    let mut loader = uncached_loader(MemoryFetcher::new().with_source(&main, "import QtQuick 2.0\nimport \"nowhere\"\nItem {}\n", 1));
    let errors = loader.load(&main).unwrap_err();
    assert_eq!(errors[0].description, "\"nowhere\": no such directory");
}

#[test]
fn test_remote_document_loads_asynchronously() {
    let main = url("http://example.com/app/Main.qml");
    let fetcher = MemoryFetcher::new()
        .with_source(&main, MAIN, 1)
        .with_source(&url("http://example.com/app/Button.qml"), BUTTON, 1);
    let mut loader = uncached_loader(fetcher);
    loader.get_or_create(&main);
    assert_eq!(loader.unit(&main).unwrap().status(), UnitStatus::Loading);
    while loader.process_events() > 0 {}
    assert!(loader.unit(&main).unwrap().is_complete());
    assert!(loader.unit(&url("http://example.com/app/Button.qml")).unwrap().is_complete());
}

#[test]
fn test_type_references_survive_cache_round_trip() {
    let cache = TempDir::new().unwrap();
    let main = url("file:///app/Main.qml");
    let first = cached_loader(app(MAIN, BUTTON, 1), &cache).load(&main).unwrap();
    let restored = DiskCache::new(cache.path()).load(&main, 1).unwrap();
    assert_eq!(restored.type_references, collect_type_references(&parse_document(&main, MAIN).unwrap()));
    assert_eq!(restored, *first);
}
