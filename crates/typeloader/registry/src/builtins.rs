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

//! Builtin module set
//!
//! A small `QtQml` / `QtQuick` module surface that documents can import
//! without any plugin being loaded.

use crate::descriptor::TypeRegistration;
use crate::meta::{MetaEnum, MetaObject};
use crate::registry::{RegistryResult, TypeRegistry};
use std::sync::Arc;
use tracing::info;
use typeloader_common::Version;

pub const QTQML_MODULE: &str = "QtQml";
pub const QTQUICK_MODULE: &str = "QtQuick";

const ALIGNMENT: &[(&str, i64)] = &[
    ("AlignLeft", 0x1),
    ("AlignRight", 0x2),
    ("AlignHCenter", 0x4),
    ("AlignJustify", 0x8),
    ("AlignTop", 0x20),
    ("AlignBottom", 0x40),
    ("AlignVCenter", 0x80),
    ("AlignCenter", 0x84),
];

/// Register the builtin modules into `registry`
pub fn register_builtin_types(registry: &TypeRegistry) -> RegistryResult<()> {
    let qobject = MetaObject::builder("QObject").property("objectName", "string").build();
    let timer = MetaObject::builder("QQmlTimer")
        .inherits(&qobject)
        .property("interval", "int")
        .property("running", "bool")
        .property("repeat", "bool")
        .property("triggeredOnStart", "bool")
        .signal("triggered", &[])
        .method("start", &[])
        .method("stop", &[])
        .method("restart", &[])
        .build();
    let qt = MetaObject::builder("Qt")
        .enumeration(MetaEnum::with_values("Alignment", ALIGNMENT))
        .enumeration(MetaEnum::sequential("Orientation", &["Unknown", "Horizontal", "Vertical"]))
        .build();

    registry.register(TypeRegistration::native(QTQML_MODULE, "QtObject", Version::new(2, 0), Arc::clone(&qobject)))?;
    registry.register(TypeRegistration::native(QTQML_MODULE, "Timer", Version::new(2, 0), timer))?;
    registry.register(TypeRegistration::singleton(QTQML_MODULE, "Qt", Version::new(2, 0), "Qt", Some(Arc::clone(&qt))))?;

    let item = MetaObject::builder("QQuickItem")
        .inherits(&qobject)
        .related(&qt)
        .property("parent", "Item")
        .property("x", "real")
        .property("y", "real")
        .property("z", "real")
        .property("width", "real")
        .property("height", "real")
        .property("opacity", "real")
        .property("visible", "bool")
        .property("enabled", "bool")
        .property("clip", "bool")
        .property("state", "string")
        .property("transformOrigin", "TransformOrigin")
        .readonly_property("data", "list<QtObject>")
        .readonly_property("children", "list<Item>")
        .readonly_property("anchors", "QQuickAnchors")
        .revisioned_property("antialiasing", "bool", 1)
        .method("forceActiveFocus", &[])
        .method("mapToItem", &["Item", "real", "real"])
        .enumeration(MetaEnum::sequential(
            "TransformOrigin",
            &["TopLeft", "Top", "TopRight", "Left", "Center", "Right", "BottomLeft", "Bottom", "BottomRight"],
        ))
        .default_property("data")
        .build();
    let rectangle = MetaObject::builder("QQuickRectangle")
        .inherits(&item)
        .property("color", "color")
        .property("radius", "real")
        .readonly_property("border", "QQuickPen")
        .build();
    let text = MetaObject::builder("QQuickText")
        .inherits(&item)
        .property("text", "string")
        .property("color", "color")
        .readonly_property("font", "QFont")
        .property("horizontalAlignment", "HAlignment")
        .property("verticalAlignment", "VAlignment")
        .property("wrapMode", "WrapMode")
        .readonly_property("lineCount", "int")
        .signal("linkActivated", &["string"])
        .enumeration(MetaEnum::with_values("HAlignment", &ALIGNMENT[..4]))
        .enumeration(MetaEnum::with_values("VAlignment", &ALIGNMENT[4..7]))
        .enumeration(MetaEnum::with_values("WrapMode", &[("NoWrap", 0), ("WordWrap", 1), ("WrapAnywhere", 3), ("Wrap", 4)]))
        .build();
    let mouse_area = MetaObject::builder("QQuickMouseArea")
        .inherits(&item)
        .readonly_property("mouseX", "real")
        .readonly_property("mouseY", "real")
        .readonly_property("containsMouse", "bool")
        .property("hoverEnabled", "bool")
        .signal("clicked", &["QQuickMouseEvent"])
        .signal("doubleClicked", &["QQuickMouseEvent"])
        .signal("released", &["QQuickMouseEvent"])
        .build();
    let list_view = MetaObject::builder("QQuickListView")
        .inherits(&item)
        .property("model", "var")
        .property("delegate", "Component")
        .property("spacing", "real")
        .property("orientation", "Orientation")
        .readonly_property("count", "int")
        .method("positionViewAtIndex", &["int", "PositionMode"])
        .enumeration(MetaEnum::with_values(
            "PositionMode",
            &[("Beginning", 0), ("Center", 1), ("End", 2), ("Visible", 3), ("Contain", 4), ("SnapPosition", 5)],
        ))
        .build();
    let keys = MetaObject::builder("QQuickKeysAttached")
        .inherits(&qobject)
        .property("enabled", "bool")
        .signal("pressed", &["QQuickKeyEvent"])
        .signal("released", &["QQuickKeyEvent"])
        .build();

    registry.register(TypeRegistration::native(QTQUICK_MODULE, "Item", Version::new(2, 0), Arc::clone(&item)))?;
    registry.register(TypeRegistration::native(QTQUICK_MODULE, "Item", Version::new(2, 1), item))?;
    registry.register(TypeRegistration::native(QTQUICK_MODULE, "Rectangle", Version::new(2, 0), rectangle))?;
    registry.register(TypeRegistration::native(QTQUICK_MODULE, "Text", Version::new(2, 0), text))?;
    registry.register(TypeRegistration::native(QTQUICK_MODULE, "MouseArea", Version::new(2, 0), mouse_area))?;
    registry.register(TypeRegistration::native(QTQUICK_MODULE, "ListView", Version::new(2, 0), list_view))?;
    registry.register(TypeRegistration::native(QTQUICK_MODULE, "Keys", Version::new(2, 0), keys).uncreatable("Keys is only available via attached properties"))?;

    info!(types = registry.len(), "Registered builtin modules");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ConflictKind;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        register_builtin_types(&registry).unwrap();
        registry
    }

    #[test]
    fn test_builtins_are_installed() {
        let registry = registry();
        assert!(registry.is_module_installed(QTQML_MODULE));
        assert!(registry.module_has_major(QTQUICK_MODULE, 2));
        assert!(registry.lookup(QTQUICK_MODULE, "Rectangle", 2, 15).is_some());
        assert!(!registry.lookup(QTQUICK_MODULE, "Keys", 2, 0).unwrap().is_creatable());
    }

    #[test]
    fn test_registering_twice_is_harmless() {
        let registry = registry();
        let count = registry.len();
        register_builtin_types(&registry).unwrap();
        assert_eq!(registry.len(), count);
    }

    #[test]
    fn test_list_view_center_shadows_item_center() {
        let registry = registry();
        let list_view = registry.lookup(QTQUICK_MODULE, "ListView", 2, 0).unwrap();
        let item = registry.lookup(QTQUICK_MODULE, "Item", 2, 0).unwrap();

        assert_eq!(item.enum_value("Center"), Some(4));
        assert_eq!(list_view.enum_value("Center"), Some(1));
        let table = list_view.enum_table().unwrap();
        assert!(table.conflicts().iter().any(|c| c.key == "Center" && c.kind == ConflictKind::ShadowsBase));

        let index = list_view.scoped_enum_index("TransformOrigin").unwrap();
        assert_eq!(list_view.scoped_enum_value(index, "Center"), Some(4));
    }

    #[test]
    fn test_related_enums_reach_items() {
        let registry = registry();
        let text = registry.lookup(QTQUICK_MODULE, "Text", 2, 0).unwrap();
        assert_eq!(text.enum_value("AlignHCenter"), Some(4));
        assert_eq!(text.enum_value("Vertical"), Some(2));
    }

    #[test]
    fn test_revisioned_item_property() {
        let registry = registry();
        let item_2_0 = registry.lookup(QTQUICK_MODULE, "Item", 2, 0).unwrap();
        assert!(item_2_0.property_cache(0).unwrap().property("antialiasing").is_none());
        let item_2_1 = registry.lookup(QTQUICK_MODULE, "Item", 2, 1).unwrap();
        assert!(item_2_1.property_cache(1).unwrap().property("antialiasing").is_some());
    }
}
