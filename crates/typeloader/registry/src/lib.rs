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

//! Type registry for the declarative type loader
//!
//! Maps `(module, name, version)` triples to shared, immutable-after-setup
//! [`TypeDescriptor`]s. Native types are described by explicit
//! [`MetaObject`] chains; composite types are identified by their source URL.

pub mod builtins;
pub mod descriptor;
pub mod enums;
pub mod meta;
pub mod property_cache;
pub mod registry;

pub use descriptor::{ExtendedInfo, NativeTypeData, SingletonTypeData, TypeData, TypeDescriptor, TypeId, TypeKind, TypeRegistration};
pub use enums::{ConflictKind, EnumConflict, EnumSource, EnumTable, enum_sources};
pub use meta::{MetaEnum, MetaMethod, MetaObject, MetaObjectBuilder, MetaProperty};
pub use property_cache::{EnumData, MethodData, PropertyCache, PropertyData, signal_name_from_handler};
pub use registry::{RegistryError, RegistryResult, TypeRegistry, type_registration_lock};

/// 32-byte blake3 digest used for every checksum in the workspace
pub type Digest = [u8; 32];
