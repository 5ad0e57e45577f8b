/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate as sys;

/// Dynamic type tag of a `Variant`, and the type of every slot in a call frame.
///
/// Discriminants match the engine's `Variant::Type` numbering; types not bridged by this crate are left out.
#[repr(u32)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum VariantType {
    #[default]
    Nil = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    String = 4,
    Vector2 = 5,
    Vector2i = 6,
    Vector3 = 9,
    Vector3i = 10,
    Color = 20,
    StringName = 21,
    Object = 24,
    Dictionary = 27,
    Array = 28,
    PackedByteArray = 29,
    PackedInt32Array = 30,
    PackedInt64Array = 31,
    PackedFloat32Array = 32,
    PackedFloat64Array = 33,
    PackedStringArray = 34,
}

impl VariantType {
    /// All bridged types, in discriminant order.
    pub const ALL: &'static [VariantType] = &[
        Self::Nil,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::String,
        Self::Vector2,
        Self::Vector2i,
        Self::Vector3,
        Self::Vector3i,
        Self::Color,
        Self::StringName,
        Self::Object,
        Self::Dictionary,
        Self::Array,
        Self::PackedByteArray,
        Self::PackedInt32Array,
        Self::PackedInt64Array,
        Self::PackedFloat32Array,
        Self::PackedFloat64Array,
        Self::PackedStringArray,
    ];

    pub fn sys(self) -> sys::GDExtensionVariantType {
        self as sys::GDExtensionVariantType
    }

    /// Maps an engine tag back. Returns `None` for types this crate does not bridge.
    pub fn from_sys(value: sys::GDExtensionVariantType) -> Option<Self> {
        Self::ALL.iter().copied().find(|ty| ty.sys() == value)
    }

    /// Name as used by the engine's class database.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nil => "Nil",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "String",
            Self::Vector2 => "Vector2",
            Self::Vector2i => "Vector2i",
            Self::Vector3 => "Vector3",
            Self::Vector3i => "Vector3i",
            Self::Color => "Color",
            Self::StringName => "StringName",
            Self::Object => "Object",
            Self::Dictionary => "Dictionary",
            Self::Array => "Array",
            Self::PackedByteArray => "PackedByteArray",
            Self::PackedInt32Array => "PackedInt32Array",
            Self::PackedInt64Array => "PackedInt64Array",
            Self::PackedFloat32Array => "PackedFloat32Array",
            Self::PackedFloat64Array => "PackedFloat64Array",
            Self::PackedStringArray => "PackedStringArray",
        }
    }

    /// Width in bytes of a value of this type inside a ptrcall frame.
    ///
    /// `int` and `float` slots are always 64-bit; [`ArgumentMetadata`] records the declared width.
    /// Types with native storage occupy the width of their opaque handle.
    pub const fn ptrcall_size(self) -> usize {
        const REAL: usize = if cfg!(feature = "double-precision") { 8 } else { 4 };

        match self {
            Self::Nil => 0,
            Self::Bool => 1,
            Self::Int | Self::Float => 8,
            Self::Vector2 => 2 * REAL,
            Self::Vector3 => 3 * REAL,
            Self::Vector2i => 8,
            Self::Vector3i => 12,
            Self::Color => 16,
            Self::String | Self::StringName | Self::Object => 8,
            Self::Dictionary | Self::Array => 8,
            Self::PackedByteArray
            | Self::PackedInt32Array
            | Self::PackedInt64Array
            | Self::PackedFloat32Array
            | Self::PackedFloat64Array
            | Self::PackedStringArray => 16,
        }
    }

    /// Whether values of this type own native storage that must be constructed and destroyed through the engine.
    pub const fn has_native_storage(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::StringName
                | Self::Dictionary
                | Self::Array
                | Self::PackedByteArray
                | Self::PackedInt32Array
                | Self::PackedInt64Array
                | Self::PackedFloat32Array
                | Self::PackedFloat64Array
                | Self::PackedStringArray
        )
    }
}

impl std::fmt::Display for VariantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Declared width of an `int` or `float` parameter, carried next to its 64-bit frame slot.
#[repr(u32)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ArgumentMetadata {
    #[default]
    None = 0,
    IntIsInt8 = 1,
    IntIsInt16 = 2,
    IntIsInt32 = 3,
    IntIsInt64 = 4,
    IntIsUint8 = 5,
    IntIsUint16 = 6,
    IntIsUint32 = 7,
    IntIsUint64 = 8,
    RealIsFloat = 9,
    RealIsDouble = 10,
}

impl ArgumentMetadata {
    pub fn sys(self) -> sys::GDExtensionClassMethodArgumentMetadata {
        self as sys::GDExtensionClassMethodArgumentMetadata
    }

    pub fn rust_type(self) -> Option<&'static str> {
        let name = match self {
            Self::None => return None,
            Self::IntIsInt8 => "i8",
            Self::IntIsInt16 => "i16",
            Self::IntIsInt32 => "i32",
            Self::IntIsInt64 => "i64",
            Self::IntIsUint8 => "u8",
            Self::IntIsUint16 => "u16",
            Self::IntIsUint32 => "u32",
            Self::IntIsUint64 => "u64",
            Self::RealIsFloat => "f32",
            Self::RealIsDouble => "f64",
        };
        Some(name)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_type_sys_roundtrip() {
        for &ty in VariantType::ALL {
            assert_eq!(VariantType::from_sys(ty.sys()), Some(ty));
        }

        // Rect2 is not bridged.
        assert_eq!(VariantType::from_sys(7), None);
    }

    #[test]
    fn ptrcall_sizes() {
        assert_eq!(VariantType::Bool.ptrcall_size(), 1);
        assert_eq!(VariantType::Int.ptrcall_size(), 8);
        assert_eq!(VariantType::Float.ptrcall_size(), 8);
        assert_eq!(VariantType::Color.ptrcall_size(), 16);
        assert_eq!(VariantType::String.ptrcall_size(), 8);
        assert_eq!(VariantType::PackedStringArray.ptrcall_size(), 16);
        assert_eq!(VariantType::Nil.ptrcall_size(), 0);
    }

    #[test]
    fn metadata_names() {
        assert_eq!(ArgumentMetadata::IntIsInt32.rust_type(), Some("i32"));
        assert_eq!(ArgumentMetadata::RealIsFloat.rust_type(), Some("f32"));
        assert_eq!(ArgumentMetadata::None.rust_type(), None);
    }
}
