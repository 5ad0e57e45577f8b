/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::builtin::{self, Color, Variant, Vector2, Vector2i, Vector3, Vector3i};
use crate::meta::error::{ConvertError, FromVariantError};
use crate::meta::ToGodot;
use crate::obj::{InstanceId, RawObject};
use crate::sys::VariantType;

/// Host-side copy of a [`Variant`], as a Rust sum type.
///
/// Unlike `Variant`, this type lives entirely on the Rust side: converting in either direction copies all contents, so
/// mutating a `VariantValue` never affects engine containers and vice versa. Match on it to get exhaustive handling of all
/// bridged types.
///
/// Containers nested deeper than [`MAX_NESTING`](Self::MAX_NESTING) levels do not convert. A container that contains itself
/// always reaches that limit, so converting it fails with an error.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariantValue {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    StringName(String),
    Vector2(Vector2),
    Vector2i(Vector2i),
    Vector3(Vector3),
    Vector3i(Vector3i),
    Color(Color),

    /// Object reference, by instance ID. `None` is a null object, which is distinct from `Nil`.
    Object(Option<InstanceId>),

    Array(Vec<VariantValue>),

    /// Key-value pairs in the dictionary's insertion order.
    Dictionary(Vec<(VariantValue, VariantValue)>),

    PackedByteArray(Vec<u8>),
    PackedInt32Array(Vec<i32>),
    PackedInt64Array(Vec<i64>),
    PackedFloat32Array(Vec<f32>),
    PackedFloat64Array(Vec<f64>),
    PackedStringArray(Vec<String>),
}

impl VariantValue {
    /// The engine type of the variant this value converts to.
    pub fn variant_type(&self) -> VariantType {
        match self {
            Self::Nil => VariantType::Nil,
            Self::Bool(_) => VariantType::Bool,
            Self::Int(_) => VariantType::Int,
            Self::Float(_) => VariantType::Float,
            Self::String(_) => VariantType::String,
            Self::StringName(_) => VariantType::StringName,
            Self::Vector2(_) => VariantType::Vector2,
            Self::Vector2i(_) => VariantType::Vector2i,
            Self::Vector3(_) => VariantType::Vector3,
            Self::Vector3i(_) => VariantType::Vector3i,
            Self::Color(_) => VariantType::Color,
            Self::Object(_) => VariantType::Object,
            Self::Array(_) => VariantType::Array,
            Self::Dictionary(_) => VariantType::Dictionary,
            Self::PackedByteArray(_) => VariantType::PackedByteArray,
            Self::PackedInt32Array(_) => VariantType::PackedInt32Array,
            Self::PackedInt64Array(_) => VariantType::PackedInt64Array,
            Self::PackedFloat32Array(_) => VariantType::PackedFloat32Array,
            Self::PackedFloat64Array(_) => VariantType::PackedFloat64Array,
            Self::PackedStringArray(_) => VariantType::PackedStringArray,
        }
    }

    /// Builds a new engine variant. Containers are created fresh, so the result shares nothing with other variants.
    ///
    /// An object whose instance ID no longer refers to a live object becomes a null object.
    pub fn to_variant(&self) -> Variant {
        match self {
            Self::Nil => Variant::nil(),
            Self::Bool(value) => value.to_variant(),
            Self::Int(value) => value.to_variant(),
            Self::Float(value) => value.to_variant(),
            Self::String(value) => value.to_variant(),
            Self::StringName(value) => builtin::StringName::from(value.as_str()).to_variant(),
            Self::Vector2(value) => value.to_variant(),
            Self::Vector2i(value) => value.to_variant(),
            Self::Vector3(value) => value.to_variant(),
            Self::Vector3i(value) => value.to_variant(),
            Self::Color(value) => value.to_variant(),
            Self::Object(id) => {
                let raw = (*id).map_or_else(RawObject::null, RawObject::from_instance_id);
                Variant::from_ffi_value(&raw)
            }
            Self::Array(elements) => {
                let mut array = builtin::Array::new();
                for element in elements {
                    array.push(element.to_variant());
                }
                array.to_variant()
            }
            Self::Dictionary(pairs) => {
                let mut dictionary = builtin::Dictionary::new();
                for (key, value) in pairs {
                    dictionary.set(key.to_variant(), value.to_variant());
                }
                dictionary.to_variant()
            }
            Self::PackedByteArray(values) => builtin::PackedByteArray::from(values.as_slice()).to_variant(),
            Self::PackedInt32Array(values) => builtin::PackedInt32Array::from(values.as_slice()).to_variant(),
            Self::PackedInt64Array(values) => builtin::PackedInt64Array::from(values.as_slice()).to_variant(),
            Self::PackedFloat32Array(values) => builtin::PackedFloat32Array::from(values.as_slice()).to_variant(),
            Self::PackedFloat64Array(values) => builtin::PackedFloat64Array::from(values.as_slice()).to_variant(),
            Self::PackedStringArray(values) => {
                let strings: Vec<builtin::GString> = values.iter().map(builtin::GString::from).collect();
                builtin::PackedStringArray::from(strings.as_slice()).to_variant()
            }
        }
    }

    /// Maximum nesting of arrays and dictionaries in [`Variant::to_value()`]; the engine uses the same limit.
    pub const MAX_NESTING: usize = 100;

    pub(crate) fn from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        Self::from_variant_nested(variant, 0)
    }

    fn from_variant_nested(variant: &Variant, depth: usize) -> Result<Self, ConvertError> {
        let ty = variant.try_get_type()?;
        if depth >= Self::MAX_NESTING && matches!(ty, VariantType::Array | VariantType::Dictionary) {
            // The value is not printed: it may be the cyclic container itself.
            return Err(FromVariantError::TooDeep {
                max_depth: Self::MAX_NESTING,
            }
            .into_error(ty));
        }

        let value = match ty {
            VariantType::Nil => Self::Nil,
            VariantType::Bool => Self::Bool(variant.to_ffi_value()?),
            VariantType::Int => Self::Int(variant.to_ffi_value()?),
            VariantType::Float => Self::Float(variant.to_ffi_value()?),
            VariantType::String => Self::String(variant.to_ffi_value::<builtin::GString>()?.to_string()),
            VariantType::StringName => {
                Self::StringName(variant.to_ffi_value::<builtin::StringName>()?.to_string())
            }
            VariantType::Vector2 => Self::Vector2(variant.to_ffi_value()?),
            VariantType::Vector2i => Self::Vector2i(variant.to_ffi_value()?),
            VariantType::Vector3 => Self::Vector3(variant.to_ffi_value()?),
            VariantType::Vector3i => Self::Vector3i(variant.to_ffi_value()?),
            VariantType::Color => Self::Color(variant.to_ffi_value()?),
            VariantType::Object => Self::Object(variant.to_ffi_value::<RawObject>()?.instance_id()),
            VariantType::Array => {
                let array = variant.to_ffi_value::<builtin::Array>()?;
                let elements = array
                    .iter_shared()
                    .map(|element| Self::from_variant_nested(&element, depth + 1))
                    .collect::<Result<_, _>>()?;

                Self::Array(elements)
            }
            VariantType::Dictionary => {
                let dictionary = variant.to_ffi_value::<builtin::Dictionary>()?;
                let pairs = dictionary
                    .iter_shared()
                    .map(|(key, value)| {
                        let key = Self::from_variant_nested(&key, depth + 1)?;
                        let value = Self::from_variant_nested(&value, depth + 1)?;
                        Ok((key, value))
                    })
                    .collect::<Result<_, ConvertError>>()?;

                Self::Dictionary(pairs)
            }
            VariantType::PackedByteArray => {
                Self::PackedByteArray(variant.to_ffi_value::<builtin::PackedByteArray>()?.to_vec())
            }
            VariantType::PackedInt32Array => {
                Self::PackedInt32Array(variant.to_ffi_value::<builtin::PackedInt32Array>()?.to_vec())
            }
            VariantType::PackedInt64Array => {
                Self::PackedInt64Array(variant.to_ffi_value::<builtin::PackedInt64Array>()?.to_vec())
            }
            VariantType::PackedFloat32Array => {
                Self::PackedFloat32Array(variant.to_ffi_value::<builtin::PackedFloat32Array>()?.to_vec())
            }
            VariantType::PackedFloat64Array => {
                Self::PackedFloat64Array(variant.to_ffi_value::<builtin::PackedFloat64Array>()?.to_vec())
            }
            VariantType::PackedStringArray => {
                let strings = variant.to_ffi_value::<builtin::PackedStringArray>()?.to_vec();
                Self::PackedStringArray(strings.iter().map(String::from).collect())
            }
        };

        Ok(value)
    }
}

impl From<&Variant> for VariantValue {
    /// Converts like [`Variant::to_value()`], mapping unsupported types to `Nil`.
    fn from(variant: &Variant) -> Self {
        Self::from_variant(variant).unwrap_or_default()
    }
}

impl From<&VariantValue> for Variant {
    fn from(value: &VariantValue) -> Self {
        value.to_variant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_types() {
        assert_eq!(VariantValue::default().variant_type(), VariantType::Nil);
        assert_eq!(VariantValue::Object(None).variant_type(), VariantType::Object);
        assert_eq!(
            VariantValue::Dictionary(vec![(VariantValue::Int(1), VariantValue::Nil)]).variant_type(),
            VariantType::Dictionary
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip() {
        let value = VariantValue::Array(vec![
            VariantValue::Int(42),
            VariantValue::String("hello".to_string()),
            VariantValue::Vector2i(Vector2i::new(1, 2)),
            VariantValue::PackedFloat32Array(vec![0.5, -1.0]),
        ]);

        let json = serde_json::to_string(&value).unwrap();
        let back: VariantValue = serde_json::from_str(&json).unwrap();

        assert_eq!(back, value);
    }
}
