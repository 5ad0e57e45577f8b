/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;
use std::hash::Hash;

use crate::builtin::{Array, Dictionary, GString, Variant};
use crate::meta::error::{ConvertError, FromFfiError, FromVariantError};
use crate::meta::traits::GodotFfiVariant;
use crate::meta::{FromGodot, GodotConvert, GodotNullableFfi, GodotType, ToGodot};
use crate::sys;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Option<T>

impl<T> GodotType for Option<T>
where
    T: GodotType,
    T::Ffi: GodotNullableFfi,
    Option<T>: crate::meta::sealed::Sealed,
{
    type Ffi = T::Ffi;

    fn to_ffi(&self) -> Self::Ffi {
        GodotNullableFfi::flatten_option(self.as_ref().map(|t| t.to_ffi()))
    }

    fn into_ffi(self) -> Self::Ffi {
        GodotNullableFfi::flatten_option(self.map(|t| t.into_ffi()))
    }

    fn try_from_ffi(ffi: Self::Ffi) -> Result<Self, ConvertError> {
        if ffi.is_null() {
            return Ok(None);
        }

        T::try_from_ffi(ffi).map(Some)
    }

    fn try_from_return(ffi: Self::Ffi, ownership: sys::Ownership) -> Result<Self, ConvertError> {
        if ffi.is_null() {
            return Ok(None);
        }

        T::try_from_return(ffi, ownership).map(Some)
    }

    fn param_metadata() -> sys::ArgumentMetadata {
        T::param_metadata()
    }

    fn godot_type_name() -> String {
        T::godot_type_name()
    }
}

impl<T> GodotConvert for Option<T>
where
    T: GodotType,
    T::Ffi: GodotNullableFfi,
    Option<T>: crate::meta::sealed::Sealed,
{
    type Via = Option<T>;
}

impl<T> ToGodot for Option<T>
where
    T: GodotType,
    T::Ffi: GodotNullableFfi,
    Option<T>: crate::meta::sealed::Sealed,
{
    fn to_godot(&self) -> Self::Via {
        self.as_ref().map(T::to_godot)
    }

    fn to_variant(&self) -> Variant {
        match self {
            Some(inner) => inner.to_variant(),
            None => Variant::nil(),
        }
    }
}

impl<T> FromGodot for Option<T>
where
    T: GodotType,
    T::Ffi: GodotNullableFfi,
    Option<T>: crate::meta::sealed::Sealed,
{
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via)
    }

    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        if variant.is_nil() {
            return Ok(None);
        }

        T::try_from_variant(variant).map(Some)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Scalars

macro_rules! impl_godot_scalar {
    ($T:ty as $Via:ty, $err:path, $param_metadata:expr) => {
        impl GodotType for $T {
            type Ffi = $Via;

            fn to_ffi(&self) -> Self::Ffi {
                (*self).into()
            }

            fn into_ffi(self) -> Self::Ffi {
                self.into()
            }

            fn try_from_ffi(ffi: Self::Ffi) -> Result<Self, ConvertError> {
                Self::try_from(ffi).map_err(|_rust_err| $err.into_error(ffi))
            }

            fn param_metadata() -> sys::ArgumentMetadata {
                $param_metadata
            }

            fn godot_type_name() -> String {
                stringify!($Via).to_string()
            }
        }

        impl GodotConvert for $T {
            type Via = $T;
        }

        impl ToGodot for $T {
            fn to_godot(&self) -> Self::Via {
                *self
            }
        }

        impl FromGodot for $T {
            fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
                Ok(via)
            }
        }
    };

    ($T:ty as $Via:ty, $param_metadata:expr; lossy) => {
        impl GodotType for $T {
            type Ffi = $Via;

            fn to_ffi(&self) -> Self::Ffi {
                *self as $Via
            }

            fn into_ffi(self) -> Self::Ffi {
                self as $Via
            }

            fn try_from_ffi(ffi: Self::Ffi) -> Result<Self, ConvertError> {
                Ok(ffi as $T)
            }

            fn param_metadata() -> sys::ArgumentMetadata {
                $param_metadata
            }

            fn godot_type_name() -> String {
                stringify!($Via).to_string()
            }
        }

        impl GodotConvert for $T {
            type Via = $T;
        }

        impl ToGodot for $T {
            fn to_godot(&self) -> Self::Via {
                *self
            }
        }

        impl FromGodot for $T {
            fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
                Ok(via)
            }
        }
    };
}

macro_rules! impl_godot_ffi_scalar {
    ($T:ty, $name:literal, $param_metadata:expr) => {
        impl GodotType for $T {
            type Ffi = $T;

            fn to_ffi(&self) -> Self::Ffi {
                *self
            }

            fn into_ffi(self) -> Self::Ffi {
                self
            }

            fn try_from_ffi(ffi: Self::Ffi) -> Result<Self, ConvertError> {
                Ok(ffi)
            }

            fn param_metadata() -> sys::ArgumentMetadata {
                $param_metadata
            }

            fn godot_type_name() -> String {
                $name.to_string()
            }
        }

        impl GodotConvert for $T {
            type Via = $T;
        }

        impl ToGodot for $T {
            fn to_godot(&self) -> Self::Via {
                *self
            }
        }

        impl FromGodot for $T {
            fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
                Ok(via)
            }
        }
    };
}

impl_godot_ffi_scalar!(bool, "bool", sys::ArgumentMetadata::None);
impl_godot_ffi_scalar!(i64, "int", sys::ArgumentMetadata::None);
impl_godot_ffi_scalar!(f64, "float", sys::ArgumentMetadata::None);

impl_godot_scalar!(i32 as i64, FromFfiError::I32, sys::ArgumentMetadata::IntIsInt32);
impl_godot_scalar!(i16 as i64, FromFfiError::I16, sys::ArgumentMetadata::IntIsInt16);
impl_godot_scalar!(i8 as i64, FromFfiError::I8, sys::ArgumentMetadata::IntIsInt8);
impl_godot_scalar!(u32 as i64, FromFfiError::U32, sys::ArgumentMetadata::IntIsUint32);
impl_godot_scalar!(u16 as i64, FromFfiError::U16, sys::ArgumentMetadata::IntIsUint16);
impl_godot_scalar!(u8 as i64, FromFfiError::U8, sys::ArgumentMetadata::IntIsUint8);

// f64 -> f32 may lose precision; the engine does the same when the declared width is 32 bits.
impl_godot_scalar!(f32 as f64, sys::ArgumentMetadata::RealIsFloat; lossy);

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Unit: return type of methods without return value

impl GodotType for () {
    type Ffi = ();

    fn to_ffi(&self) -> Self::Ffi {}

    fn into_ffi(self) -> Self::Ffi {}

    fn try_from_ffi(_ffi: Self::Ffi) -> Result<Self, ConvertError> {
        Ok(())
    }

    fn godot_type_name() -> String {
        "Nil".to_string()
    }
}

impl GodotConvert for () {
    type Via = ();
}

impl ToGodot for () {
    fn to_godot(&self) -> Self::Via {}

    fn to_variant(&self) -> Variant {
        Variant::nil()
    }
}

impl FromGodot for () {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// FFI variant conversions of scalars, through the lifecycle table's variant converters

macro_rules! impl_ffi_variant_scalar {
    ($($T:ty),*) => {
        $(
            impl GodotFfiVariant for $T {
                fn ffi_to_variant(&self) -> Variant {
                    Variant::from_ffi_value(self)
                }

                fn ffi_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
                    variant.to_ffi_value::<$T>()
                }
            }
        )*
    };
}

impl_ffi_variant_scalar!(bool, i64, f64);

impl GodotFfiVariant for () {
    fn ffi_to_variant(&self) -> Variant {
        Variant::nil()
    }

    fn ffi_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        if variant.is_nil() {
            return Ok(());
        }

        Err(FromVariantError::BadType {
            expected: sys::VariantType::Nil,
            actual: variant.try_get_type()?,
        }
        .into_error(variant.clone()))
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Host types: converted (deep-copied) at the boundary

impl GodotConvert for String {
    type Via = GString;
}

impl ToGodot for String {
    fn to_godot(&self) -> Self::Via {
        GString::from(self.as_str())
    }
}

impl FromGodot for String {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via.to_string())
    }
}

impl GodotConvert for &str {
    type Via = GString;
}

impl ToGodot for &str {
    fn to_godot(&self) -> Self::Via {
        GString::from(*self)
    }
}

/// `Vec<T>` travels as an untyped [`Array`]. Each conversion copies all elements.
impl<T: GodotConvert> GodotConvert for Vec<T> {
    type Via = Array;
}

impl<T: ToGodot> ToGodot for Vec<T> {
    fn to_godot(&self) -> Self::Via {
        Array::from_slice(self)
    }
}

impl<T: FromGodot> FromGodot for Vec<T> {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        via.try_to_vec()
    }
}

/// `HashMap<K, V>` travels as a [`Dictionary`]. Each conversion copies all entries.
impl<K: GodotConvert, V: GodotConvert> GodotConvert for HashMap<K, V> {
    type Via = Dictionary;
}

impl<K: ToGodot, V: ToGodot> ToGodot for HashMap<K, V> {
    fn to_godot(&self) -> Self::Via {
        Dictionary::from_pairs(self.iter())
    }
}

impl<K, V> FromGodot for HashMap<K, V>
where
    K: FromGodot + Eq + Hash,
    V: FromGodot,
{
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        via.try_to_hash_map()
    }
}
