/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use sys::interface_fn;

use crate::builtin::GString;
use crate::meta::{FromGodot, GodotType, ToGodot};
use crate::sys;

/// Marker trait to identify types that can be stored in [`PackedArray<T>`][crate::builtin::PackedArray].
#[diagnostic::on_unimplemented(
    message = "`PackedArray<T>` can only store element types supported in engine packed arrays.",
    label = "has invalid element type"
)]
pub trait PackedArrayElement: GodotType + Clone + ToGodot + FromGodot {
    /// Variant type of the packed array holding this element, e.g. `PackedInt32Array` for `i32`.
    #[doc(hidden)]
    const PACKED_VARIANT_TYPE: sys::VariantType;

    /// Pointer to the element at `index`. The element is stored in its native layout, which equals `Self`.
    ///
    /// # Safety
    /// `array` must be a live packed array of this element type, and `index` in bounds.
    #[doc(hidden)]
    unsafe fn ffi_index(array: sys::GDExtensionTypePtr, index: i64) -> *mut Self;

    /// # Safety
    /// See [`ffi_index()`](Self::ffi_index).
    #[doc(hidden)]
    unsafe fn ffi_index_const(array: sys::GDExtensionConstTypePtr, index: i64) -> *const Self;
}

macro_rules! impl_packed_array_element {
    ($Element:ty => $Packed:ident, $operator_index:ident, $operator_index_const:ident) => {
        impl PackedArrayElement for $Element {
            const PACKED_VARIANT_TYPE: sys::VariantType = sys::VariantType::$Packed;

            unsafe fn ffi_index(array: sys::GDExtensionTypePtr, index: i64) -> *mut Self {
                interface_fn!($operator_index)(array, index) as *mut Self
            }

            unsafe fn ffi_index_const(array: sys::GDExtensionConstTypePtr, index: i64) -> *const Self {
                interface_fn!($operator_index_const)(array, index) as *const Self
            }
        }
    };
}

impl_packed_array_element!(u8 => PackedByteArray, packed_byte_array_operator_index, packed_byte_array_operator_index_const);
impl_packed_array_element!(i32 => PackedInt32Array, packed_int32_array_operator_index, packed_int32_array_operator_index_const);
impl_packed_array_element!(i64 => PackedInt64Array, packed_int64_array_operator_index, packed_int64_array_operator_index_const);
impl_packed_array_element!(f32 => PackedFloat32Array, packed_float32_array_operator_index, packed_float32_array_operator_index_const);
impl_packed_array_element!(f64 => PackedFloat64Array, packed_float64_array_operator_index, packed_float64_array_operator_index_const);

// `GString` is a transparent wrapper around the engine's string handle, which is what the array stores.
impl_packed_array_element!(
    GString => PackedStringArray,
    packed_string_array_operator_index,
    packed_string_array_operator_index_const
);
