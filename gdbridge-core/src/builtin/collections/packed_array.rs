/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops};

use sys::{ffi_methods, GodotFfi, ParamMeta, ReturnMeta, VariantType};

use crate::builtin::collections::PackedArrayElement;
use crate::builtin::{GString, Variant};
use crate::meta::error::ConvertError;
use crate::meta::{builtin_ptrcall, FromGodot, GodotConvert, GodotFfiVariant, GodotType, ToGodot};
use crate::sys;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Type aliases

/// General-purpose byte buffer.
pub type PackedByteArray = PackedArray<u8>;
pub type PackedInt32Array = PackedArray<i32>;
pub type PackedInt64Array = PackedArray<i64>;
pub type PackedFloat32Array = PackedArray<f32>;
pub type PackedFloat64Array = PackedArray<f64>;
pub type PackedStringArray = PackedArray<GString>;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Generic definition

/// Space-efficient array of `T` elements.
///
/// Note that, unlike [`Array`][crate::builtin::Array], this type has value semantics: each copy will be independent
/// of the original. Under the hood, the engine uses copy-on-write, so copies are still cheap to make.
///
/// # Type aliases
/// This generic type can be instantiated for a finite number of element types, which all implement [`PackedArrayElement`].
///
/// | Type alias             | Element     |
/// |------------------------|-------------|
/// | [`PackedByteArray`]    | `u8`        |
/// | [`PackedInt32Array`]   | `i32`       |
/// | [`PackedInt64Array`]   | `i64`       |
/// | [`PackedFloat32Array`] | `f32`       |
/// | [`PackedFloat64Array`] | `f64`       |
/// | [`PackedStringArray`]  | [`GString`] |
pub struct PackedArray<T: PackedArrayElement> {
    // All packed arrays have same memory layout.
    opaque: sys::types::OpaquePackedArray,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: PackedArrayElement> PackedArray<T> {
    fn from_opaque(opaque: sys::types::OpaquePackedArray) -> Self {
        Self {
            opaque,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Constructs an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the value at the specified index, or `None` if out-of-bounds.
    ///
    /// If you know the index is valid, use the `[]` operator (`Index`/`IndexMut` traits) instead.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len() {
            return None;
        }

        // SAFETY: index is in bounds.
        unsafe { Some((*T::ffi_index_const(self.sys_const(), sys::usize_to_int(index))).clone()) }
    }

    /// ⚠️ Sets the value at the specified index.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: T) {
        self[index] = value;
    }

    /// Returns the number of elements in the array.
    ///
    /// _Engine equivalent: `size`_
    #[doc(alias = "size")]
    pub fn len(&self) -> usize {
        // SAFETY: `self` is a live packed array.
        let len: i64 = unsafe { builtin_ptrcall(T::PACKED_VARIANT_TYPE, "size", self.sys(), ()) };
        sys::int_to_usize(len)
    }

    /// Returns `true` if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends an element to the end of the array.
    ///
    /// _Engine equivalent: `append` and `push_back`_
    #[doc(alias = "append")]
    #[doc(alias = "push_back")]
    pub fn push(&mut self, value: T) {
        // SAFETY: `self` is a live packed array.
        let _appended: bool = unsafe { builtin_ptrcall(T::PACKED_VARIANT_TYPE, "push_back", self.sys_mut(), (value,)) };
    }

    /// Resizes the array to contain a different number of elements.
    ///
    /// If the new size is smaller, elements are removed from the end. If the new size is larger, new elements are set to
    /// their default value (zero or empty string).
    pub fn resize(&mut self, size: usize) {
        // SAFETY: `self` is a live packed array.
        let error: i64 =
            unsafe { builtin_ptrcall(T::PACKED_VARIANT_TYPE, "resize", self.sys_mut(), (sys::usize_to_int(size),)) };

        assert_eq!(error, 0, "{} cannot be resized to {size} elements", T::PACKED_VARIANT_TYPE);
    }

    /// Copies all elements into a new `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        let len = self.len();
        let base = self.sys_const();

        // SAFETY: all indices are in bounds; elements are cloned before `self` can change.
        (0..len)
            .map(|index| unsafe { (*T::ffi_index_const(base, sys::usize_to_int(index))).clone() })
            .collect()
    }

    /// # Panics
    ///
    /// If `index` is out of bounds.
    fn ptr(&self, index: usize) -> *const T {
        self.check_bounds(index);

        // SAFETY: bounds checked above.
        unsafe { T::ffi_index_const(self.sys_const(), sys::usize_to_int(index)) }
    }

    /// # Panics
    ///
    /// If `index` is out of bounds.
    fn ptr_mut(&mut self, index: usize) -> *mut T {
        self.check_bounds(index);

        // SAFETY: bounds checked above.
        unsafe { T::ffi_index(self.sys_mut(), sys::usize_to_int(index)) }
    }

    fn check_bounds(&self, index: usize) {
        let len = self.len();
        assert!(
            index < len,
            "{} index {index} out of bounds: length is {len}",
            T::PACKED_VARIANT_TYPE
        );
    }
}

impl<T: PackedArrayElement> From<&[T]> for PackedArray<T> {
    /// Creates a packed array with a copy of all elements of the slice.
    fn from(slice: &[T]) -> Self {
        let mut array = Self::new();
        if slice.is_empty() {
            return array;
        }

        array.resize(slice.len());
        for (index, element) in slice.iter().enumerate() {
            array[index] = element.clone();
        }
        array
    }
}

impl<T: PackedArrayElement, const N: usize> From<[T; N]> for PackedArray<T> {
    fn from(array: [T; N]) -> Self {
        Self::from(&array[..])
    }
}

impl<T: PackedArrayElement> ops::Index<usize> for PackedArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        let ptr = self.ptr(index);
        // SAFETY: `ptr` checked bounds.
        unsafe { &*ptr }
    }
}

impl<T: PackedArrayElement> ops::IndexMut<usize> for PackedArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let ptr = self.ptr_mut(index);
        // SAFETY: `ptr` checked bounds.
        unsafe { &mut *ptr }
    }
}

impl<T: PackedArrayElement> Default for PackedArray<T> {
    fn default() -> Self {
        let storage = sys::builtin_lifecycle().storage(T::PACKED_VARIANT_TYPE);

        // SAFETY: the default constructor fully initializes the value.
        unsafe {
            Self::from_sys_init(|self_ptr| {
                (storage.construct_default)(self_ptr, std::ptr::null());
            })
        }
    }
}

impl<T: PackedArrayElement> Clone for PackedArray<T> {
    fn clone(&self) -> Self {
        let storage = sys::builtin_lifecycle().storage(T::PACKED_VARIANT_TYPE);

        // SAFETY: `self` is alive for the duration of the copy constructor.
        unsafe {
            Self::from_sys_init(|self_ptr| {
                let args = [self.sys_const()];
                (storage.construct_copy)(self_ptr, args.as_ptr());
            })
        }
    }
}

impl<T: PackedArrayElement> Drop for PackedArray<T> {
    fn drop(&mut self) {
        let storage = sys::builtin_lifecycle().storage(T::PACKED_VARIANT_TYPE);

        // SAFETY: `self` is initialized and never used again.
        unsafe { (storage.destroy)(self.sys_mut()) };
    }
}

impl<T: PackedArrayElement + PartialEq> PartialEq for PackedArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.to_vec() == other.to_vec()
    }
}

impl<T: PackedArrayElement + fmt::Debug> fmt::Debug for PackedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// FFI and conversions

// SAFETY: a transparent wrapper around the engine's packed array storage; the element type selects the variant type.
unsafe impl<T: PackedArrayElement> GodotFfi for PackedArray<T> {
    fn variant_type() -> VariantType {
        T::PACKED_VARIANT_TYPE
    }

    ffi_methods! { type sys::GDExtensionTypePtr = *mut Opaque; .. }
}

impl<T: PackedArrayElement> GodotConvert for PackedArray<T> {
    type Via = Self;
}

impl<T: PackedArrayElement> ToGodot for PackedArray<T> {
    fn to_godot(&self) -> Self::Via {
        self.clone()
    }
}

impl<T: PackedArrayElement> FromGodot for PackedArray<T> {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via)
    }
}

impl<T: PackedArrayElement> GodotFfiVariant for PackedArray<T> {
    fn ffi_to_variant(&self) -> Variant {
        Variant::from_ffi_value(self)
    }

    fn ffi_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        variant.to_ffi_value::<Self>()
    }
}

impl<T: PackedArrayElement> GodotType for PackedArray<T> {
    type Ffi = Self;

    fn to_ffi(&self) -> Self::Ffi {
        self.clone()
    }

    fn into_ffi(self) -> Self::Ffi {
        self
    }

    fn try_from_ffi(ffi: Self::Ffi) -> Result<Self, ConvertError> {
        Ok(ffi)
    }

    fn godot_type_name() -> String {
        T::PACKED_VARIANT_TYPE.name().to_string()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Engine methods

macro_rules! packed_array_methods {
    ($( $Packed:ident: $Element:ident $(($metadata:ident))? ),* $(,)?) => {
        pub(crate) static PACKED_ARRAY_METHODS: &[sys::MethodSpec] = &[
            $(
                sys::MethodSpec::builtin(VariantType::$Packed, "size", 3173160232, &[], ReturnMeta::value(VariantType::Int)),
                sys::MethodSpec::builtin(
                    VariantType::$Packed,
                    "resize",
                    848867239,
                    &[ParamMeta::value("new_size", VariantType::Int)],
                    ReturnMeta::value(VariantType::Int),
                ),
                sys::MethodSpec::builtin(
                    VariantType::$Packed,
                    "push_back",
                    694024632,
                    &[ParamMeta::value("value", VariantType::$Element)
                        $(.with_metadata(sys::ArgumentMetadata::$metadata))?],
                    ReturnMeta::value(VariantType::Bool),
                ),
            )*
        ];
    };
}

packed_array_methods!(
    PackedByteArray: Int(IntIsUint8),
    PackedInt32Array: Int(IntIsInt32),
    PackedInt64Array: Int,
    PackedFloat32Array: Float(RealIsFloat),
    PackedFloat64Array: Float,
    PackedStringArray: String,
);
