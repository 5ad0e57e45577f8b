/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::builtin::GString;
use crate::meta::error::{ConvertError, FromVariantError};
use crate::meta::{FromGodot, GodotConvert, GodotFfiVariant, GodotType, ToGodot};
use crate::sys;
use sys::types::OpaqueVariant;
use sys::{ffi_methods, interface_fn, GodotFfi, VariantType};

mod variant_value;

pub use variant_value::VariantValue;

/// Engine's `Variant` type: a dynamically typed value that can hold any bridged type.
///
/// A `Variant` owns its payload. Cloning runs the engine's copy constructor, which for [`Array`][crate::builtin::Array] and
/// [`Dictionary`][crate::builtin::Dictionary] payloads shares the container (like cloning the container itself).
///
/// To inspect a variant without interpreting its tag manually, convert it to the host-side sum type with [`to_value()`](Self::to_value).
#[repr(transparent)]
pub struct Variant {
    opaque: OpaqueVariant,
}

impl Variant {
    /// Create an empty variant (`null` value in GDScript).
    pub fn nil() -> Self {
        // SAFETY: `variant_new_nil` initializes the variant.
        unsafe {
            Self::from_var_sys_init(|variant_ptr| {
                interface_fn!(variant_new_nil)(variant_ptr);
            })
        }
    }

    /// Create a variant holding a non-nil value.
    ///
    /// Equivalent to [`value.to_variant()`][ToGodot::to_variant].
    #[allow(clippy::should_implement_trait)]
    pub fn from<T: ToGodot>(value: T) -> Self {
        value.to_variant()
    }

    /// ⚠️ Convert to type `T`, panicking on failure.
    ///
    /// Equivalent to [`T::from_variant(&self)`][FromGodot::from_variant].
    ///
    /// # Panics
    /// When this variant holds a different type.
    pub fn to<T: FromGodot>(&self) -> T {
        T::from_variant(self)
    }

    /// Convert to type `T`, returning `Err` on failure.
    ///
    /// Equivalent to [`T::try_from_variant(&self)`][FromGodot::try_from_variant].
    pub fn try_to<T: FromGodot>(&self) -> Result<T, ConvertError> {
        T::try_from_variant(self)
    }

    /// Checks whether the variant is empty (`null` value in GDScript).
    pub fn is_nil(&self) -> bool {
        self.raw_type() == VariantType::Nil.sys()
    }

    /// Returns the type that is currently held by this variant.
    ///
    /// Types that this library does not bridge (only a newer engine can produce them) are reported as `Nil`, although
    /// [`is_nil()`](Self::is_nil) is false for them. Use [`try_get_type()`](Self::try_get_type) to tell them apart.
    pub fn get_type(&self) -> VariantType {
        VariantType::from_sys(self.raw_type()).unwrap_or(VariantType::Nil)
    }

    /// Returns the type, or an error if it is not bridged.
    pub fn try_get_type(&self) -> Result<VariantType, ConvertError> {
        let raw = self.raw_type();
        VariantType::from_sys(raw).ok_or_else(|| FromVariantError::UnknownType(raw).into_error(raw))
    }

    /// Converts to the host-side sum type, copying all contents (including nested containers).
    ///
    /// Objects are represented by their instance ID; the object itself is not copied.
    pub fn to_value(&self) -> Result<VariantValue, ConvertError> {
        VariantValue::from_variant(self)
    }

    /// Returns the engine's string representation of this variant.
    pub fn stringify(&self) -> GString {
        // SAFETY: `variant_stringify` initializes the string.
        unsafe {
            GString::from_string_sys_init(|string_ptr| {
                interface_fn!(variant_stringify)(self.var_sys_const(), string_ptr);
            })
        }
    }

    /// Converts a value of any type with a variant converter.
    pub(crate) fn from_ffi_value<T: GodotFfi>(value: &T) -> Self {
        let converter = sys::builtin_lifecycle().conversion(T::variant_type()).from_type;

        // SAFETY: the converter reads a `T` and initializes the variant; `value` outlives the call.
        unsafe {
            Self::from_var_sys_init(|variant_ptr| {
                converter(variant_ptr, value.sys());
            })
        }
    }

    /// Extracts a value of exactly type `T`. No conversion between types takes place; `int` does not become `float`.
    pub(crate) fn to_ffi_value<T: GodotFfi>(&self) -> Result<T, ConvertError> {
        let expected = T::variant_type();
        let actual = self.try_get_type()?;
        if actual != expected {
            return Err(FromVariantError::BadType { expected, actual }.into_error(self));
        }

        let converter = sys::builtin_lifecycle().conversion(expected).to_type;

        // SAFETY: the tag was checked; the converter initializes a fresh `T` from the payload, which stays owned by `self`.
        let value = unsafe {
            T::from_sys_init(|type_ptr| {
                converter(type_ptr, self.var_sys());
            })
        };

        Ok(value)
    }

    /// Views an engine-owned variant, e.g. an element of an array.
    ///
    /// # Safety
    /// `ptr` must point to an initialized variant that outlives `'a` and is not mutated meanwhile.
    pub(crate) unsafe fn borrow_var_sys<'a>(ptr: sys::GDExtensionConstVariantPtr) -> &'a Variant {
        &*(ptr as *const Variant)
    }

    /// Mutable view of an engine-owned variant slot. Assigning through it destroys the previous value.
    ///
    /// # Safety
    /// `ptr` must point to an initialized variant that outlives `'a` and is not accessed otherwise meanwhile.
    pub(crate) unsafe fn borrow_var_sys_mut<'a>(ptr: sys::GDExtensionVariantPtr) -> &'a mut Variant {
        &mut *(ptr as *mut Variant)
    }

    fn raw_type(&self) -> sys::GDExtensionVariantType {
        // SAFETY: `self` is an initialized variant.
        unsafe { interface_fn!(variant_get_type)(self.var_sys_const()) }
    }

    fn from_opaque(opaque: OpaqueVariant) -> Self {
        Self { opaque }
    }

    pub(crate) fn var_sys_const(&self) -> sys::GDExtensionConstVariantPtr {
        self.var_sys()
    }

    // Conversions from/to engine `Variant*` pointers
    ffi_methods! {
        type sys::GDExtensionVariantPtr = *mut Opaque;

        fn from_var_sys = from_sys;
        fn from_var_sys_init = from_sys_init;
        fn var_sys = sys;
    }
}

impl Clone for Variant {
    fn clone(&self) -> Self {
        // SAFETY: `self` is alive during the copy.
        unsafe {
            Self::from_var_sys_init(|variant_ptr| {
                interface_fn!(variant_new_copy)(variant_ptr, self.var_sys_const());
            })
        }
    }
}

impl Drop for Variant {
    fn drop(&mut self) {
        // SAFETY: `self` is initialized and never used again.
        unsafe {
            interface_fn!(variant_destroy)(self.var_sys());
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::nil()
    }
}

/// Compares contents. Containers compare element-wise, objects by instance ID.
///
/// Variants that cannot be converted to a [`VariantValue`], such as a container that contains itself, are not equal to
/// anything, including themselves.
impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_value(), other.to_value()) {
            (Ok(lhs), Ok(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.stringify(), f)
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_value() {
            Ok(value) => fmt::Debug::fmt(&value, f),
            Err(err) => write!(f, "Variant(type={}, {err})", self.raw_type()),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// FFI and conversions

// SAFETY: `Variant` is a transparent wrapper around the engine's variant storage.
unsafe impl GodotFfi for Variant {
    /// Variants are not a variant type of their own; their call frame slot is [`SlotType::Variant`](sys::SlotType::Variant).
    fn variant_type() -> VariantType {
        VariantType::Nil
    }

    fn slot_type() -> sys::SlotType {
        sys::SlotType::Variant
    }

    ffi_methods! { type sys::GDExtensionTypePtr = *mut Opaque; .. }
}

impl GodotConvert for Variant {
    type Via = Variant;
}

impl ToGodot for Variant {
    fn to_godot(&self) -> Self::Via {
        self.clone()
    }

    fn to_variant(&self) -> Variant {
        self.clone()
    }
}

impl FromGodot for Variant {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via)
    }

    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        Ok(variant.clone())
    }
}

impl GodotFfiVariant for Variant {
    fn ffi_to_variant(&self) -> Variant {
        self.clone()
    }

    fn ffi_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        Ok(variant.clone())
    }
}

impl GodotType for Variant {
    type Ffi = Variant;

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
        "Variant".to_string()
    }
}
