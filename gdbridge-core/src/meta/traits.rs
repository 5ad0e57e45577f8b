/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::builtin::Variant;
use crate::meta::error::ConvertError;
use crate::meta::{sealed, FromGodot, GodotConvert, ToGodot};
use crate::sys;

// Re-export sys traits in this module, so all are in one place.
pub use sys::{GodotFfi, GodotNullableFfi};

/// Conversion of [`GodotFfi`] types to/from [`Variant`].
#[doc(hidden)]
pub trait GodotFfiVariant: Sized + GodotFfi {
    fn ffi_to_variant(&self) -> Variant;
    fn ffi_from_variant(variant: &Variant) -> Result<Self, ConvertError>;
}

/// Type that is directly representable in the engine.
///
/// This trait cannot be implemented for custom user types; for those, [`GodotConvert`] exists instead.
/// A type implements `GodotType` when the engine has a direct, native representation for it. For instance:
/// - [`i64`] implements `GodotType`, since it can be directly represented by the engine's `int` type.
/// - [`i32`] implements it as well: it travels in an `int` slot, and its [`param_metadata()`](Self::param_metadata) tells
///   the engine that only 32 bits are used.
//
// Unlike `GodotFfi`, types implementing this trait don't need to fully represent their engine type. `i32` cannot hold every
// `int`, so it is not `GodotFfi`; its FFI representation is `i64`.
pub trait GodotType: GodotConvert<Via = Self> + ToGodot + FromGodot + sealed::Sealed + 'static {
    #[doc(hidden)]
    type Ffi: GodotFfiVariant;

    #[doc(hidden)]
    fn to_ffi(&self) -> Self::Ffi;

    #[doc(hidden)]
    fn into_ffi(self) -> Self::Ffi;

    #[doc(hidden)]
    fn try_from_ffi(ffi: Self::Ffi) -> Result<Self, ConvertError>;

    #[doc(hidden)]
    fn from_ffi(ffi: Self::Ffi) -> Self {
        Self::try_from_ffi(ffi).unwrap_or_else(|err| panic!("GodotType::from_ffi() failed: {err}"))
    }

    /// Decodes the return value of an engine method, which declares who owns the returned value.
    ///
    /// Only objects care; all other types are values.
    #[doc(hidden)]
    fn try_from_return(ffi: Self::Ffi, _ownership: sys::Ownership) -> Result<Self, ConvertError> {
        Self::try_from_ffi(ffi)
    }

    /// Type of the call frame slot holding this type.
    #[doc(hidden)]
    fn slot_type() -> sys::SlotType {
        <Self::Ffi as GodotFfi>::slot_type()
    }

    /// Declared width of `int`/`float` values; [`ArgumentMetadata::None`](sys::ArgumentMetadata::None) for all other types.
    #[doc(hidden)]
    fn param_metadata() -> sys::ArgumentMetadata {
        sys::ArgumentMetadata::None
    }

    #[doc(hidden)]
    fn godot_type_name() -> String;
}

/// `(slot type, metadata)` pair of a [`GodotType`], the unit in which call frames check argument types.
pub(crate) fn frame_signature<T: GodotType>() -> (sys::SlotType, sys::ArgumentMetadata) {
    (T::slot_type(), T::param_metadata())
}
