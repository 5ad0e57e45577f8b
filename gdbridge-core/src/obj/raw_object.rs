/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use sys::{ffi_methods, interface_fn, GodotFfi, GodotNullableFfi, VariantType};

use crate::builtin::Variant;
use crate::meta::error::ConvertError;
use crate::meta::GodotFfiVariant;
use crate::obj::InstanceId;
use crate::sys;

/// Untyped, non-owning object pointer as it appears in a call frame.
///
/// This is the FFI representation of [`Gd<T>`](crate::obj::Gd). It neither keeps the object alive nor tracks its liveness;
/// the typed layer wraps it into a handle before user code sees it.
#[derive(Copy, Clone, Eq, PartialEq)]
#[repr(transparent)]
#[doc(hidden)]
pub struct RawObject {
    ptr: sys::GDExtensionObjectPtr,
}

impl RawObject {
    pub fn null() -> Self {
        Self {
            ptr: std::ptr::null_mut(),
        }
    }

    pub(crate) fn from_obj_ptr(ptr: sys::GDExtensionObjectPtr) -> Self {
        Self { ptr }
    }

    /// Looks up a live object; dead or unknown IDs give a null pointer.
    pub fn from_instance_id(id: InstanceId) -> Self {
        // SAFETY: the engine accepts any ID and returns null for unknown ones.
        let ptr = unsafe { interface_fn!(object_get_instance_from_id)(id.to_u64()) };
        Self { ptr }
    }

    pub fn obj_ptr(self) -> sys::GDExtensionObjectPtr {
        self.ptr
    }

    /// Instance ID of the object, or `None` if null.
    ///
    /// The pointer must refer to a live object, unless it is null.
    pub fn instance_id(self) -> Option<InstanceId> {
        if self.ptr.is_null() {
            return None;
        }

        // SAFETY: non-null pointers held by this type were handed out by the engine for a live object.
        let id = unsafe { interface_fn!(object_get_instance_id)(self.ptr) };
        InstanceId::try_from_u64(id)
    }
}

impl fmt::Debug for RawObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawObject({:p})", self.ptr)
    }
}

// SAFETY: an object slot holds exactly one object pointer.
unsafe impl GodotFfi for RawObject {
    fn variant_type() -> VariantType {
        VariantType::Object
    }

    ffi_methods! { type sys::GDExtensionTypePtr = *mut Self; .. }
}

impl GodotNullableFfi for RawObject {
    fn null() -> Self {
        Self::null()
    }

    fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

impl GodotFfiVariant for RawObject {
    fn ffi_to_variant(&self) -> Variant {
        Variant::from_ffi_value(self)
    }

    fn ffi_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        // A nil variant stands for the null object.
        if variant.is_nil() {
            return Ok(Self::null());
        }

        variant.to_ffi_value::<Self>()
    }
}
