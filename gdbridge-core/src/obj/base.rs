/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;

use crate::obj::{Gd, GodotClass, InstanceId};
use crate::sys;

/// Restricted version of `Gd`, to hold the base instance inside a user's `GodotClass`.
///
/// Behaves similarly to [`Gd`][crate::obj::Gd], but is more constrained. Cannot be constructed by the user.
pub struct Base<T: GodotClass> {
    // Neither a handle nor a reference: the user instance lives inside the object, so a strong reference here would be a cycle
    // that keeps ref-counted objects alive forever.
    obj_ptr: sys::GDExtensionObjectPtr,
    instance_id: InstanceId,
    _marker: PhantomData<*const T>,
}

impl<T: GodotClass> Base<T> {
    /// # Safety
    /// `base_ptr` must be a live object of class `T` (or a subclass), which outlives the `Base`.
    pub(crate) unsafe fn from_sys(base_ptr: sys::GDExtensionObjectPtr) -> Self {
        assert!(!base_ptr.is_null(), "instance base is null pointer");

        let raw = crate::obj::RawObject::from_obj_ptr(base_ptr);
        let instance_id = raw
            .instance_id()
            .unwrap_or_else(|| panic!("instance base has no instance ID"));

        Self {
            obj_ptr: base_ptr,
            instance_id,
            _marker: PhantomData,
        }
    }

    /// Returns a [`Gd`] referencing the same object.
    ///
    /// For ref-counted classes, the returned pointer holds a new reference. Otherwise, it is a borrowed view; the object belongs
    /// to whoever owns the user instance.
    pub fn to_gd(&self) -> Gd<T> {
        // SAFETY: the base object lives at least as long as the user instance that holds `self`.
        unsafe { Gd::from_obj_sys_borrowed(self.obj_ptr) }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    #[doc(hidden)]
    pub fn obj_sys(&self) -> sys::GDExtensionObjectPtr {
        self.obj_ptr
    }
}

impl<T: GodotClass> Debug for Base<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Base {{ class: {}, id: {} }}", T::CLASS_NAME, self.instance_id)
    }
}
