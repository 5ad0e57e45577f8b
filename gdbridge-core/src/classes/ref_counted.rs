/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use sys::{ArgumentMetadata, MethodSpec, ReturnMeta, VariantType};

use crate::classes::Object;
use crate::meta::class_ptrcall;
use crate::obj::bounds::MemRefCounted;
use crate::obj::{Gd, Inherits};
use crate::sys;

engine_class!(
    /// Base class of all reference-counted objects. Destroyed when the last reference is dropped.
    ///
    /// `Gd` manages the count itself (`init_ref`, `reference`, `unreference`); the wrappers do not expose those methods.
    RefCounted: Object,
    memory = MemRefCounted,
    inherits = [Object],
    virtuals = &[],
);

pub trait RefCountedApi {
    /// Current number of references, including the one held by `self`.
    fn get_reference_count(&self) -> i32;
}

impl<T: Inherits<RefCounted>> RefCountedApi for Gd<T> {
    fn get_reference_count(&self) -> i32 {
        // SAFETY: `obj_sys()` checks that the object is alive; `T` inherits the method's class.
        unsafe { class_ptrcall("RefCounted", "get_reference_count", self.obj_sys(), ()) }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

pub(crate) static REF_COUNTED_METHODS: &[MethodSpec] = &[
    // Returns whether this was the first reference.
    MethodSpec::class("RefCounted", "init_ref", 2240911060, &[], ReturnMeta::value(VariantType::Bool)),
    MethodSpec::class("RefCounted", "reference", 2240911060, &[], ReturnMeta::value(VariantType::Bool)),
    // Returns whether the count dropped to zero; the caller then destroys the object.
    MethodSpec::class("RefCounted", "unreference", 2240911060, &[], ReturnMeta::value(VariantType::Bool)),
    MethodSpec::class(
        "RefCounted",
        "get_reference_count",
        3905245786,
        &[],
        ReturnMeta::value(VariantType::Int).with_metadata(ArgumentMetadata::IntIsInt32),
    ),
];
