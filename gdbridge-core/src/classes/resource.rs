/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use sys::{DefaultArg, MethodSpec, ParamMeta, ReturnMeta, SlotType, VariantType};

use crate::builtin::GString;
use crate::classes::{Object, RefCounted};
use crate::meta::class_ptrcall;
use crate::obj::bounds::MemRefCounted;
use crate::obj::{Gd, Inherits};
use crate::registry::VirtualMethodSpec;
use crate::sys;

engine_class!(
    /// Serializable data container.
    Resource: RefCounted,
    memory = MemRefCounted,
    inherits = [RefCounted, Object],
    virtuals = RESOURCE_VIRTUALS,
);

pub trait ResourceApi {
    fn set_name(&mut self, name: &str);

    fn get_name(&self) -> GString;

    /// Shallow copy of the resource. The returned object is new; the caller holds its only reference.
    fn duplicate(&self) -> Gd<Resource>;

    /// Copy of the resource; with `subresources`, nested resources are copied too.
    fn duplicate_ex(&self, subresources: bool) -> Gd<Resource>;
}

impl<T: Inherits<Resource>> ResourceApi for Gd<T> {
    fn set_name(&mut self, name: &str) {
        // SAFETY: `obj_sys()` checks that the object is alive; `T` inherits the method's class.
        unsafe { class_ptrcall("Resource", "set_name", self.obj_sys(), (name,)) }
    }

    fn get_name(&self) -> GString {
        unsafe { class_ptrcall("Resource", "get_name", self.obj_sys(), ()) }
    }

    fn duplicate(&self) -> Gd<Resource> {
        unsafe { class_ptrcall("Resource", "duplicate", self.obj_sys(), ()) }
    }

    fn duplicate_ex(&self, subresources: bool) -> Gd<Resource> {
        unsafe { class_ptrcall("Resource", "duplicate", self.obj_sys(), (subresources,)) }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

pub(crate) static RESOURCE_METHODS: &[MethodSpec] = &[
    MethodSpec::class(
        "Resource",
        "set_name",
        83702148,
        &[ParamMeta::value("name", VariantType::String)],
        ReturnMeta::VOID,
    ),
    MethodSpec::class("Resource", "get_name", 201670096, &[], ReturnMeta::value(VariantType::String)),
    MethodSpec::class(
        "Resource",
        "duplicate",
        482882304,
        &[ParamMeta::value("subresources", VariantType::Bool).with_default(DefaultArg::Bool(false))],
        ReturnMeta::owned(SlotType::Value(VariantType::Object)),
    ),
];

const RESOURCE_VIRTUALS: &[VirtualMethodSpec] = &[VirtualMethodSpec::new("_setup_local_to_scene", &[], ReturnMeta::VOID)];
