/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use sys::{ArgumentMetadata, DefaultArg, MethodSpec, ParamMeta, ReturnMeta, SlotType, VariantType};

use crate::builtin::{GString, StringName, Variant};
use crate::meta::class_ptrcall;
use crate::obj::bounds::MemManual;
use crate::obj::{Gd, Inherits, NoBase};
use crate::registry::VirtualMethodSpec;
use crate::sys;

engine_class!(
    /// Root of the class hierarchy.
    Object: NoBase,
    memory = MemManual,
    inherits = [],
    virtuals = OBJECT_VIRTUALS,
);

/// Methods of [`Object`], available on every `Gd<T>`.
pub trait ObjectApi {
    /// Name of the object's dynamic class, e.g. `"Node2D"` for a `Gd<Object>` pointing to a node.
    fn get_class(&self) -> GString;

    /// Whether the object is an instance of `class` or one of its subclasses.
    fn is_class(&self, class: &str) -> bool;

    fn set_meta(&mut self, name: &str, value: &Variant);

    /// Metadata entry `name`, or nil if there is none.
    fn get_meta(&self, name: &str) -> Variant;

    /// Metadata entry `name`, or `default` if there is none.
    fn get_meta_ex(&self, name: &str, default: &Variant) -> Variant;

    fn has_meta(&self, name: &str) -> bool;
}

impl<T: Inherits<Object>> ObjectApi for Gd<T> {
    fn get_class(&self) -> GString {
        // SAFETY: `obj_sys()` checks that the object is alive; `T` inherits the method's class.
        unsafe { class_ptrcall("Object", "get_class", self.obj_sys(), ()) }
    }

    fn is_class(&self, class: &str) -> bool {
        unsafe { class_ptrcall("Object", "is_class", self.obj_sys(), (class,)) }
    }

    fn set_meta(&mut self, name: &str, value: &Variant) {
        let name = StringName::from(name);
        unsafe { class_ptrcall("Object", "set_meta", self.obj_sys(), (name, value.clone())) }
    }

    fn get_meta(&self, name: &str) -> Variant {
        // Omitted default is filled in by the call frame.
        let name = StringName::from(name);
        unsafe { class_ptrcall("Object", "get_meta", self.obj_sys(), (name,)) }
    }

    fn get_meta_ex(&self, name: &str, default: &Variant) -> Variant {
        let name = StringName::from(name);
        unsafe { class_ptrcall("Object", "get_meta", self.obj_sys(), (name, default.clone())) }
    }

    fn has_meta(&self, name: &str) -> bool {
        let name = StringName::from(name);
        unsafe { class_ptrcall("Object", "has_meta", self.obj_sys(), (name,)) }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

pub(crate) static OBJECT_METHODS: &[MethodSpec] = &[
    MethodSpec::class("Object", "get_class", 201670096, &[], ReturnMeta::value(VariantType::String)),
    MethodSpec::class(
        "Object",
        "is_class",
        3927539163,
        &[ParamMeta::value("class", VariantType::String)],
        ReturnMeta::value(VariantType::Bool),
    ),
    MethodSpec::class(
        "Object",
        "set_meta",
        3776071444,
        &[
            ParamMeta::value("name", VariantType::StringName),
            ParamMeta::new("value", SlotType::Variant),
        ],
        ReturnMeta::VOID,
    ),
    MethodSpec::class(
        "Object",
        "get_meta",
        3990617847,
        &[
            ParamMeta::value("name", VariantType::StringName),
            ParamMeta::new("default", SlotType::Variant).with_default(DefaultArg::Nil),
        ],
        ReturnMeta::owned(SlotType::Variant),
    ),
    MethodSpec::class(
        "Object",
        "has_meta",
        2619796661,
        &[ParamMeta::value("name", VariantType::StringName)],
        ReturnMeta::value(VariantType::Bool),
    ),
];

const OBJECT_VIRTUALS: &[VirtualMethodSpec] = &[
    VirtualMethodSpec::new(
        "_set",
        &[
            ParamMeta::value("property", VariantType::StringName),
            ParamMeta::new("value", SlotType::Variant),
        ],
        ReturnMeta::value(VariantType::Bool),
    ),
    VirtualMethodSpec::new(
        "_get",
        &[ParamMeta::value("property", VariantType::StringName)],
        ReturnMeta::owned(SlotType::Variant),
    ),
    VirtualMethodSpec::new("_to_string", &[], ReturnMeta::value(VariantType::String)),
    VirtualMethodSpec::new(
        "_notification",
        &[ParamMeta::value("what", VariantType::Int).with_metadata(ArgumentMetadata::IntIsInt32)],
        ReturnMeta::VOID,
    ),
];
